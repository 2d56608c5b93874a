//! Configuration du système
//!
//! Ordre de priorité: valeurs par défaut < variables d'environnement (`.env`
//! compris) < fichier JSON (`--config`) < options de la ligne de commande.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::reproject_lite::CrsDefinition;

/// Préfixe des archives du cadastre coréen (`LSMD_CONT_LDREG_11110.zip`)
pub const DEFAULT_ARCHIVE_PREFIX: &str = "LSMD_CONT_LDREG_";

/// Configuration principale
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    /// Dossier racine contenant `zip/`, `unzipped/` et `json/`
    pub data_dir: PathBuf,

    /// Préfixe retiré du nom des archives pour obtenir le code région
    pub archive_prefix: String,

    /// EPSG des coordonnées source
    pub source_epsg: u32,

    /// Nombre de régions traitées en parallèle (1 = séquentiel)
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            source_epsg: 5186,
            jobs: 1,
        }
    }
}

/// Valeurs optionnelles surchargeant des `Settings` (fichier JSON ou CLI)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsOverrides {
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    #[serde(default)]
    pub archive_prefix: Option<String>,
    #[serde(default)]
    pub source_epsg: Option<u32>,
    #[serde(default)]
    pub jobs: Option<usize>,
}

impl SettingsOverrides {
    /// Charge des surcharges depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }
}

impl Settings {
    /// Lit la configuration depuis l'environnement
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lit la configuration via une fonction de lookup (testable)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(dir) = lookup("CADASTRE_DATA_DIR") {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup("CADASTRE_ARCHIVE_PREFIX") {
            settings.archive_prefix = prefix;
        }
        if let Some(epsg) = lookup("CADASTRE_SOURCE_EPSG") {
            settings.source_epsg = epsg
                .trim()
                .parse()
                .context(format!("Invalid CADASTRE_SOURCE_EPSG: {}", epsg))?;
        }
        if let Some(jobs) = lookup("CADASTRE_JOBS") {
            settings.jobs = jobs
                .trim()
                .parse()
                .context(format!("Invalid CADASTRE_JOBS: {}", jobs))?;
        }

        Ok(settings)
    }

    /// Applique des surcharges (les valeurs absentes sont conservées)
    pub fn apply(&mut self, overrides: SettingsOverrides) {
        if let Some(dir) = overrides.data_dir {
            self.data_dir = dir;
        }
        if let Some(prefix) = overrides.archive_prefix {
            self.archive_prefix = prefix;
        }
        if let Some(epsg) = overrides.source_epsg {
            self.source_epsg = epsg;
        }
        if let Some(jobs) = overrides.jobs {
            self.jobs = jobs;
        }
    }

    /// Vérifie la cohérence de la configuration
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            bail!("jobs must be at least 1");
        }
        self.source_crs()?;
        Ok(())
    }

    /// Définition du CRS source
    pub fn source_crs(&self) -> Result<CrsDefinition> {
        match CrsDefinition::from_epsg(self.source_epsg) {
            Some(crs) => Ok(crs),
            None => bail!("Unsupported source CRS: EPSG:{}", self.source_epsg),
        }
    }

    /// Archives d'entrée
    pub fn zip_dir(&self) -> PathBuf {
        self.data_dir.join("zip")
    }

    /// Dossiers extraits, un par région
    pub fn unzipped_dir(&self) -> PathBuf {
        self.data_dir.join("unzipped")
    }

    /// FeatureCollections produites
    pub fn json_dir(&self) -> PathBuf {
        self.data_dir.join("json")
    }
}
