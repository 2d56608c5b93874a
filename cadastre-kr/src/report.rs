//! Rapport de traitement par lot
//!
//! Chaque région aboutit à SUCCESS, SKIPPED ou FAILED. Le rapport agrège ces
//! résultats pour l'affichage, l'export JSON et le code de sortie.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::error::RegionError;

/// Statut global du lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchStatus {
    /// Toutes les régions réussies (ou ignorées)
    Success,
    /// Au moins une réussite et au moins un échec
    PartialSuccess,
    /// Aucune réussite, au moins un échec
    Failed,
    /// Aucune région trouvée
    Empty,
}

/// Résultat d'une région
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegionOutcome {
    Success {
        features: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<PathBuf>,
    },
    Skipped {
        reason: String,
    },
    Failed {
        kind: String,
        reason: String,
    },
}

impl RegionOutcome {
    pub fn from_error(err: &RegionError) -> Self {
        if err.is_skip() {
            Self::Skipped {
                reason: err.to_string(),
            }
        } else {
            Self::Failed {
                kind: err.kind().to_string(),
                reason: format_error_chain(err),
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Ligne du rapport pour une région
#[derive(Debug, Clone, Serialize)]
pub struct RegionReport {
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<String>,
    #[serde(flatten)]
    pub outcome: RegionOutcome,
}

/// Rapport complet d'un lot (`process` ou `count`)
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Commande exécutée
    pub command: String,
    /// Durée du traitement
    pub duration_secs: f64,
    /// Statut global
    pub status: BatchStatus,

    pub regions_succeeded: usize,
    pub regions_skipped: usize,
    pub regions_failed: usize,
    /// Somme des features des régions réussies
    pub total_features: usize,

    /// Détail par région, trié par archive
    pub regions: Vec<RegionReport>,
}

impl BatchReport {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            duration_secs: 0.0,
            status: BatchStatus::Empty,
            regions_succeeded: 0,
            regions_skipped: 0,
            regions_failed: 0,
            total_features: 0,
            regions: Vec::new(),
        }
    }

    /// Enregistre le résultat d'une région
    pub fn record(&mut self, region: &str, archive: Option<String>, outcome: RegionOutcome) {
        match &outcome {
            RegionOutcome::Success { features, .. } => {
                self.regions_succeeded += 1;
                self.total_features += features;
            }
            RegionOutcome::Skipped { .. } => self.regions_skipped += 1,
            RegionOutcome::Failed { .. } => self.regions_failed += 1,
        }
        self.regions.push(RegionReport {
            region: region.to_string(),
            archive,
            outcome,
        });
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration_secs = duration.as_secs_f64();
    }

    /// Détermine le statut final
    pub fn finalize(&mut self) {
        self.status = if self.regions.is_empty() {
            BatchStatus::Empty
        } else if self.regions_failed == 0 {
            BatchStatus::Success
        } else if self.regions_succeeded > 0 {
            BatchStatus::PartialSuccess
        } else {
            BatchStatus::Failed
        };
    }

    /// Vrai si au moins une région a échoué (SKIPPED ne compte pas)
    pub fn has_failures(&self) -> bool {
        self.regions_failed > 0
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("{} REPORT", self.command.to_uppercase());
        println!("{}", "=".repeat(60));

        println!("\nStatus: {:?}", self.status);
        println!("Duration: {:.2}s", self.duration_secs);

        println!("\n--- SUMMARY ---");
        println!(
            "Regions: {} succeeded, {} skipped, {} failed",
            self.regions_succeeded, self.regions_skipped, self.regions_failed
        );
        println!("Features: {}", format_thousands(self.total_features));

        let problems: Vec<&RegionReport> = self
            .regions
            .iter()
            .filter(|r| !matches!(r.outcome, RegionOutcome::Success { .. }))
            .collect();
        if !problems.is_empty() {
            println!("\n--- SKIPPED / FAILED ({}) ---", problems.len());
            for r in problems.iter().take(20) {
                match &r.outcome {
                    RegionOutcome::Skipped { reason } => println!("  SKIPPED [{}] {}", r.region, reason),
                    RegionOutcome::Failed { reason, .. } => println!("  FAILED  [{}] {}", r.region, reason),
                    RegionOutcome::Success { .. } => {}
                }
            }
            if problems.len() > 20 {
                println!("  ... and {} more", problems.len() - 20);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    /// Affichage compact pour le résumé
    pub fn summary(&self) -> String {
        format!(
            "{}: {} regions ({} ok, {} skipped, {} failed), {} features",
            self.command,
            self.regions.len(),
            self.regions_succeeded,
            self.regions_skipped,
            self.regions_failed,
            format_thousands(self.total_features)
        )
    }
}

/// Formate un entier avec des séparateurs de milliers (`1,234,567`)
pub fn format_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Message d'erreur avec ses causes (`a: b: c`)
fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
