//! Point d'entrée CLI pour cadastre-kr

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, EnvFilter};

use cadastre_kr::{Settings, SettingsOverrides};

// Charger .env au démarrage
fn load_env() {
    // Chercher .env dans le répertoire courant ou parent
    if dotenvy::dotenv().is_err() {
        // Essayer depuis le répertoire du binaire
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                let _ = dotenvy::from_path(dir.join(".env"));
            }
        }
    }
}

mod cli;

use cli::Commands;

/// Convertir le cadastre coréen (shapefile) en GeoJSON WGS84
#[derive(Parser)]
#[command(name = "cadastre-kr")]
#[command(author, version)]
#[command(about = "Convertir les archives shapefile du cadastre coréen en GeoJSON WGS84")]
#[command(long_about = "Extrait les archives LSMD_CONT_LDREG_*.zip, reprojette les parcelles (EPSG:5186 → EPSG:4326), répare l'encodage CP949 des attributs et écrit une FeatureCollection par région.")]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Data root containing zip/, unzipped/ and json/ (env: CADASTRE_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Number of regions processed concurrently (env: CADASTRE_JOBS)
    #[arg(long, alias = "threads", global = true)]
    jobs: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<ExitCode> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    // Configurer le logging
    init_logging(cli.verbose, cli.quiet);

    let settings = load_settings(&cli)?;

    let report = match &cli.command {
        Commands::Process { report } => {
            info!(data_dir = %settings.data_dir.display(), "Process all archives");
            cli::cmd_process(&settings, report.as_deref())?
        }
        Commands::Count => {
            info!(data_dir = %settings.data_dir.display(), "Count all features");
            cli::cmd_count(&settings)?
        }
    };

    if report.has_failures() {
        warn!(failed = report.regions_failed, "Some regions failed");
    }
    if cli.command.exits_with_failure(&report) {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

/// Environnement, puis fichier JSON, puis options CLI
fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::from_env()?;

    if let Some(path) = &cli.config {
        let overrides = SettingsOverrides::load(path)
            .with_context(|| format!("Invalid settings file: {}", path.display()))?;
        settings.apply(overrides);
    }

    settings.apply(SettingsOverrides {
        data_dir: cli.data_dir.clone(),
        jobs: cli.jobs,
        ..Default::default()
    });

    settings.validate()?;
    Ok(settings)
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => Level::WARN,
        (_, 0) => Level::INFO,
        (_, 1) => Level::DEBUG,
        (_, _) => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .init();
}
