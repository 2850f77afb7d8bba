//! Point d'entrée CLI pour cadastre-formations

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// Charger .env au démarrage
fn load_env() {
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

use cli::{Commands, SummaryArgs};

/// Explorer le cadastre des formations TIC en Wallonie
#[derive(Parser)]
#[command(name = "cadastre-formations")]
#[command(author, version)]
#[command(about = "Charger, enrichir et explorer le cadastre des formations TIC (résumé par défaut)")]
#[command(long_about = "Charge le CSV des formations, normalise durées et provinces, l'enrichit avec le référentiel des codes postaux puis affiche un résumé.\n\nUtilisez 'export-csv', 'to-geojson' ou 'explore' pour les autres usages.")]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    /// Augmenter la verbosité (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Mode silencieux
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Sous-commande (défaut: summary)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Arguments du résumé (commande par défaut)
    #[command(flatten)]
    summary: Option<SummaryArgs>,
}

fn main() -> Result<()> {
    // Charger .env avant tout
    load_env();

    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Summary(args)) => cli::cmd_summary(&args)?,
        Some(Commands::ExportCsv {
            source,
            output,
            enriched,
            filter,
        }) => {
            info!(output = %output.display(), enriched, "Export CSV");
            cli::cmd_export_csv(&source, &output, enriched, &filter)?;
        }
        Some(Commands::ToGeojson {
            source,
            output,
            by_province,
            filter,
        }) => {
            info!(output = %output.display(), by_province, "Export vers GeoJSON");
            cli::cmd_to_geojson(&source, &output, by_province, &filter)?;
        }
        Some(Commands::Explore { source }) => cli::cmd_explore(&source)?,
        None => cli::cmd_summary(&cli.summary.unwrap_or_default())?,
    }

    Ok(())
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
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
