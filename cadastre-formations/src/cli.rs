//! Définition et implémentation des commandes CLI
//!
//! - `summary`: rapport d'exécution et vues agrégées (défaut)
//! - `export-csv`: export filtré
//! - `to-geojson`: carte des formations
//! - `explore`: session interactive

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use tracing::{debug, info, warn};

use cadastre_formations::config::{Config, Sources};
use cadastre_formations::export::{export_csv, export_to_geojson, GeoJsonMode};
use cadastre_formations::report::RunReport;
use cadastre_formations::session::{apply_command, Command, Session};
use formations::views::{
    self, Filter, DURATION_BINS, ORGANISME_CATEGORIE_MIN_COUNT, TOP_ORGANISMES,
};
use formations::{loader, CategorieDuree, Dataset, Formation, GeoReference, Province, TableCache};

#[derive(Subcommand)]
pub enum Commands {
    /// Load, enrich and summarize the dataset
    Summary(SummaryArgs),

    /// Export the (filtered) display columns to CSV
    ExportCsv {
        #[command(flatten)]
        source: SourceArgs,

        /// Output CSV file
        #[arg(short, long)]
        output: PathBuf,

        /// Append the computed columns (duree_heures, ville, arrondissement, latitude, longitude)
        #[arg(long)]
        enriched: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Export geolocated formations to GeoJSON
    ToGeojson {
        #[command(flatten)]
        source: SourceArgs,

        /// Output GeoJSON file
        #[arg(short, long)]
        output: PathBuf,

        /// One point per province (centroid) instead of one per formation
        #[arg(long)]
        by_province: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Interactive exploration session (commands read from stdin)
    Explore {
        #[command(flatten)]
        source: SourceArgs,
    },
}

/// Sources et conversion des durées
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Main dataset (défaut : env FORMATIONS_CSV / data/formations_clean.csv)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Postal code reference table (défaut : env FORMATIONS_REFERENCE)
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Duration scale preset: standard, reduit
    #[arg(long, default_value = "standard")]
    pub preset: String,

    /// Path to a JSON duration scale (overrides --preset)
    #[arg(long)]
    pub scale_config: Option<PathBuf>,
}

/// Arguments de la commande par défaut
#[derive(Args, Debug, Clone, Default)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Save the run report as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

/// Filtres de sélection
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Province (repeatable)
    #[arg(long)]
    pub province: Vec<String>,

    /// Organisme (repeatable)
    #[arg(long)]
    pub organisme: Vec<String>,

    /// Duration category: Courte, Moyenne, Longue, "Non spécifié" (repeatable)
    #[arg(long)]
    pub categorie: Vec<String>,

    /// Only qualifying formations
    #[arg(long)]
    pub qualifiante: bool,

    /// Only certifying formations
    #[arg(long)]
    pub certifiante: bool,

    /// Case-insensitive search in the title
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    pub fn to_filter(&self) -> Result<Filter> {
        let mut filter = Filter {
            organismes: self.organisme.clone(),
            qualifiante_only: self.qualifiante,
            certifiante_only: self.certifiante,
            search: self.search.clone().unwrap_or_default(),
            ..Default::default()
        };

        for name in &self.province {
            match Province::from_name(name) {
                Some(p) => filter.provinces.push(p),
                None => bail!(
                    "Unknown province: {}. Use: Hainaut, Liège, Namur, Luxembourg, Brabant wallon",
                    name
                ),
            }
        }
        for label in &self.categorie {
            match CategorieDuree::from_label(label) {
                Some(c) => filter.categories.push(c),
                None => bail!("Unknown category: {}", label),
            }
        }

        Ok(filter)
    }
}

/// Source résolue (arguments + environnement) et configuration
struct Pipeline {
    sources: Sources,
    config: Config,
}

impl Pipeline {
    fn resolve(args: &SourceArgs) -> Result<Self> {
        let sources =
            Sources::from_env().with_overrides(args.input.clone(), args.reference.clone());
        let config = match &args.scale_config {
            Some(path) => Config::load(path)?,
            None => Config::from_spec(&args.preset)?,
        };
        debug!(?sources, scale = ?config.scale(), "Configuration résolue");
        Ok(Self { sources, config })
    }

    fn identity(&self) -> String {
        self.sources.input.display().to_string()
    }

    fn geo_reference(&self) -> GeoReference {
        match &self.sources.reference {
            Some(path) => GeoReference::from_reference(&loader::load_reference_path(path)),
            None => GeoReference::none(),
        }
    }

    fn read_input(&self) -> Result<Vec<u8>> {
        loader::read_source(&self.sources.input)
            .context(format!("Failed to read {}", self.sources.input.display()))
    }

    fn build(&self, bytes: &[u8], geo: &GeoReference) -> Result<Dataset> {
        Dataset::build(&self.identity(), bytes, geo, &self.config.scale())
            .context(format!("Failed to load {}", self.sources.input.display()))
    }

    fn load(&self) -> Result<Dataset> {
        let bytes = self.read_input()?;
        self.build(&bytes, &self.geo_reference())
    }

    /// Relit la source et reconstruit le jeu si son contenu a changé
    ///
    /// Une source illisible est retirée du cache: le prochain contenu lu est
    /// toujours reconstruit.
    fn reload(&self, cache: &mut TableCache<Dataset>, geo: &GeoReference) -> Result<Arc<Dataset>> {
        let identity = self.identity();
        let bytes = match self.read_input() {
            Ok(bytes) => bytes,
            Err(e) => {
                cache.invalidate(&identity);
                return Err(e);
            }
        };
        cache.get_or_load(&identity, &bytes, |b| self.build(b, geo))
    }
}

/// Jeu de données courant après un rechargement
///
/// Un échec garde le jeu précédent; sans jeu précédent, l'erreur remonte.
fn keep_or_replace(
    previous: Option<Arc<Dataset>>,
    reloaded: Result<Arc<Dataset>>,
) -> Result<Arc<Dataset>> {
    match (reloaded, previous) {
        (Ok(dataset), _) => Ok(dataset),
        (Err(e), Some(previous)) => {
            let reason = format!("{:#}", e);
            warn!(error = %reason, "Rechargement impossible, données précédentes conservées");
            Ok(previous)
        }
        (Err(e), None) => Err(e),
    }
}

/// Exécute la commande summary
pub fn cmd_summary(args: &SummaryArgs) -> Result<()> {
    let dataset = Pipeline::resolve(&args.source)?.load()?;
    let report = RunReport::from_dataset(&dataset);
    report.display();

    print_views(&dataset, &dataset.all());

    if let Some(path) = &args.json {
        report
            .save_to_file(path)
            .context(format!("Failed to write report: {}", path.display()))?;
        info!(path = %path.display(), "Rapport sauvegardé");
    }

    info!("{}", report.summary());
    Ok(())
}

/// Exécute la commande export-csv
pub fn cmd_export_csv(
    source: &SourceArgs,
    output: &Path,
    enriched: bool,
    filter: &FilterArgs,
) -> Result<()> {
    let filter = filter.to_filter()?;
    let dataset = Pipeline::resolve(source)?.load()?;
    let selected = dataset.filtered(&filter);

    export_csv(output, &selected, &dataset.export_columns(enriched))?;
    println!(
        "{} formation(s) exportée(s) vers {}",
        selected.len(),
        output.display()
    );
    Ok(())
}

/// Exécute la commande to-geojson
pub fn cmd_to_geojson(
    source: &SourceArgs,
    output: &Path,
    by_province: bool,
    filter: &FilterArgs,
) -> Result<()> {
    let filter = filter.to_filter()?;
    let dataset = Pipeline::resolve(source)?.load()?;
    let selected = dataset.filtered(&filter);

    let mode = if by_province {
        GeoJsonMode::Provinces
    } else {
        GeoJsonMode::Formations
    };
    let points = export_to_geojson(&selected, &dataset.mapping, mode, output)?;

    if points == 0 {
        warn!("Aucune formation géolocalisée: le référentiel est-il fourni ?");
    }
    println!("{} point(s) exporté(s) vers {}", points, output.display());
    Ok(())
}

/// Exécute la session interactive
///
/// La source est relue à chaque commande; le cache évite de reconstruire
/// le jeu de données tant que son contenu ne change pas. Si la relecture
/// échoue, la session continue sur le dernier jeu chargé.
pub fn cmd_explore(source: &SourceArgs) -> Result<()> {
    let pipeline = Pipeline::resolve(source)?;
    let geo = pipeline.geo_reference();
    if !geo.is_available() {
        println!("Référentiel géographique indisponible: ni ville ni coordonnées.");
    }
    let mut cache: TableCache<Dataset> = TableCache::new();
    let mut session = Session::default();
    let mut current: Option<Arc<Dataset>> = None;

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        let reloaded = pipeline.reload(&mut cache, &geo);
        let dataset = keep_or_replace(current.take(), reloaded)?;
        current = Some(Arc::clone(&dataset));
        let selected = dataset.filtered(&session.filter);

        write!(stdout, "[{} formation(s)] > ", selected.len())?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match Command::parse(&line) {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match &command {
            Command::Quit => break,
            Command::Stats => print_views(&dataset, &selected),
            Command::Export { path, enriched } => {
                if let Err(e) = export_csv(path, &selected, &dataset.export_columns(*enriched)) {
                    println!("Export impossible: {:#}", e);
                } else {
                    println!("{} formation(s) exportée(s) vers {}", selected.len(), path.display());
                }
            }
            _ => session = apply_command(&session, &command),
        }
    }

    debug!(hits = cache.hits(), misses = cache.misses(), "Fin de session");
    Ok(())
}

/// Affiche les vues agrégées d'une sélection
fn print_views(dataset: &Dataset, selected: &[&Formation]) {
    let mapping = &dataset.mapping;
    let summary = views::summary(selected, mapping);

    println!("\n--- FORMATIONS ---");
    println!("Formations: {}", summary.formations);
    if let Some(n) = summary.organismes {
        println!("Organismes: {}", n);
    }
    println!(
        "Qualifiantes: {}, certifiantes: {}",
        summary.qualifiantes, summary.certifiantes
    );
    if let Some(n) = summary.provinces {
        println!("Provinces: {}", n);
    }

    print_counts("PAR PROVINCE", &views::province_counts(selected));
    print_counts(
        "TOP ORGANISMES",
        &views::organisme_counts(selected, mapping, TOP_ORGANISMES),
    );
    print_counts("PAR CATÉGORIE DE DURÉE", &views::categorie_counts(selected));

    if let Some(b) = views::certification_breakdown(selected, mapping) {
        println!("\n--- CERTIFICATION ---");
        println!(
            "  Qualifiante seule: {}\n  Certifiante seule: {}\n  Les deux: {}\n  Aucune: {}",
            b.qualifiantes, b.certifiantes, b.les_deux, b.aucune
        );
    }

    match views::duration_stats(selected) {
        Some(stats) => println!(
            "\nDurée: moyenne {:.0} h, médiane {:.0} h ({} formations)",
            stats.mean, stats.median, stats.count
        ),
        None => println!("\nDurée: aucune donnée exploitable"),
    }

    let histogram = views::duration_histogram(selected, DURATION_BINS);
    if !histogram.is_empty() {
        println!("\n--- DISTRIBUTION DES DURÉES (h) ---");
        for bin in histogram.iter().filter(|b| b.count > 0) {
            println!("  {:>7.0} - {:<7.0} {}", bin.start, bin.end, bin.count);
        }
    }

    let by_province = views::durations_by_province(selected);
    if !by_province.is_empty() {
        println!("\n--- DURÉES PAR PROVINCE (h) ---");
        for (province, hours) in &by_province {
            // non vide, trié
            let (min, max) = (hours[0], hours[hours.len() - 1]);
            println!(
                "  {}: {} formation(s), min {}, médiane {}, max {}",
                province,
                hours.len(),
                min,
                hours[hours.len() / 2],
                max
            );
        }
    }

    let groups =
        views::organisme_categorie_counts(selected, mapping, ORGANISME_CATEGORIE_MIN_COUNT);
    if !groups.is_empty() {
        println!(
            "\n--- ORGANISME / CATÉGORIE (au moins {}) ---",
            ORGANISME_CATEGORIE_MIN_COUNT
        );
        for (organisme, categorie, count) in &groups {
            println!("  {} / {}: {}", organisme, categorie, count);
        }
    }

    let hierarchy = views::hierarchy(selected, mapping);
    if !hierarchy.is_empty() {
        println!("\n--- PROVINCE / ORGANISME / CATÉGORIE ---");
        for ((province, organisme, categorie), count) in hierarchy.iter().take(20) {
            println!("  {} / {} / {}: {}", province, organisme, categorie, count);
        }
        if hierarchy.len() > 20 {
            println!("  ... and {} more", hierarchy.len() - 20);
        }
    }
}

fn print_counts(title: &str, counts: &[(String, usize)]) {
    if counts.is_empty() {
        return;
    }
    println!("\n--- {} ---", title);
    for (value, count) in counts {
        println!("  {}: {}", value, count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args() {
        let args = FilterArgs {
            province: vec!["hainaut".to_string(), "Brabant wallon".to_string()],
            categorie: vec!["courte".to_string()],
            qualifiante: true,
            search: Some("python".to_string()),
            ..Default::default()
        };
        let filter = args.to_filter().unwrap();

        assert_eq!(filter.provinces, vec![Province::Hainaut, Province::BrabantWallon]);
        assert_eq!(filter.categories, vec![CategorieDuree::Courte]);
        assert!(filter.qualifiante_only);
        assert_eq!(filter.search, "python");
    }

    #[test]
    fn test_filter_args_unknown_province() {
        let args = FilterArgs {
            province: vec!["Anvers".to_string()],
            ..Default::default()
        };
        assert!(args.to_filter().is_err());
    }

    #[test]
    fn test_empty_filter_args() {
        assert!(FilterArgs::default().to_filter().unwrap().is_empty());
    }

    const CSV: &str = "intitule;type_organisme;localisation_potentielle;duree;courte;moyenne;longue\n\
Python;ASBL;Namur;3 jours;OUI;NON;NON\n";

    fn pipeline(input: PathBuf) -> Pipeline {
        Pipeline {
            sources: Sources {
                input,
                reference: None,
            },
            config: Config::from_preset("standard").unwrap(),
        }
    }

    #[test]
    fn test_reload_failure_keeps_previous_dataset() {
        let path = std::env::temp_dir().join("cadastre_formations_explore_garbage.csv");
        std::fs::write(&path, CSV).unwrap();
        let pipeline = pipeline(path.clone());
        let geo = GeoReference::none();
        let mut cache = TableCache::new();

        let first = keep_or_replace(None, pipeline.reload(&mut cache, &geo)).unwrap();
        assert_eq!(first.formations.len(), 1);

        // Plus de séparateur exploitable: le rechargement échoue
        std::fs::write(&path, "a;b\n1;2\n").unwrap();
        let reloaded = pipeline.reload(&mut cache, &geo);
        assert!(reloaded.is_err());
        let kept = keep_or_replace(Some(Arc::clone(&first)), reloaded).unwrap();
        assert!(Arc::ptr_eq(&kept, &first));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_first_load_failure_is_an_error() {
        let path = std::env::temp_dir().join("cadastre_formations_explore_missing.csv");
        std::fs::remove_file(&path).ok();
        let pipeline = pipeline(path);
        let mut cache = TableCache::new();

        let reloaded = pipeline.reload(&mut cache, &GeoReference::none());
        assert!(keep_or_replace(None, reloaded).is_err());
    }

    #[test]
    fn test_unreadable_source_invalidates_cache() {
        let path = std::env::temp_dir().join("cadastre_formations_explore_deleted.csv");
        std::fs::write(&path, CSV).unwrap();
        let pipeline = pipeline(path.clone());
        let geo = GeoReference::none();
        let mut cache = TableCache::new();

        pipeline.reload(&mut cache, &geo).unwrap();
        pipeline.reload(&mut cache, &geo).unwrap();
        assert_eq!((cache.hits(), cache.misses()), (1, 1));

        std::fs::remove_file(&path).unwrap();
        assert!(pipeline.reload(&mut cache, &geo).is_err());

        // Même contenu, mais l'entrée a été oubliée
        std::fs::write(&path, CSV).unwrap();
        pipeline.reload(&mut cache, &geo).unwrap();
        assert_eq!((cache.hits(), cache.misses()), (1, 2));

        std::fs::remove_file(&path).ok();
    }
}
