//! Rapport d'exécution du pipeline
//!
//! Collecte ce qui a été chargé, résolu et enrichi, et les conditions
//! récupérables rencontrées en chemin (champs absents, référentiel
//! indisponible, points inexploitables).

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use formations::{Dataset, EnrichOutcome};

/// État du référentiel géographique pour l'exécution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferenceStatus {
    /// Enrichissement sauté
    Skipped { reason: String },
    /// Enrichissement effectué
    Applied,
}

/// Rapport complet d'une exécution
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Source principale
    pub source: String,
    /// Séparateur détecté
    pub delimiter: String,
    /// Nombre de lignes chargées
    pub rows: usize,
    /// Nombre de colonnes
    pub columns: usize,
    /// Champs logiques introuvables dans la source
    pub missing_fields: Vec<String>,

    pub reference: ReferenceStatus,
    /// Formations trouvées dans le référentiel
    pub geo_matches: usize,
    /// Provinces complétées depuis le référentiel
    pub provinces_backfilled: usize,
    /// Points "lat,lon" inexploitables
    pub malformed_coordinates: usize,
    /// Durées sans nombre exploitable
    pub unparsed_durations: usize,

    /// Avertissements
    pub warnings: Vec<String>,
}

impl RunReport {
    /// Construit le rapport d'un jeu de données
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut report = Self {
            source: dataset.source_name.clone(),
            delimiter: delimiter_label(dataset.delimiter),
            rows: dataset.formations.len(),
            columns: dataset.columns.len(),
            missing_fields: dataset
                .mapping
                .missing()
                .iter()
                .map(|c| c.key().to_string())
                .collect(),
            reference: ReferenceStatus::Applied,
            geo_matches: 0,
            provinces_backfilled: 0,
            malformed_coordinates: 0,
            unparsed_durations: dataset.unparsed_durations,
            warnings: Vec::new(),
        };

        match &dataset.outcome {
            EnrichOutcome::Skipped { reason } => {
                report.reference = ReferenceStatus::Skipped {
                    reason: reason.clone(),
                };
                report.warn(format!("Enrichissement géographique sauté: {}", reason));
            }
            EnrichOutcome::Applied(stats) => {
                report.geo_matches = stats.matched;
                report.provinces_backfilled = stats.backfilled;
                report.malformed_coordinates = stats.malformed_coordinates;
                if stats.malformed_coordinates > 0 {
                    report.warn(format!(
                        "{} correspondance(s) sans coordonnées exploitables",
                        stats.malformed_coordinates
                    ));
                }
            }
        }

        if !report.missing_fields.is_empty() {
            report.warn(format!(
                "Champs absents: {}",
                report.missing_fields.join(", ")
            ));
        }

        report
    }

    /// Ajoute un avertissement
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Affiche le rapport sur la console
    pub fn display(&self) {
        println!("\n{}", "=".repeat(60));
        println!("RUN REPORT - {}", self.source);
        println!("{}", "=".repeat(60));

        println!("\n--- SOURCE ---");
        println!("Delimiter: {}", self.delimiter);
        println!("Rows: {}, columns: {}", self.rows, self.columns);

        println!("\n--- ENRICHMENT ---");
        match &self.reference {
            ReferenceStatus::Skipped { reason } => println!("Reference: skipped ({})", reason),
            ReferenceStatus::Applied => {
                println!("Reference: applied");
                println!(
                    "Matches: {}, provinces backfilled: {}, malformed coordinates: {}",
                    self.geo_matches, self.provinces_backfilled, self.malformed_coordinates
                );
            }
        }
        println!("Unparsed durations: {}", self.unparsed_durations);

        if !self.warnings.is_empty() {
            println!("\n--- WARNINGS ({}) ---", self.warnings.len());
            for w in self.warnings.iter().take(10) {
                println!("  {}", w);
            }
            if self.warnings.len() > 10 {
                println!("  ... and {} more", self.warnings.len() - 10);
            }
        }

        println!("\n{}", "=".repeat(60));
    }

    /// Sauvegarde le rapport en JSON
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Affichage compact
    pub fn summary(&self) -> String {
        match &self.reference {
            ReferenceStatus::Skipped { .. } => format!(
                "{}: {} rows, enrichment skipped, {} warnings",
                self.source,
                self.rows,
                self.warnings.len()
            ),
            ReferenceStatus::Applied => format!(
                "{}: {} rows, {} geo matches, {} backfilled, {} warnings",
                self.source,
                self.rows,
                self.geo_matches,
                self.provinces_backfilled,
                self.warnings.len()
            ),
        }
    }
}

fn delimiter_label(delimiter: u8) -> String {
    match delimiter {
        b'\t' => "\\t".to_string(),
        d => (d as char).to_string(),
    }
}
