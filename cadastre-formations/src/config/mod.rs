//! Configuration du système

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use formations::DurationScale;

/// Chemin par défaut du jeu de données principal
pub const DEFAULT_INPUT: &str = "data/formations_clean.csv";

/// Configuration principale
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Facteurs de conversion des durées
    #[serde(default)]
    pub durations: DurationConfig,
}

/// Facteurs de conversion vers les heures
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct DurationConfig {
    #[serde(default = "default_hours_per_year")]
    pub hours_per_year: u64,
    pub hours_per_month: u64,
    pub hours_per_week: u64,
    pub hours_per_day: u64,
}

fn default_hours_per_year() -> u64 {
    formations::parser::duration::HOURS_PER_YEAR
}

impl Default for DurationConfig {
    fn default() -> Self {
        let scale = DurationScale::STANDARD;
        Self {
            hours_per_year: scale.hours_per_year,
            hours_per_month: scale.hours_per_month,
            hours_per_week: scale.hours_per_week,
            hours_per_day: scale.hours_per_day,
        }
    }
}

impl From<DurationConfig> for DurationScale {
    fn from(c: DurationConfig) -> Self {
        DurationScale {
            hours_per_year: c.hours_per_year,
            hours_per_month: c.hours_per_month,
            hours_per_week: c.hours_per_week,
            hours_per_day: c.hours_per_day,
        }
    }
}

impl Config {
    /// Charge une configuration depuis un fichier
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        serde_json::from_str(&content).context("Failed to parse config JSON")
    }

    /// Charge une configuration depuis un preset embarqué
    pub fn from_preset(preset: &str) -> Result<Self> {
        match preset {
            "standard" => Self::load_embedded(include_str!("presets/standard.json")),
            "reduit" => Self::load_embedded(include_str!("presets/reduit.json")),
            _ => anyhow::bail!("Unknown preset: {}. Use: standard, reduit", preset),
        }
    }

    /// Preset embarqué ou chemin vers un fichier JSON
    pub fn from_spec(spec: &str) -> Result<Self> {
        match spec {
            "standard" | "reduit" => Self::from_preset(spec),
            _ => Self::load(Path::new(spec)),
        }
    }

    fn load_embedded(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse embedded config")
    }

    pub fn scale(&self) -> DurationScale {
        self.durations.into()
    }
}

/// Sources de données, depuis l'environnement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub input: PathBuf,
    pub reference: Option<PathBuf>,
}

impl Sources {
    /// `FORMATIONS_CSV` (défaut: `data/formations_clean.csv`) et
    /// `FORMATIONS_REFERENCE` (optionnel)
    pub fn from_env() -> Self {
        Self {
            input: std::env::var("FORMATIONS_CSV")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_INPUT)),
            reference: std::env::var("FORMATIONS_REFERENCE").ok().map(PathBuf::from),
        }
    }

    /// Les arguments de la ligne de commande priment sur l'environnement
    pub fn with_overrides(mut self, input: Option<PathBuf>, reference: Option<PathBuf>) -> Self {
        if let Some(input) = input {
            self.input = input;
        }
        if let Some(reference) = reference {
            self.reference = Some(reference);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(
            Config::from_preset("standard").unwrap().scale(),
            DurationScale::STANDARD
        );
        assert_eq!(
            Config::from_preset("reduit").unwrap().scale(),
            DurationScale::REDUIT
        );
        assert!(Config::from_preset("inconnu").is_err());
    }

    #[test]
    fn test_partial_json_defaults_year() {
        let config: Config = serde_json::from_str(
            r#"{"durations":{"hours_per_month":150,"hours_per_week":38,"hours_per_day":7}}"#,
        )
        .unwrap();
        let scale = config.scale();
        assert_eq!(scale.hours_per_year, 1000);
        assert_eq!(scale.hours_per_month, 150);
    }

    #[test]
    fn test_empty_json_is_standard() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.scale(), DurationScale::STANDARD);
    }

    #[test]
    fn test_overrides() {
        let sources = Sources {
            input: PathBuf::from(DEFAULT_INPUT),
            reference: None,
        }
        .with_overrides(Some(PathBuf::from("a.csv")), Some(PathBuf::from("ref.csv")));
        assert_eq!(sources.input, PathBuf::from("a.csv"));
        assert_eq!(sources.reference, Some(PathBuf::from("ref.csv")));
    }
}
