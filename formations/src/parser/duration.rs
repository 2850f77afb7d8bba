//! Normalisation des durées en heures

use std::sync::LazyLock;

use regex::Regex;

/// 1 an ≈ 1000 heures (approximation)
pub const HOURS_PER_YEAR: u64 = 1000;
pub const HOURS_PER_MONTH: u64 = 160;
pub const HOURS_PER_WEEK: u64 = 40;
pub const HOURS_PER_DAY: u64 = 8;

static FIRST_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("static regex"));

/// Facteurs de conversion vers les heures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationScale {
    pub hours_per_year: u64,
    pub hours_per_month: u64,
    pub hours_per_week: u64,
    pub hours_per_day: u64,
}

impl DurationScale {
    /// Jeu canonique: 1000 / 160 / 40 / 8
    pub const STANDARD: DurationScale = DurationScale {
        hours_per_year: HOURS_PER_YEAR,
        hours_per_month: HOURS_PER_MONTH,
        hours_per_week: HOURS_PER_WEEK,
        hours_per_day: HOURS_PER_DAY,
    };

    /// Variante observée en parallèle: 1000 / 120 / 35 / 7
    pub const REDUIT: DurationScale = DurationScale {
        hours_per_year: HOURS_PER_YEAR,
        hours_per_month: 120,
        hours_per_week: 35,
        hours_per_day: 7,
    };

    /// Facteur d'unité détecté dans un texte déjà en minuscules
    ///
    /// L'ordre compte: "heure" contient "h", "journée" contient "jour".
    fn factor_for(&self, text: &str) -> u64 {
        if text.contains("année") || text.contains("an") {
            self.hours_per_year
        } else if text.contains("mois") {
            self.hours_per_month
        } else if text.contains("semaine") {
            self.hours_per_week
        } else if text.contains("jour") || text.contains("journée") {
            self.hours_per_day
        } else {
            // "heure", "h" ou pas d'unité: déjà en heures
            1
        }
    }
}

impl Default for DurationScale {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Convertit un texte de durée en heures
///
/// Seul le premier nombre est retenu: "2 à 3 jours" vaut 2 jours.
/// Retourne `None` pour un texte vide, sans chiffre, ou dont la valeur
/// dépasse la capacité d'un `u64`.
pub fn parse_duration(text: &str, scale: &DurationScale) -> Option<u64> {
    let lowered = text.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let number: u64 = FIRST_NUMBER.find(&lowered)?.as_str().parse().ok()?;
    number.checked_mul(scale.factor_for(&lowered))
}
