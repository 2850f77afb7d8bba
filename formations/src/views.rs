//! Vues en lecture seule pour la couche de présentation
//!
//! Filtres, comptages groupés et statistiques calculés sur une table
//! enrichie. Aucune vue ne modifie les formations.

use std::collections::{BTreeMap, BTreeSet};

use crate::mapping::{Concept, FieldMapping};
use crate::types::{CategorieDuree, Formation, Province};

/// Nombre d'organismes retenus dans le classement
pub const TOP_ORGANISMES: usize = 15;

/// Sélections de filtrage (conjonction de toutes les contraintes)
///
/// Une sélection vide ne contraint rien; une contrainte portant sur un
/// champ logique non mappé est ignorée.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub provinces: Vec<Province>,
    pub organismes: Vec<String>,
    pub categories: Vec<CategorieDuree>,
    pub qualifiante_only: bool,
    pub certifiante_only: bool,
    pub search: String,
}

impl Filter {
    pub fn is_empty(&self) -> bool {
        *self == Filter::default()
    }

    pub fn matches(&self, formation: &Formation, mapping: &FieldMapping) -> bool {
        let record = &formation.record;

        if !self.provinces.is_empty() && mapping.has(Concept::Localisation) {
            match formation.province {
                Some(p) if self.provinces.contains(&p) => {}
                _ => return false,
            }
        }

        if !self.organismes.is_empty() && mapping.has(Concept::Organisme) {
            match mapping.value(record, Concept::Organisme) {
                Some(o) if self.organismes.iter().any(|s| s == o) => {}
                _ => return false,
            }
        }

        if !self.categories.is_empty() {
            if let Some(categorie) = formation.categorie_duree {
                if !self.categories.contains(&categorie) {
                    return false;
                }
            }
        }

        if self.qualifiante_only
            && mapping.has(Concept::Qualifiante)
            && mapping.flag(record, Concept::Qualifiante) != Some(true)
        {
            return false;
        }

        if self.certifiante_only
            && mapping.has(Concept::Certifiante)
            && mapping.flag(record, Concept::Certifiante) != Some(true)
        {
            return false;
        }

        let query = self.search.trim();
        if !query.is_empty() && mapping.has(Concept::Intitule) {
            let intitule = mapping.value(record, Concept::Intitule).unwrap_or("");
            if !intitule.to_lowercase().contains(&query.to_lowercase()) {
                return false;
            }
        }

        true
    }
}

/// Applique un filtre; l'ordre des formations est conservé
pub fn apply<'a>(
    formations: &'a [Formation],
    filter: &Filter,
    mapping: &FieldMapping,
) -> Vec<&'a Formation> {
    formations
        .iter()
        .filter(|f| filter.matches(f, mapping))
        .collect()
}

/// Provinces présentes, triées, sans la sentinelle
pub fn province_options(formations: &[&Formation]) -> Vec<Province> {
    formations
        .iter()
        .filter_map(|f| f.province)
        .filter(Province::is_specified)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Comptage par valeur, trié par effectif décroissant puis valeur
pub fn count_by<F>(formations: &[&Formation], key: F) -> Vec<(String, usize)>
where
    F: Fn(&Formation) -> Option<String>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for formation in formations {
        if let Some(k) = key(*formation) {
            *counts.entry(k).or_default() += 1;
        }
    }

    let mut sorted: Vec<(String, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    sorted
}

/// Formations par province (sentinelle exclue)
pub fn province_counts(formations: &[&Formation]) -> Vec<(String, usize)> {
    count_by(formations, |f| {
        f.province
            .filter(Province::is_specified)
            .map(|p| p.name().to_string())
    })
}

/// Organismes les plus représentés
pub fn organisme_counts(
    formations: &[&Formation],
    mapping: &FieldMapping,
    limit: usize,
) -> Vec<(String, usize)> {
    let mut counts = count_by(formations, |f| {
        mapping
            .value(&f.record, Concept::Organisme)
            .map(str::to_string)
    });
    counts.truncate(limit);
    counts
}

pub fn categorie_counts(formations: &[&Formation]) -> Vec<(String, usize)> {
    count_by(formations, |f| f.categorie_duree.map(|c| c.label().to_string()))
}

/// Indicateurs principaux
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub formations: usize,
    pub organismes: Option<usize>,
    pub qualifiantes: usize,
    pub certifiantes: usize,
    pub provinces: Option<usize>,
}

pub fn summary(formations: &[&Formation], mapping: &FieldMapping) -> Summary {
    let count_flag = |concept| {
        formations
            .iter()
            .filter(|f| mapping.flag(&f.record, concept) == Some(true))
            .count()
    };

    let organismes = mapping.has(Concept::Organisme).then(|| {
        formations
            .iter()
            .filter_map(|f| mapping.value(&f.record, Concept::Organisme))
            .collect::<BTreeSet<_>>()
            .len()
    });

    let provinces = mapping.has(Concept::Localisation).then(|| {
        formations
            .iter()
            .filter_map(|f| f.province)
            .collect::<BTreeSet<_>>()
            .len()
    });

    Summary {
        formations: formations.len(),
        organismes,
        qualifiantes: count_flag(Concept::Qualifiante),
        certifiantes: count_flag(Concept::Certifiante),
        provinces,
    }
}

/// Répartition qualifiante / certifiante
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CertificationBreakdown {
    pub qualifiantes: usize,
    pub certifiantes: usize,
    pub les_deux: usize,
    pub aucune: usize,
}

/// `None` si l'un des deux drapeaux n'est pas mappé
pub fn certification_breakdown(
    formations: &[&Formation],
    mapping: &FieldMapping,
) -> Option<CertificationBreakdown> {
    if !mapping.has(Concept::Qualifiante) || !mapping.has(Concept::Certifiante) {
        return None;
    }

    let mut breakdown = CertificationBreakdown::default();
    for f in formations {
        let q = mapping.flag(&f.record, Concept::Qualifiante);
        let c = mapping.flag(&f.record, Concept::Certifiante);
        match (q, c) {
            (Some(true), Some(false)) => breakdown.qualifiantes += 1,
            (Some(false), Some(true)) => breakdown.certifiantes += 1,
            (Some(true), Some(true)) => breakdown.les_deux += 1,
            (Some(false), Some(false)) => breakdown.aucune += 1,
            _ => {}
        }
    }
    Some(breakdown)
}

/// Moyenne et médiane des durées connues
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
}

pub fn duration_stats(formations: &[&Formation]) -> Option<DurationStats> {
    let mut hours: Vec<u64> = formations.iter().filter_map(|f| f.duree_heures).collect();
    if hours.is_empty() {
        return None;
    }
    hours.sort_unstable();

    let count = hours.len();
    let mean = hours.iter().map(|&h| h as f64).sum::<f64>() / count as f64;
    let median = if count % 2 == 1 {
        hours[count / 2] as f64
    } else {
        (hours[count / 2 - 1] as f64 + hours[count / 2] as f64) / 2.0
    };

    Some(DurationStats {
        count,
        mean,
        median,
    })
}

/// Effectifs par (province, organisme, catégorie de durée)
///
/// Seules les lignes avec province spécifiée, organisme et catégorie
/// présents sont comptées.
pub fn hierarchy(
    formations: &[&Formation],
    mapping: &FieldMapping,
) -> BTreeMap<(Province, String, CategorieDuree), usize> {
    let mut counts = BTreeMap::new();
    for f in formations {
        let Some(province) = f.province.filter(Province::is_specified) else {
            continue;
        };
        let Some(organisme) = mapping.value(&f.record, Concept::Organisme) else {
            continue;
        };
        let Some(categorie) = f.categorie_duree else {
            continue;
        };
        *counts
            .entry((province, organisme.to_string(), categorie))
            .or_insert(0) += 1;
    }
    counts
}

/// Taille minimale d'un groupe (organisme, catégorie) pour la vue en tuiles
pub const ORGANISME_CATEGORIE_MIN_COUNT: usize = 3;

/// Nombre de classes de l'histogramme des durées
pub const DURATION_BINS: usize = 30;

/// Effectifs par (organisme, catégorie de durée)
///
/// Seuls les groupes d'au moins `min_count` formations sont gardés. Tri par
/// effectif décroissant, puis par organisme et catégorie à égalité.
pub fn organisme_categorie_counts(
    formations: &[&Formation],
    mapping: &FieldMapping,
    min_count: usize,
) -> Vec<(String, CategorieDuree, usize)> {
    let mut counts: BTreeMap<(String, CategorieDuree), usize> = BTreeMap::new();
    for f in formations {
        let (Some(organisme), Some(categorie)) = (
            mapping.value(&f.record, Concept::Organisme),
            f.categorie_duree,
        ) else {
            continue;
        };
        *counts.entry((organisme.to_string(), categorie)).or_default() += 1;
    }

    let mut groups: Vec<(String, CategorieDuree, usize)> = counts
        .into_iter()
        .filter(|(_, count)| *count >= min_count)
        .map(|((organisme, categorie), count)| (organisme, categorie, count))
        .collect();
    groups.sort_by(|a, b| b.2.cmp(&a.2));
    groups
}

/// Durées strictement positives, triées
fn positive_durations<'a, I>(formations: I) -> Vec<u64>
where
    I: IntoIterator<Item = &'a Formation>,
{
    let mut hours: Vec<u64> = formations
        .into_iter()
        .filter_map(|f| f.duree_heures)
        .filter(|&h| h > 0)
        .collect();
    hours.sort_unstable();
    hours
}

/// Une classe d'histogramme `[start, end)`; la dernière inclut `end`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Histogramme des durées > 0 en `bins` classes de même largeur
///
/// Vide si aucune durée positive. Une seule classe si toutes les durées
/// sont égales.
pub fn duration_histogram(formations: &[&Formation], bins: usize) -> Vec<HistogramBin> {
    let hours = positive_durations(formations.iter().copied());
    let (Some(&min), Some(&max)) = (hours.first(), hours.last()) else {
        return Vec::new();
    };
    if bins == 0 {
        return Vec::new();
    }

    let (min, max) = (min as f64, max as f64);
    if max == min {
        return vec![HistogramBin {
            start: min,
            end: max,
            count: hours.len(),
        }];
    }

    let width = (max - min) / bins as f64;
    let mut histogram: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();
    for h in hours {
        let i = (((h as f64 - min) / width) as usize).min(bins - 1);
        histogram[i].count += 1;
    }
    histogram
}

/// Durées > 0 par province spécifiée, triées
pub fn durations_by_province(formations: &[&Formation]) -> BTreeMap<Province, Vec<u64>> {
    let mut by_province: BTreeMap<Province, Vec<&Formation>> = BTreeMap::new();
    for f in formations {
        if let Some(province) = f.province.filter(Province::is_specified) {
            by_province.entry(province).or_default().push(f);
        }
    }

    by_province
        .into_iter()
        .map(|(province, rows)| (province, positive_durations(rows)))
        .filter(|(_, hours)| !hours.is_empty())
        .collect()
}

/// Colonne affichable: colonne source ou attribut calculé
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Column {
    Source(String),
    Province,
    CategorieDuree,
    DureeHeures,
    Ville,
    Arrondissement,
    Latitude,
    Longitude,
}

impl Column {
    pub fn header(&self) -> &str {
        match self {
            Column::Source(name) => name,
            Column::Province => "province",
            Column::CategorieDuree => "categorie_duree",
            Column::DureeHeures => "duree_heures",
            Column::Ville => "ville",
            Column::Arrondissement => "arrondissement",
            Column::Latitude => "latitude",
            Column::Longitude => "longitude",
        }
    }

    /// Valeur texte pour une formation; `None` si absente
    pub fn value(&self, formation: &Formation) -> Option<String> {
        match self {
            Column::Source(name) => formation.record.get(name).map(str::to_string),
            Column::Province => formation.province.map(|p| p.name().to_string()),
            Column::CategorieDuree => formation.categorie_duree.map(|c| c.label().to_string()),
            Column::DureeHeures => formation.duree_heures.map(|h| h.to_string()),
            Column::Ville => formation.ville.clone(),
            Column::Arrondissement => formation.arrondissement.clone(),
            Column::Latitude => formation.latitude().map(|v| v.to_string()),
            Column::Longitude => formation.longitude().map(|v| v.to_string()),
        }
    }
}

/// Colonnes enrichies ajoutables à l'export
pub const ENRICHED_COLUMNS: [Column; 5] = [
    Column::DureeHeures,
    Column::Ville,
    Column::Arrondissement,
    Column::Latitude,
    Column::Longitude,
];

/// Ajoute les colonnes enrichies qui ne sont pas déjà présentes
pub fn with_enriched(mut columns: Vec<Column>) -> Vec<Column> {
    for column in ENRICHED_COLUMNS {
        if !columns.iter().any(|c| c.header() == column.header()) {
            columns.push(column);
        }
    }
    columns
}

/// Colonnes affichées dans le tableau, dans l'ordre de présentation
///
/// Chaque colonne n'apparaît qu'une fois; si aucune ne se résout, toutes
/// les colonnes de la table sont affichées.
pub fn display_columns(mapping: &FieldMapping, table_columns: &[String]) -> Vec<Column> {
    let has_category = [Concept::Courte, Concept::Moyenne, Concept::Longue]
        .into_iter()
        .all(|c| mapping.has(c));

    let candidates = [
        source(mapping, Concept::Intitule),
        source(mapping, Concept::Organisme),
        source(mapping, Concept::Denomination),
        mapping.has(Concept::Localisation).then_some(Column::Province),
        source(mapping, Concept::Localisation),
        has_category.then_some(Column::CategorieDuree),
        source(mapping, Concept::Duree),
        source(mapping, Concept::Qualifiante),
        source(mapping, Concept::Certifiante),
        source(mapping, Concept::Public),
    ];

    let mut columns: Vec<Column> = Vec::new();
    for column in candidates.into_iter().flatten() {
        if !columns.iter().any(|c| c.header() == column.header()) {
            columns.push(column);
        }
    }

    if columns.is_empty() {
        return table_columns.iter().cloned().map(Column::Source).collect();
    }
    columns
}

fn source(mapping: &FieldMapping, concept: Concept) -> Option<Column> {
    mapping
        .column(concept)
        .map(|name| Column::Source(name.to_string()))
}
