//! Application des parsers de champs, colonne par colonne

use tracing::debug;

use crate::mapping::{Concept, FieldMapping};
use crate::parser::{extract_province, parse_duration, DurationScale};
use crate::types::{CategorieDuree, Formation, RawRecord, Table};

/// Construit les formations normalisées depuis la table principale
///
/// Chaque attribut calculé n'existe que si ses champs sources sont mappés:
/// sans `localisation` pas de province, sans `duree` pas d'heures, sans les
/// trois drapeaux de durée pas de catégorie.
pub fn build_formations(
    table: &Table,
    mapping: &FieldMapping,
    scale: &DurationScale,
) -> Vec<Formation> {
    let with_category = [Concept::Courte, Concept::Moyenne, Concept::Longue]
        .into_iter()
        .all(|c| mapping.has(c));

    let formations: Vec<Formation> = table
        .rows
        .iter()
        .map(|record| build_formation(record, mapping, scale, with_category))
        .collect();

    debug!(
        rows = formations.len(),
        with_category,
        with_province = mapping.has(Concept::Localisation),
        with_duration = mapping.has(Concept::Duree),
        "Formations normalisées"
    );

    formations
}

fn build_formation(
    record: &RawRecord,
    mapping: &FieldMapping,
    scale: &DurationScale,
    with_category: bool,
) -> Formation {
    let localisation = mapping
        .value(record, Concept::Localisation)
        .map(str::to_string);

    let province_extraite = mapping
        .has(Concept::Localisation)
        .then(|| extract_province(localisation.as_deref().unwrap_or("")));

    let duree_heures = mapping
        .value(record, Concept::Duree)
        .and_then(|text| parse_duration(text, scale));

    let categorie_duree = with_category.then(|| categorie_from_flags(record, mapping));

    Formation {
        record: record.clone(),
        localisation,
        province_extraite,
        province: province_extraite,
        duree_heures,
        categorie_duree,
        ville: None,
        arrondissement: None,
        coordinates: None,
    }
}

/// Premier drapeau à "OUI" parmi courte, moyenne, longue
fn categorie_from_flags(record: &RawRecord, mapping: &FieldMapping) -> CategorieDuree {
    let is_set = |c| mapping.flag(record, c) == Some(true);

    if is_set(Concept::Courte) {
        CategorieDuree::Courte
    } else if is_set(Concept::Moyenne) {
        CategorieDuree::Moyenne
    } else if is_set(Concept::Longue) {
        CategorieDuree::Longue
    } else {
        CategorieDuree::NonSpecifie
    }
}
