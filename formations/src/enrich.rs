//! Jointure des formations avec l'index géographique

use tracing::{debug, info};

use crate::geo::{GeoEntry, GeoIndex, GeoReference};
use crate::types::{Coordinates, Formation, Province};

/// Compteurs d'un enrichissement effectué
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    /// Formations dont la localisation est trouvée dans l'index
    pub matched: usize,
    /// Provinces complétées depuis le référentiel
    pub backfilled: usize,
    /// Correspondances dont le point "lat,lon" est inexploitable
    pub malformed_coordinates: usize,
}

/// Issue de l'étape d'enrichissement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrichOutcome {
    /// Référentiel indisponible: la table est passée telle quelle
    Skipped { reason: String },
    /// Jointure effectuée (éventuellement sans aucune correspondance)
    Applied(EnrichStats),
}

/// Formations enrichies et issue de l'étape
#[derive(Debug, Clone)]
pub struct Enriched {
    pub formations: Vec<Formation>,
    pub outcome: EnrichOutcome,
}

/// Enrichit les formations avec le référentiel géographique
///
/// Fonction pure: ni les formations d'entrée ni l'index ne sont modifiés.
/// La province extraite du texte n'est jamais remplacée par celle du
/// référentiel; seule une province absente ou "Non spécifié" est complétée.
/// Appliquée deux fois avec le même référentiel, elle donne le même résultat.
pub fn enrich(formations: &[Formation], reference: &GeoReference) -> Enriched {
    let index = match reference {
        GeoReference::Available(index) => index,
        GeoReference::Unavailable { reason } => {
            info!(reason = %reason, "Enrichissement géographique sauté");
            return Enriched {
                formations: formations.to_vec(),
                outcome: EnrichOutcome::Skipped {
                    reason: reason.clone(),
                },
            };
        }
    };

    let mut stats = EnrichStats::default();
    let enriched = formations
        .iter()
        .map(|f| enrich_one(f, index, &mut stats))
        .collect();

    info!(
        matched = stats.matched,
        backfilled = stats.backfilled,
        malformed_coordinates = stats.malformed_coordinates,
        "Enrichissement géographique terminé"
    );

    Enriched {
        formations: enriched,
        outcome: EnrichOutcome::Applied(stats),
    }
}

fn enrich_one(formation: &Formation, index: &GeoIndex, stats: &mut EnrichStats) -> Formation {
    let mut out = formation.clone();

    let Some(entry) = formation
        .localisation
        .as_deref()
        .and_then(|loc| index.lookup(loc))
    else {
        return out;
    };

    stats.matched += 1;
    apply_entry(&mut out, entry, stats);
    out
}

fn apply_entry(out: &mut Formation, entry: &GeoEntry, stats: &mut EnrichStats) {
    out.ville = Some(entry.municipality.clone());
    out.arrondissement = entry.arrondissement.clone();

    out.coordinates = entry.geo_point.as_deref().and_then(parse_geo_point);
    if out.coordinates.is_none() {
        debug!(ville = %entry.municipality, point = ?entry.geo_point, "Point géographique inexploitable");
        stats.malformed_coordinates += 1;
    }

    let resolved = out.province_extraite.is_some_and(|p| p.is_specified());
    if resolved {
        return;
    }

    if let Some(province) = entry.province.as_deref().and_then(Province::from_name) {
        out.province = Some(province);
        stats.backfilled += 1;
    }
}

/// Parse un point composite "lat,lon"
///
/// Exactement deux parties numériques finies séparées par une virgule;
/// sinon `None` (jamais d'assignation partielle).
pub fn parse_geo_point(text: &str) -> Option<Coordinates> {
    let mut parts = text.split(',');
    let (lat, lon) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let latitude: f64 = fast_float::parse(lat.trim()).ok()?;
    let longitude: f64 = fast_float::parse(lon.trim()).ok()?;
    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }

    Some(Coordinates {
        latitude,
        longitude,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{
        ARRONDISSEMENT_FIELD, GEO_POINT_FIELD, MUNICIPALITY_FIELD, PROVINCE_FIELD,
    };
    use crate::types::{RawRecord, Table};

    fn formation(localisation: &str, province: Province) -> Formation {
        Formation {
            record: RawRecord::default(),
            localisation: Some(localisation.to_string()),
            province_extraite: Some(province),
            province: Some(province),
            duree_heures: None,
            categorie_duree: None,
            ville: None,
            arrondissement: None,
            coordinates: None,
        }
    }

    fn reference(rows: &[(&str, &str, &str, &str)]) -> GeoReference {
        let table = Table {
            columns: vec![
                MUNICIPALITY_FIELD.into(),
                ARRONDISSEMENT_FIELD.into(),
                PROVINCE_FIELD.into(),
                GEO_POINT_FIELD.into(),
            ],
            rows: rows
                .iter()
                .map(|&(m, a, p, g)| {
                    [
                        (MUNICIPALITY_FIELD, m),
                        (ARRONDISSEMENT_FIELD, a),
                        (PROVINCE_FIELD, p),
                        (GEO_POINT_FIELD, g),
                    ]
                    .into_iter()
                    .collect::<RawRecord>()
                })
                .collect(),
        };
        GeoReference::Available(GeoIndex::build(&table))
    }

    #[test]
    fn test_parse_geo_point() {
        assert_eq!(
            parse_geo_point("50.4108, 4.4446"),
            Some(Coordinates {
                latitude: 50.4108,
                longitude: 4.4446
            })
        );
        assert_eq!(parse_geo_point("50.4108"), None);
        assert_eq!(parse_geo_point("50.4,4.4,1"), None);
        assert_eq!(parse_geo_point("abc,4.4"), None);
        assert_eq!(parse_geo_point("50.4,"), None);
        assert_eq!(parse_geo_point(""), None);
        assert_eq!(parse_geo_point("inf,4.4"), None);
    }

    #[test]
    fn test_local_province_wins() {
        let reference = reference(&[("Fleurus", "Charleroi", "Namur", "50.48,4.55")]);
        let result = enrich(&[formation("Fleurus", Province::Hainaut)], &reference);

        let f = &result.formations[0];
        assert_eq!(f.province, Some(Province::Hainaut));
        assert_eq!(f.ville.as_deref(), Some("Fleurus"));
        assert_eq!(f.arrondissement.as_deref(), Some("Charleroi"));
        assert_eq!(f.latitude(), Some(50.48));
        assert_eq!(f.longitude(), Some(4.55));
    }

    #[test]
    fn test_sentinel_backfilled() {
        let reference = reference(&[("Seraing", "Liège", "Liège", "50.58,5.50")]);
        let result = enrich(&[formation("seraing", Province::NonSpecifie)], &reference);

        assert_eq!(result.formations[0].province, Some(Province::Liege));
        assert_eq!(
            result.outcome,
            EnrichOutcome::Applied(EnrichStats {
                matched: 1,
                backfilled: 1,
                malformed_coordinates: 0,
            })
        );
        // Le texte d'origine reste la province extraite
        assert_eq!(result.formations[0].province_extraite, Some(Province::NonSpecifie));
    }

    #[test]
    fn test_absent_province_backfilled() {
        let reference = reference(&[("Seraing", "Liège", "Liège", "50.58,5.50")]);
        let mut f = formation("Seraing", Province::NonSpecifie);
        f.province_extraite = None;
        f.province = None;
        let result = enrich(&[f], &reference);
        assert_eq!(result.formations[0].province, Some(Province::Liege));
    }

    #[test]
    fn test_foreign_province_not_backfilled() {
        let reference = reference(&[("Anvers", "Anvers", "Anvers", "51.2,4.4")]);
        let result = enrich(&[formation("Anvers", Province::NonSpecifie)], &reference);
        assert_eq!(result.formations[0].province, Some(Province::NonSpecifie));
        assert_eq!(result.formations[0].ville.as_deref(), Some("Anvers"));
    }

    #[test]
    fn test_malformed_point_leaves_coordinates_absent() {
        let reference = reference(&[("Namur", "Namur", "Namur", "50.46;4.86")]);
        let result = enrich(&[formation("Namur", Province::Namur)], &reference);

        let f = &result.formations[0];
        assert_eq!(f.ville.as_deref(), Some("Namur"));
        assert!(f.coordinates.is_none());
        match result.outcome {
            EnrichOutcome::Applied(stats) => assert_eq!(stats.malformed_coordinates, 1),
            other => panic!("Expected Applied, got {:?}", other),
        }
    }

    #[test]
    fn test_miss_keeps_original() {
        let reference = reference(&[("Namur", "Namur", "Namur", "50.46,4.86")]);
        let input = [formation("Bruxelles", Province::NonSpecifie)];
        let result = enrich(&input, &reference);
        assert_eq!(result.formations[0], input[0]);
    }

    #[test]
    fn test_idempotent() {
        let reference = reference(&[
            ("Seraing", "Liège", "Liège", "50.58,5.50"),
            ("Fleurus", "Charleroi", "Hainaut", "50.48,4.55"),
        ]);
        let input = [
            formation("Seraing", Province::NonSpecifie),
            formation("Fleurus", Province::Namur),
            formation("Bruxelles", Province::NonSpecifie),
        ];

        let once = enrich(&input, &reference);
        let twice = enrich(&once.formations, &reference);
        assert_eq!(once.formations, twice.formations);
    }

    #[test]
    fn test_unavailable_reference_passes_through() {
        let input = [formation("Namur", Province::Namur)];
        let result = enrich(&input, &GeoReference::none());

        assert_eq!(result.formations, input.to_vec());
        assert!(matches!(result.outcome, EnrichOutcome::Skipped { .. }));
    }

    #[test]
    fn test_applied_without_match_differs_from_skipped() {
        let reference = reference(&[("Namur", "Namur", "Namur", "50.46,4.86")]);
        let result = enrich(&[formation("Arlon", Province::Luxembourg)], &reference);
        assert_eq!(result.outcome, EnrichOutcome::Applied(EnrichStats::default()));
    }
}
