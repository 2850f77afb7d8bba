//! Extraction de la province depuis un texte de localisation

use crate::types::Province;

/// Communes connues -> province, parcourues dans cet ordre
pub const VILLES_PROVINCES: &[(&str, Province)] = &[
    ("Liège", Province::Liege),
    ("Verviers", Province::Liege),
    ("Huy", Province::Liege),
    ("Namur", Province::Namur),
    ("Dinant", Province::Namur),
    ("Gembloux", Province::Namur),
    ("Charleroi", Province::Hainaut),
    ("Mons", Province::Hainaut),
    ("Tournai", Province::Hainaut),
    ("Mouscron", Province::Hainaut),
    ("Arlon", Province::Luxembourg),
    ("Bastogne", Province::Luxembourg),
    ("Virton", Province::Luxembourg),
    ("Marche-en-Famenne", Province::Luxembourg),
    ("Wavre", Province::BrabantWallon),
    ("Nivelles", Province::BrabantWallon),
    ("Jodoigne", Province::BrabantWallon),
];

/// Devine la province d'un texte libre
///
/// Recherche de sous-chaîne insensible à la casse: d'abord les communes
/// connues, puis les noms de province. Pas de correspondance approchée.
pub fn extract_province(text: &str) -> Province {
    let loc = text.trim().to_lowercase();
    if loc.is_empty() {
        return Province::NonSpecifie;
    }

    VILLES_PROVINCES
        .iter()
        .find(|(ville, _)| loc.contains(&ville.to_lowercase()))
        .map(|&(_, province)| province)
        .or_else(|| {
            Province::ALL
                .into_iter()
                .find(|p| loc.contains(&p.name().to_lowercase()))
        })
        .unwrap_or(Province::NonSpecifie)
}
