//! Types d'erreurs pour le crate formations

use thiserror::Error;

/// Erreurs fatales pouvant survenir lors du chargement d'une source
///
/// Les anomalies ligne à ligne (durée illisible, coordonnées malformées,
/// référentiel absent) ne sont jamais des erreurs: elles se traduisent par
/// des valeurs absentes ou par un enrichissement sauté.
#[derive(Debug, Error)]
pub enum FormationsError {
    /// Erreur d'I/O lors de la lecture d'une source
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Aucun séparateur candidat ne donne une structure tabulaire exploitable
    #[error("Parse error in {source_name}: {reason}")]
    Parse { source_name: String, reason: String },

    /// Source principale non décodable en UTF-8
    #[error("Invalid encoding in {source_name}: {reason}")]
    Encoding { source_name: String, reason: String },
}

impl FormationsError {
    /// Crée une erreur de parsing avec contexte
    pub fn parse_error(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Aucun séparateur ne produit plus de colonnes que le minimum requis
    pub fn unrecognized_structure(source_name: impl Into<String>) -> Self {
        Self::parse_error(source_name, "source has unrecognized tabular structure")
    }

    /// Crée une erreur d'encodage avec contexte
    pub fn encoding_error(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encoding {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unrecognized_structure_message() {
        let err = FormationsError::unrecognized_structure("formations.csv");
        assert_eq!(
            err.to_string(),
            "Parse error in formations.csv: source has unrecognized tabular structure"
        );
    }
}
