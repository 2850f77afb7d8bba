//! Session d'exploration interactive
//!
//! Le contexte de session est une valeur explicite: chaque commande produit
//! une nouvelle session, sans état global.

use std::path::PathBuf;

use thiserror::Error;

use formations::views::Filter;
use formations::{CategorieDuree, Province};

/// Contexte d'une interaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub filter: Filter,
}

/// Commande saisie par l'utilisateur
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ajoute ou retire une province de la sélection
    Province(Province),
    /// Ajoute ou retire un organisme de la sélection
    Organisme(String),
    /// Ajoute ou retire une catégorie de durée
    Categorie(CategorieDuree),
    /// Bascule "qualifiantes uniquement"
    Qualifiante,
    /// Bascule "certifiantes uniquement"
    Certifiante,
    /// Recherche dans l'intitulé (vide = pas de recherche)
    Search(String),
    Reset,
    Stats,
    /// Exporte la sélection; `enriched` ajoute les colonnes calculées
    Export { path: PathBuf, enriched: bool },
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Commande vide")]
    Empty,

    #[error("Commande inconnue: {0}")]
    Unknown(String),

    #[error("Argument manquant pour '{0}'")]
    MissingArgument(&'static str),

    #[error("Province inconnue: {0}")]
    UnknownProvince(String),

    #[error("Catégorie inconnue: {0} (Courte, Moyenne, Longue, Non spécifié)")]
    UnknownCategorie(String),
}

impl Command {
    /// Parse une ligne saisie
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        match verb.to_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "province" => {
                let name = required(arg, "province")?;
                Province::from_name(name)
                    .map(Command::Province)
                    .ok_or_else(|| CommandError::UnknownProvince(name.to_string()))
            }
            "organisme" => Ok(Command::Organisme(required(arg, "organisme")?.to_string())),
            "categorie" => {
                let label = required(arg, "categorie")?;
                CategorieDuree::from_label(label)
                    .map(Command::Categorie)
                    .ok_or_else(|| CommandError::UnknownCategorie(label.to_string()))
            }
            "qualifiante" => Ok(Command::Qualifiante),
            "certifiante" => Ok(Command::Certifiante),
            "search" => Ok(Command::Search(arg.to_string())),
            "reset" => Ok(Command::Reset),
            "stats" => Ok(Command::Stats),
            "export" => {
                let (enriched, path) = match arg.strip_prefix("--enriched") {
                    Some(rest) => (true, rest.trim()),
                    None => (false, arg),
                };
                Ok(Command::Export {
                    path: PathBuf::from(required(path, "export")?),
                    enriched,
                })
            }
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn required<'a>(arg: &'a str, verb: &'static str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::MissingArgument(verb))
    } else {
        Ok(arg)
    }
}

fn toggle<T: PartialEq + Clone>(selection: &mut Vec<T>, value: &T) {
    if let Some(pos) = selection.iter().position(|v| v == value) {
        selection.remove(pos);
    } else {
        selection.push(value.clone());
    }
}

/// Applique une commande et retourne la session suivante
///
/// `stats`, `export` et `quit` ne modifient pas le contexte.
pub fn apply_command(session: &Session, command: &Command) -> Session {
    let mut next = session.clone();
    let filter = &mut next.filter;

    match command {
        Command::Province(p) => toggle(&mut filter.provinces, p),
        Command::Organisme(o) => toggle(&mut filter.organismes, o),
        Command::Categorie(c) => toggle(&mut filter.categories, c),
        Command::Qualifiante => filter.qualifiante_only = !filter.qualifiante_only,
        Command::Certifiante => filter.certifiante_only = !filter.certifiante_only,
        Command::Search(text) => filter.search = text.clone(),
        Command::Reset => *filter = Filter::default(),
        Command::Stats | Command::Export { .. } | Command::Quit => {}
    }

    next
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("province liège"),
            Ok(Command::Province(Province::Liege))
        );
        assert_eq!(
            Command::parse("  organisme  Centre de compétence  "),
            Ok(Command::Organisme("Centre de compétence".to_string()))
        );
        assert_eq!(
            Command::parse("categorie non spécifié"),
            Ok(Command::Categorie(CategorieDuree::NonSpecifie))
        );
        assert_eq!(Command::parse("QUALIFIANTE"), Ok(Command::Qualifiante));
        assert_eq!(Command::parse("search"), Ok(Command::Search(String::new())));
        assert_eq!(
            Command::parse("export out.csv"),
            Ok(Command::Export {
                path: PathBuf::from("out.csv"),
                enriched: false
            })
        );
        assert_eq!(
            Command::parse("export --enriched carte.csv"),
            Ok(Command::Export {
                path: PathBuf::from("carte.csv"),
                enriched: true
            })
        );
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(Command::parse("   "), Err(CommandError::Empty));
        assert_eq!(
            Command::parse("province Anvers"),
            Err(CommandError::UnknownProvince("Anvers".to_string()))
        );
        assert_eq!(
            Command::parse("province"),
            Err(CommandError::MissingArgument("province"))
        );
        assert_eq!(
            Command::parse("categorie"),
            Err(CommandError::MissingArgument("categorie"))
        );
        assert_eq!(
            Command::parse("export --enriched"),
            Err(CommandError::MissingArgument("export"))
        );
        assert!(matches!(
            Command::parse("frobnicate"),
            Err(CommandError::Unknown(_))
        ));
    }

    #[test]
    fn test_toggle_selection() {
        let s0 = Session::default();
        let s1 = apply_command(&s0, &Command::Province(Province::Namur));
        let s2 = apply_command(&s1, &Command::Province(Province::Hainaut));
        assert_eq!(s2.filter.provinces, vec![Province::Namur, Province::Hainaut]);

        let s3 = apply_command(&s2, &Command::Province(Province::Namur));
        assert_eq!(s3.filter.provinces, vec![Province::Hainaut]);

        // La session d'origine n'est pas modifiée
        assert!(s0.filter.is_empty());
    }

    #[test]
    fn test_flags_and_search() {
        let s = apply_command(&Session::default(), &Command::Qualifiante);
        assert!(s.filter.qualifiante_only);
        let s = apply_command(&s, &Command::Qualifiante);
        assert!(!s.filter.qualifiante_only);

        let s = apply_command(&s, &Command::Search("python".to_string()));
        assert_eq!(s.filter.search, "python");
    }

    #[test]
    fn test_reset_and_passive_commands() {
        let s = apply_command(&Session::default(), &Command::Certifiante);
        let s = apply_command(&s, &Command::Organisme("ASBL".to_string()));

        assert_eq!(apply_command(&s, &Command::Stats), s);
        assert_eq!(apply_command(&s, &Command::Quit), s);
        assert!(apply_command(&s, &Command::Reset).filter.is_empty());
    }
}
