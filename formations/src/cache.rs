//! Mémoïsation des chargements, par identité de source et empreinte du contenu

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

/// Empreinte blake3 (hexadécimale) d'un contenu
pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}

struct CacheEntry<T> {
    fingerprint: String,
    value: Arc<T>,
}

/// Cache clé -> valeur calculée, invalidé quand l'empreinte change
///
/// La clé est l'identité de la source (chemin, nom de fichier importé);
/// l'empreinte détecte un contenu modifié sous la même identité.
pub struct TableCache<T> {
    entries: HashMap<String, CacheEntry<T>>,
    hits: usize,
    misses: usize,
}

impl<T> Default for TableCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<T> TableCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retourne la valeur en cache si le contenu est inchangé, sinon la
    /// recalcule avec `load` et remplace l'entrée
    ///
    /// # Errors
    ///
    /// Propage l'erreur de `load`; l'ancienne entrée est alors retirée.
    pub fn get_or_load<E, F>(&mut self, identity: &str, bytes: &[u8], load: F) -> Result<Arc<T>, E>
    where
        F: FnOnce(&[u8]) -> Result<T, E>,
    {
        let print = fingerprint(bytes);

        if let Some(entry) = self.entries.get(identity) {
            if entry.fingerprint == print {
                self.hits += 1;
                debug!(source = identity, "Cache: source inchangée");
                return Ok(Arc::clone(&entry.value));
            }
            debug!(source = identity, "Cache: empreinte modifiée, rechargement");
        }

        self.misses += 1;
        self.entries.remove(identity);
        let value = Arc::new(load(bytes)?);
        self.entries.insert(
            identity.to_string(),
            CacheEntry {
                fingerprint: print,
                value: Arc::clone(&value),
            },
        );
        Ok(value)
    }

    /// Oublie une source
    pub fn invalidate(&mut self, identity: &str) {
        self.entries.remove(identity);
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
