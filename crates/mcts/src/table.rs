//! Persistent state-value table for the heuristic engine.
//!
//! The table aggregates `(accumulated value, visit count)` per canonical
//! position key across every search an engine runs. It is serialized as
//! MessagePack with named fields:
//!
//! ```text
//! { version: u32, entries: [ [key, { value: f64, visits: u64 }], ... ] }
//! ```

use crate::search::SearchObserver;
use playout_core::{Outcome, PlayoutError, Result, StateKey};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::File;
use std::hash::Hash;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::info;

/// Aggregated statistics for one position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateValue {
    /// Sum of rollout results recorded for the position.
    pub value: f64,

    /// Number of simulations that passed through the position.
    pub visits: u64,
}

impl StateValue {
    /// Mean value, or None if the position was never visited.
    pub fn mean(&self) -> Option<f64> {
        (self.visits > 0).then(|| self.value / self.visits as f64)
    }
}

/// On-disk layout of a table.
#[derive(Serialize)]
struct TableFile<'a, K> {
    version: u32,
    entries: Vec<(&'a K, &'a StateValue)>,
}

#[derive(Deserialize)]
struct OwnedTableFile<K> {
    version: u32,
    entries: Vec<(K, StateValue)>,
}

/// Map from canonical state key to aggregated value.
///
/// Grows monotonically; entries are never pruned.
#[derive(Clone, Debug, PartialEq)]
pub struct StateValueTable<K: Eq + Hash> {
    entries: HashMap<K, StateValue>,
}

impl<K: Eq + Hash> Default for StateValueTable<K> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> StateValueTable<K> {
    /// Current save format version.
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct positions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &K) -> Option<&StateValue> {
        self.entries.get(key)
    }

    /// Add `value` to the entry for `key`, creating it with count 1 if absent.
    pub fn record(&mut self, key: K, value: f64) {
        match self.entries.entry(key) {
            Entry::Occupied(mut e) => {
                let entry = e.get_mut();
                entry.value += value;
                entry.visits += 1;
            }
            Entry::Vacant(e) => {
                e.insert(StateValue { value, visits: 1 });
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &StateValue)> {
        self.entries.iter()
    }

    /// Total visits over all entries.
    pub fn total_visits(&self) -> u64 {
        self.entries.values().map(|v| v.visits).sum()
    }
}

impl<K: Eq + Hash + Serialize> StateValueTable<K> {
    /// Serialize the table to `writer`.
    ///
    /// # Errors
    /// Returns `PlayoutError::Io` if writing fails, or
    /// `PlayoutError::Format` if a key cannot be encoded.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        let file = TableFile {
            version: Self::VERSION,
            entries: self.entries.iter().collect(),
        };
        // Encode fully before touching the writer so that only genuine
        // write failures surface as I/O errors.
        let bytes = rmp_serde::to_vec_named(&file)
            .map_err(|e| PlayoutError::Format(format!("failed to encode table: {e}")))?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(())
    }

    /// Serialize the table to a file, creating or truncating it.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.save(BufWriter::new(file))?;
        info!(entries = self.len(), path = %path.display(), "saved state-value table");
        Ok(())
    }
}

impl<K: Eq + Hash + DeserializeOwned> StateValueTable<K> {
    /// Deserialize a table from `reader`.
    ///
    /// # Errors
    /// Returns `PlayoutError::Io` if reading fails, or `PlayoutError::Format`
    /// if the bytes are not a table of this key type, the version is
    /// unsupported, or a key appears twice.
    pub fn load<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        let file: OwnedTableFile<K> = rmp_serde::from_slice(&bytes)
            .map_err(|e| PlayoutError::Format(e.to_string()))?;

        if file.version != Self::VERSION {
            return Err(PlayoutError::Format(format!(
                "unsupported table version {} (expected {})",
                file.version,
                Self::VERSION
            )));
        }

        let mut entries = HashMap::with_capacity(file.entries.len());
        for (key, value) in file.entries {
            if entries.insert(key, value).is_some() {
                return Err(PlayoutError::Format("duplicate key in table".to_string()));
            }
        }

        Ok(Self { entries })
    }

    /// Deserialize a table from a file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::load(BufReader::new(file))?;
        info!(entries = table.len(), path = %path.display(), "loaded state-value table");
        Ok(table)
    }
}

impl<G, K> SearchObserver<G> for StateValueTable<K>
where
    G: StateKey<Key = K>,
    K: Eq + Hash,
{
    fn on_backpropagate(&mut self, game: &G, state: &G::State, outcome: Outcome) {
        self.record(game.state_key(state), outcome.get());
    }
}
