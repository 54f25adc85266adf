use fxvault_domain::errors::StoreError;
use fxvault_domain::repositories::series_store::{ChunkQuery, SeriesStore};
use fxvault_domain::value_objects::chunk::{ChunkKey, SeriesChunk};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Process-local store with the same upsert semantics as the Postgres adapter.
#[derive(Debug, Default)]
pub struct InMemorySeriesStore {
    chunks: Mutex<BTreeMap<ChunkKey, SeriesChunk>>,
}

impl InMemorySeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<ChunkKey> {
        self.chunks.lock().keys().cloned().collect()
    }
}

impl SeriesStore for InMemorySeriesStore {
    fn upsert_chunks(&self, chunks: &[SeriesChunk]) -> Result<usize, StoreError> {
        let mut guard = self.chunks.lock();
        for chunk in chunks {
            guard.insert(chunk.key.clone(), chunk.clone());
        }
        Ok(chunks.len())
    }

    fn find_one(&self, key: &ChunkKey) -> Result<Option<SeriesChunk>, StoreError> {
        Ok(self.chunks.lock().get(key).cloned())
    }

    fn find_chunks(&self, query: &ChunkQuery) -> Result<Vec<SeriesChunk>, StoreError> {
        let guard = self.chunks.lock();
        let mut found: Vec<SeriesChunk> = guard
            .iter()
            .filter(|(key, _)| query.matches(key))
            .map(|(_, chunk)| chunk.clone())
            .collect();
        found.sort_by_key(|chunk| (chunk.key.year, chunk.key.month));
        Ok(found)
    }
}
