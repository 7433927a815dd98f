//! Brute-force cosine index for one collection

use std::collections::HashMap;
use std::collections::HashSet;

use serde::Deserialize;
use serde::Serialize;

use crate::errors::Result;
use crate::errors::TutorRagError;
use crate::models::Metadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEntry {
    pub id: String,
    pub document: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A raw nearest-neighbour hit, before it is tagged with its collection
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHit {
    pub id: String,
    pub document: String,
    pub metadata: Metadata,
    pub distance: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
    /// Fixed by the first upsert
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    entries: Vec<StoredEntry>,
    #[serde(skip)]
    positions: HashMap<String, usize>,
}

impl Collection {
    pub fn new(name: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            name: name.into(),
            metadata,
            dimension: None,
            entries: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Rebuild the id lookup after deserialisation
    pub(crate) fn reindex(&mut self) {
        self.positions = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&StoredEntry> {
        self.positions.get(id).map(|&i| &self.entries[i])
    }

    /// Insert or replace by id. Arrays must be parallel; every vector must
    /// match the collection dimension.
    pub fn upsert(
        &mut self,
        ids: Vec<String>,
        embeddings: Vec<Vec<f32>>,
        documents: Vec<String>,
        metadatas: Vec<Metadata>,
    ) -> Result<usize> {
        let n = ids.len();
        if embeddings.len() != n || documents.len() != n || metadatas.len() != n {
            return Err(TutorRagError::InvalidInput(format!(
                "upsert into {}: ids={}, embeddings={}, documents={}, metadatas={}",
                self.name,
                n,
                embeddings.len(),
                documents.len(),
                metadatas.len()
            )));
        }
        if n == 0 {
            return Ok(0);
        }

        let expected = self.dimension.unwrap_or(embeddings[0].len());
        if expected == 0 {
            return Err(TutorRagError::InvalidInput(format!(
                "upsert into {}: empty embedding",
                self.name
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != expected) {
            return Err(TutorRagError::DimensionMismatch {
                collection: self.name.clone(),
                expected,
                actual: bad.len(),
            });
        }
        self.dimension = Some(expected);

        let written = ids.iter().collect::<HashSet<_>>().len();
        let rows = ids.into_iter().zip(embeddings).zip(documents).zip(metadatas);
        for (((id, embedding), document), metadata) in rows {
            let entry = StoredEntry {
                id: id.clone(),
                document,
                embedding,
                metadata,
            };
            match self.positions.get(&id) {
                Some(&i) => self.entries[i] = entry,
                None => {
                    self.positions.insert(id, self.entries.len());
                    self.entries.push(entry);
                }
            }
        }
        Ok(written)
    }

    /// Nearest `n_results` by cosine distance, ascending; ties keep insertion order
    pub fn query(&self, embedding: &[f32], n_results: usize) -> Result<Vec<QueryHit>> {
        if let Some(expected) = self.dimension {
            if embedding.len() != expected {
                return Err(TutorRagError::DimensionMismatch {
                    collection: self.name.clone(),
                    expected,
                    actual: embedding.len(),
                });
            }
        }
        if n_results == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (i, cosine_distance(embedding, &e.embedding)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(n_results);

        Ok(scored
            .into_iter()
            .map(|(i, distance)| {
                let entry = &self.entries[i];
                QueryHit {
                    id: entry.id.clone(),
                    document: entry.document.clone(),
                    metadata: entry.metadata.clone(),
                    distance,
                }
            })
            .collect())
    }

    /// Remove every entry; the dimension is released too
    pub fn clear(&mut self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        self.positions.clear();
        self.dimension = None;
        removed
    }
}

/// `1 - cos(a, b)` clamped to `[0, 2]`; a zero vector is orthogonal to everything
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;

    let similarity = if denom <= f32::EPSILON { 0.0 } else { dot / denom };
    (1.0 - similarity).clamp(0.0, 2.0)
}
