//! In-memory implementation of [`ModelStore`].
//!
//! [`InMemoryStore`] keeps snapshots in a `BTreeMap` keyed by model id. Used
//! in tests and whenever nothing needs to outlive the process.

use std::collections::BTreeMap;

use crate::error::StorageError;
use crate::hash::fingerprint;
use crate::snapshot::ModelSnapshot;
use crate::traits::ModelStore;
use crate::types::{ModelId, ModelSummary};

#[derive(Debug, Clone)]
struct StoredModel {
    name: String,
    fingerprint: String,
    snapshot: ModelSnapshot,
}

/// In-memory model store.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    models: BTreeMap<ModelId, StoredModel>,
    next_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            models: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelStore for InMemoryStore {
    fn save_model(
        &mut self,
        name: &str,
        snapshot: &ModelSnapshot,
    ) -> Result<ModelId, StorageError> {
        let id = ModelId(self.next_id);
        self.next_id += 1;
        self.models.insert(
            id,
            StoredModel {
                name: name.to_string(),
                fingerprint: fingerprint(snapshot.features()).to_hex().to_string(),
                snapshot: snapshot.clone(),
            },
        );
        Ok(id)
    }

    fn load_model(&self, id: ModelId) -> Result<ModelSnapshot, StorageError> {
        let stored = self
            .models
            .get(&id)
            .ok_or(StorageError::ModelNotFound(id.0))?;
        let computed = fingerprint(stored.snapshot.features()).to_hex().to_string();
        if computed != stored.fingerprint {
            return Err(StorageError::FingerprintMismatch {
                model: id.0,
                stored: stored.fingerprint.clone(),
                computed,
            });
        }
        Ok(stored.snapshot.clone())
    }

    fn list_models(&self) -> Result<Vec<ModelSummary>, StorageError> {
        Ok(self
            .models
            .iter()
            .map(|(id, stored)| ModelSummary {
                id: *id,
                name: stored.name.clone(),
                features: stored.snapshot.features().len(),
                fingerprint: stored.fingerprint.clone(),
            })
            .collect())
    }

    fn delete_model(&mut self, id: ModelId) -> Result<(), StorageError> {
        self.models
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::ModelNotFound(id.0))
    }
}
