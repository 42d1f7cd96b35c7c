//! The [`ModelStore`] trait defining the storage contract for trained models.
//!
//! All backends (InMemoryStore, SqliteStore) implement this trait, so the CLI
//! can swap them without changing anything else.

use crate::error::StorageError;
use crate::snapshot::ModelSnapshot;
use crate::types::{ModelId, ModelSummary};

/// The storage contract for trained models.
///
/// The trait is synchronous: training and inference are CPU-bound batch jobs
/// and the store is touched once at either end.
pub trait ModelStore {
    /// Persists a snapshot under `name`. Names need not be unique; every save
    /// allocates a new [`ModelId`].
    fn save_model(&mut self, name: &str, snapshot: &ModelSnapshot) -> Result<ModelId, StorageError>;

    /// Loads a snapshot, verifying its fingerprint.
    fn load_model(&self, id: ModelId) -> Result<ModelSnapshot, StorageError>;

    /// Lists stored models in id order.
    fn list_models(&self) -> Result<Vec<ModelSummary>, StorageError>;

    /// Deletes a model and its weights.
    fn delete_model(&mut self, id: ModelId) -> Result<(), StorageError>;
}
