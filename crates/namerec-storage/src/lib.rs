//! Persistence for trained name-recovery models.
//!
//! A stored model is its [`FeatureIndex`](namerec_core::FeatureIndex) plus
//! the weight vector trained against it. Both travel together because a
//! weight is meaningless without the key at its position; a blake3
//! fingerprint of the index is kept alongside and re-checked on load.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: ModelId, ModelSummary storage-layer types
//! - [`snapshot`]: ModelSnapshot, the unit of persistence
//! - [`hash`]: feature-index fingerprinting
//! - [`traits`]: ModelStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: migration setup
//! - [`sqlite`]: SqliteStore implementation

pub mod error;
pub mod hash;
pub mod memory;
pub mod schema;
pub mod snapshot;
pub mod sqlite;
pub mod traits;
pub mod types;

pub use error::StorageError;
pub use hash::fingerprint;
pub use memory::InMemoryStore;
pub use snapshot::ModelSnapshot;
pub use sqlite::SqliteStore;
pub use traits::ModelStore;
pub use types::{ModelId, ModelSummary};
