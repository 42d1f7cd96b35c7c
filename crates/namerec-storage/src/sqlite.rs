//! SQLite implementation of [`ModelStore`].
//!
//! [`SqliteStore`] writes one `models` row per saved snapshot and one
//! `features` row per feature key, carrying the key, its kind, and its
//! weight. Every write runs in a transaction. Loading rebuilds the feature
//! index in `feature_id` order and re-checks the stored fingerprint.

use rusqlite::{params, Connection, OptionalExtension};

use namerec_core::{EdgeKind, FeatureId, FeatureIndex, FeatureKey};

use crate::error::StorageError;
use crate::hash::fingerprint;
use crate::snapshot::ModelSnapshot;
use crate::traits::ModelStore;
use crate::types::{ModelId, ModelSummary};

/// SQLite-backed implementation of [`ModelStore`].
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    fn integrity(reason: impl Into<String>) -> StorageError {
        StorageError::IntegrityError {
            reason: reason.into(),
        }
    }
}

/// One `features` row.
struct FeatureRow {
    feature_id: i64,
    key: FeatureKey,
    kind: String,
    weight: f64,
}

impl ModelStore for SqliteStore {
    fn save_model(
        &mut self,
        name: &str,
        snapshot: &ModelSnapshot,
    ) -> Result<ModelId, StorageError> {
        let features = snapshot.features();
        let digest = fingerprint(features).to_hex().to_string();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO models (name, fingerprint, feature_count) VALUES (?1, ?2, ?3)",
            params![name, digest, features.len() as i64],
        )?;
        let model_id = tx.last_insert_rowid();
        {
            let mut insert = tx.prepare(
                "INSERT INTO features \
                 (model_id, feature_id, left_name, relation, right_name, kind, weight) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for ((id, key, kind), weight) in features.iter().zip(snapshot.weights()) {
                insert.execute(params![
                    model_id,
                    id.0,
                    key.left,
                    key.relation,
                    key.right,
                    kind.as_str(),
                    weight,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!(model = model_id, name, features = features.len(), "model saved");
        Ok(ModelId(model_id))
    }

    fn load_model(&self, id: ModelId) -> Result<ModelSnapshot, StorageError> {
        let header: Option<(String, i64)> = self
            .conn
            .query_row(
                "SELECT fingerprint, feature_count FROM models WHERE id = ?1",
                params![id.0],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let (stored, count) = header.ok_or(StorageError::ModelNotFound(id.0))?;

        let mut stmt = self.conn.prepare(
            "SELECT feature_id, left_name, relation, right_name, kind, weight \
             FROM features WHERE model_id = ?1 ORDER BY feature_id",
        )?;
        let rows = stmt
            .query_map(params![id.0], |row| {
                Ok(FeatureRow {
                    feature_id: row.get(0)?,
                    key: FeatureKey {
                        left: row.get(1)?,
                        relation: row.get(2)?,
                        right: row.get(3)?,
                    },
                    kind: row.get(4)?,
                    weight: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.len() as i64 != count {
            return Err(Self::integrity(format!(
                "model {} declares {} features but has {} rows",
                id.0,
                count,
                rows.len()
            )));
        }

        let mut features = FeatureIndex::new();
        let mut weights = Vec::with_capacity(rows.len());
        for (position, row) in rows.into_iter().enumerate() {
            if row.feature_id != position as i64 {
                return Err(Self::integrity(format!(
                    "model {}: feature ids are not dense at {}",
                    id.0, position
                )));
            }
            let kind = EdgeKind::parse(&row.kind)
                .ok_or_else(|| Self::integrity(format!("unknown edge kind {:?}", row.kind)))?;
            let assigned = features.insert(row.key, kind);
            if assigned != FeatureId(position as u32) {
                return Err(Self::integrity(format!(
                    "model {}: duplicate feature key at {}",
                    id.0, position
                )));
            }
            weights.push(row.weight);
        }

        let computed = fingerprint(&features).to_hex().to_string();
        if computed != stored {
            return Err(StorageError::FingerprintMismatch {
                model: id.0,
                stored,
                computed,
            });
        }
        ModelSnapshot::new(features, weights)
    }

    fn list_models(&self) -> Result<Vec<ModelSummary>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, feature_count, fingerprint FROM models ORDER BY id")?;
        let models = stmt
            .query_map([], |row| {
                Ok(ModelSummary {
                    id: ModelId(row.get(0)?),
                    name: row.get(1)?,
                    features: row.get::<_, i64>(2)? as usize,
                    fingerprint: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(models)
    }

    fn delete_model(&mut self, id: ModelId) -> Result<(), StorageError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM features WHERE model_id = ?1", params![id.0])?;
        let removed = tx.execute("DELETE FROM models WHERE id = ?1", params![id.0])?;
        if removed == 0 {
            return Err(StorageError::ModelNotFound(id.0));
        }
        tx.commit()?;
        Ok(())
    }
}
