//! System of record for projects and users.
//!
//! The store exposes collection-level writes plus a subscription per
//! collection. A subscription is a stream that yields the full current
//! contents of the collection once on connect and again after every change;
//! dropping the stream releases whatever the subscription holds open.

pub mod memory;
pub mod postgres;

#[cfg(test)]
mod tests;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Project, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The store's access rules rejected the operation.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Record not found: {0}")]
    NotFound(Uuid),

    /// The store could not be reached or the subscription ended.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // 42501: insufficient_privilege
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some("42501") {
                return StoreError::PermissionDenied(db.message().to_string());
            }
        }
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Database(other),
        }
    }
}

/// Full contents of a collection at one point in time.
pub type Snapshot<T> = Vec<T>;

/// Stream of collection snapshots.
pub type SnapshotStream<T> = Pin<Box<dyn Stream<Item = Result<Snapshot<T>, StoreError>> + Send>>;

/// Persistence port for the workspace.
///
/// Writes are not echoed back to the caller; they become visible through the
/// next snapshot delivered on a subscription.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a new project record.
    async fn create_project(&self, project: &Project) -> Result<(), StoreError>;

    /// Replaces the record stored under `project.doc_id`.
    async fn update_project(&self, project: &Project) -> Result<(), StoreError>;

    async fn delete_project(&self, doc_id: Uuid) -> Result<(), StoreError>;

    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    /// Subscribes to the project collection.
    async fn subscribe_projects(&self) -> Result<SnapshotStream<Project>, StoreError>;

    /// Subscribes to the user collection.
    async fn subscribe_users(&self) -> Result<SnapshotStream<User>, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
