use std::sync::atomic::{AtomicBool, Ordering};

use async_stream::stream;
use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::models::{Project, User};
use crate::store::{DocumentStore, SnapshotStream, StoreError};

/// Process-local store backed by `watch` channels.
///
/// Each write replaces the channel value and wakes every subscriber, which
/// then reads the whole collection. Rapid writes may be coalesced into one
/// snapshot.
pub struct MemoryStore {
    projects: watch::Sender<Vec<Project>>,
    users: watch::Sender<Vec<User>>,
    denied: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            projects: watch::Sender::new(Vec::new()),
            users: watch::Sender::new(Vec::new()),
            denied: AtomicBool::new(false),
        }
    }

    /// Store pre-populated with `projects` and `users`.
    pub fn seeded(projects: Vec<Project>, users: Vec<User>) -> Self {
        let store = Self::new();
        store.projects.send_replace(projects);
        store.users.send_replace(users);
        store
    }

    /// Makes every subsequent operation fail as if access rules rejected it.
    pub fn deny_access(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    fn check_access(&self) -> Result<(), StoreError> {
        if self.denied.load(Ordering::SeqCst) {
            Err(StoreError::PermissionDenied(
                "access rules reject this client".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

fn watch_stream<T>(mut rx: watch::Receiver<Vec<T>>) -> SnapshotStream<T>
where
    T: Clone + Send + Sync + 'static,
{
    Box::pin(stream! {
        loop {
            let snapshot = rx.borrow_and_update().clone();
            yield Ok(snapshot);
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_project(&self, project: &Project) -> Result<(), StoreError> {
        self.check_access()?;
        self.projects.send_modify(|projects| projects.push(project.clone()));
        Ok(())
    }

    async fn update_project(&self, project: &Project) -> Result<(), StoreError> {
        self.check_access()?;
        let mut found = false;
        self.projects.send_if_modified(|projects| {
            if let Some(slot) = projects.iter_mut().find(|p| p.doc_id == project.doc_id) {
                *slot = project.clone();
                found = true;
            }
            found
        });
        if found {
            Ok(())
        } else {
            Err(StoreError::NotFound(project.doc_id))
        }
    }

    async fn delete_project(&self, doc_id: Uuid) -> Result<(), StoreError> {
        self.check_access()?;
        let removed = self.projects.send_if_modified(|projects| {
            let before = projects.len();
            projects.retain(|p| p.doc_id != doc_id);
            projects.len() != before
        });
        if removed {
            Ok(())
        } else {
            Err(StoreError::NotFound(doc_id))
        }
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        self.check_access()?;
        self.users.send_modify(|users| users.push(user.clone()));
        Ok(())
    }

    async fn subscribe_projects(&self) -> Result<SnapshotStream<Project>, StoreError> {
        self.check_access()?;
        Ok(watch_stream(self.projects.subscribe()))
    }

    async fn subscribe_users(&self) -> Result<SnapshotStream<User>, StoreError> {
        self.check_access()?;
        Ok(watch_stream(self.users.subscribe()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_access()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::ProjectDraft;
    use crate::models::{ProjectId, ProjectInput};
    use chrono::NaiveDate;
    use futures::StreamExt;

    fn project(seq: u32) -> Project {
        let mut draft = ProjectDraft::new(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        draft.apply(ProjectInput {
            project_year: "114".into(),
            ..ProjectInput::default()
        });
        draft.finalize(|| ProjectId::from_sequence(seq)).unwrap()
    }

    #[tokio::test]
    async fn test_subscription_yields_initial_and_changed_snapshots() {
        let store = MemoryStore::seeded(vec![project(1)], Vec::new());
        let mut stream = store.subscribe_projects().await.unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.len(), 1);

        store.create_project(&project(2)).await.unwrap();
        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_record() {
        let store = MemoryStore::new();
        let ghost = project(1);
        assert!(matches!(
            store.update_project(&ghost).await,
            Err(StoreError::NotFound(id)) if id == ghost.doc_id
        ));
        assert!(matches!(
            store.delete_project(ghost.doc_id).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_denied_access() {
        let store = MemoryStore::new();
        store.deny_access(true);
        assert!(matches!(
            store.subscribe_users().await,
            Err(StoreError::PermissionDenied(_))
        ));
        store.deny_access(false);
        assert!(store.subscribe_users().await.is_ok());
    }
}
