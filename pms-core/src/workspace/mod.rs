//! Shared view of the project and user collections.
//!
//! The workspace owns the store client and one background task per
//! collection subscription. Each task swaps its cache for the newest
//! snapshot wholesale, re-evaluates warranty notices and bumps the revision
//! counter. Writes go straight to the store and show up in the caches only
//! once the store reports them back through a snapshot.


use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::Principal;
use crate::error::{AppError, ValidationError};
use crate::finance::{Financials, ProfitSplit, ProjectDraft};
use crate::ident::next_project_id;
use crate::invite::{normalize_email, username_for, MailDraft};
use crate::models::{Project, ProjectId, ProjectInput, Role, User};
use crate::query::sort_for_listing;
use crate::store::{DocumentStore, SnapshotStream};
use crate::warranty::{collect_notices, WarrantyNotice};

/// Figures for an unsaved draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftPreview {
    /// Identifier the draft would be saved under
    pub id: ProjectId,
    #[serde(flatten)]
    pub split: ProfitSplit,
    #[serde(flatten)]
    pub financials: Financials,
}

/// Sync banner contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncStatus {
    pub error: Option<String>,
    pub projects: usize,
    pub users: usize,
    pub revision: u64,
}

/// Outcome of an invitation: the stored user and the mail to send them.
#[derive(Debug, Clone, Serialize)]
pub struct Invitation {
    pub user: User,
    pub mail: MailDraft,
}

#[derive(Default)]
struct Caches {
    projects: RwLock<Arc<Vec<Project>>>,
    users: RwLock<Arc<Vec<User>>>,
    notices: RwLock<Arc<Vec<WarrantyNotice>>>,
    sync_error: RwLock<Option<String>>,
}

struct Shared {
    caches: Caches,
    revision: watch::Sender<u64>,
}

impl Shared {
    async fn replace_projects(&self, mut snapshot: Vec<Project>) {
        sort_for_listing(&mut snapshot);
        let count = snapshot.len();
        *self.caches.projects.write().await = Arc::new(snapshot);
        info!("Project snapshot applied ({} records)", count);
        self.refresh_notices().await;
        self.revision.send_modify(|r| *r += 1);
    }

    async fn replace_users(&self, snapshot: Vec<User>) {
        let count = snapshot.len();
        *self.caches.users.write().await = Arc::new(snapshot);
        info!("User snapshot applied ({} records)", count);
        self.refresh_notices().await;
        self.revision.send_modify(|r| *r += 1);
    }

    async fn record_sync_error(&self, collection: &str, message: String) {
        error!("{} subscription failed: {}", collection, message);
        *self.caches.sync_error.write().await = Some(message);
        self.revision.send_modify(|r| *r += 1);
    }

    /// Recomputes notices from the cached projects. An empty pass keeps the
    /// previous set.
    async fn refresh_notices(&self) {
        let projects = self.caches.projects.read().await.clone();
        let notices = collect_notices(&projects, Utc::now());
        if notices.is_empty() {
            return;
        }
        for notice in &notices {
            info!(project_id = %notice.project_id, days = notice.days_remaining, "{}", notice.message);
        }
        *self.caches.notices.write().await = Arc::new(notices);
    }
}

/// Collection caches plus the store they mirror.
pub struct Workspace {
    store: Arc<dyn DocumentStore>,
    super_admins: Vec<String>,
    shared: Arc<Shared>,
    registering: Arc<Mutex<HashSet<String>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Workspace {
    /// Subscribes to both collections and waits for their first snapshots.
    ///
    /// A rejected subscription is recorded as the sync error and leaves the
    /// matching cache empty; it never fails startup. The error stays until
    /// the workspace is restarted.
    ///
    /// # Arguments
    ///
    /// * `store` - System of record
    /// * `super_admins` - Lowercase e-mails always resolved as admins
    pub async fn start(store: Arc<dyn DocumentStore>, super_admins: Vec<String>) -> Arc<Self> {
        let shared = Arc::new(Shared {
            caches: Caches::default(),
            revision: watch::Sender::new(0),
        });
        let mut tasks = Vec::new();

        match store.subscribe_projects().await {
            Ok(mut stream) => {
                if let Some(first) = stream.next().await {
                    match first {
                        Ok(snapshot) => shared.replace_projects(snapshot).await,
                        Err(e) => shared.record_sync_error("Project", e.to_string()).await,
                    }
                }
                tasks.push(tokio::spawn(follow_projects(shared.clone(), stream)));
            }
            Err(e) => shared.record_sync_error("Project", e.to_string()).await,
        }

        match store.subscribe_users().await {
            Ok(mut stream) => {
                if let Some(first) = stream.next().await {
                    match first {
                        Ok(snapshot) => shared.replace_users(snapshot).await,
                        Err(e) => shared.record_sync_error("User", e.to_string()).await,
                    }
                }
                tasks.push(tokio::spawn(follow_users(shared.clone(), stream)));
            }
            Err(e) => shared.record_sync_error("User", e.to_string()).await,
        }

        Arc::new(Self {
            store,
            super_admins,
            shared,
            registering: Arc::new(Mutex::new(HashSet::new())),
            tasks: Mutex::new(tasks),
        })
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Cached projects, identifier descending.
    pub async fn projects(&self) -> Arc<Vec<Project>> {
        self.shared.caches.projects.read().await.clone()
    }

    pub async fn users(&self) -> Arc<Vec<User>> {
        self.shared.caches.users.read().await.clone()
    }

    /// Latest non-empty notice set.
    pub async fn notices(&self) -> Arc<Vec<WarrantyNotice>> {
        self.shared.caches.notices.read().await.clone()
    }

    pub async fn sync_error(&self) -> Option<String> {
        self.shared.caches.sync_error.read().await.clone()
    }

    pub async fn status(&self) -> SyncStatus {
        SyncStatus {
            error: self.sync_error().await,
            projects: self.projects().await.len(),
            users: self.users().await.len(),
            revision: *self.shared.revision.borrow(),
        }
    }

    /// Receiver that changes whenever a snapshot or sync error is applied.
    pub fn revisions(&self) -> watch::Receiver<u64> {
        self.shared.revision.subscribe()
    }

    /// Identifier the next created project would receive.
    pub async fn next_id(&self) -> ProjectId {
        let projects = self.projects().await;
        next_project_id(projects.iter().map(|p| &p.id))
    }

    /// Figures for `input` without saving. With `editing`, the draft starts
    /// from that cached record.
    pub async fn preview(
        &self,
        input: ProjectInput,
        editing: Option<Uuid>,
    ) -> Result<DraftPreview, AppError> {
        let (mut draft, id) = match editing {
            Some(doc_id) => {
                let current = self.cached_project(doc_id).await?;
                (ProjectDraft::edit(&current), current.id)
            }
            None => (ProjectDraft::new(today()), self.next_id().await),
        };
        draft.apply(input);
        draft.check_amounts()?;

        Ok(DraftPreview {
            id,
            split: draft.split(),
            financials: draft.financials(),
        })
    }

    /// Validates `input`, assigns the next identifier and writes the record.
    ///
    /// The identifier comes from a max-scan over the cache, so two callers
    /// working from the same snapshot can receive the same one.
    pub async fn create_project(&self, input: ProjectInput) -> Result<Project, AppError> {
        let mut draft = ProjectDraft::new(today());
        draft.apply(input);

        let existing = self.projects().await;
        let project = draft.finalize(|| next_project_id(existing.iter().map(|p| &p.id)))?;

        self.store.create_project(&project).await?;
        info!("Project {} created ({})", project.id, project.doc_id);
        Ok(project)
    }

    /// Replaces a project's fields, keeping its identifier and key.
    pub async fn update_project(
        &self,
        doc_id: Uuid,
        input: ProjectInput,
    ) -> Result<Project, AppError> {
        let current = self.cached_project(doc_id).await?;
        let mut draft = ProjectDraft::edit(&current);
        draft.apply(input);
        let project = draft.finalize(|| current.id.clone())?;

        self.store.update_project(&project).await?;
        info!("Project {} updated", project.id);
        Ok(project)
    }

    pub async fn delete_project(&self, doc_id: Uuid) -> Result<(), AppError> {
        self.store.delete_project(doc_id).await?;
        info!("Project {} deleted", doc_id);
        Ok(())
    }

    /// Maps an authenticated principal to a user with a role.
    ///
    /// Allow-listed e-mails are admins. Otherwise the stored record is used
    /// with the principal's current name and avatar. Unknown principals are
    /// registered as plain users; that write is not awaited and a failure is
    /// only logged.
    pub async fn resolve_user(&self, principal: &Principal) -> User {
        let users = self.users().await;
        let stored = users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(&principal.email));

        if self.super_admins.iter().any(|e| e == &principal.email) {
            return User {
                doc_id: stored.map(|u| u.doc_id).unwrap_or_else(Uuid::nil),
                email: principal.email.clone(),
                username: principal
                    .display_name
                    .clone()
                    .unwrap_or_else(|| "Admin".to_string()),
                role: Role::Admin,
                photo_url: principal.photo_url.clone(),
                created_at: stored.and_then(|u| u.created_at),
            };
        }

        if let Some(user) = stored {
            let mut user = user.clone();
            if let Some(name) = &principal.display_name {
                user.username = name.clone();
            }
            if principal.photo_url.is_some() {
                user.photo_url = principal.photo_url.clone();
            }
            return user;
        }

        let user = User {
            doc_id: Uuid::new_v4(),
            email: principal.email.clone(),
            username: principal
                .display_name
                .clone()
                .unwrap_or_else(|| "User".to_string()),
            role: Role::User,
            photo_url: principal.photo_url.clone(),
            created_at: Some(Utc::now()),
        };
        self.register(user.clone());
        user
    }

    /// Stores a first-time user in the background, at most once per e-mail
    /// until the write fails.
    fn register(&self, user: User) {
        match self.registering.lock() {
            Ok(mut pending) => {
                if !pending.insert(user.email.clone()) {
                    return;
                }
            }
            Err(e) => {
                warn!("Registration guard poisoned: {}", e);
                return;
            }
        }

        let store = self.store.clone();
        let registering = self.registering.clone();
        tokio::spawn(async move {
            match store.create_user(&user).await {
                Ok(()) => info!("Registered new user {}", user.email),
                Err(e) => {
                    warn!("Failed to register user {}: {}", user.email, e);
                    if let Ok(mut pending) = registering.lock() {
                        pending.remove(&user.email);
                    }
                }
            }
        });
    }

    /// Adds a user by e-mail and drafts the invitation mail.
    pub async fn invite_user(&self, raw_email: &str) -> Result<Invitation, AppError> {
        let email = normalize_email(raw_email)?;
        let users = self.users().await;
        if users.iter().any(|u| u.email.eq_ignore_ascii_case(&email)) {
            return Err(ValidationError::DuplicateEmail(email).into());
        }

        let user = User {
            doc_id: Uuid::new_v4(),
            email: email.clone(),
            username: username_for(&email).to_string(),
            role: Role::User,
            photo_url: None,
            created_at: Some(Utc::now()),
        };
        self.store.create_user(&user).await?;
        info!("Invited user {}", email);

        Ok(Invitation {
            mail: MailDraft::invitation(&email),
            user,
        })
    }

    /// Stops following the store.
    pub fn shutdown(&self) {
        match self.tasks.lock() {
            Ok(mut tasks) => {
                for task in tasks.drain(..) {
                    task.abort();
                }
            }
            Err(e) => warn!("Task list poisoned during shutdown: {}", e),
        }
        info!("Workspace subscriptions closed");
    }

    async fn cached_project(&self, doc_id: Uuid) -> Result<Project, AppError> {
        self.projects()
            .await
            .iter()
            .find(|p| p.doc_id == doc_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("project {}", doc_id)))
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Ok(tasks) = self.tasks.get_mut() {
            for task in tasks.drain(..) {
                task.abort();
            }
        }
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn follow_projects(shared: Arc<Shared>, mut stream: SnapshotStream<Project>) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(snapshot) => shared.replace_projects(snapshot).await,
            Err(e) => shared.record_sync_error("Project", e.to_string()).await,
        }
    }
    warn!("Project subscription ended");
}

async fn follow_users(shared: Arc<Shared>, mut stream: SnapshotStream<User>) {
    while let Some(item) = stream.next().await {
        match item {
            Ok(snapshot) => shared.replace_users(snapshot).await,
            Err(e) => shared.record_sync_error("User", e.to_string()).await,
        }
    }
    warn!("User subscription ended");
}
