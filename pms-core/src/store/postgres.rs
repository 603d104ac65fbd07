use async_stream::stream;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgListener;
use sqlx::{FromRow, PgPool};
use tracing::{info, warn};
use uuid::Uuid;

use crate::finance::{Financials, ProfitSplit};
use crate::models::{Project, ProjectId, ProjectStatus, ProjectType, ProjectYear, Role, User};
use crate::store::{DocumentStore, Snapshot, SnapshotStream, StoreError};

/// Notification channel raised by the `projects` table trigger.
pub const PROJECTS_CHANNEL: &str = "pms_projects";

/// Notification channel raised by the `users` table trigger.
pub const USERS_CHANNEL: &str = "pms_users";

/// PostgreSQL-backed store.
///
/// Subscriptions hold a dedicated `LISTEN` connection and reload the whole
/// table after every notification. The connection is returned when the
/// subscription stream is dropped.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    doc_id: Uuid,
    project_id: ProjectId,
    project_year: ProjectYear,
    status: ProjectStatus,
    invoice_date: Option<NaiveDate>,
    invoice_number: Option<String>,
    payment_date: Option<NaiveDate>,
    payment_bank: Option<String>,
    name: String,
    project_type: ProjectType,
    amount: Decimal,
    school: String,
    engineer: String,
    has_warranty: bool,
    warranty_start: Option<NaiveDate>,
    warranty_end: Option<NaiveDate>,
    has_warranty_bond: bool,
    warranty_bond_amount: Decimal,
    maintenance_cost: Decimal,
    other_cost: Decimal,
    profit_split_sales: i16,
    mgmt_fee: Decimal,
    personnel_fee: Decimal,
    total_cost: Decimal,
    net_profit: Decimal,
    sales_profit: Decimal,
    eng_profit: Decimal,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            doc_id: row.doc_id,
            id: row.project_id,
            project_year: row.project_year,
            status: row.status,
            invoice_date: row.invoice_date,
            invoice_number: row.invoice_number,
            payment_date: row.payment_date,
            payment_bank: row.payment_bank,
            name: row.name,
            project_type: row.project_type,
            amount: row.amount,
            school: row.school,
            engineer: row.engineer,
            has_warranty: row.has_warranty,
            warranty_start: row.warranty_start,
            warranty_end: row.warranty_end,
            has_warranty_bond: row.has_warranty_bond,
            warranty_bond_amount: row.warranty_bond_amount,
            maintenance_cost: row.maintenance_cost,
            other_cost: row.other_cost,
            split: ProfitSplit::from_sales(i64::from(row.profit_split_sales)),
            financials: Financials {
                mgmt_fee: row.mgmt_fee,
                personnel_fee: row.personnel_fee,
                total_cost: row.total_cost,
                net_profit: row.net_profit,
                sales_profit: row.sales_profit,
                eng_profit: row.eng_profit,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    doc_id: Uuid,
    email: String,
    username: String,
    role: Role,
    photo_url: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            doc_id: row.doc_id,
            email: row.email,
            username: row.username,
            role: row.role,
            photo_url: row.photo_url,
            created_at: row.created_at,
        }
    }
}

async fn load_projects(pool: &PgPool) -> Result<Snapshot<Project>, StoreError> {
    let rows = sqlx::query_as::<_, ProjectRow>(
        r#"
        SELECT
            doc_id, project_id, project_year, status, invoice_date, invoice_number,
            payment_date, payment_bank, name, project_type, amount, school, engineer,
            has_warranty, warranty_start, warranty_end, has_warranty_bond,
            warranty_bond_amount, maintenance_cost, other_cost, profit_split_sales,
            mgmt_fee, personnel_fee, total_cost, net_profit, sales_profit, eng_profit
        FROM projects
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Project::from).collect())
}

async fn load_users(pool: &PgPool) -> Result<Snapshot<User>, StoreError> {
    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT doc_id, email, username, role, photo_url, created_at
        FROM users
        ORDER BY created_at ASC NULLS FIRST
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(User::from).collect())
}

/// Opens a `LISTEN` connection and turns its notifications into snapshots.
///
/// The first snapshot is loaded before returning so that access problems
/// surface at subscription time rather than on the first change.
async fn subscribe<T, F, Fut>(
    pool: &PgPool,
    channel: &'static str,
    load: F,
) -> Result<SnapshotStream<T>, StoreError>
where
    T: Send + 'static,
    F: Fn(PgPool) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = Result<Snapshot<T>, StoreError>> + Send,
{
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(channel).await?;
    let initial = load(pool.clone()).await?;
    let pool = pool.clone();

    info!("Subscribed to {}", channel);

    Ok(Box::pin(stream! {
        yield Ok(initial);
        loop {
            match listener.try_recv().await {
                Ok(Some(_)) => yield load(pool.clone()).await,
                Ok(None) => {
                    // connection dropped; notifications may have been missed
                    warn!("Listener on {} reconnecting", channel);
                    yield load(pool.clone()).await;
                }
                Err(e) => {
                    yield Err(StoreError::from(e));
                    break;
                }
            }
        }
    }))
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create_project(&self, p: &Project) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO projects (
                doc_id, project_id, project_year, status, invoice_date, invoice_number,
                payment_date, payment_bank, name, project_type, amount, school, engineer,
                has_warranty, warranty_start, warranty_end, has_warranty_bond,
                warranty_bond_amount, maintenance_cost, other_cost,
                profit_split_sales, profit_split_eng,
                mgmt_fee, personnel_fee, total_cost, net_profit, sales_profit, eng_profit
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25, $26, $27, $28
            )
            "#,
        )
        .bind(p.doc_id)
        .bind(p.id.as_str())
        .bind(p.project_year.as_str())
        .bind(p.status)
        .bind(p.invoice_date)
        .bind(&p.invoice_number)
        .bind(p.payment_date)
        .bind(&p.payment_bank)
        .bind(&p.name)
        .bind(p.project_type)
        .bind(p.amount)
        .bind(&p.school)
        .bind(&p.engineer)
        .bind(p.has_warranty)
        .bind(p.warranty_start)
        .bind(p.warranty_end)
        .bind(p.has_warranty_bond)
        .bind(p.warranty_bond_amount)
        .bind(p.maintenance_cost)
        .bind(p.other_cost)
        .bind(i16::from(p.split.sales()))
        .bind(i16::from(p.split.eng()))
        .bind(p.financials.mgmt_fee)
        .bind(p.financials.personnel_fee)
        .bind(p.financials.total_cost)
        .bind(p.financials.net_profit)
        .bind(p.financials.sales_profit)
        .bind(p.financials.eng_profit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_project(&self, p: &Project) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                project_year = $2, status = $3, invoice_date = $4, invoice_number = $5,
                payment_date = $6, payment_bank = $7, name = $8, project_type = $9,
                amount = $10, school = $11, engineer = $12, has_warranty = $13,
                warranty_start = $14, warranty_end = $15, has_warranty_bond = $16,
                warranty_bond_amount = $17, maintenance_cost = $18, other_cost = $19,
                profit_split_sales = $20, profit_split_eng = $21,
                mgmt_fee = $22, personnel_fee = $23, total_cost = $24,
                net_profit = $25, sales_profit = $26, eng_profit = $27,
                updated_at = NOW()
            WHERE doc_id = $1
            "#,
        )
        .bind(p.doc_id)
        .bind(p.project_year.as_str())
        .bind(p.status)
        .bind(p.invoice_date)
        .bind(&p.invoice_number)
        .bind(p.payment_date)
        .bind(&p.payment_bank)
        .bind(&p.name)
        .bind(p.project_type)
        .bind(p.amount)
        .bind(&p.school)
        .bind(&p.engineer)
        .bind(p.has_warranty)
        .bind(p.warranty_start)
        .bind(p.warranty_end)
        .bind(p.has_warranty_bond)
        .bind(p.warranty_bond_amount)
        .bind(p.maintenance_cost)
        .bind(p.other_cost)
        .bind(i16::from(p.split.sales()))
        .bind(i16::from(p.split.eng()))
        .bind(p.financials.mgmt_fee)
        .bind(p.financials.personnel_fee)
        .bind(p.financials.total_cost)
        .bind(p.financials.net_profit)
        .bind(p.financials.sales_profit)
        .bind(p.financials.eng_profit)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(p.doc_id));
        }
        Ok(())
    }

    async fn delete_project(&self, doc_id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM projects WHERE doc_id = $1")
            .bind(doc_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(doc_id));
        }
        Ok(())
    }

    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (doc_id, email, username, role, photo_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user.doc_id)
        .bind(&user.email)
        .bind(&user.username)
        .bind(user.role)
        .bind(&user.photo_url)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn subscribe_projects(&self) -> Result<SnapshotStream<Project>, StoreError> {
        subscribe(&self.pool, PROJECTS_CHANNEL, |pool| async move {
            load_projects(&pool).await
        })
        .await
    }

    async fn subscribe_users(&self) -> Result<SnapshotStream<User>, StoreError> {
        subscribe(&self.pool, USERS_CHANNEL, |pool| async move {
            load_users(&pool).await
        })
        .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
