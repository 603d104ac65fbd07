use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::finance::coerce::{lenient_date, lenient_decimal, lenient_percent};
use crate::finance::{Financials, ProfitSplit};

/// Year codes a project can be booked under.
pub const PROJECT_YEARS: [&str; 5] = ["114", "115", "116", "117", "118"];

/// Engineers offered by the project form.
pub const ENGINEERS: [&str; 6] = ["Ryder", "Sian", "Peggy", "Ken", "Jc", "JB"];

/// Form value that switches the engineer to the free-text `custom_engineer`.
pub const OTHER_ENGINEER: &str = "Other";

/// Banks a payment can be received into.
pub const PAYMENT_BANKS: [&str; 2] = ["Mega Bank", "Bank of Taiwan"];

/// Sequential project identifier, `P` followed by a zero-padded number.
///
/// Ordering is plain string ordering, which matches numeric ordering only
/// while every identifier has the same digit width.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn from_sequence(n: u32) -> Self {
        ProjectId(format!("P{n:04}"))
    }

    /// Numeric suffix of the identifier, if it has one.
    ///
    /// Everything after the first character is read up to the first
    /// non-digit, so `P0012` yields 12 and `Pxyz` yields nothing.
    pub fn sequence(&self) -> Option<u32> {
        let digits: String = self
            .0
            .chars()
            .skip(1)
            .take_while(char::is_ascii_digit)
            .collect();
        digits.parse().ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ProjectId {
    fn from(value: String) -> Self {
        ProjectId(value)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        ProjectId(value.to_string())
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One of the fixed [`PROJECT_YEARS`] codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct ProjectYear(String);

impl ProjectYear {
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if PROJECT_YEARS.contains(&code) {
            Ok(ProjectYear(code.to_string()))
        } else {
            Err(ValidationError::UnknownYear(code.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ProjectYear {
    fn default() -> Self {
        ProjectYear(PROJECT_YEARS[0].to_string())
    }
}

impl fmt::Display for ProjectYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Project status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar")]
pub enum ProjectStatus {
    #[default]
    #[sqlx(rename = "in_progress")]
    InProgress,
    #[sqlx(rename = "under_warranty")]
    UnderWarranty,
    #[sqlx(rename = "warranty_expired")]
    WarrantyExpired,
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectStatus::InProgress => write!(f, "In progress"),
            ProjectStatus::UnderWarranty => write!(f, "Under warranty"),
            ProjectStatus::WarrantyExpired => write!(f, "Warranty expired"),
        }
    }
}

/// Kind of engagement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "varchar")]
pub enum ProjectType {
    #[default]
    #[sqlx(rename = "new")]
    New,
    #[sqlx(rename = "expansion")]
    Expansion,
    #[sqlx(rename = "maintenance")]
    Maintenance,
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectType::New => write!(f, "New"),
            ProjectType::Expansion => write!(f, "Expansion"),
            ProjectType::Maintenance => write!(f, "Maintenance"),
        }
    }
}

/// A billable engagement with its invoicing, warranty and profit figures.
///
/// The derived money fields in `financials` are computed when the record is
/// saved and stored with it. Reads never recompute them, so a record keeps
/// the figures it was saved with even if the fee rates change later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Store key of the record
    pub doc_id: Uuid,

    /// Human-facing sequential identifier (`P0001`)
    pub id: ProjectId,

    pub project_year: ProjectYear,
    pub status: ProjectStatus,

    pub invoice_date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    pub payment_date: Option<NaiveDate>,
    pub payment_bank: Option<String>,

    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    pub amount: Decimal,

    /// Client site
    pub school: String,
    pub engineer: String,

    pub has_warranty: bool,
    pub warranty_start: Option<NaiveDate>,
    pub warranty_end: Option<NaiveDate>,
    pub has_warranty_bond: bool,
    pub warranty_bond_amount: Decimal,

    pub maintenance_cost: Decimal,
    pub other_cost: Decimal,

    #[serde(flatten)]
    pub split: ProfitSplit,

    #[serde(flatten)]
    pub financials: Financials,
}

/// Project form payload used for both create and full-document update.
///
/// Numeric fields are lenient: unparsable input counts as zero. A missing
/// split keeps whatever split the draft already holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInput {
    pub project_year: String,
    pub status: ProjectStatus,
    #[serde(deserialize_with = "lenient_date")]
    pub invoice_date: Option<NaiveDate>,
    pub invoice_number: Option<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub payment_date: Option<NaiveDate>,
    pub payment_bank: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: ProjectType,
    #[serde(deserialize_with = "lenient_decimal")]
    pub amount: Decimal,
    pub school: String,
    pub engineer: String,
    pub custom_engineer: Option<String>,
    pub has_warranty: bool,
    #[serde(deserialize_with = "lenient_date")]
    pub warranty_start: Option<NaiveDate>,
    #[serde(deserialize_with = "lenient_date")]
    pub warranty_end: Option<NaiveDate>,
    pub has_warranty_bond: bool,
    #[serde(deserialize_with = "lenient_decimal")]
    pub warranty_bond_amount: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub maintenance_cost: Decimal,
    #[serde(deserialize_with = "lenient_decimal")]
    pub other_cost: Decimal,
    #[serde(deserialize_with = "lenient_percent")]
    pub profit_split_sales: Option<i64>,
    #[serde(deserialize_with = "lenient_percent")]
    pub profit_split_eng: Option<i64>,
}

impl From<&Project> for ProjectInput {
    fn from(project: &Project) -> Self {
        ProjectInput {
            project_year: project.project_year.to_string(),
            status: project.status,
            invoice_date: project.invoice_date,
            invoice_number: project.invoice_number.clone(),
            payment_date: project.payment_date,
            payment_bank: project.payment_bank.clone(),
            name: project.name.clone(),
            project_type: project.project_type,
            amount: project.amount,
            school: project.school.clone(),
            engineer: project.engineer.clone(),
            custom_engineer: None,
            has_warranty: project.has_warranty,
            warranty_start: project.warranty_start,
            warranty_end: project.warranty_end,
            has_warranty_bond: project.has_warranty_bond,
            warranty_bond_amount: project.warranty_bond_amount,
            maintenance_cost: project.maintenance_cost,
            other_cost: project.other_cost,
            profit_split_sales: Some(i64::from(project.split.sales())),
            profit_split_eng: Some(i64::from(project.split.eng())),
        }
    }
}
