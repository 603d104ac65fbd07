use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ValidationError;
use crate::finance::{
    max_amount, round_cents, Financials, ProfitSplit, SPLIT_ADJUSTED_ENGINEER,
};
use crate::models::project::OTHER_ENGINEER;
use crate::models::{Project, ProjectId, ProjectInput, ProjectYear};

/// Project form state between opening the form and saving it.
///
/// A draft is either new (no `editing` key) or an edit of an existing record.
/// The engineer-driven split adjustment only applies to new drafts.
#[derive(Debug, Clone)]
pub struct ProjectDraft {
    editing: Option<(Uuid, ProjectId)>,
    form: ProjectInput,
    split: ProfitSplit,
}

impl ProjectDraft {
    /// Blank form for a new project, invoiced today.
    pub fn new(today: NaiveDate) -> Self {
        let form = ProjectInput {
            project_year: ProjectYear::default().to_string(),
            invoice_date: Some(today),
            ..ProjectInput::default()
        };
        Self {
            editing: None,
            form,
            split: ProfitSplit::EVEN,
        }
    }

    /// Form pre-filled from an existing record.
    pub fn edit(project: &Project) -> Self {
        Self {
            editing: Some((project.doc_id, project.id.clone())),
            form: ProjectInput::from(project),
            split: project.split,
        }
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn split(&self) -> ProfitSplit {
        self.split
    }

    pub fn engineer(&self) -> &str {
        &self.form.engineer
    }

    /// Selects the engineer.
    ///
    /// On a new draft, picking the split-adjusted engineer moves the split to
    /// 40/60 and switching away from them restores 50/50.
    pub fn set_engineer(&mut self, engineer: impl Into<String>) {
        let engineer = engineer.into();
        if !self.is_editing() {
            if engineer == SPLIT_ADJUSTED_ENGINEER {
                self.split = ProfitSplit::ENGINEERING_HEAVY;
            } else if self.form.engineer == SPLIT_ADJUSTED_ENGINEER {
                self.split = ProfitSplit::EVEN;
            }
        }
        self.form.engineer = engineer;
    }

    pub fn set_sales_split(&mut self, percent: i64) {
        self.split = ProfitSplit::from_sales(percent);
    }

    pub fn set_eng_split(&mut self, percent: i64) {
        self.split = ProfitSplit::from_eng(percent);
    }

    /// Replaces the form contents with a submitted payload.
    ///
    /// The engineer is applied first so an explicit split in the payload
    /// overrides the automatic adjustment.
    pub fn apply(&mut self, input: ProjectInput) {
        let engineer = input.engineer.clone();
        let sales = input.profit_split_sales;
        let eng = input.profit_split_eng;

        self.set_engineer(engineer);
        self.form = ProjectInput {
            engineer: self.form.engineer.clone(),
            amount: round_cents(input.amount),
            maintenance_cost: round_cents(input.maintenance_cost),
            other_cost: round_cents(input.other_cost),
            warranty_bond_amount: round_cents(input.warranty_bond_amount),
            ..input
        };

        if let Some(sales) = sales {
            self.set_sales_split(sales);
        } else if let Some(eng) = eng {
            self.set_eng_split(eng);
        }
    }

    /// Rejects entered amounts that are negative or beyond [`max_amount`].
    ///
    /// Must pass before [`financials`](Self::financials) is trusted with
    /// user input.
    pub fn check_amounts(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("amount", self.form.amount),
            ("maintenance_cost", self.form.maintenance_cost),
            ("other_cost", self.form.other_cost),
            ("warranty_bond_amount", self.form.warranty_bond_amount),
        ] {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(ValidationError::Negative(field));
            }
            if value >= max_amount() {
                return Err(ValidationError::TooLarge(field));
            }
        }
        Ok(())
    }

    /// Figures for the current form contents.
    pub fn financials(&self) -> Financials {
        Financials::compute(
            self.form.amount,
            self.form.maintenance_cost,
            self.form.other_cost,
            self.split,
        )
    }

    /// Validates the form and produces the record to persist.
    ///
    /// Edits keep their store key and identifier; new drafts take the
    /// identifier produced by `assign_id` and a fresh key.
    pub fn finalize(
        self,
        assign_id: impl FnOnce() -> ProjectId,
    ) -> Result<Project, ValidationError> {
        let project_year = ProjectYear::parse(&self.form.project_year)?;
        self.check_amounts()?;

        let financials = self.financials();
        let (doc_id, id) = match self.editing {
            Some(key) => key,
            None => (Uuid::new_v4(), assign_id()),
        };

        let form = self.form;
        let engineer = if form.engineer == OTHER_ENGINEER {
            form.custom_engineer.unwrap_or_default().trim().to_string()
        } else {
            form.engineer
        };
        let (warranty_start, warranty_end) = if form.has_warranty {
            (form.warranty_start, form.warranty_end)
        } else {
            (None, None)
        };
        let warranty_bond_amount = if form.has_warranty_bond {
            form.warranty_bond_amount
        } else {
            Decimal::ZERO
        };

        Ok(Project {
            doc_id,
            id,
            project_year,
            status: form.status,
            invoice_date: form.invoice_date,
            invoice_number: non_blank(form.invoice_number),
            payment_date: form.payment_date,
            payment_bank: non_blank(form.payment_bank),
            name: form.name,
            project_type: form.project_type,
            amount: form.amount,
            school: form.school,
            engineer,
            has_warranty: form.has_warranty,
            warranty_start,
            warranty_end,
            has_warranty_bond: form.has_warranty_bond,
            warranty_bond_amount,
            maintenance_cost: form.maintenance_cost,
            other_cost: form.other_cost,
            split: self.split,
            financials,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
