//! Fee and profit derivation for a project.
//!
//! Every figure here is rounded to whole currency units, half away from zero,
//! so that the values persisted with a record never carry fractional cents.

pub mod coerce;
pub mod draft;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

pub use draft::ProjectDraft;

/// Engineer whose new projects default to a 40/60 sales/engineering split.
pub const SPLIT_ADJUSTED_ENGINEER: &str = "Sian";

/// Management overhead, charged as 10% of the project amount.
pub fn mgmt_fee_rate() -> Decimal {
    Decimal::new(10, 2)
}

/// Personnel overhead, charged as 5% of the project amount.
pub fn personnel_fee_rate() -> Decimal {
    Decimal::new(5, 2)
}

/// Decimal places kept on entered amounts, matching the storage columns.
pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound on any entered amount.
///
/// Derived totals add up to three entered amounts, so the bound keeps them
/// inside the `NUMERIC(18, 2)` columns as well as the inputs.
pub fn max_amount() -> Decimal {
    Decimal::from(1_000_000_000_000_000_i64)
}

/// Rounds to whole units, half away from zero.
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an entered amount to cents, half away from zero.
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Percentage allocation of net profit between sales and engineering.
///
/// The two sides always sum to 100; constructors clamp out-of-range input
/// instead of rejecting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SplitFields", into = "SplitFields")]
pub struct ProfitSplit {
    sales: u8,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct SplitFields {
    profit_split_sales: i64,
    profit_split_eng: i64,
}

impl TryFrom<SplitFields> for ProfitSplit {
    type Error = String;

    fn try_from(fields: SplitFields) -> Result<Self, Self::Error> {
        if fields.profit_split_sales + fields.profit_split_eng != 100 {
            return Err(format!(
                "profit split {}/{} does not sum to 100",
                fields.profit_split_sales, fields.profit_split_eng
            ));
        }
        Ok(Self::from_sales(fields.profit_split_sales))
    }
}

impl From<ProfitSplit> for SplitFields {
    fn from(split: ProfitSplit) -> Self {
        SplitFields {
            profit_split_sales: i64::from(split.sales()),
            profit_split_eng: i64::from(split.eng()),
        }
    }
}

impl Default for ProfitSplit {
    fn default() -> Self {
        Self::EVEN
    }
}

impl ProfitSplit {
    /// 50/50, the split every new project starts with.
    pub const EVEN: ProfitSplit = ProfitSplit { sales: 50 };

    /// 40/60, applied when the split-adjusted engineer is picked on a new project.
    pub const ENGINEERING_HEAVY: ProfitSplit = ProfitSplit { sales: 40 };

    /// Builds a split from the sales share, clamped to `[0, 100]`.
    pub fn from_sales(percent: i64) -> Self {
        Self {
            sales: clamp_percent(percent),
        }
    }

    /// Builds a split from the engineering share, clamped to `[0, 100]`.
    pub fn from_eng(percent: i64) -> Self {
        Self {
            sales: 100 - clamp_percent(percent),
        }
    }

    pub fn sales(self) -> u8 {
        self.sales
    }

    pub fn eng(self) -> u8 {
        100 - self.sales
    }
}

fn clamp_percent(percent: i64) -> u8 {
    // clamped into 0..=100 so the cast is lossless
    percent.clamp(0, 100) as u8
}

/// Derived money fields stored alongside a project record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Financials {
    pub mgmt_fee: Decimal,
    pub personnel_fee: Decimal,
    pub total_cost: Decimal,
    pub net_profit: Decimal,
    pub sales_profit: Decimal,
    pub eng_profit: Decimal,
}

impl Financials {
    /// Derives fees, net profit and the profit split from raw project inputs.
    ///
    /// `net_profit` is not clamped and may be negative when costs exceed the
    /// project amount; the split then distributes the loss.
    pub fn compute(
        amount: Decimal,
        maintenance_cost: Decimal,
        other_cost: Decimal,
        split: ProfitSplit,
    ) -> Self {
        let mgmt_fee = round_whole(amount * mgmt_fee_rate());
        let personnel_fee = round_whole(amount * personnel_fee_rate());
        let total_cost = mgmt_fee + personnel_fee + maintenance_cost + other_cost;
        let net_profit = amount - total_cost;
        let hundred = Decimal::ONE_HUNDRED;
        let sales_profit = round_whole(net_profit * Decimal::from(split.sales()) / hundred);
        let eng_profit = round_whole(net_profit * Decimal::from(split.eng()) / hundred);

        Self {
            mgmt_fee,
            personnel_fee,
            total_cost,
            net_profit,
            sales_profit,
            eng_profit,
        }
    }
}
