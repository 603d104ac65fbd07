//! Spreadsheet export of a project listing.
//!
//! The file is UTF-8 with a byte-order mark so spreadsheet software picks the
//! right encoding. Free-text columns are always quoted.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::Project;

/// Byte-order mark written before the header row.
pub const BOM: char = '\u{FEFF}';

/// Suggested download name.
pub const EXPORT_FILE_NAME: &str = "projects.csv";

/// Column headers, in output order.
pub const HEADERS: [&str; 25] = [
    "Project ID",
    "Project Year",
    "Status",
    "Invoice Date",
    "Invoice Number",
    "Payment Date",
    "Payment Bank",
    "Project Name",
    "Type",
    "Amount",
    "School",
    "Engineer",
    "Has Warranty",
    "Warranty Start",
    "Warranty End",
    "Warranty Bond",
    "Management Fee (10%)",
    "Personnel Fee (5%)",
    "Maintenance Cost",
    "Other Cost",
    "Net Profit",
    "Sales Split %",
    "Sales Profit",
    "Engineering Split %",
    "Engineering Profit",
];

fn quoted(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\"\""))
}

fn date(value: Option<NaiveDate>) -> String {
    value.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
}

fn money(value: Decimal) -> String {
    value.normalize().to_string()
}

fn row(p: &Project) -> [String; 25] {
    let f = &p.financials;
    [
        p.id.to_string(),
        p.project_year.to_string(),
        p.status.to_string(),
        date(p.invoice_date),
        quoted(p.invoice_number.as_deref().unwrap_or_default()),
        date(p.payment_date),
        quoted(p.payment_bank.as_deref().unwrap_or_default()),
        quoted(&p.name),
        p.project_type.to_string(),
        money(p.amount),
        quoted(&p.school),
        quoted(&p.engineer),
        if p.has_warranty { "Yes" } else { "No" }.to_string(),
        date(p.warranty_start),
        date(p.warranty_end),
        money(p.warranty_bond_amount),
        money(f.mgmt_fee),
        money(f.personnel_fee),
        money(p.maintenance_cost),
        money(p.other_cost),
        money(f.net_profit),
        format!("{}%", p.split.sales()),
        money(f.sales_profit),
        format!("{}%", p.split.eng()),
        money(f.eng_profit),
    ]
}

/// Serializes `projects` in the given order, one row each, after the header.
pub fn projects_csv<'a, I>(projects: I) -> String
where
    I: IntoIterator<Item = &'a Project>,
{
    let mut lines = vec![HEADERS.join(",")];
    lines.extend(projects.into_iter().map(|p| row(p).join(",")));

    let mut out = String::new();
    out.push(BOM);
    out.push_str(&lines.join("\n"));
    out
}
