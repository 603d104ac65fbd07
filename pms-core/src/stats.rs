use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Project, ProjectYear};

/// A named total in a ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub name: String,
    pub value: Decimal,
}

/// Profit totals for one project year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStats {
    pub year: ProjectYear,
    pub count: usize,
    pub total_amount: Decimal,
    /// Net profit per client site, highest first
    pub school_data: Vec<RankEntry>,
    /// Net profit per engineer, highest first
    pub eng_data: Vec<RankEntry>,
    /// Net profit per project type, highest first
    pub type_data: Vec<RankEntry>,
    pub total_sales_profit: Decimal,
    pub total_eng_profit: Decimal,
}

impl YearStats {
    /// Sales/engineering profit split as a two-entry ranking, in that order.
    pub fn split_data(&self) -> [RankEntry; 2] {
        [
            RankEntry {
                name: "Sales".to_string(),
                value: self.total_sales_profit,
            },
            RankEntry {
                name: "Engineering".to_string(),
                value: self.total_eng_profit,
            },
        ]
    }
}

/// Accumulates per-name sums, remembering the order names were first seen.
#[derive(Default)]
struct Ranking {
    index: HashMap<String, usize>,
    entries: Vec<RankEntry>,
}

impl Ranking {
    fn add(&mut self, name: &str, value: Decimal) {
        match self.index.get(name) {
            Some(&i) => self.entries[i].value += value,
            None => {
                self.index.insert(name.to_string(), self.entries.len());
                self.entries.push(RankEntry {
                    name: name.to_string(),
                    value,
                });
            }
        }
    }

    /// Highest value first; equal values keep first-seen order.
    fn into_sorted(mut self) -> Vec<RankEntry> {
        self.entries.sort_by(|a, b| b.value.cmp(&a.value));
        self.entries
    }
}

/// Builds the statistics for every project booked under `year`.
pub fn year_stats(projects: &[Project], year: &ProjectYear) -> YearStats {
    let mut schools = Ranking::default();
    let mut engineers = Ranking::default();
    let mut types = Ranking::default();
    let mut count = 0;
    let mut total_amount = Decimal::ZERO;
    let mut total_sales_profit = Decimal::ZERO;
    let mut total_eng_profit = Decimal::ZERO;

    for project in projects.iter().filter(|p| &p.project_year == year) {
        let net = project.financials.net_profit;
        schools.add(&project.school, net);
        engineers.add(&project.engineer, net);
        types.add(&project.project_type.to_string(), net);

        count += 1;
        total_amount += project.amount;
        total_sales_profit += project.financials.sales_profit;
        total_eng_profit += project.financials.eng_profit;
    }

    YearStats {
        year: year.clone(),
        count,
        total_amount,
        school_data: schools.into_sorted(),
        eng_data: engineers.into_sorted(),
        type_data: types.into_sorted(),
        total_sales_profit,
        total_eng_profit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::ProjectDraft;
    use crate::models::{ProjectId, ProjectInput, ProjectType};
    use chrono::NaiveDate;

    fn project(seq: u32, year: &str, school: &str, engineer: &str, net: i64) -> Project {
        let mut draft = ProjectDraft::new(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        draft.apply(ProjectInput {
            project_year: year.into(),
            school: school.into(),
            engineer: engineer.into(),
            amount: Decimal::from(1000),
            ..ProjectInput::default()
        });
        let mut p = draft.finalize(|| ProjectId::from_sequence(seq)).unwrap();
        // pin net profit directly; the ranking only reads stored figures
        p.financials.net_profit = Decimal::from(net);
        p
    }

    fn year(code: &str) -> ProjectYear {
        ProjectYear::parse(code).unwrap()
    }

    #[test]
    fn test_school_ranking_sorted_descending() {
        let projects = vec![project(1, "114", "A", "Ken", 100), project(2, "114", "B", "Ken", 200)];
        let stats = year_stats(&projects, &year("114"));
        assert_eq!(
            stats.school_data,
            vec![
                RankEntry { name: "B".into(), value: Decimal::from(200) },
                RankEntry { name: "A".into(), value: Decimal::from(100) },
            ]
        );
        assert_eq!(stats.eng_data, vec![RankEntry { name: "Ken".into(), value: Decimal::from(300) }]);
        assert_eq!(stats.count, 2);
        assert_eq!(stats.total_amount, Decimal::from(2000));
    }

    #[test]
    fn test_other_years_are_excluded() {
        let projects = vec![project(1, "114", "A", "Ken", 100), project(2, "115", "A", "Ken", 900)];
        let stats = year_stats(&projects, &year("115"));
        assert_eq!(stats.count, 1);
        assert_eq!(stats.school_data[0].value, Decimal::from(900));

        let empty = year_stats(&projects, &year("118"));
        assert_eq!(empty.count, 0);
        assert!(empty.school_data.is_empty());
        assert_eq!(empty.total_amount, Decimal::ZERO);
    }

    #[test]
    fn test_split_totals_and_type_ranking() {
        let mut projects = vec![project(1, "114", "A", "Sian", 0), project(2, "114", "B", "Ken", 0)];
        projects[1].project_type = ProjectType::Maintenance;
        for p in &mut projects {
            p.financials.net_profit = Decimal::from(850);
        }
        let stats = year_stats(&projects, &year("114"));

        // 1000 amount, 40/60 for Sian and 50/50 for Ken
        assert_eq!(stats.total_sales_profit, Decimal::from(340 + 425));
        assert_eq!(stats.total_eng_profit, Decimal::from(510 + 425));
        assert_eq!(stats.split_data()[0].name, "Sales");

        let types: Vec<_> = stats.type_data.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(types, vec!["New", "Maintenance"]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let projects = vec![
            project(1, "114", "C", "Ken", 50),
            project(2, "114", "A", "Ken", 50),
            project(3, "114", "B", "Ken", 75),
        ];
        let names: Vec<_> = year_stats(&projects, &year("114"))
            .school_data
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["B", "C", "A"]);
    }
}
