use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Project, ProjectId};

/// Returned by [`days_remaining`] when a project has no warranty end date.
pub const NO_END_DATE: i64 = -999;

/// Upper bound of the alert window, in days before expiry.
pub const ALERT_WINDOW_DAYS: i64 = 180;

/// Alerts stop once a warranty has been expired this many days.
pub const ALERT_GRACE_DAYS: i64 = 30;

const DAY_MILLIS: i64 = 86_400_000;

/// Whole days from `now` until the start of `end` (UTC), rounded up.
///
/// Any part of a day left counts as a full day, so an end date ten calendar
/// days ahead reports 10 at any time of the current day.
pub fn days_remaining(end: Option<NaiveDate>, now: DateTime<Utc>) -> i64 {
    let Some(end) = end else {
        return NO_END_DATE;
    };
    let end_millis = end.and_time(chrono::NaiveTime::MIN).and_utc().timestamp_millis();
    let diff = end_millis - now.timestamp_millis();
    let days = diff.div_euclid(DAY_MILLIS);
    if diff.rem_euclid(DAY_MILLIS) == 0 {
        days
    } else {
        days + 1
    }
}

/// True when a notice should be raised for a warranty this close to expiry.
pub fn is_alerting(days: i64) -> bool {
    days <= ALERT_WINDOW_DAYS && days > -ALERT_GRACE_DAYS
}

/// Display severity; no lower bound.
pub fn is_urgent(days: i64) -> bool {
    days <= ALERT_WINDOW_DAYS
}

/// Outcome of evaluating one warranty end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyStatus {
    pub days_remaining: i64,
    pub alerting: bool,
    pub urgent: bool,
    pub expired: bool,
}

impl WarrantyStatus {
    pub fn evaluate(end: Option<NaiveDate>, now: DateTime<Utc>) -> Self {
        let days = days_remaining(end, now);
        Self {
            days_remaining: days,
            alerting: end.is_some() && is_alerting(days),
            urgent: is_urgent(days),
            expired: days < 0,
        }
    }
}

impl fmt::Display for WarrantyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.expired {
            write!(f, "expired")
        } else {
            write!(f, "{} days remaining", self.days_remaining)
        }
    }
}

/// Textual notice for a project whose warranty is about to run out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarrantyNotice {
    pub project_id: ProjectId,
    pub days_remaining: i64,
    pub message: String,
    pub generated_at: DateTime<Utc>,
}

impl WarrantyNotice {
    /// Key unique to a project at a given distance from expiry.
    pub fn key(&self) -> String {
        format!("{}{}", self.project_id, self.days_remaining)
    }
}

/// One evaluation pass: a notice for every warranted project inside the
/// alert window, in collection order.
pub fn collect_notices(projects: &[Project], now: DateTime<Utc>) -> Vec<WarrantyNotice> {
    projects
        .iter()
        .filter(|p| p.has_warranty && p.warranty_end.is_some())
        .filter_map(|p| {
            let days = days_remaining(p.warranty_end, now);
            is_alerting(days).then(|| WarrantyNotice {
                project_id: p.id.clone(),
                days_remaining: days,
                message: format!(
                    "[Automatic notice] Warranty for project {} expires in {} days.",
                    p.id, days
                ),
                generated_at: now,
            })
        })
        .collect()
}

/// Warranted projects ordered by end date, soonest first.
///
/// Projects flagged as warranted but missing an end date sort last.
pub fn warranty_listing(projects: &[Project]) -> Vec<&Project> {
    let mut listing: Vec<&Project> = projects.iter().filter(|p| p.has_warranty).collect();
    listing.sort_by(|a, b| match (a.warranty_end, b.warranty_end) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::ProjectDraft;
    use crate::models::ProjectInput;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 20, 9, 30, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn warranted(seq: u32, end: Option<NaiveDate>) -> Project {
        let mut draft = ProjectDraft::new(today());
        draft.apply(ProjectInput {
            project_year: "114".into(),
            has_warranty: true,
            warranty_end: end,
            ..ProjectInput::default()
        });
        draft.finalize(|| ProjectId::from_sequence(seq)).unwrap()
    }

    #[test]
    fn test_ten_days_out_is_alerting() {
        let status = WarrantyStatus::evaluate(Some(today() + Duration::days(10)), now());
        assert_eq!(status.days_remaining, 10);
        assert!(status.alerting);
        assert!(status.urgent);
        assert!(!status.expired);
    }

    #[test]
    fn test_two_hundred_days_out_is_quiet() {
        let status = WarrantyStatus::evaluate(Some(today() + Duration::days(200)), now());
        assert_eq!(status.days_remaining, 200);
        assert!(!status.alerting);
        assert!(!status.urgent);
    }

    #[test]
    fn test_missing_end_date_uses_sentinel() {
        let status = WarrantyStatus::evaluate(None, now());
        assert_eq!(status.days_remaining, NO_END_DATE);
        assert!(!status.alerting);
    }

    #[test]
    fn test_days_remaining_rounds_up() {
        let midnight = Utc.with_ymd_and_hms(2025, 8, 20, 0, 0, 0).unwrap();
        assert_eq!(days_remaining(Some(today() + Duration::days(3)), midnight), 3);
        // end is today: already partway through the day
        assert_eq!(days_remaining(Some(today()), now()), 0);
        assert_eq!(days_remaining(Some(today() - Duration::days(1)), now()), -1);
    }

    #[test]
    fn test_alert_window_bounds() {
        assert!(is_alerting(180));
        assert!(!is_alerting(181));
        assert!(is_alerting(-29));
        assert!(!is_alerting(-30));
        assert!(is_urgent(-500));
    }

    #[test]
    fn test_collect_notices_once_per_qualifying_project() {
        let projects = vec![
            warranted(1, Some(today() + Duration::days(10))),
            warranted(2, Some(today() + Duration::days(400))),
            warranted(3, None),
            warranted(4, Some(today() - Duration::days(5))),
        ];
        let notices = collect_notices(&projects, now());
        let ids: Vec<_> = notices.iter().map(|n| n.project_id.as_str()).collect();
        assert_eq!(ids, vec!["P0001", "P0004"]);
        assert_eq!(notices[0].key(), "P000110");
        assert!(notices[0].message.contains("P0001"));
        assert!(notices[0].message.contains("10 days"));
    }

    #[test]
    fn test_listing_sorted_soonest_first() {
        let mut unwarranted = warranted(5, Some(today()));
        unwarranted.has_warranty = false;
        let projects = vec![
            warranted(1, Some(today() + Duration::days(90))),
            warranted(2, None),
            unwarranted,
            warranted(3, Some(today() + Duration::days(3))),
        ];
        let ids: Vec<_> = warranty_listing(&projects)
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["P0003", "P0001", "P0002"]);
    }
}
