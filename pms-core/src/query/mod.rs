//! Filtering, ordering and paging of the cached project collection.

pub mod paginate;

use serde::{Deserialize, Serialize};

use crate::models::{Project, ProjectStatus};

pub use paginate::{paginate, Page, PAGE_SIZE};

/// Listing filters as submitted by the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFilter {
    /// Case-insensitive substring of name, identifier, invoice number or invoice date
    pub search: String,
    pub engineer: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        self.matches_text(project)
            && self
                .engineer
                .as_deref()
                .filter(|e| !e.is_empty())
                .map_or(true, |e| project.engineer == e)
            && self.status.map_or(true, |s| project.status == s)
    }

    fn matches_text(&self, project: &Project) -> bool {
        let needle = self.search.to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let contains = |haystack: &str| haystack.to_lowercase().contains(&needle);

        contains(&project.name)
            || contains(project.id.as_str())
            || project.invoice_number.as_deref().is_some_and(contains)
            || project
                .invoice_date
                .is_some_and(|d| contains(&d.format("%Y-%m-%d").to_string()))
    }

    /// Matching projects, in the order given.
    pub fn apply<'a>(&self, projects: &'a [Project]) -> Vec<&'a Project> {
        projects.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Orders a collection for the project listing: identifier descending.
///
/// The comparison is on the identifier string, matching numeric order only
/// while all identifiers share a digit width.
pub fn sort_for_listing(projects: &mut [Project]) {
    projects.sort_by(|a, b| b.id.cmp(&a.id));
}

/// Filter state of the project listing.
///
/// Any change to a filter sends the view back to the first page.
#[derive(Debug, Clone, PartialEq)]
pub struct ListView {
    filter: ProjectFilter,
    page: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            filter: ProjectFilter::default(),
            page: 1,
        }
    }
}

impl ListView {
    pub fn filter(&self) -> &ProjectFilter {
        &self.filter
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
        self.page = 1;
    }

    pub fn set_engineer(&mut self, engineer: Option<String>) {
        self.filter.engineer = engineer;
        self.page = 1;
    }

    pub fn set_status(&mut self, status: Option<ProjectStatus>) {
        self.filter.status = status;
        self.page = 1;
    }

    /// Moves to `page`, clamped against the current result count.
    pub fn go_to(&mut self, page: usize, projects: &[Project]) {
        let total = self.filter.apply(projects).len();
        self.page = paginate::clamp_page(page, total);
    }

    pub fn next_page(&mut self, projects: &[Project]) {
        self.go_to(self.page + 1, projects);
    }

    pub fn previous_page(&mut self, projects: &[Project]) {
        self.go_to(self.page.saturating_sub(1), projects);
    }

    /// The current page of matching projects.
    pub fn render(&self, projects: &[Project]) -> Page<Project> {
        let matching: Vec<Project> = self.filter.apply(projects).into_iter().cloned().collect();
        paginate(&matching, self.page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::ProjectDraft;
    use crate::models::{ProjectId, ProjectInput};
    use chrono::NaiveDate;

    fn project(seq: u32, name: &str, engineer: &str) -> Project {
        let mut draft = ProjectDraft::new(NaiveDate::from_ymd_opt(2025, 3, 14).unwrap());
        draft.apply(ProjectInput {
            project_year: "114".into(),
            name: name.into(),
            engineer: engineer.into(),
            invoice_date: NaiveDate::from_ymd_opt(2025, 3, 14),
            invoice_number: Some(format!("AB-{seq:08}")),
            ..ProjectInput::default()
        });
        draft.finalize(|| ProjectId::from_sequence(seq)).unwrap()
    }

    fn many(n: u32) -> Vec<Project> {
        (1..=n).map(|i| project(i, &format!("Site {i}"), "Ken")).collect()
    }

    #[test]
    fn test_search_by_name_any_case() {
        let projects = vec![project(1, "Alpha", "Ken"), project(2, "Beta", "Ken")];
        for term in ["alpha", "ALPHA", "Alp"] {
            let filter = ProjectFilter {
                search: term.into(),
                ..ProjectFilter::default()
            };
            let hits: Vec<_> = filter.apply(&projects).iter().map(|p| p.id.as_str()).collect();
            assert_eq!(hits, vec!["P0001"], "term {term}");
        }
    }

    #[test]
    fn test_search_by_id_invoice_number_and_date() {
        let projects = vec![project(1, "Alpha", "Ken"), project(2, "Beta", "Ken")];
        let search = |term: &str| {
            ProjectFilter {
                search: term.into(),
                ..ProjectFilter::default()
            }
            .apply(&projects)
            .len()
        };
        assert_eq!(search("p0002"), 1);
        assert_eq!(search("ab-00000001"), 1);
        assert_eq!(search("2025-03"), 2);
        assert_eq!(search("gamma"), 0);
    }

    #[test]
    fn test_engineer_and_status_filters() {
        let mut projects = vec![project(1, "Alpha", "Ken"), project(2, "Beta", "Sian")];
        projects[1].status = ProjectStatus::UnderWarranty;

        let by_engineer = ProjectFilter {
            engineer: Some("Sian".into()),
            ..ProjectFilter::default()
        };
        assert_eq!(by_engineer.apply(&projects).len(), 1);

        let by_status = ProjectFilter {
            status: Some(ProjectStatus::InProgress),
            ..ProjectFilter::default()
        };
        assert_eq!(by_status.apply(&projects)[0].id.as_str(), "P0001");

        let blank_engineer = ProjectFilter {
            engineer: Some(String::new()),
            ..ProjectFilter::default()
        };
        assert_eq!(blank_engineer.apply(&projects).len(), 2);
    }

    #[test]
    fn test_listing_sorted_by_id_descending() {
        let mut projects = vec![project(2, "b", "Ken"), project(10, "c", "Ken"), project(1, "a", "Ken")];
        sort_for_listing(&mut projects);
        let ids: Vec<_> = projects.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["P0010", "P0002", "P0001"]);
    }

    #[test]
    fn test_filter_change_resets_page() {
        let projects = many(25);
        let mut view = ListView::default();
        view.go_to(3, &projects);
        assert_eq!(view.page(), 3);

        view.set_search("site");
        assert_eq!(view.page(), 1);

        view.go_to(2, &projects);
        view.set_engineer(Some("Ken".into()));
        assert_eq!(view.page(), 1);

        view.go_to(2, &projects);
        view.set_status(None);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_view_navigation_is_clamped() {
        let projects = many(25);
        let mut view = ListView::default();
        view.previous_page(&projects);
        assert_eq!(view.page(), 1);
        view.go_to(7, &projects);
        assert_eq!(view.page(), 3);
        view.next_page(&projects);
        assert_eq!(view.page(), 3);
        assert_eq!(view.render(&projects).items.len(), 5);
    }
}
