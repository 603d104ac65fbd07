use crate::models::ProjectId;

/// Picks the identifier for a new project from the identifiers currently loaded.
///
/// The highest parsable numeric suffix wins and the new identifier is one
/// past it; unparsable identifiers are skipped. The scan runs over the local
/// snapshot with no transactional guarantee, so two writers working from the
/// same snapshot will pick the same identifier.
pub fn next_project_id<'a, I>(existing: I) -> ProjectId
where
    I: IntoIterator<Item = &'a ProjectId>,
{
    let max = existing
        .into_iter()
        .filter_map(ProjectId::sequence)
        .max()
        .unwrap_or(0);
    ProjectId::from_sequence(max.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<ProjectId> {
        raw.iter().map(|s| ProjectId::from(*s)).collect()
    }

    #[test]
    fn test_next_id_after_gap() {
        let existing = ids(&["P0001", "P0003"]);
        assert_eq!(next_project_id(&existing).as_str(), "P0004");
    }

    #[test]
    fn test_first_id_on_empty_collection() {
        assert_eq!(next_project_id(&Vec::<ProjectId>::new()).as_str(), "P0001");
    }

    #[test]
    fn test_unparsable_ids_are_ignored() {
        let existing = ids(&["legacy", "P0009", "Pabc", "P0002"]);
        assert_eq!(next_project_id(&existing).as_str(), "P0010");
    }

    #[test]
    fn test_width_grows_past_four_digits() {
        let existing = ids(&["P9999"]);
        assert_eq!(next_project_id(&existing).as_str(), "P10000");
    }

    #[test]
    fn test_assignment_is_repeatable_without_writes() {
        let existing = ids(&["P0001", "P0003"]);
        assert_eq!(next_project_id(&existing), next_project_id(&existing));
    }
}
