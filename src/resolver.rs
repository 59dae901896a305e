//! As-of resolution of role assignments.

use crate::model::{ResolvedParty, ResolvedPersons, Role, RoleAssignment, RoleRow, SourceData};
use chrono::NaiveDate;
use strum::IntoEnumIterator;
use tracing::{debug, trace};

/// Picks the row with the latest `valid_from` not after `as_of`. Rows are
/// scanned in ascending order and a later row with an equal date never
/// replaces an earlier one.
pub fn resolve(rows: &[RoleRow], as_of: NaiveDate) -> Option<RoleAssignment> {
    let mut best: Option<&RoleRow> = None;
    let mut best_date: Option<NaiveDate> = None;

    for row in rows {
        let Some(valid_from) = row.valid_from else {
            trace!(row = row.row, "role row without a valid date skipped");
            continue;
        };
        if valid_from > as_of {
            continue;
        }
        if best_date.is_none_or(|current| valid_from > current) {
            best = Some(row);
            best_date = Some(valid_from);
        }
    }

    let row = best?;
    Some(RoleAssignment {
        row: row.row,
        valid_from: best_date?,
        party: row.party.clone(),
    })
}

/// Resolves every role as of `as_of` and attaches the organization record
/// named by each assignment.
pub fn resolve_persons(source: &SourceData, as_of: NaiveDate) -> ResolvedPersons {
    let mut persons = ResolvedPersons::default();
    for role in Role::iter() {
        let Some(assignment) = resolve(source.role_rows(role), as_of) else {
            debug!(role = %role, %as_of, "no assignment in effect");
            continue;
        };
        let organization = assignment
            .party
            .organization
            .as_ref()
            .and_then(|name| source.organizations.get(name))
            .cloned();
        persons.insert(
            role,
            ResolvedParty {
                assignment,
                organization,
            },
        );
    }
    persons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Organization, Party};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn row(row: u32, valid_from: Option<NaiveDate>, name: &str) -> RoleRow {
        RoleRow {
            row,
            valid_from,
            party: Party {
                person_name: Some(name.to_string()),
                ..Party::default()
            },
        }
    }

    #[test]
    fn picks_latest_assignment_not_after_as_of() {
        let rows = vec![
            row(60, Some(day(2023, 6, 1)), "Ivanov"),
            row(61, Some(day(2024, 2, 1)), "Petrov"),
            row(62, Some(day(2024, 1, 10)), "Sidorov"),
        ];
        let resolved = resolve(&rows, day(2024, 1, 15)).expect("assignment");
        assert_eq!(resolved.row, 62);
        assert_eq!(resolved.valid_from, day(2024, 1, 10));

        let later = resolve(&rows, day(2024, 3, 1)).expect("assignment");
        assert_eq!(later.row, 61);
    }

    #[test]
    fn equal_dates_keep_the_earliest_row() {
        let rows = vec![
            row(60, Some(day(2024, 1, 1)), "First"),
            row(61, Some(day(2024, 1, 1)), "Duplicate"),
        ];
        let resolved = resolve(&rows, day(2024, 1, 15)).expect("assignment");
        assert_eq!(resolved.row, 60);
        assert_eq!(resolved.party.person_name.as_deref(), Some("First"));
    }

    #[test]
    fn undated_rows_are_skipped_and_misses_are_empty() {
        let rows = vec![
            row(60, None, "Undated"),
            row(61, Some(day(2025, 1, 1)), "Future"),
        ];
        assert_eq!(resolve(&rows, day(2024, 1, 15)), None);
        assert_eq!(resolve(&[], day(2024, 1, 15)), None);

        let with_valid = vec![row(60, None, "Undated"), row(61, Some(day(2024, 1, 1)), "Ok")];
        assert_eq!(resolve(&with_valid, day(2024, 1, 15)).map(|a| a.row), Some(61));
    }

    #[test]
    fn as_of_date_itself_is_inclusive() {
        let rows = vec![row(20, Some(day(2024, 1, 15)), "Same day")];
        assert!(resolve(&rows, day(2024, 1, 15)).is_some());
        assert!(resolve(&rows, day(2024, 1, 14)).is_none());
    }

    #[test]
    fn resolve_persons_attaches_organization() {
        let mut source = SourceData::default();
        let mut executor = row(60, Some(day(2024, 1, 1)), "Ivanov");
        executor.party.organization = Some("StroyMontazh".to_string());
        source.role_ranges.insert(Role::WorkExecutor, vec![executor]);
        source.organizations.insert(
            "StroyMontazh".to_string(),
            Organization {
                id: "ORG-1".to_string(),
                name: "StroyMontazh".to_string(),
                ..Organization::default()
            },
        );

        let persons = resolve_persons(&source, day(2024, 1, 15));
        assert_eq!(persons.len(), 1);
        let party = persons.get(Role::WorkExecutor).expect("executor");
        assert_eq!(party.organization.as_ref().map(|o| o.id.as_str()), Some("ORG-1"));
        assert!(persons.get(Role::GeneralContractor).is_none());
    }
}
