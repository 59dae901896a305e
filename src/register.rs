//! Register loader: turns raw sheet rows into typed acts, role ranges and
//! the organizations snapshot.
//!
//! The register scan stops at the first row that has content but fails
//! validation; that row marks the end of the act table. Only rows with no
//! cell values at all are passed over; a cell holding blank text still
//! counts as content and ends the scan.

use crate::model::{
    Act, ActId, Organization, Organizations, Party, RawCell, RegisterRow, Role, RoleRow,
    SourceData,
};
use crate::workbook::{raw_cell, read_rows};
use std::collections::BTreeMap;
use strum::IntoEnumIterator;
use tracing::{debug, info};
use umya_spreadsheet::Worksheet;

/// Column positions of the `Register` sheet, zero-based.
pub mod columns {
    pub const ID_PREFIX: usize = 0;
    pub const ID_NUMBER: usize = 1;
    pub const WORK_DESCRIPTION: usize = 2;
    pub const WORK_START: usize = 3;
    pub const WORK_END: usize = 4;
    pub const ACT_DATE: usize = 5;
    pub const SUBSEQUENT_WORKS: usize = 7;
    pub const MATERIALS: usize = 8;
    pub const EXECUTIVE_SCHEMES: usize = 9;
    pub const PROJECT_NUMBER: usize = 10;
    pub const PROJECT_SHEET: usize = 11;
    pub const REGULATIONS: usize = 12;
    pub const REGULATIONS_EXTRA: usize = 13;
    pub const NOTES: usize = 14;
}

/// Rows shorter than this cannot hold an act date.
pub const MIN_FIELDS: usize = 7;
/// First data row of every source sheet; row 1 is the header.
pub const FIRST_DATA_ROW: u32 = 2;
/// Columns A..O of the register sheet.
const REGISTER_COLUMNS: u32 = 15;
/// Columns A..G of the involved-parties sheet.
const PARTY_COLUMNS: u32 = 7;
/// Columns A..H of the organizations sheet.
const ORGANIZATION_COLUMNS: u32 = 8;

pub fn is_valid_row(row: &[RawCell]) -> bool {
    if row.iter().all(RawCell::is_empty) {
        return false;
    }
    if row.len() < MIN_FIELDS {
        return false;
    }
    if row[columns::ID_PREFIX].is_empty() {
        return false;
    }
    row[columns::ACT_DATE].as_date().is_some()
}

fn field(row: &[RawCell], index: usize) -> Option<String> {
    row.get(index).and_then(RawCell::as_text)
}

fn lenient_date(row: &[RawCell], index: usize) -> Option<chrono::NaiveDate> {
    row.get(index).and_then(RawCell::as_lenient_date)
}

/// Builds an act from a row that already passed [`is_valid_row`].
fn act_from_row(row: &[RawCell], source_row: u32) -> Option<Act> {
    let prefix = field(row, columns::ID_PREFIX)?;
    let act_date = row.get(columns::ACT_DATE)?.as_date()?;
    let number = field(row, columns::ID_NUMBER).unwrap_or_default();

    let regulations = [columns::REGULATIONS, columns::REGULATIONS_EXTRA]
        .into_iter()
        .filter_map(|index| field(row, index))
        .collect::<Vec<_>>();

    Some(Act {
        id: ActId::new(prefix, number),
        act_date,
        work_description: field(row, columns::WORK_DESCRIPTION),
        work_start: lenient_date(row, columns::WORK_START),
        work_end: lenient_date(row, columns::WORK_END),
        subsequent_works: field(row, columns::SUBSEQUENT_WORKS),
        materials: field(row, columns::MATERIALS),
        executive_schemes: field(row, columns::EXECUTIVE_SCHEMES),
        project_number: field(row, columns::PROJECT_NUMBER),
        project_sheet: field(row, columns::PROJECT_SHEET),
        regulations: (!regulations.is_empty()).then(|| regulations.join("\n")),
        notes: field(row, columns::NOTES),
        source_row,
    })
}

/// Parses register rows that start at `first_row` in the sheet.
pub fn load_acts(rows: &[RegisterRow], first_row: u32) -> Vec<Act> {
    let mut acts = Vec::new();
    for (offset, row) in rows.iter().enumerate() {
        let sheet_row = first_row + offset as u32;
        if is_valid_row(row) {
            if let Some(act) = act_from_row(row, sheet_row) {
                acts.push(act);
            }
        } else if row.iter().any(|cell| !matches!(cell, RawCell::Empty)) {
            debug!(row = sheet_row, "register scan stopped at invalid row");
            break;
        }
    }
    acts
}

pub fn load_acts_from_sheet(sheet: &Worksheet) -> Vec<Act> {
    let last_row = sheet.get_highest_row();
    let width = sheet.get_highest_column().max(REGISTER_COLUMNS);
    if last_row < FIRST_DATA_ROW {
        return Vec::new();
    }
    let rows = read_rows(sheet, FIRST_DATA_ROW, last_row, width);
    let acts = load_acts(&rows, FIRST_DATA_ROW);
    info!(
        sheet = sheet.get_name(),
        scanned = rows.len(),
        acts = acts.len(),
        "register loaded"
    );
    acts
}

fn party_from_row(row: &[RawCell]) -> Party {
    Party {
        position: field(row, 1),
        organization: field(row, 2),
        order: field(row, 3),
        certification: field(row, 4),
        person_name: field(row, 5),
        address: field(row, 6),
    }
}

/// Rows of every role range, in ascending row order. Entirely empty rows are
/// dropped; rows without a genuine date keep `valid_from = None`.
pub fn load_role_ranges(sheet: &Worksheet) -> BTreeMap<Role, Vec<RoleRow>> {
    Role::iter()
        .map(|role| {
            let range = role.row_range();
            let rows = read_rows(sheet, *range.start(), *range.end(), PARTY_COLUMNS);
            let entries = rows
                .iter()
                .zip(range)
                .filter(|(cells, _)| cells.iter().any(|cell| !cell.is_empty()))
                .map(|(cells, row)| RoleRow {
                    row,
                    valid_from: cells[0].as_date(),
                    party: party_from_row(cells),
                })
                .collect::<Vec<_>>();
            debug!(role = %role, rows = entries.len(), "role range loaded");
            (role, entries)
        })
        .collect()
}

pub fn load_organizations(sheet: &Worksheet) -> Organizations {
    let mut organizations = Organizations::new();
    let last_row = sheet.get_highest_row();
    for row in FIRST_DATA_ROW..=last_row.max(FIRST_DATA_ROW) {
        let cells: Vec<RawCell> = (1..=ORGANIZATION_COLUMNS)
            .map(|column| raw_cell(sheet, column, row))
            .collect();
        let Some(id) = field(&cells, 0) else {
            continue;
        };
        let name = field(&cells, 2).unwrap_or_else(|| id.clone());
        organizations.insert(
            name.clone(),
            Organization {
                id,
                kind: field(&cells, 1),
                name,
                registration_number: field(&cells, 3),
                tax_id: field(&cells, 4),
                address: field(&cells, 5),
                phone: field(&cells, 6),
                accreditation: field(&cells, 7),
            },
        );
    }
    organizations
}

pub fn load_source(parties: &Worksheet, organizations: &Worksheet) -> SourceData {
    let source = SourceData {
        role_ranges: load_role_ranges(parties),
        organizations: load_organizations(organizations),
    };
    info!(
        organizations = source.organizations.len(),
        role_rows = source.role_ranges.values().map(Vec::len).sum::<usize>(),
        "source data loaded"
    );
    source
}
