use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use strum::{AsRefStr, Display, EnumIter};

use crate::utils::format_number;

/// Raw value of one register cell, before any positional interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Number(f64),
    /// Numeric cell carrying a date number format.
    Date(NaiveDate),
}

impl RawCell {
    pub fn text(value: impl Into<String>) -> Self {
        RawCell::Text(value.into())
    }

    /// Blank text counts as empty, matching how spreadsheet users see it.
    pub fn is_empty(&self) -> bool {
        match self {
            RawCell::Empty => true,
            RawCell::Text(text) => text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            RawCell::Empty => None,
            RawCell::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            RawCell::Number(number) => Some(format_number(*number)),
            RawCell::Date(date) => Some(date.format("%d.%m.%Y").to_string()),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawCell::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// Genuine dates, or text typed as `dd.mm.yyyy`.
    pub fn as_lenient_date(&self) -> Option<NaiveDate> {
        match self {
            RawCell::Date(date) => Some(*date),
            RawCell::Text(text) => NaiveDate::parse_from_str(text.trim(), "%d.%m.%Y").ok(),
            _ => None,
        }
    }
}

/// One register row with positional semantics only.
pub type RegisterRow = Vec<RawCell>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActId {
    pub prefix: String,
    pub number: String,
}

impl ActId {
    pub fn new(prefix: impl Into<String>, number: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            number: number.into(),
        }
    }
}

impl std::fmt::Display for ActId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Act {
    pub id: ActId,
    pub act_date: NaiveDate,
    pub work_description: Option<String>,
    pub work_start: Option<NaiveDate>,
    pub work_end: Option<NaiveDate>,
    pub subsequent_works: Option<String>,
    pub materials: Option<String>,
    pub executive_schemes: Option<String>,
    pub project_number: Option<String>,
    pub project_sheet: Option<String>,
    pub regulations: Option<String>,
    pub notes: Option<String>,
    pub source_row: u32,
}

impl Act {
    /// Minimal act with only the required fields set.
    pub fn new(id: ActId, act_date: NaiveDate) -> Self {
        Self {
            id,
            act_date,
            work_description: None,
            work_start: None,
            work_end: None,
            subsequent_works: None,
            materials: None,
            executive_schemes: None,
            project_number: None,
            project_sheet: None,
            regulations: None,
            notes: None,
            source_row: 0,
        }
    }

    pub fn number(&self) -> String {
        self.id.to_string()
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    ClientTechnicalSupervision,
    GeneralContractor,
    ContractorTechnicalSupervision,
    AuthorSupervision,
    WorkExecutor,
    Other,
}

impl Role {
    /// Fixed block of rows in the involved-parties sheet.
    pub fn row_range(self) -> RangeInclusive<u32> {
        match self {
            Role::ClientTechnicalSupervision => 20..=29,
            Role::GeneralContractor => 30..=39,
            Role::ContractorTechnicalSupervision => 40..=49,
            Role::AuthorSupervision => 50..=59,
            Role::WorkExecutor => 60..=69,
            Role::Other => 70..=79,
        }
    }

    pub fn includes_address(self) -> bool {
        matches!(self, Role::GeneralContractor)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Party {
    pub position: Option<String>,
    pub organization: Option<String>,
    pub order: Option<String>,
    pub certification: Option<String>,
    pub person_name: Option<String>,
    pub address: Option<String>,
}

/// Non-empty row of a role range as it appears in the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRow {
    pub row: u32,
    pub valid_from: Option<NaiveDate>,
    pub party: Party,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleAssignment {
    pub row: u32,
    pub valid_from: NaiveDate,
    pub party: Party,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Organization {
    pub id: String,
    pub kind: Option<String>,
    pub name: String,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub accreditation: Option<String>,
}

/// Organizations keyed by name, in sheet order.
pub type Organizations = IndexMap<String, Organization>;

/// Read-only snapshot shared by every act of a batch.
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub role_ranges: BTreeMap<Role, Vec<RoleRow>>,
    pub organizations: Organizations,
}

impl SourceData {
    pub fn role_rows(&self, role: Role) -> &[RoleRow] {
        self.role_ranges
            .get(&role)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedParty {
    pub assignment: RoleAssignment,
    pub organization: Option<Organization>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPersons {
    parties: BTreeMap<Role, ResolvedParty>,
}

impl ResolvedPersons {
    pub fn insert(&mut self, role: Role, party: ResolvedParty) {
        self.parties.insert(role, party);
    }

    pub fn get(&self, role: Role) -> Option<&ResolvedParty> {
        self.parties.get(&role)
    }

    pub fn len(&self) -> usize {
        self.parties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parties.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActFailure {
    /// Position of the act in register order.
    pub index: usize,
    pub act_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub total: usize,
    pub succeeded: usize,
    pub failures: Vec<ActFailure>,
    pub sheets: Vec<String>,
    pub output: PathBuf,
}

impl BatchResult {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn is_partial_success(&self) -> bool {
        self.succeeded > 0 && !self.failures.is_empty()
    }
}
