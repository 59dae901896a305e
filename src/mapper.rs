//! Field mapper: writes an act and its resolved parties into a cloned sheet.

use crate::model::{Act, Organization, Party, ResolvedPersons, Role};
use crate::template::SheetWriter;
use anyhow::Result;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;
use umya_spreadsheet::Worksheet;

/// Materials cell value meaning no certificates are attached.
pub const MATERIALS_NOT_USED: &str = "not used";
/// Row height per text line, in points.
pub const LINE_HEIGHT: f64 = 15.0;

/// Fills one output sheet. The orchestrator is generic over this so that
/// alternative layouts can be plugged in.
pub trait SheetFiller {
    fn fill(&self, sheet: &mut Worksheet, act: &Act, persons: &ResolvedPersons) -> Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct DateCells {
    pub day: &'static str,
    pub month: &'static str,
    pub year: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub struct RoleCells {
    pub role: Role,
    pub details: &'static str,
    pub signature: &'static str,
    pub organization: Option<&'static str>,
}

/// Template coordinates.
pub mod cells {
    use super::{DateCells, RoleCells};
    use crate::model::Role;

    pub const ACT_NUMBER: &str = "C8";
    pub const ACT_DATE: DateCells = DateCells {
        day: "K8",
        month: "O8",
        year: "S8",
    };
    pub const WORK_DESCRIPTION: &str = "A45";
    pub const PROJECT_REFERENCE: &str = "A49";
    pub const MATERIALS: &str = "A51";
    pub const WORK_START: DateCells = DateCells {
        day: "K56",
        month: "O56",
        year: "S56",
    };
    pub const WORK_END: DateCells = DateCells {
        day: "K57",
        month: "O57",
        year: "S57",
    };
    pub const EXECUTIVE_SCHEMES: &str = "F59";
    pub const REGULATIONS: &str = "A61";
    pub const SUBSEQUENT_WORKS: &str = "A63";
    pub const NOTES: &str = "K65";
    pub const ATTACHMENTS: &str = "A68";

    pub const ROLES: [RoleCells; 6] = [
        RoleCells {
            role: Role::ClientTechnicalSupervision,
            details: "A21",
            signature: "K72",
            organization: Some("A11"),
        },
        RoleCells {
            role: Role::GeneralContractor,
            details: "A23",
            signature: "K74",
            organization: Some("A13"),
        },
        RoleCells {
            role: Role::ContractorTechnicalSupervision,
            details: "A25",
            signature: "K76",
            organization: None,
        },
        RoleCells {
            role: Role::AuthorSupervision,
            details: "A27",
            signature: "K78",
            organization: Some("A15"),
        },
        RoleCells {
            role: Role::WorkExecutor,
            details: "A29",
            signature: "K80",
            organization: None,
        },
        RoleCells {
            role: Role::Other,
            details: "A31",
            signature: "K82",
            organization: None,
        },
    ];
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

pub fn attachments_text(act: &Act) -> Option<String> {
    let mut lines = Vec::new();
    if let Some(schemes) = non_blank(act.executive_schemes.as_deref()) {
        lines.push(schemes.to_string());
    }
    if let Some(materials) = non_blank(act.materials.as_deref())
        && materials != MATERIALS_NOT_USED
    {
        lines.push(format!("Certificates for materials: {materials}"));
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

pub fn person_details(party: &Party, include_address: bool) -> Option<String> {
    let mut parts: Vec<&str> = [party.position.as_deref(), party.organization.as_deref()]
        .into_iter()
        .filter_map(non_blank)
        .collect();
    if include_address && let Some(address) = non_blank(party.address.as_deref()) {
        parts.push(address);
    }

    let mut references = Vec::new();
    if let Some(order) = non_blank(party.order.as_deref()) {
        references.push(format!("Order: {order}"));
    }
    if let Some(certification) = non_blank(party.certification.as_deref()) {
        references.push(format!("Certification: {certification}"));
    }

    let base = parts.join(", ");
    let text = match (base.is_empty(), references.is_empty()) {
        (true, true) => return None,
        (false, true) => base,
        (true, false) => format!("({})", references.join("; ")),
        (false, false) => format!("{base} ({})", references.join("; ")),
    };
    Some(text)
}

pub fn organization_requisites(organization: &Organization) -> Option<String> {
    let parts: Vec<String> = [
        non_blank(Some(organization.name.as_str())).map(str::to_string),
        non_blank(organization.registration_number.as_deref()).map(|v| format!("OGRN {v}")),
        non_blank(organization.tax_id.as_deref()).map(|v| format!("INN {v}")),
        non_blank(organization.address.as_deref()).map(str::to_string),
        non_blank(organization.phone.as_deref()).map(|v| format!("tel. {v}")),
        non_blank(organization.accreditation.as_deref()).map(|v| format!("SRO {v}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join(", "))
}

pub fn project_reference(act: &Act) -> Option<String> {
    let parts: Vec<String> = [
        non_blank(act.project_number.as_deref()).map(|v| format!("№ {v}")),
        non_blank(act.project_sheet.as_deref()).map(|v| format!("sheet {v}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    (!parts.is_empty()).then(|| parts.join("\n"))
}

/// Default layout: the fixed coordinate table in [`cells`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ActFieldMapper;

impl ActFieldMapper {
    fn write_date(writer: &mut SheetWriter<'_>, target: DateCells, date: Option<NaiveDate>) {
        let Some(date) = date else {
            return;
        };
        writer.write_number(target.day, date.day() as f64);
        writer.write_number(target.month, date.month() as f64);
        writer.write_number(target.year, date.year() as f64);
    }

    fn write_optional(writer: &mut SheetWriter<'_>, address: &str, value: Option<&str>) {
        if let Some(value) = non_blank(value) {
            writer.write_text(address, value);
        }
    }
}

impl SheetFiller for ActFieldMapper {
    fn fill(&self, sheet: &mut Worksheet, act: &Act, persons: &ResolvedPersons) -> Result<()> {
        let mut writer = SheetWriter::new(sheet);

        writer.write_text(cells::ACT_NUMBER, &act.number());
        Self::write_date(&mut writer, cells::ACT_DATE, Some(act.act_date));

        for slot in cells::ROLES {
            let Some(resolved) = persons.get(slot.role) else {
                continue;
            };
            let party = &resolved.assignment.party;
            if let Some(details) = person_details(party, slot.role.includes_address()) {
                writer.write_text(slot.details, &details);
            }
            Self::write_optional(&mut writer, slot.signature, party.person_name.as_deref());
            if let Some(address) = slot.organization
                && let Some(requisites) = resolved
                    .organization
                    .as_ref()
                    .and_then(organization_requisites)
            {
                writer.write_text(address, &requisites);
            }
        }

        Self::write_optional(
            &mut writer,
            cells::WORK_DESCRIPTION,
            act.work_description.as_deref(),
        );
        Self::write_optional(
            &mut writer,
            cells::PROJECT_REFERENCE,
            project_reference(act).as_deref(),
        );
        Self::write_optional(&mut writer, cells::MATERIALS, act.materials.as_deref());
        Self::write_date(&mut writer, cells::WORK_START, act.work_start);
        Self::write_date(&mut writer, cells::WORK_END, act.work_end);
        Self::write_optional(
            &mut writer,
            cells::EXECUTIVE_SCHEMES,
            act.executive_schemes.as_deref(),
        );
        Self::write_optional(&mut writer, cells::REGULATIONS, act.regulations.as_deref());
        Self::write_optional(
            &mut writer,
            cells::SUBSEQUENT_WORKS,
            act.subsequent_works.as_deref(),
        );
        Self::write_optional(&mut writer, cells::NOTES, act.notes.as_deref());
        Self::write_optional(
            &mut writer,
            cells::ATTACHMENTS,
            attachments_text(act).as_deref(),
        );

        let adjusted = adjust_row_heights(writer.sheet_mut());
        debug!(act = %act.id, rows_adjusted = adjusted, "act fields written");
        Ok(())
    }
}

/// Sets `LINE_HEIGHT × lines` on every row whose tallest text cell spans more
/// than one line. Returns the number of rows changed.
pub fn adjust_row_heights(sheet: &mut Worksheet) -> usize {
    let mut tallest: BTreeMap<u32, usize> = BTreeMap::new();
    for cell in sheet.get_cell_collection() {
        let lines = cell.get_value().matches('\n').count() + 1;
        if lines > 1 {
            let entry = tallest.entry(*cell.get_coordinate().get_row_num()).or_insert(0);
            *entry = (*entry).max(lines);
        }
    }

    for (row, lines) in &tallest {
        let dimension = sheet.get_row_dimension_mut(row);
        dimension.set_height(LINE_HEIGHT * *lines as f64);
        dimension.set_custom_height(true);
    }
    tallest.len()
}
