#![allow(dead_code)]

use std::path::{Path, PathBuf};

use aosr_acts::config::{DEFAULT_ORGANIZATIONS_SHEET, DEFAULT_PARTIES_SHEET, DEFAULT_REGISTER_SHEET};
use aosr_acts::model::{Act, ActId};
use aosr_acts::utils::date_to_excel_serial;
use aosr_acts::{CliArgs, GeneratorConfig};
use chrono::NaiveDate;
use tempfile::{TempDir, tempdir};
use umya_spreadsheet::{self, Spreadsheet, Worksheet};

pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub fn write_workbook_to_path<F>(path: &Path, f: F)
where
    F: FnOnce(&mut Spreadsheet),
{
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create dir");
    }
    let mut book = umya_spreadsheet::new_file();
    f(&mut book);
    umya_spreadsheet::writer::xlsx::write(&book, path).expect("write workbook");
}

pub fn read_workbook(path: &Path) -> Spreadsheet {
    umya_spreadsheet::reader::xlsx::read(path).expect("read workbook")
}

/// Numeric cell with a date number format, the way spreadsheet apps store dates.
pub fn set_date(sheet: &mut Worksheet, address: &str, date: NaiveDate) {
    sheet
        .get_cell_mut(address)
        .set_value_number(date_to_excel_serial(date));
    sheet
        .get_style_mut(address)
        .get_number_format_mut()
        .set_format_code("dd.mm.yyyy");
}

pub fn cell_text(sheet: &Worksheet, address: &str) -> Option<String> {
    sheet
        .get_cell(address)
        .map(|cell| cell.get_value().to_string())
        .filter(|value| !value.is_empty())
}

pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|sheet| sheet.get_name().to_string())
        .collect()
}

pub fn write_act_row(sheet: &mut Worksheet, row: u32, prefix: &str, number: &str, act_date: NaiveDate) {
    sheet.get_cell_mut(format!("A{row}").as_str()).set_value(prefix);
    sheet.get_cell_mut(format!("B{row}").as_str()).set_value(number);
    sheet
        .get_cell_mut(format!("C{row}").as_str())
        .set_value(format!("Waterproofing of foundation slab, section {number}"));
    set_date(sheet, format!("F{row}").as_str(), act_date);
}

pub fn write_party_row(
    sheet: &mut Worksheet,
    row: u32,
    valid_from: NaiveDate,
    position: &str,
    organization: &str,
    name: &str,
) {
    set_date(sheet, format!("A{row}").as_str(), valid_from);
    sheet.get_cell_mut(format!("B{row}").as_str()).set_value(position);
    sheet.get_cell_mut(format!("C{row}").as_str()).set_value(organization);
    sheet.get_cell_mut(format!("F{row}").as_str()).set_value(name);
}

pub fn write_organization_row(sheet: &mut Worksheet, row: u32, id: &str, name: &str, tax_id: &str) {
    sheet.get_cell_mut(format!("A{row}").as_str()).set_value(id);
    sheet.get_cell_mut(format!("B{row}").as_str()).set_value("LLC");
    sheet.get_cell_mut(format!("C{row}").as_str()).set_value(name);
    sheet.get_cell_mut(format!("E{row}").as_str()).set_value(tax_id);
}

/// Register with three acts, a contractor and two succeeding work executors.
pub fn populate_register(book: &mut Spreadsheet) {
    let organizations = book
        .new_sheet(DEFAULT_ORGANIZATIONS_SHEET)
        .expect("organizations sheet");
    organizations.get_cell_mut("A1").set_value("Id");
    organizations.get_cell_mut("C1").set_value("Name");
    write_organization_row(organizations, 2, "ORG-1", "StroyMontazh", "7700000001");
    write_organization_row(organizations, 3, "ORG-2", "TechNadzor", "7700000002");

    let parties = book.new_sheet(DEFAULT_PARTIES_SHEET).expect("parties sheet");
    write_party_row(parties, 20, day(2023, 1, 10), "Inspector", "TechNadzor", "Sidorov S.S.");
    write_party_row(parties, 30, day(2023, 1, 10), "Site manager", "StroyMontazh", "Kuznetsov K.K.");
    parties.get_cell_mut("G30").set_value("Moscow, Lenina 1");
    write_party_row(parties, 60, day(2023, 6, 1), "Foreman", "StroyMontazh", "Ivanov I.I.");
    write_party_row(parties, 61, day(2024, 2, 1), "Foreman", "StroyMontazh", "Petrov P.P.");

    let register = book.new_sheet(DEFAULT_REGISTER_SHEET).expect("register sheet");
    register.get_cell_mut("A1").set_value("Prefix");
    register.get_cell_mut("B1").set_value("Number");
    register.get_cell_mut("F1").set_value("Act date");
    write_act_row(register, 2, "AOSR-", "1", day(2024, 1, 15));
    write_act_row(register, 3, "AOSR-", "2", day(2024, 2, 20));
    write_act_row(register, 4, "AOSR-", "3", day(2024, 3, 5));
}

/// Template with merges around the field coordinates, dimensions and a
/// styled header.
pub fn populate_template(sheet: &mut Worksheet) {
    sheet.get_cell_mut("A1").set_value("ACT OF HIDDEN WORKS INSPECTION");
    sheet.get_style_mut("A1").get_font_mut().set_bold(true);
    sheet.get_cell_mut("A8").set_value("No.");
    sheet.get_cell_mut("D2").set_value_number(42);

    for range in ["A1:S1", "C8:H8", "A45:S45", "A21:S21", "J65:M65"] {
        sheet.add_merge_cells(range);
    }
    sheet.get_column_dimension_mut("A").set_width(18.5);
    sheet.get_column_dimension_mut("K").set_width(7.25);
    sheet.get_row_dimension_mut(&1).set_height(32.0);
    sheet.get_row_dimension_mut(&1).set_custom_height(true);
}

pub fn template_book() -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();
    if let Some(sheet) = book.get_sheet_by_name_mut("Sheet1") {
        sheet.set_name("Template");
        populate_template(sheet);
    }
    book
}

pub fn act(prefix: &str, number: &str, act_date: NaiveDate) -> Act {
    Act::new(ActId::new(prefix, number), act_date)
}

pub struct TestWorkspace {
    _tempdir: TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new() -> Self {
        let tempdir = tempdir().expect("tempdir");
        let root = tempdir.path().to_path_buf();
        Self {
            _tempdir: tempdir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn create_workbook<F>(&self, name: &str, f: F) -> PathBuf
    where
        F: FnOnce(&mut Spreadsheet),
    {
        let path = self.path(name);
        write_workbook_to_path(&path, f);
        path
    }

    /// Writes `data/register.xlsx` and `data/template.xlsx`.
    pub fn with_sample_inputs(self) -> Self {
        self.create_workbook("data/register.xlsx", populate_register);
        self.create_workbook("data/template.xlsx", |book| {
            if let Some(sheet) = book.get_sheet_by_name_mut("Sheet1") {
                populate_template(sheet);
            }
        });
        self
    }

    pub fn config(&self) -> GeneratorConfig {
        GeneratorConfig::from_args(CliArgs {
            data_dir: Some(self.path("data")),
            output_dir: Some(self.path("output")),
            load_attempts: Some(1),
            retry_delay_ms: Some(0),
            ..CliArgs::default()
        })
        .expect("config")
    }
}
