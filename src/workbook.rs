use crate::error::GenerationError;
use crate::model::{RawCell, RegisterRow};
use crate::recovery::{FixedDelay, RetryConfig, retry_with_policy};
use crate::utils::{cell_address, excel_serial_to_date, is_date_format};
use anyhow::{Context, anyhow};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Reads an xlsx workbook, retrying transient failures. A missing file is
/// reported immediately without retrying.
pub fn load_workbook(path: &Path, retry: &RetryConfig) -> Result<Spreadsheet, GenerationError> {
    if !path.is_file() {
        return Err(GenerationError::InputMissing {
            path: path.to_path_buf(),
        });
    }

    let policy = FixedDelay::new(retry.clone());
    let book = retry_with_policy(
        |attempt| {
            debug!(path = %path.display(), attempt, "reading workbook");
            umya_spreadsheet::reader::xlsx::read(path)
                .with_context(|| format!("failed to parse workbook {:?}", path))
        },
        &policy,
        "load_workbook",
    )
    .map_err(|exhausted| GenerationError::Load {
        path: path.to_path_buf(),
        attempts: exhausted.attempts,
        message: format!("{:#}", exhausted.last_error),
    })?;

    info!(
        path = %path.display(),
        sheets = book.get_sheet_collection().len(),
        "workbook loaded"
    );
    Ok(book)
}

/// Writes the workbook next to its destination first, then swaps it into
/// place, so an interrupted save never leaves a half-written artifact.
pub fn save_workbook_atomic(
    book: &Spreadsheet,
    path: &Path,
    retry: &RetryConfig,
) -> Result<(), GenerationError> {
    let policy = FixedDelay::new(retry.clone());
    retry_with_policy(|_| write_once(book, path), &policy, "save_workbook").map_err(
        |exhausted| GenerationError::Save {
            path: path.to_path_buf(),
            attempts: exhausted.attempts,
            message: format!("{:#}", exhausted.last_error),
        },
    )?;
    info!(path = %path.display(), "workbook saved");
    Ok(())
}

fn write_once(book: &Spreadsheet, path: &Path) -> anyhow::Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    if path.file_name().is_none() {
        return Err(anyhow!("output path {:?} has no file name", path));
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create directory {:?}", dir))?;

    let temp = tempfile::Builder::new()
        .prefix(".aosr-")
        .suffix(".xlsx.tmp")
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temp file in {:?}", dir))?;
    umya_spreadsheet::writer::xlsx::write(book, temp.path())
        .with_context(|| format!("failed to write workbook to {:?}", temp.path()))?;

    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("failed to remove previous output {:?}", path))?;
    }
    temp.persist(path)
        .map_err(|err| anyhow!("failed to move temp file into {:?}: {}", path, err.error))?;
    Ok(())
}

pub fn sheet_by_name<'a>(
    book: &'a Spreadsheet,
    name: &str,
    path: &Path,
) -> Result<&'a Worksheet, GenerationError> {
    book.get_sheet_by_name(name)
        .ok_or_else(|| GenerationError::SheetMissing {
            path: path.to_path_buf(),
            sheet: name.to_string(),
        })
}

/// The template is the first sheet of its workbook.
pub fn template_sheet<'a>(
    book: &'a Spreadsheet,
    path: &Path,
) -> Result<&'a Worksheet, GenerationError> {
    book.get_sheet_collection()
        .iter()
        .next()
        .ok_or_else(|| GenerationError::TemplateEmpty {
            path: path.to_path_buf(),
        })
}

/// Typed view of one cell. Numbers formatted as dates become dates; text that
/// merely looks like a date stays text.
pub fn raw_cell(sheet: &Worksheet, column: u32, row: u32) -> RawCell {
    let address = cell_address(column, row);
    let Some(cell) = sheet.get_cell(address.as_str()) else {
        return RawCell::Empty;
    };

    if let Some(number) = cell.get_value_number() {
        let date_formatted = cell
            .get_style()
            .get_number_format()
            .map(|format| is_date_format(format.get_format_code()))
            .unwrap_or(false);
        if date_formatted && let Some(date) = excel_serial_to_date(number) {
            return RawCell::Date(date);
        }
        return RawCell::Number(number);
    }

    let value = cell.get_value();
    if value.is_empty() {
        RawCell::Empty
    } else {
        RawCell::Text(value.into_owned())
    }
}

/// Reads rows `first_row..=last_row`, each exactly `width` cells wide.
pub fn read_rows(sheet: &Worksheet, first_row: u32, last_row: u32, width: u32) -> Vec<RegisterRow> {
    (first_row..=last_row)
        .map(|row| (1..=width).map(|column| raw_cell(sheet, column, row)).collect())
        .collect()
}
