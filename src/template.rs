//! Style-preserving template replication.
//!
//! A clone is built as a standalone [`Worksheet`] that owns copies of every
//! style component, so later writes to the clone never reach the template.

use crate::utils::{CellSpan, cell_address, column_number_to_name, parse_cell_address, parse_range};
use tracing::{debug, trace};
use umya_spreadsheet::{Style, Worksheet};

/// Merged ranges of a sheet, used to tell anchors from covered cells.
#[derive(Debug, Clone, Default)]
pub struct MergeMap {
    spans: Vec<CellSpan>,
}

impl MergeMap {
    pub fn from_sheet(sheet: &Worksheet) -> Self {
        let spans = sheet
            .get_merge_cells()
            .iter()
            .filter_map(|range| parse_range(&range.get_range()))
            .collect();
        Self { spans }
    }

    pub fn spans(&self) -> &[CellSpan] {
        &self.spans
    }

    /// True for cells inside a merged range other than its top-left anchor.
    pub fn is_covered(&self, column: u32, row: u32) -> bool {
        self.spans
            .iter()
            .any(|span| span.contains(column, row) && !span.is_anchor(column, row))
    }
}

/// Writes values into a sheet, silently dropping writes that target covered
/// cells of merged ranges.
pub struct SheetWriter<'a> {
    sheet: &'a mut Worksheet,
    merges: MergeMap,
}

impl<'a> SheetWriter<'a> {
    pub fn new(sheet: &'a mut Worksheet) -> Self {
        let merges = MergeMap::from_sheet(sheet);
        Self { sheet, merges }
    }

    fn writable(&self, address: &str) -> bool {
        match parse_cell_address(address) {
            Some((column, row)) if self.merges.is_covered(column, row) => {
                debug!(address, "write to merged cell ignored");
                false
            }
            Some(_) => true,
            None => {
                debug!(address, "write to malformed address ignored");
                false
            }
        }
    }

    pub fn write_text(&mut self, address: &str, value: &str) -> bool {
        if !self.writable(address) {
            return false;
        }
        self.sheet.get_cell_mut(address).set_value(value);
        true
    }

    pub fn write_number(&mut self, address: &str, value: f64) -> bool {
        if !self.writable(address) {
            return false;
        }
        self.sheet.get_cell_mut(address).set_value_number(value);
        true
    }

    pub fn sheet_mut(&mut self) -> &mut Worksheet {
        &mut *self.sheet
    }
}

fn has_style(style: &Style) -> bool {
    style.get_font().is_some()
        || style.get_borders().is_some()
        || style.get_fill().is_some()
        || style.get_number_format().is_some()
        || style.get_protection().is_some()
        || style.get_alignment().is_some()
}

/// Rebuilds a style from owned copies of each component.
fn copy_style(source: &Style) -> Style {
    let mut style = Style::default();
    if let Some(font) = source.get_font() {
        style.set_font(font.clone());
    }
    if let Some(borders) = source.get_borders() {
        style.set_borders(borders.clone());
    }
    if let Some(fill) = source.get_fill() {
        style.set_fill(fill.clone());
    }
    if let Some(number_format) = source.get_number_format() {
        style.set_number_format(number_format.clone());
    }
    if let Some(protection) = source.get_protection() {
        style.set_protection(protection.clone());
    }
    if let Some(alignment) = source.get_alignment() {
        style.set_alignment(alignment.clone());
    }
    style
}

/// Deep-copies `template` into a new sheet called `name`.
///
/// Merges are recreated first, then column widths and row heights, then every
/// cell that is not covered by a merge gets its value and style. Formula
/// cells contribute their cached value only.
pub fn clone_template(template: &Worksheet, name: &str) -> Worksheet {
    let mut sheet = Worksheet::default();
    sheet.set_name(name);
    sheet.set_sheet_format_properties(template.get_sheet_format_properties().clone());

    let merges = MergeMap::from_sheet(template);
    for span in merges.spans() {
        sheet.add_merge_cells(span.to_string());
    }

    let mut widths = 0usize;
    for column in template.get_column_dimensions() {
        let letter = column_number_to_name(*column.get_col_num());
        sheet
            .get_column_dimension_mut(&letter)
            .set_width(*column.get_width());
        widths += 1;
    }

    let mut heights = 0usize;
    for row in template.get_row_dimensions() {
        let height = *row.get_height();
        if height <= 0.0 {
            continue;
        }
        let target = sheet.get_row_dimension_mut(row.get_row_num());
        target.set_height(height);
        target.set_custom_height(*row.get_custom_height());
        heights += 1;
    }

    let mut cells = 0usize;
    for cell in template.get_cell_collection() {
        let column = *cell.get_coordinate().get_col_num();
        let row = *cell.get_coordinate().get_row_num();
        if merges.is_covered(column, row) {
            trace!(column, row, "covered template cell skipped");
            continue;
        }

        let address = cell_address(column, row);
        let target = sheet.get_cell_mut(address.as_str());
        if let Some(number) = cell.get_value_number() {
            target.set_value_number(number);
        } else {
            let value = cell.get_value();
            if !value.is_empty() {
                target.set_value(value.into_owned());
            }
        }

        let style = cell.get_style();
        if has_style(style) {
            target.set_style(copy_style(style));
        }
        cells += 1;
    }

    debug!(
        sheet = name,
        merges = merges.spans().len(),
        widths,
        heights,
        cells,
        "template cloned"
    );
    sheet
}
