//! Batch orchestration: one output sheet per act, failures isolated per act,
//! a single save at the end.

use crate::error::GenerationError;
use crate::logging::{act_span, batch_span};
use crate::mapper::{ActFieldMapper, SheetFiller};
use crate::model::{Act, ActFailure, ActId, BatchResult, SourceData};
use crate::recovery::RetryConfig;
use crate::resolver::resolve_persons;
use crate::template::clone_template;
use crate::utils::truncate_chars;
use crate::workbook::save_workbook_atomic;
use anyhow::{Context, anyhow};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};
use umya_spreadsheet::{Spreadsheet, Worksheet};

/// Longest sheet name the xlsx format accepts.
pub const SHEET_NAME_LIMIT: usize = 31;
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const REPORT_SHEET: &str = "Report";

/// `"Act " + id`, with forbidden characters replaced, cut to the limit.
pub fn sheet_name_for(id: &ActId) -> String {
    let raw: String = format!("Act {id}")
        .chars()
        .map(|ch| if FORBIDDEN_SHEET_CHARS.contains(&ch) { '_' } else { ch })
        .collect();
    truncate_chars(&raw, SHEET_NAME_LIMIT)
}

/// Hands out unique sheet names; sheet names compare case-insensitively.
#[derive(Debug, Default)]
pub struct SheetNamer {
    used: HashSet<String>,
}

impl SheetNamer {
    fn key(name: &str) -> String {
        name.to_lowercase()
    }

    /// First free variant of `base`: `base`, then `base (2)`, `base (3)`, ...
    /// with the base shortened so the suffix fits the limit.
    pub fn candidate(&self, base: &str) -> String {
        if !self.used.contains(&Self::key(base)) {
            return base.to_string();
        }
        (2..)
            .map(|n| {
                let suffix = format!(" ({n})");
                let room = SHEET_NAME_LIMIT.saturating_sub(suffix.chars().count());
                format!("{}{suffix}", truncate_chars(base, room))
            })
            .find(|name| !self.used.contains(&Self::key(name)))
            .unwrap_or_else(|| base.to_string())
    }

    pub fn reserve(&mut self, name: &str) {
        self.used.insert(Self::key(name));
    }
}

/// Where and how the batch artifact is written.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub path: PathBuf,
    pub retry: RetryConfig,
}

impl OutputTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            retry: RetryConfig::file_io(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// In-memory result of rendering a batch, before persistence.
pub struct RenderedBatch {
    pub book: Spreadsheet,
    pub total: usize,
    pub sheets: Vec<String>,
    pub failures: Vec<ActFailure>,
}

pub struct Generator<F: SheetFiller = ActFieldMapper> {
    filler: F,
}

impl Generator<ActFieldMapper> {
    pub fn new() -> Self {
        Self {
            filler: ActFieldMapper,
        }
    }
}

impl Default for Generator<ActFieldMapper> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: SheetFiller> Generator<F> {
    pub fn with_filler(filler: F) -> Self {
        Self { filler }
    }

    fn render_act(
        &self,
        template: &Worksheet,
        source: &SourceData,
        act: &Act,
        name: &str,
    ) -> anyhow::Result<Worksheet> {
        let mut sheet = clone_template(template, name);
        let persons = resolve_persons(source, act.act_date);
        self.filler
            .fill(&mut sheet, act, &persons)
            .with_context(|| format!("failed to fill sheet {name:?}"))?;
        Ok(sheet)
    }

    /// Renders every act into a fresh workbook. Failed acts leave no sheet
    /// behind and are reported in `failures`.
    pub fn render(&self, acts: &[Act], template: &Worksheet, source: &SourceData) -> RenderedBatch {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        let mut namer = SheetNamer::default();
        let mut sheets = Vec::with_capacity(acts.len());
        let mut failures = Vec::new();

        for (index, act) in acts.iter().enumerate() {
            let name = namer.candidate(&sheet_name_for(&act.id));
            let _span = act_span(&act.number(), &name).entered();
            let outcome = self.render_act(template, source, act, &name).and_then(|sheet| {
                book.add_sheet(sheet)
                    .map(|_| ())
                    .map_err(|err| anyhow!("failed to add sheet {name:?}: {err}"))
            });

            match outcome {
                Ok(()) => {
                    info!(
                        act = %act.id,
                        sheet = %name,
                        progress = %format!("{}/{}", index + 1, acts.len()),
                        "act generated"
                    );
                    namer.reserve(&name);
                    sheets.push(name);
                }
                Err(err) => {
                    warn!(act = %act.id, row = act.source_row, error = %format!("{err:#}"), "act failed");
                    failures.push(ActFailure {
                        index,
                        act_id: act.id.to_string(),
                        error: format!("{err:#}"),
                    });
                }
            }
        }

        if sheets.is_empty() {
            write_report_sheet(&mut book, acts.len(), &failures);
        }

        RenderedBatch {
            book,
            total: acts.len(),
            sheets,
            failures,
        }
    }

    pub fn generate_batch(
        &self,
        acts: &[Act],
        template: &Worksheet,
        source: &SourceData,
        output: &OutputTarget,
    ) -> Result<BatchResult, GenerationError> {
        let _span = batch_span(&output.path.display().to_string()).entered();
        let rendered = self.render(acts, template, source);
        save_workbook_atomic(&rendered.book, &output.path, &output.retry)?;

        let result = BatchResult {
            total: rendered.total,
            succeeded: rendered.sheets.len(),
            failures: rendered.failures,
            sheets: rendered.sheets,
            output: output.path.clone(),
        };
        info!(
            total = result.total,
            succeeded = result.succeeded,
            failed = result.failures.len(),
            output = %result.output.display(),
            "batch complete"
        );
        Ok(result)
    }
}

/// Runs a batch with the default field layout.
pub fn generate_batch(
    acts: &[Act],
    template: &Worksheet,
    source: &SourceData,
    output: &OutputTarget,
) -> Result<BatchResult, GenerationError> {
    Generator::new().generate_batch(acts, template, source, output)
}

/// Keeps an all-failed batch a valid workbook: lists what went wrong.
fn write_report_sheet(book: &mut Spreadsheet, total: usize, failures: &[ActFailure]) {
    let Ok(sheet) = book.new_sheet(REPORT_SHEET) else {
        return;
    };
    let headline = if total == 0 {
        "The register contains no acts".to_string()
    } else {
        format!("No acts were generated: 0/{total}")
    };
    sheet.get_cell_mut("A1").set_value(headline);
    for (offset, failure) in failures.iter().enumerate() {
        let row = offset as u32 + 2;
        sheet
            .get_cell_mut(format!("A{row}").as_str())
            .set_value(failure.act_id.as_str());
        sheet
            .get_cell_mut(format!("B{row}").as_str())
            .set_value(failure.error.as_str());
    }
}
