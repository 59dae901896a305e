pub mod batch;
pub mod config;
pub mod error;
pub mod logging;
pub mod mapper;
pub mod model;
pub mod recovery;
pub mod register;
pub mod resolver;
pub mod template;
pub mod utils;
pub mod workbook;

pub use batch::{Generator, OutputTarget, generate_batch};
pub use config::{CliArgs, GeneratorConfig};
pub use error::{ErrorCode, GenerationError};
pub use logging::{LoggingConfig, init_logging};
pub use model::{Act, ActFailure, BatchResult};

use workbook::{load_workbook, sheet_by_name, template_sheet};

/// Loads the register and template named by `config`, renders every act and
/// saves the output workbook once.
pub fn run(config: &GeneratorConfig) -> Result<BatchResult, GenerationError> {
    config.ensure_inputs()?;

    tracing::info!(
        register = %config.register_path.display(),
        template = %config.template_path.display(),
        output = %config.output_path.display(),
        "starting act generation"
    );

    let register_book = load_workbook(&config.register_path, &config.retry)?;
    let register_sheet = sheet_by_name(&register_book, &config.sheets.register, &config.register_path)?;
    let parties_sheet = sheet_by_name(&register_book, &config.sheets.parties, &config.register_path)?;
    let organizations_sheet = sheet_by_name(
        &register_book,
        &config.sheets.organizations,
        &config.register_path,
    )?;

    let acts = register::load_acts_from_sheet(register_sheet);
    let source = register::load_source(parties_sheet, organizations_sheet);

    let template_book = load_workbook(&config.template_path, &config.retry)?;
    let template = template_sheet(&template_book, &config.template_path)?;

    let output = OutputTarget::new(&config.output_path).with_retry(config.retry.clone());
    generate_batch(&acts, template, &source, &output)
}
