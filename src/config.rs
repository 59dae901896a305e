use crate::error::GenerationError;
use crate::recovery::RetryConfig;
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "output";
const DEFAULT_REGISTER_FILE: &str = "register.xlsx";
const DEFAULT_TEMPLATE_FILE: &str = "template.xlsx";
const DEFAULT_OUTPUT_FILE: &str = "acts.xlsx";
const DEFAULT_LOAD_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
const DEFAULT_CERTIFICATE_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png"];

pub const DEFAULT_REGISTER_SHEET: &str = "Register";
pub const DEFAULT_PARTIES_SHEET: &str = "Involved parties";
pub const DEFAULT_ORGANIZATIONS_SHEET: &str = "Organizations";

/// Names of the three source sheets inside the register workbook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetNames {
    pub register: String,
    pub parties: String,
    pub organizations: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            register: DEFAULT_REGISTER_SHEET.to_string(),
            parties: DEFAULT_PARTIES_SHEET.to_string(),
            organizations: DEFAULT_ORGANIZATIONS_SHEET.to_string(),
        }
    }
}

/// Fully resolved paths and policies for one generation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub register_path: PathBuf,
    pub template_path: PathBuf,
    pub output_path: PathBuf,
    pub sheets: SheetNames,
    pub retry: RetryConfig,
    pub certificate_extensions: Vec<String>,
    pub json_output: bool,
}

impl GeneratorConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            data_dir: cli_data_dir,
            output_dir: cli_output_dir,
            register: cli_register,
            template: cli_template,
            output: cli_output,
            register_sheet: cli_register_sheet,
            parties_sheet: cli_parties_sheet,
            organizations_sheet: cli_organizations_sheet,
            load_attempts: cli_load_attempts,
            retry_delay_ms: cli_retry_delay_ms,
            certificate_extensions: cli_certificate_extensions,
            json,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            data_dir: file_data_dir,
            output_dir: file_output_dir,
            register: file_register,
            template: file_template,
            output: file_output,
            register_sheet: file_register_sheet,
            parties_sheet: file_parties_sheet,
            organizations_sheet: file_organizations_sheet,
            load_attempts: file_load_attempts,
            retry_delay_ms: file_retry_delay_ms,
            certificate_extensions: file_certificate_extensions,
            json: file_json,
        } = file_config;

        let data_dir = cli_data_dir
            .or(file_data_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let output_dir = cli_output_dir
            .or(file_output_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

        let register_path = resolve_against(
            &data_dir,
            cli_register
                .or(file_register)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTER_FILE)),
        );
        let template_path = resolve_against(
            &data_dir,
            cli_template
                .or(file_template)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE_FILE)),
        );
        let output_path = resolve_against(
            &output_dir,
            cli_output
                .or(file_output)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
        );

        let defaults = SheetNames::default();
        let sheets = SheetNames {
            register: cli_register_sheet
                .or(file_register_sheet)
                .unwrap_or(defaults.register),
            parties: cli_parties_sheet
                .or(file_parties_sheet)
                .unwrap_or(defaults.parties),
            organizations: cli_organizations_sheet
                .or(file_organizations_sheet)
                .unwrap_or(defaults.organizations),
        };
        for name in [&sheets.register, &sheets.parties, &sheets.organizations] {
            anyhow::ensure!(!name.trim().is_empty(), "sheet names must not be empty");
        }

        let load_attempts = cli_load_attempts
            .or(file_load_attempts)
            .unwrap_or(DEFAULT_LOAD_ATTEMPTS);
        anyhow::ensure!(load_attempts >= 1, "load attempts must be at least 1");
        let retry_delay_ms = cli_retry_delay_ms
            .or(file_retry_delay_ms)
            .unwrap_or(DEFAULT_RETRY_DELAY_MS);
        let retry = RetryConfig::file_io()
            .with_attempts(load_attempts)
            .with_delay(Duration::from_millis(retry_delay_ms));

        let mut certificate_extensions = cli_certificate_extensions
            .or(file_certificate_extensions)
            .unwrap_or_else(|| {
                DEFAULT_CERTIFICATE_EXTENSIONS
                    .iter()
                    .map(|ext| (*ext).to_string())
                    .collect()
            })
            .into_iter()
            .map(|ext| ext.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect::<Vec<_>>();
        certificate_extensions.sort();
        certificate_extensions.dedup();

        anyhow::ensure!(
            !certificate_extensions.is_empty(),
            "at least one certificate extension must be provided"
        );

        Ok(Self {
            data_dir,
            output_dir,
            register_path,
            template_path,
            output_path,
            sheets,
            retry,
            certificate_extensions,
            json_output: json || file_json.unwrap_or(false),
        })
    }

    /// Checks that both input workbooks exist before any processing starts.
    pub fn ensure_inputs(&self) -> Result<(), GenerationError> {
        for path in [&self.register_path, &self.template_path] {
            if !path.is_file() {
                return Err(GenerationError::InputMissing { path: path.clone() });
            }
        }
        Ok(())
    }

    /// True when the file's extension is one of the accepted certificate
    /// formats, compared case-insensitively.
    pub fn accepts_certificate<P: AsRef<Path>>(&self, path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .map(|ext| self.certificate_extensions.contains(&ext))
            .unwrap_or(false)
    }
}

fn resolve_against(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

#[derive(Parser, Debug, Default, Clone)]
#[command(
    name = "aosr-acts",
    about = "Generate hidden-work acceptance acts from a register workbook",
    version
)]
pub struct CliArgs {
    #[arg(
        long,
        env = "AOSR_CONFIG",
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "AOSR_DATA_DIR",
        value_name = "DIR",
        help = "Directory holding the register and template workbooks"
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "AOSR_OUTPUT_DIR",
        value_name = "DIR",
        help = "Directory receiving the generated workbook"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(
        long,
        env = "AOSR_REGISTER",
        value_name = "FILE",
        help = "Register workbook, relative to the data directory"
    )]
    pub register: Option<PathBuf>,

    #[arg(
        long,
        env = "AOSR_TEMPLATE",
        value_name = "FILE",
        help = "Template workbook, relative to the data directory"
    )]
    pub template: Option<PathBuf>,

    #[arg(
        long,
        env = "AOSR_OUTPUT",
        value_name = "FILE",
        help = "Output workbook, relative to the output directory"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        long,
        env = "AOSR_REGISTER_SHEET",
        value_name = "NAME",
        help = "Sheet holding the act register"
    )]
    pub register_sheet: Option<String>,

    #[arg(
        long,
        env = "AOSR_PARTIES_SHEET",
        value_name = "NAME",
        help = "Sheet holding the involved parties"
    )]
    pub parties_sheet: Option<String>,

    #[arg(
        long,
        env = "AOSR_ORGANIZATIONS_SHEET",
        value_name = "NAME",
        help = "Sheet holding the organizations"
    )]
    pub organizations_sheet: Option<String>,

    #[arg(
        long,
        env = "AOSR_LOAD_ATTEMPTS",
        value_name = "N",
        help = "Attempts for reading and writing workbooks",
        value_parser = clap::value_parser!(u32)
    )]
    pub load_attempts: Option<u32>,

    #[arg(
        long,
        env = "AOSR_RETRY_DELAY_MS",
        value_name = "MS",
        help = "Delay between attempts in milliseconds",
        value_parser = clap::value_parser!(u64)
    )]
    pub retry_delay_ms: Option<u64>,

    #[arg(
        long,
        env = "AOSR_CERTIFICATE_EXTENSIONS",
        value_name = "EXT",
        value_delimiter = ',',
        help = "Comma-separated list of accepted certificate file extensions"
    )]
    pub certificate_extensions: Option<Vec<String>>,

    #[arg(
        long,
        env = "AOSR_JSON",
        help = "Print the batch result as JSON"
    )]
    pub json: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialConfig {
    data_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    register: Option<PathBuf>,
    template: Option<PathBuf>,
    output: Option<PathBuf>,
    register_sheet: Option<String>,
    parties_sheet: Option<String>,
    organizations_sheet: Option<String>,
    load_attempts: Option<u32>,
    retry_delay_ms: Option<u64>,
    certificate_extensions: Option<Vec<String>>,
    json: Option<bool>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
