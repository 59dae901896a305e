use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use aosr_acts::config::SheetNames;
use aosr_acts::error::GenerationError;
use aosr_acts::{CliArgs, GeneratorConfig};
use assert_matches::assert_matches;
use clap::Parser;
use serial_test::serial;

#[test]
#[serial]
fn defaults_resolve_against_data_and_output_dirs() {
    let config = GeneratorConfig::from_args(CliArgs::parse_from(["aosr-acts"])).expect("config");

    assert_eq!(config.register_path, PathBuf::from("data/register.xlsx"));
    assert_eq!(config.template_path, PathBuf::from("data/template.xlsx"));
    assert_eq!(config.output_path, PathBuf::from("output/acts.xlsx"));
    assert_eq!(config.sheets, SheetNames::default());
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.retry.delay, Duration::from_secs(1));
    assert_eq!(
        config.certificate_extensions,
        vec!["jpeg", "jpg", "pdf", "png"]
    );
    assert!(!config.json_output);
}

#[test]
#[serial]
fn merges_config_file_and_cli_overrides() {
    let dir = tempfile::tempdir().expect("config tempdir");
    let config_path = dir.path().join("aosr.yaml");
    let yaml = "data_dir: /srv/site-12\nregister: registers/2024.xlsx\nload_attempts: 5\nretry_delay_ms: 250\nregister_sheet: Acts\ncertificate_extensions:\n  - PDF\n";
    fs::write(&config_path, yaml).expect("write config");

    let args = CliArgs::parse_from([
        "aosr-acts",
        "--config",
        config_path.to_str().unwrap(),
        "--load-attempts",
        "2",
        "--certificate-extensions",
        ".TIFF,pdf",
        "--output",
        "/tmp/out/acts-2024.xlsx",
        "--json",
    ]);
    let config = GeneratorConfig::from_args(args).expect("config");

    assert_eq!(
        config.register_path,
        PathBuf::from("/srv/site-12/registers/2024.xlsx")
    );
    assert_eq!(config.template_path, PathBuf::from("/srv/site-12/template.xlsx"));
    assert_eq!(config.output_path, PathBuf::from("/tmp/out/acts-2024.xlsx"));
    assert_eq!(config.retry.max_attempts, 2);
    assert_eq!(config.retry.delay, Duration::from_millis(250));
    assert_eq!(config.sheets.register, "Acts");
    assert_eq!(config.sheets.parties, "Involved parties");
    assert_eq!(config.certificate_extensions, vec!["pdf", "tiff"]);
    assert!(config.json_output);
}

#[test]
#[serial]
fn json_config_files_are_accepted() {
    let dir = tempfile::tempdir().expect("config tempdir");
    let config_path = dir.path().join("aosr.json");
    fs::write(&config_path, r#"{"output_dir": "build", "json": true}"#).expect("write config");

    let args = CliArgs::parse_from(["aosr-acts", "--config", config_path.to_str().unwrap()]);
    let config = GeneratorConfig::from_args(args).expect("config");
    assert_eq!(config.output_path, PathBuf::from("build/acts.xlsx"));
    assert!(config.json_output);
}

#[test]
#[serial]
fn unknown_config_keys_and_extensions_are_rejected() {
    let dir = tempfile::tempdir().expect("config tempdir");
    let yaml_path = dir.path().join("aosr.yaml");
    fs::write(&yaml_path, "workspace_root: /tmp\n").expect("write config");
    let err = GeneratorConfig::from_args(CliArgs {
        config: Some(yaml_path),
        ..CliArgs::default()
    })
    .expect_err("unknown key");
    assert!(format!("{err:#}").contains("failed to parse YAML config"));

    let toml_path = dir.path().join("aosr.toml");
    fs::write(&toml_path, "data_dir = 'x'\n").expect("write config");
    let err = GeneratorConfig::from_args(CliArgs {
        config: Some(toml_path),
        ..CliArgs::default()
    })
    .expect_err("unsupported extension");
    assert!(err.to_string().contains("unsupported config extension"));
}

#[test]
fn empty_certificate_extensions_is_error() {
    let args = CliArgs {
        certificate_extensions: Some(vec![" ".into(), ".".into()]),
        ..CliArgs::default()
    };
    let err = GeneratorConfig::from_args(args).expect_err("expected failure");
    assert!(err.to_string().contains("at least one certificate extension"));
}

#[test]
fn zero_load_attempts_is_error() {
    let args = CliArgs {
        load_attempts: Some(0),
        ..CliArgs::default()
    };
    let err = GeneratorConfig::from_args(args).expect_err("expected failure");
    assert!(err.to_string().contains("load attempts"));
}

#[test]
fn certificate_check_ignores_case() {
    let config = GeneratorConfig::from_args(CliArgs::default()).expect("config");
    assert!(config.accepts_certificate("certs/mastic.PDF"));
    assert!(config.accepts_certificate("scan.jpeg"));
    assert!(!config.accepts_certificate("notes.docx"));
    assert!(!config.accepts_certificate("no_extension"));
}

#[test]
fn ensure_inputs_names_the_missing_file() {
    let workspace = tempfile::tempdir().expect("workspace tempdir");
    let register = workspace.path().join("register.xlsx");
    fs::write(&register, b"placeholder").expect("write register");

    let config = GeneratorConfig::from_args(CliArgs {
        data_dir: Some(workspace.path().to_path_buf()),
        ..CliArgs::default()
    })
    .expect("config");

    let err = config.ensure_inputs().expect_err("template is missing");
    assert_matches!(err, GenerationError::InputMissing { ref path } if path.ends_with("template.xlsx"));
}

#[test]
#[serial]
fn environment_variables_feed_the_cli() {
    unsafe {
        std::env::set_var("AOSR_DATA_DIR", "/var/lib/aosr");
        std::env::set_var("AOSR_RETRY_DELAY_MS", "10");
    }
    let args = CliArgs::parse_from(["aosr-acts"]);
    unsafe {
        std::env::remove_var("AOSR_DATA_DIR");
        std::env::remove_var("AOSR_RETRY_DELAY_MS");
    }

    let config = GeneratorConfig::from_args(args).expect("config");
    assert_eq!(config.register_path, PathBuf::from("/var/lib/aosr/register.xlsx"));
    assert_eq!(config.retry.delay, Duration::from_millis(10));
}
