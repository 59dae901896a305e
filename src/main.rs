use aosr_acts::{
    BatchResult, CliArgs, GenerationError, GeneratorConfig, LoggingConfig, init_logging, run,
};
use clap::Parser;
use std::process::ExitCode;

fn print_summary(result: &BatchResult) {
    println!(
        "Generated {}/{} acts into {}",
        result.succeeded,
        result.total,
        result.output.display()
    );
    for failure in &result.failures {
        println!("  act {} failed: {}", failure.act_id, failure.error);
    }
}

fn main() -> ExitCode {
    let logging_config = LoggingConfig::from_env();
    let _guard = match init_logging(logging_config) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("failed to initialize logging: {err:#}");
            None
        }
    };

    let cli = CliArgs::parse();
    let config = match GeneratorConfig::from_args(cli) {
        Ok(config) => config,
        Err(err) => {
            let err = GenerationError::InvalidConfig(format!("{err:#}"));
            tracing::error!(code = %err.code(), error = %err, "configuration rejected");
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config) {
        Ok(result) => {
            if config.json_output {
                match serde_json::to_string_pretty(&result) {
                    Ok(json) => println!("{json}"),
                    Err(err) => eprintln!("failed to serialize result: {err}"),
                }
            } else {
                print_summary(&result);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(
                code = %err.code(),
                category = err.code().category(),
                path = ?err.path(),
                error = %err,
                "generation failed"
            );
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
