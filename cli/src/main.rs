use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};

use image_converter_core::{ConversionRequest, ConversionResult, Converter};

mod cli;
mod report;

use cli::Cli;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Init logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let result = match ConversionRequest::new(&cli.input, &cli.output) {
        Ok(request) => run(&cli, &request)?,
        Err(err) => ConversionResult::Failure(err),
    };

    if cli.json {
        println!("{}", report::to_json(&result).context("Failed to serialize result")?);
    } else {
        report::print_summary(&result);
    }

    Ok(if result.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run(cli: &Cli, request: &ConversionRequest) -> Result<ConversionResult> {
    let converter = Converter::new(cli.to_config());
    log::debug!("{:?}", converter.config());

    let spinner = if cli.json {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid progress template")?,
    );
    spinner.set_message(format!(
        "{} → {}",
        request.input_format(),
        request.output_format()
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = converter.dispatch(request);

    spinner.finish_and_clear();
    Ok(result)
}
