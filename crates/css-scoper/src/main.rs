//! css-scoper: scope page stylesheets with namespace classes.

mod cli;
mod config;
mod orchestrator;
mod output;

use clap::Parser;
use cli::{Args, OutputFormat};
use env_logger::Env;
use miette::Result;
use output::Formatter;

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(args.log_filter()))
        .format_timestamp(None)
        .init();

    let report = orchestrator::run(&args)?;
    if !report.written() {
        log::debug!("stylesheet not written");
    }

    if args.output == OutputFormat::Human {
        for warning in report.warnings() {
            eprintln!("Warning: {}", warning);
        }
    }
    print!("{}", Formatter::new(args.output).format(&report));

    if args.fail_on_warnings && !report.warnings().is_empty() {
        std::process::exit(1);
    }

    Ok(())
}
