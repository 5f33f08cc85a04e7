//! `get-the-nini`: download a discussion thread and export it.

mod args;
mod output;

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use nini_engine::{Driver, LogSink};

use crate::args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.stdout && args.formats().len() > 1 {
        Args::command()
            .error(ErrorKind::ArgumentConflict, "--stdout takes a single --format")
            .exit();
    }

    nini_logging::initialize(args.log_destination(), args.log_level());

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let _ = writeln!(io::stderr().lock(), "error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let formats = args.formats();
    let driver = Driver::with_sink(args.run_config(), Arc::new(LogSink));
    let report = driver.run(&args.url, &formats).await?;

    output::write_warning_summary(&mut io::stderr().lock(), &report.warnings)?;

    if args.stdout {
        output::write_raw(&mut io::stdout().lock(), &report.documents)
    } else {
        let paths = output::write_documents(&args.out_dir, &report.documents)?;
        output::write_paths(&mut io::stdout().lock(), &paths)
    }
}
