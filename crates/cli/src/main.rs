//! `octolint` entry point.
//!
//! This binary is the composition root: it merges flags, environment and the
//! config file into [`settings::Settings`], installs the tracing subscriber,
//! builds the Octopus client and runs every enabled check. The filtered
//! results are printed to stdout as JSON; logs go to stderr.

mod args;
mod entry;
mod logging;
mod settings;

use checks::CheckFactory;
use clap::Parser;

use crate::args::Cli;
use crate::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_checks {
        for id in CheckFactory::all_check_ids() {
            println!("{id}");
        }
        return Ok(());
    }

    let settings = Settings::load(cli)?;
    logging::init(&settings.log_level, settings.log_format);
    settings.validate()?;

    let results = tokio::select! {
        results = entry::run(&settings) => results?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            anyhow::bail!("interrupted before the audit finished");
        }
    };

    tracing::info!(reported = results.len(), "Audit complete");
    println!("{}", entry::render_report(&results)?);
    Ok(())
}
