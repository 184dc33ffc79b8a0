use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use textscanner::Config;
use textscanner::replay::{self, Script};

#[derive(Parser, Debug)]
#[command(name = "textscanner")]
#[command(version, about = "Hover-to-lookup scan coordinator for pointer, touch and pen input")]
struct Cli {
    /// Input script to replay through the scanner
    #[arg(long, short = 's', value_name = "FILE")]
    script: PathBuf,

    /// Config file to use instead of ~/.config/textscanner/config.toml
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let script = Script::load(&cli.script)?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start the scan runtime")?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = runtime.block_on(replay::run(&script, &config, &mut out))?;

    log::info!(
        "Replayed {} step(s) from {}",
        summary.steps,
        cli.script.display()
    );
    Ok(())
}
