use crate::batch::split_all;
use crate::commands::{Cli, Commands};
use crate::inspect::inspect;
use anyhow::Result;
use clap::Parser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::debug;

mod batch;
mod commands;
mod error;
mod inspect;
mod locator;
mod summary;

pub mod built_info {
    // The file has been placed there by the build script.
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    let logger = env_logger::builder()
        .filter_level(cli.log_level())
        .parse_default_env()
        .build();

    let level = logger.filter();
    let pb = MultiProgress::new();

    LogWrapper::new(pb.clone(), logger).try_init()?;
    log::set_max_level(level);

    debug!(
        "{} {} ({}, {})",
        built_info::PKG_NAME,
        built_info::PKG_VERSION,
        built_info::TARGET,
        built_info::PROFILE
    );

    match cli.command {
        Commands::Split(cmd) => {
            let output = cmd.output.clone();
            let summary = split_all(cmd, pb.clone()).await?;
            pb.suspend(|| println!("\n{}", summary.render(&output)));

            if summary.has_failures() {
                std::process::exit(1);
            }
        }
        Commands::Inspect(cmd) => inspect(cmd).await?,
    }

    Ok(())
}
