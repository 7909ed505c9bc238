mod calib;
mod dataset;
mod error;
mod info;
mod inspect;
mod io;
mod map;
mod mapping;
mod opts;
mod parse;
mod project;
mod tile;
mod types;
mod utils;

use clap::Parser;
use eyre::Result;
use opts::{Info, Opts};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let opts = Opts::parse();

    match opts {
        Opts::Map(args) => {
            crate::map::map(args)?;
        }
        Opts::Inspect(args) => {
            crate::inspect::inspect(args)?;
        }
        Opts::Info(Info { file }) => {
            crate::info::info(file)?;
        }
    }

    Ok(())
}
