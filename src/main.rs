use anyhow::Result;
use clap::Parser;

mod archive;
mod cli;
mod config;
mod generate;
mod layout;
mod normalize;
mod pipeline;
mod reset;
mod staging;
#[cfg(test)]
mod test_support;
mod util;
mod workflow;

use cli::{Command, RootArgs};

fn main() -> Result<()> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    match args.command {
        Command::Pack(args) => workflow::run_pack(args),
        Command::Build(args) => workflow::run_build(args),
        Command::Unpack(args) => workflow::run_unpack(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
