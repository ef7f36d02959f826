use clap::Parser;

use crate::opts::{Command, Opts};

mod classify;
mod config;
mod link;
mod opts;
mod presentation;
mod report;

fn main() -> anyhow::Result<()> {
    let args = argfile::expand_args(argfile::parse_fromfile, argfile::PREFIX)?;

    let opts = Opts::parse_from(args);

    cli::tracing::configure_tracing(opts.trace.clone(), opts.verbose.clone())?;

    match opts.command {
        Command::Link(args) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(link::link(args))
        }
        Command::Report(args) => report::report(args),
        Command::Classify(args) => classify::classify(args),
    }
}
