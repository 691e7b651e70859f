use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "battle-events")]
#[command(about = "Battle event script case runner")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// Runs one case file and checks its expectations.
    Run(RunArgs),
    /// Runs every `*.case.json` under a directory.
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "case")]
    pub(crate) case: String,
}

#[derive(Debug, Args)]
pub(crate) struct CheckArgs {
    #[arg(long = "dir")]
    pub(crate) dir: String,
}
