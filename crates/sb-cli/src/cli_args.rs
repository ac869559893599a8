use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "spellblocks")]
#[command(about = "SpellBlocks level runner and block workshop")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    /// List the playable levels.
    Levels,
    /// List the blocks a level offers.
    Catalog(CatalogArgs),
    /// Run a program once and print every step.
    Run(RunArgs),
    /// Build and run programs interactively.
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CatalogArgs {
    #[arg(long = "level")]
    pub(crate) level: String,
}

#[derive(Debug, Args)]
pub(crate) struct WorldArgs {
    #[arg(long = "seed")]
    pub(crate) seed: Option<u32>,
    #[arg(long = "weather")]
    pub(crate) weather: Option<String>,
    #[arg(long = "monsters", value_delimiter = ',')]
    pub(crate) monsters: Option<Vec<String>>,
}

#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    #[arg(long = "level")]
    pub(crate) level: String,
    #[arg(long = "blocks", value_delimiter = ',', conflicts_with = "program_file")]
    pub(crate) blocks: Option<Vec<String>>,
    #[arg(long = "program-file")]
    pub(crate) program_file: Option<String>,
    #[command(flatten)]
    pub(crate) world: WorldArgs,
    #[arg(long = "paced")]
    pub(crate) paced: bool,
    #[arg(long = "report-out")]
    pub(crate) report_out: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[arg(long = "level")]
    pub(crate) level: String,
    #[arg(long = "program-file")]
    pub(crate) program_file: Option<String>,
    #[command(flatten)]
    pub(crate) world: WorldArgs,
}
