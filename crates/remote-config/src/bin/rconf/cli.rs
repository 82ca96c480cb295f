//! rconf cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the effective configuration
    ///
    /// Remote configuration is layered over the local configuration.
    Resolve(ResolveCommand),

    /// Print the remote configuration only
    Fetch(FetchCommand),

    /// List available providers
    Providers,
}

#[derive(Parser, Debug)]
pub struct ResolveCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct FetchCommand {
    #[clap(flatten)]
    pub input: InputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a local configuration file
    ///
    /// Can be specified multiple times, later files win.
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Override a setting (`key=value`), wins over all files
    #[clap(short = 'D', long = "set", value_name = "KEY=VALUE")]
    pub overrides: Vec<String>,

    /// Mode passed to the provider
    #[arg(short = 'm', long = "mode", default_value_t)]
    pub mode: RunMode,
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum RunMode {
    Dev,
    Test,
    #[default]
    Prod,
}

impl std::fmt::Display for RunMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RunMode::Dev => f.write_str("dev"),
            RunMode::Test => f.write_str("test"),
            RunMode::Prod => f.write_str("prod"),
        }
    }
}

impl From<RunMode> for remote_config::provider::Mode {
    fn from(value: RunMode) -> Self {
        use remote_config::provider::Mode;

        match value {
            RunMode::Dev => Mode::Dev,
            RunMode::Test => Mode::Test,
            RunMode::Prod => Mode::Prod,
        }
    }
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
    /// canonical `key = value` lines
    Conf,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
            OutputFormat::Conf => f.write_str("conf"),
        }
    }
}
