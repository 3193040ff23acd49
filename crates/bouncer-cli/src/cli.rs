//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Bouncer CLI - deterministic fixture calls for testing gRPC pipelines
///
/// Invokes any of the bounce calls on a JSON request and prints the
/// transformed response, exactly as the fixture service would answer it.
#[derive(Parser, Debug)]
#[command(
    name = "bouncer",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// More log output; repeat for debug (-vv) and trace (-vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Print only the response and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "BOUNCER_CONFIG")]
    pub config: Option<PathBuf>,

    /// How to print responses [default: human, or the configured format]
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Invoke a call on a JSON request and print the response
    Call(CallArgs),

    /// List the available calls
    Methods,

    /// Manage the configuration file
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
pub struct CallArgs {
    /// Call name or full RPC path (e.g. BounceScalars, /targetservice.Bouncer/Echo)
    #[arg(value_name = "METHOD")]
    pub method: String,

    /// Request file (JSON or YAML), or `-` for stdin; an empty request when omitted
    #[arg(value_name = "REQUEST")]
    pub request: Option<PathBuf>,

    /// Field mask path for BounceMaskedFields (repeatable)
    #[arg(long = "mask", value_name = "PATH")]
    pub masks: Vec<String>,

    /// Call metadata entry (repeatable)
    #[arg(long = "header", value_name = "KEY=VALUE", value_parser = parse_header)]
    pub headers: Vec<(String, String)>,

    /// Send the call without any metadata
    #[arg(long, conflicts_with = "headers")]
    pub no_metadata: bool,

    /// Write the response to a file instead of stdout
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show(ConfigShowArgs),

    /// Write a default configuration file
    Init(ConfigInitArgs),

    /// Print the path of the configuration file in use
    Path,
}

#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file [default: the user config directory]
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Replace an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
    Yaml,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    #[arg(value_enum)]
    pub shell: Shell,
}

/// How responses are printed
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    /// Pretty JSON under a heading, with status lines
    Human,
    /// One line of JSON
    Json,
    JsonPretty,
    Yaml,
}

/// Split `KEY=VALUE`; the value may itself contain `=`
fn parse_header(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;

    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty header name in '{}'", raw));
    }

    Ok((key.to_string(), value.to_string()))
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// `-v` count, or 0 under `--quiet`
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Color unless disabled or stdout is redirected
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}
