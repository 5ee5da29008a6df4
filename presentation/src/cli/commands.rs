//! CLI command definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use conclave_domain::{ConversationMode, OutputFormat};
use std::path::PathBuf;

/// Output format flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputArg {
    /// Human-readable colored text
    Text,
    /// JSON output
    Json,
}

impl From<OutputArg> for OutputFormat {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        }
    }
}

/// Collaboration protocol flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    /// Agents answer one after another, each seeing the previous answers
    TurnOrder,
    /// Agents answer independently and concurrently
    FreeForm,
}

impl From<ModeArg> for ConversationMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::TurnOrder => ConversationMode::TurnOrder,
            ModeArg::FreeForm => ConversationMode::FreeForm,
        }
    }
}

/// CLI arguments for conclave
#[derive(Parser, Debug)]
#[command(name = "conclave")]
#[command(author, version, about = "Multi-agent orchestration and consensus engine")]
#[command(long_about = r#"
Conclave routes each request to a roster of persona agents according to its
complexity: simple requests go to one agent, analyses are answered jointly,
and the most complex requests run through a fusion pipeline.

Configuration files are loaded from (in priority order):
1. CONCLAVE_* environment variables (sections split on __)
2. --config <path>        Explicit config file
3. ./conclave.toml        Project-level config
4. ~/.config/conclave/config.toml   Global config

Example:
  conclave process "Sketch a login screen" --type creative_design
  conclave process "Review this flow" --type security_analysis --context app=bank
  conclave collaborate "Name the project" --mode turn-order --rounds 2
  conclave query "What should we build next?"
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process one request through the orchestrator
    Process(ProcessArgs),

    /// Run the agents in one or more collaboration rounds and print the consensus
    Collaborate(CollaborateArgs),

    /// Ask every active agent and print their answers with a synthesis
    Query(QueryArgs),

    /// Show engine status
    Status(StatusArgs),

    /// Show (or clear) the persisted history
    History(HistoryArgs),
}

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// The request text
    pub query: String,

    /// Request type (e.g. creative_design, security_analysis)
    #[arg(short = 't', long = "type", default_value = "general")]
    pub request_type: String,

    /// Context entries (can be specified multiple times)
    #[arg(short, long = "context", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    pub context: Vec<(String, String)>,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,
}

#[derive(Args, Debug)]
pub struct CollaborateArgs {
    /// The question every agent answers
    pub query: String,

    /// Collaboration protocol
    #[arg(short, long, value_enum, default_value = "free-form")]
    pub mode: ModeArg,

    /// Agents to include (default: every active agent)
    #[arg(short, long = "agent", value_name = "NAME")]
    pub agents: Vec<String>,

    /// Number of rounds to aggregate
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..=10))]
    pub rounds: u32,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// The question to ask
    pub query: String,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,
}

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Clear the history instead of printing it
    #[arg(long)]
    pub clear: bool,

    /// Output format (overrides [output] format)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputArg>,
}

/// Parse `key=value`; the value may itself contain `=`
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
