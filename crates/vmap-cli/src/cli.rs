//! CLI argument definitions for `vmap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use vmap_cli::inputs::parse_assignment;
use vmap_cli::settings::ConnectionOverrides;
use vmap_map::{ApplyKind, Datum, Vocabulary};
use vmap_model::{MappingId, MappingStatus};

#[derive(Parser)]
#[command(
    name = "vmap",
    version,
    about = "Check, evaluate and manage variable mappings",
    long_about = "Work with variable mapping and imputation rules.\n\n\
                  Local commands validate and evaluate mapping files; remote\n\
                  commands talk to the mapping server."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Args)]
pub struct ConnectionArgs {
    /// Settings file (default: ./vmap.toml when present).
    #[arg(long, value_name = "PATH", env = "VMAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Mapping server root URL.
    #[arg(long = "base-url", value_name = "URL", env = "VMAP_BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// CSRF token of the session.
    #[arg(
        long = "csrf-token",
        value_name = "TOKEN",
        env = "VMAP_CSRF_TOKEN",
        hide_env_values = true,
        global = true
    )]
    pub csrf_token: Option<String>,

    /// Session cookie, e.g. `session=abc123`.
    #[arg(
        long = "session-cookie",
        value_name = "COOKIE",
        env = "VMAP_SESSION_COOKIE",
        hide_env_values = true,
        global = true
    )]
    pub session_cookie: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS", env = "VMAP_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

impl ConnectionArgs {
    pub fn overrides(&self) -> ConnectionOverrides {
        ConnectionOverrides {
            config: self.config.clone(),
            base_url: self.base_url.clone(),
            csrf_token: self.csrf_token.clone(),
            session_cookie: self.session_cookie.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the JSON of a new, empty mapping.
    Skeleton,

    /// Validate a mapping file.
    Check(CheckArgs),

    /// Evaluate a mapping file for one subject.
    Eval(EvalArgs),

    /// Fetch a stored mapping.
    Show(ShowArgs),

    /// Create or update a mapping on the server from a file.
    Push(PushArgs),

    /// Create a direct mapping on the server from a file.
    PushDirect(PushDirectArgs),

    /// Show or change the review status and notes of a mapping.
    Review(ReviewArgs),

    /// List stored mappings.
    List,

    /// Delete stored mappings. Either all are deleted or none.
    Delete(DeleteArgs),

    /// Look up schemata, attributes or choices.
    Lookup(LookupArgs),

    /// Apply all approved mappings of one kind on the server.
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct CheckArgs {
    /// Mapping file in wire format (`-` for stdin).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct EvalArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Source value as `schema.attribute=value`; repeat for each variable.
    #[arg(long = "value", short = 'V', value_name = "VAR=VALUE", value_parser = parse_assignment)]
    pub values: Vec<(String, Datum)>,
}

#[derive(Args)]
pub struct ShowArgs {
    #[arg(value_name = "ID")]
    pub id: MappingId,

    /// Print the raw JSON instead of a summary.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct PushArgs {
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Send even when local validation finds errors.
    #[arg(long = "no-check")]
    pub no_check: bool,
}

#[derive(Args)]
pub struct PushDirectArgs {
    /// Direct mapping body in JSON (`-` for stdin).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

#[derive(Args)]
pub struct ReviewArgs {
    #[arg(value_name = "ID")]
    pub id: MappingId,

    /// New status (review, in-progress, approved, rejected).
    #[arg(long, value_name = "STATUS")]
    pub status: Option<MappingStatus>,

    /// Replace the reviewer notes.
    #[arg(long, value_name = "TEXT")]
    pub notes: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[arg(value_name = "ID", required = true)]
    pub ids: Vec<MappingId>,
}

#[derive(Args)]
pub struct LookupArgs {
    /// schemata, attributes or choices.
    #[arg(value_name = "VOCABULARY")]
    pub vocabulary: Vocabulary,

    /// Search term.
    #[arg(value_name = "TERM", default_value = "")]
    pub term: String,

    /// Schema to search attributes or choices in.
    #[arg(long, value_name = "NAME")]
    pub schema: Option<String>,

    /// Attribute to search choices of.
    #[arg(long, value_name = "NAME")]
    pub attribute: Option<String>,

    /// Search target schemata instead of source schemata.
    #[arg(long)]
    pub target: bool,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Apply direct mappings.
    #[arg(long, conflicts_with = "imputation")]
    pub direct: bool,

    /// Apply imputation mappings (the default).
    #[arg(long)]
    pub imputation: bool,

    /// Follow the job's progress until it completes.
    #[arg(long)]
    pub watch: bool,
}

impl ApplyArgs {
    pub fn kind(&self) -> ApplyKind {
        if self.direct {
            ApplyKind::Direct
        } else {
            ApplyKind::Imputation
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
