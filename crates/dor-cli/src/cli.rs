use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "dor",
    about = "DOR — digital object repository client",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to a TOML configuration file.
    #[arg(short, long, global = true, default_value = "dor.toml")]
    pub config: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Describe the remote repository
    Describe,
    /// Inspect and manage objects
    Object(ObjectArgs),
    /// Inspect and manage datastreams
    Ds(DsArgs),
    /// Allocate unused identifiers
    Pids(PidsArgs),
    /// Run a resource-index query
    Query(QueryArgs),
    /// Validate an object against its content models
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct ObjectArgs {
    #[command(subcommand)]
    pub command: ObjectCommand,
}

#[derive(Subcommand)]
pub enum ObjectCommand {
    /// Show an object's profile and datastream listing
    Show { pid: String },
    /// Create an empty object
    Ingest {
        /// Identifier or bare namespace; minted by the server when absent
        id: Option<String>,
        /// Mint the identifier locally as a v4 UUID
        #[arg(long)]
        uuid: bool,
        #[arg(long)]
        label: Option<String>,
        #[arg(long)]
        owner: Option<String>,
    },
    /// Set an object's state to deleted
    Delete { pid: String },
    /// Permanently remove an object
    Purge { pid: String },
}

#[derive(Args)]
pub struct DsArgs {
    #[command(subcommand)]
    pub command: DsCommand,
}

#[derive(Subcommand)]
pub enum DsCommand {
    /// List an object's datastreams
    List { pid: String },
    /// Show a datastream's profile
    Show { pid: String, dsid: String },
    /// Download a datastream's content
    Get {
        pid: String,
        dsid: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Permanently remove a datastream
    Purge { pid: String, dsid: String },
}

#[derive(Args)]
pub struct PidsArgs {
    /// Namespace to mint in; the server default when absent
    #[arg(long)]
    pub namespace: Option<String>,
    /// Mint locally as v4 UUIDs
    #[arg(long)]
    pub uuid: bool,
    #[arg(short = 'n', long, default_value_t = 1)]
    pub count: u32,
}

#[derive(Args)]
pub struct QueryArgs {
    /// The query text
    pub query: String,
    /// Query language
    #[arg(long, default_value = "itql")]
    pub lang: QueryLang,
    #[arg(long)]
    pub limit: Option<u32>,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum QueryLang {
    Sparql,
    Itql,
    Sql2,
}

#[derive(Args)]
pub struct ValidateArgs {
    pub pid: String,
}
