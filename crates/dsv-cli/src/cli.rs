use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use dsv_store::{DatasetId, MergeMode, TextEncoding, VersionKind};

#[derive(Parser)]
#[command(
    name = "dsv",
    about = "Versioned dataset store: payloads, metadata, and their history",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Store root directory (default: /tmp/_datasets, or the server config's)
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write a dataset's metadata, creating the dataset if needed
    PutMeta(PutMetaArgs),
    /// Print a dataset's current metadata
    GetMeta(DatasetArgs),
    /// Merge metadata into an existing dataset
    UpdateMeta(UpdateMetaArgs),
    /// Store a new data version
    PutData(PutDataArgs),
    /// Print or save a dataset's current data
    GetData(GetDataArgs),
    /// Print the absolute path of the current data version
    Path(DatasetArgs),
    /// Check whether both data and metadata exist
    Exists(DatasetArgs),
    /// Delete a dataset and all its versions
    Rm(DatasetArgs),
    /// Show version history
    Log(LogArgs),
    /// List datasets
    Ls,
    /// Start the HTTP server
    Serve(ServeArgs),
}

#[derive(Args)]
pub struct DatasetArgs {
    pub dataset_id: DatasetId,
}

/// Metadata given inline as JSON or read from a file.
#[derive(Args)]
pub struct MetadataInput {
    #[arg(required_unless_present = "file")]
    pub json: Option<String>,
    /// Read the metadata document from a JSON file
    #[arg(long, conflicts_with = "json")]
    pub file: Option<PathBuf>,
}

#[derive(Args)]
pub struct PutMetaArgs {
    pub dataset_id: DatasetId,
    #[command(flatten)]
    pub input: MetadataInput,
}

#[derive(Args)]
pub struct UpdateMetaArgs {
    pub dataset_id: DatasetId,
    #[command(flatten)]
    pub input: MetadataInput,
    /// overlay or override
    #[arg(long, default_value = "override")]
    pub mode: MergeMode,
}

#[derive(Args)]
pub struct PutDataArgs {
    pub dataset_id: DatasetId,
    /// Read the payload from a file (default: stdin)
    #[arg(long, conflicts_with = "text")]
    pub file: Option<PathBuf>,
    /// Store this text instead of raw bytes
    #[arg(long)]
    pub text: Option<String>,
    /// Encoding for --text
    #[arg(long, default_value = "utf-8")]
    pub encoding: TextEncoding,
}

#[derive(Args)]
pub struct GetDataArgs {
    pub dataset_id: DatasetId,
    /// Decode the payload as text
    #[arg(long)]
    pub text: bool,
    #[arg(long, default_value = "utf-8")]
    pub encoding: TextEncoding,
    /// Write the payload to a file instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Args)]
pub struct LogArgs {
    pub dataset_id: DatasetId,
    /// Only show versions of this kind (data or metadata)
    #[arg(long)]
    pub kind: Option<VersionKind>,
}

#[derive(Args)]
pub struct ServeArgs {
    /// TOML server config
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub bind: Option<SocketAddr>,
}
