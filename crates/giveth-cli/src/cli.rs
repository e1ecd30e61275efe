use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "giveth",
    about = "Giveth delegation tools: pledge allocation, note codec, dry runs",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// TOML config file; environment overrides apply on top
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Split an amount across donations, oldest first
    Allocate(AllocateArgs),
    /// Pack an amount and pledge id into a multi-transfer note
    Encode(EncodeArgs),
    /// Unpack multi-transfer notes
    Decode(DecodeArgs),
    /// Run a multi-delegation against an in-memory ledger and scripted chain
    Simulate(SimulateArgs),
    /// Print the effective configuration
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct AllocateArgs {
    /// JSON array of `{"id", "pledgeId", "amount"}` objects
    pub donations: PathBuf,
    /// Amount in wei
    pub amount: String,
}

#[derive(Args)]
pub struct EncodeArgs {
    /// Amount in wei
    pub amount: String,
    pub pledge_id: u64,
}

#[derive(Args)]
pub struct DecodeArgs {
    #[arg(required = true)]
    pub notes: Vec<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ProjectKind {
    Campaign,
    Milestone,
}

#[derive(Args)]
pub struct SimulateArgs {
    /// JSON array of `{"id", "pledgeId", "amount"}` objects, oldest first
    pub donations: PathBuf,
    /// Amount in wei
    pub amount: String,
    /// Admin id of the receiving project
    #[arg(long, default_value = "1")]
    pub project: u64,
    #[arg(long, value_enum, default_value = "milestone")]
    pub kind: ProjectKind,
    #[arg(long)]
    pub comment: Option<String>,
    /// Fail the transaction before its hash is known
    #[arg(long)]
    pub fail_before_hash: bool,
    /// Report "unknown transaction" after the hash is known
    #[arg(long, conflicts_with = "fail_before_hash")]
    pub unknown_tx: bool,
}

#[derive(Args)]
pub struct ConfigArgs {}
