use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use prefs_types::TypeTag;

#[derive(Parser)]
#[command(
    name = "prefs",
    about = "Inspect and edit prefs store files shared between processes",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Lock file to use instead of `<file>.lock`
    #[arg(long, global = true)]
    pub lock: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the store name and every entry
    Show(ShowArgs),
    /// Print a single entry
    Get(GetArgs),
    /// Create or replace an entry
    Set(SetArgs),
    /// Delete an entry
    Remove(RemoveArgs),
    /// Change the store name
    Rename(RenameArgs),
}

#[derive(Args)]
pub struct ShowArgs {
    pub file: PathBuf,
}

#[derive(Args)]
pub struct GetArgs {
    pub file: PathBuf,
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub file: PathBuf,
    pub key: String,
    /// One value, or any number of members for `--type set`
    #[arg(num_args = 0..)]
    pub values: Vec<String>,
    #[arg(short = 't', long = "type", default_value = "string")]
    pub kind: ValueKind,
}

#[derive(Args)]
pub struct RemoveArgs {
    pub file: PathBuf,
    pub key: String,
}

#[derive(Args)]
pub struct RenameArgs {
    pub file: PathBuf,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Boolean,
    String,
    Set,
}

impl From<ValueKind> for TypeTag {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => TypeTag::Int,
            ValueKind::Long => TypeTag::Long,
            ValueKind::Float => TypeTag::Float,
            ValueKind::Boolean => TypeTag::Boolean,
            ValueKind::String => TypeTag::String,
            ValueKind::Set => TypeTag::Set,
        }
    }
}
