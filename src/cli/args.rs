//! Command-line argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Edit, list, and export a local question bank.
#[derive(Parser, Debug)]
#[command(name = "qbank")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Config file (defaults to the platform config directory).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding database files, or `:memory:`.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Database name.
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Store (table) name inside the database.
    #[arg(long, global = true)]
    pub store: Option<String>,

    /// Schema version to open the database at.
    #[arg(long = "version-number", global = true)]
    pub version_number: Option<u32>,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a default config file and create the data directory.
    Init(InitArgs),

    /// Add a new record.
    Add(AddArgs),

    /// Change fields of an existing record.
    Edit(EditArgs),

    /// Show one record.
    Show(ShowArgs),

    /// List all records.
    List(ListArgs),

    /// Delete one record.
    Delete(DeleteArgs),

    /// Delete every record in the store.
    Clear(ConfirmArgs),

    /// Export all records to a spreadsheet.
    Export(ExportArgs),

    /// Normalize option lines into `A | B | C | D` form.
    Options(TextArgs),

    /// Remove all whitespace from a question stem.
    Stem(TextArgs),

    /// Show configuration and store status.
    Status,
}

/// Arguments for the init command.
#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Only initialize if not already initialized.
    #[arg(long)]
    pub if_needed: bool,
}

/// Skip confirmation prompts.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ConfirmArgs {
    /// Answer yes to every confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,
}

/// How to treat stem and options text before saving.
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct TransformArgs {
    /// Remove all whitespace from the stem.
    #[arg(long)]
    pub strip_stem: bool,

    /// Store options exactly as given instead of normalizing them.
    ///
    /// Escape hatch for options that are not `A.`-`D.` labeled lines, such as
    /// pre-formatted HTML. Such options are stored outside the `A | B | C | D`
    /// form, and later edits leave them alone unless `--options` is passed.
    #[arg(long)]
    pub raw_options: bool,
}

/// Arguments for the add command.
#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Record id, e.g. `1-1` for group one, question one.
    #[arg(long)]
    pub id: String,

    /// Where the question comes from.
    #[arg(long)]
    pub provenance: String,

    /// Question stem.
    #[arg(long)]
    pub stem: String,

    /// Question body.
    #[arg(long)]
    pub topic: String,

    /// Options, one per line (`A. ...`).
    #[arg(long)]
    pub options: String,

    /// Correct option (A-D).
    #[arg(long)]
    pub answer: String,

    /// Explanation.
    #[arg(long)]
    pub analyze: String,

    #[command(flatten)]
    pub transform: TransformArgs,

    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

/// Arguments for the edit command.
#[derive(Parser, Debug)]
pub struct EditArgs {
    /// Id of the record to change.
    pub id: String,

    #[arg(long)]
    pub provenance: Option<String>,

    #[arg(long)]
    pub stem: Option<String>,

    #[arg(long)]
    pub topic: Option<String>,

    #[arg(long)]
    pub options: Option<String>,

    #[arg(long)]
    pub answer: Option<String>,

    #[arg(long)]
    pub analyze: Option<String>,

    #[command(flatten)]
    pub transform: TransformArgs,

    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

/// Arguments for the show command.
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Id of the record to show.
    pub id: String,

    /// Print JSON instead of labeled fields.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the list command.
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the delete command.
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Id of the record to delete.
    pub id: String,

    #[command(flatten)]
    pub confirm: ConfirmArgs,
}

/// Arguments for the export command.
#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Directory to write the spreadsheet into.
    #[arg(long, short, default_value = ".")]
    pub output: PathBuf,
}

/// Text input for the transform commands.
#[derive(Parser, Debug)]
pub struct TextArgs {
    /// Text to transform; read from stdin when omitted.
    pub text: Option<String>,
}
