//! qbank CLI - edit, list, and export a local question bank.

use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use qbank::cli::args::{
    AddArgs, ConfirmArgs, DeleteArgs, EditArgs, ExportArgs, InitArgs, ListArgs, ShowArgs,
    TextArgs, TransformArgs,
};
use qbank::cli::{confirmer, Cli, Command, GlobalArgs};
use qbank::config::{default_config_path, AppConfig};
use qbank::editor::{self, EditorMode, RecordDraft, Submission};
use qbank::export::export_records;
use qbank::storage::{StorageHandle, StoreLocation};
use qbank::view::{Outcome, QuestionTable};
use qbank::Record;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let initializing = matches!(cli.command, Command::Init(_));
    let config = resolve_config(&cli.global, initializing)?;
    debug!(?config, "resolved configuration");

    match cli.command {
        Command::Init(args) => run_init(&cli.global, &config, args),
        Command::Options(args) => run_options(args),
        Command::Stem(args) => run_stem(args),
        Command::Status => run_status(&cli.global, &config).await,
        command => {
            let handle = open_store(&config).await?;
            match command {
                Command::Add(args) => run_add(&handle, args).await,
                Command::Edit(args) => run_edit(&handle, args).await,
                Command::Show(args) => run_show(&handle, args).await,
                Command::List(args) => run_list(&handle, args).await,
                Command::Delete(args) => run_delete(&handle, args).await,
                Command::Clear(args) => run_clear(&handle, args).await,
                Command::Export(args) => run_export(&handle, &config, args).await,
                Command::Init(_)
                | Command::Options(_)
                | Command::Stem(_)
                | Command::Status => unreachable!("handled above"),
            }
        }
    }
}

/// Config file, then environment, then flags.
///
/// `allow_missing` lets `init` name a config file that does not exist yet.
fn resolve_config(global: &GlobalArgs, allow_missing: bool) -> Result<AppConfig> {
    let mut config = match (&global.config, allow_missing) {
        (Some(path), true) => AppConfig::load_or_default(path)?,
        (path, _) => AppConfig::load(path.as_deref())?,
    };
    if let Some(dir) = &global.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(db) = &global.db {
        config.database.name = db.clone();
    }
    if let Some(store) = &global.store {
        config.database.store = store.clone();
    }
    if let Some(version) = global.version_number {
        config.database.version = version;
    }
    Ok(config)
}

async fn open_store(config: &AppConfig) -> Result<StorageHandle> {
    let db = &config.database;
    StorageHandle::connect(config.location(), db.clone())
        .await
        .with_context(|| format!("Failed to open store '{}/{}'", db.name, db.store))
}

fn config_path(global: &GlobalArgs) -> Result<PathBuf> {
    global
        .config
        .clone()
        .or_else(default_config_path)
        .context("Could not determine a config directory; pass --config")
}

fn run_init(global: &GlobalArgs, config: &AppConfig, args: InitArgs) -> Result<()> {
    let path = config_path(global)?;
    if args.if_needed && path.exists() {
        println!("Already initialized ({})", path.display());
        return Ok(());
    }

    config.database.validate()?;
    config.save(&path)?;
    if let StoreLocation::Directory(dir) = config.location() {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create data directory: {}", dir.display()))?;
    }

    println!("Wrote config to {}", path.display());
    println!("Data directory: {}", config.data_dir.display());
    Ok(())
}

/// `new_options` is false when the options text came from the store unchanged.
fn apply_transforms(draft: &mut RecordDraft, transform: TransformArgs, new_options: bool) {
    if transform.strip_stem {
        draft.strip_stem_whitespace();
    }
    if new_options && !transform.raw_options {
        draft.format_options();
    }
}

fn report_submission(submission: Submission, verb: &str) {
    match submission {
        Submission::Saved(record) => println!("{verb} record '{}'", record.id),
        Submission::Cancelled => println!("Cancelled"),
    }
}

async fn run_add(handle: &StorageHandle, args: AddArgs) -> Result<()> {
    let mut draft = RecordDraft {
        id: args.id,
        provenance: args.provenance,
        stem: args.stem,
        topic: args.topic,
        options: args.options,
        answer: args.answer,
        analyze: args.analyze,
    };
    apply_transforms(&mut draft, args.transform, true);

    let mut confirm = confirmer(args.confirm);
    let submission =
        editor::submit(handle, &draft, EditorMode::Create, confirm.as_mut()).await?;
    report_submission(submission, "Added");
    Ok(())
}

async fn run_edit(handle: &StorageHandle, args: EditArgs) -> Result<()> {
    let mut table = QuestionTable::new();
    let mut draft = table.edit(handle, &args.id).await?;
    let new_options = args.options.is_some();

    let changes = [
        (&mut draft.provenance, args.provenance),
        (&mut draft.stem, args.stem),
        (&mut draft.topic, args.topic),
        (&mut draft.options, args.options),
        (&mut draft.answer, args.answer),
        (&mut draft.analyze, args.analyze),
    ];
    for (field, value) in changes {
        if let Some(value) = value {
            *field = value;
        }
    }
    apply_transforms(&mut draft, args.transform, new_options);

    let mut confirm = confirmer(args.confirm);
    let submission = table
        .save(handle, &draft, EditorMode::Edit, confirm.as_mut())
        .await?;
    report_submission(submission, "Updated");
    Ok(())
}

async fn run_show(handle: &StorageHandle, args: ShowArgs) -> Result<()> {
    let record = handle.get(&args.id).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
    } else {
        print_record(&record);
    }
    Ok(())
}

fn print_record(record: &Record) {
    println!("id:         {}", record.id);
    println!("provenance: {}", record.provenance);
    println!("stem:       {}", record.stem);
    println!("topic:      {}", record.topic);
    println!("options:    {}", record.options);
    println!("answer:     {}", record.answer);
    println!("analyze:    {}", record.analyze);
}

async fn run_list(handle: &StorageHandle, args: ListArgs) -> Result<()> {
    let mut table = QuestionTable::new();
    table.load(handle).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(table.rows())?);
    } else {
        println!("{}", table.render());
    }
    Ok(())
}

async fn run_delete(handle: &StorageHandle, args: DeleteArgs) -> Result<()> {
    let mut table = QuestionTable::new();
    let mut confirm = confirmer(args.confirm);
    match table.delete(handle, &args.id, confirm.as_mut()).await? {
        Outcome::Done => println!("Deleted record '{}'", args.id),
        Outcome::Cancelled => println!("Cancelled"),
    }
    Ok(())
}

async fn run_clear(handle: &StorageHandle, args: ConfirmArgs) -> Result<()> {
    let mut table = QuestionTable::new();
    let mut confirm = confirmer(args);
    match table.clear_all(handle, confirm.as_mut()).await? {
        Outcome::Done => println!("Cleared all records"),
        Outcome::Cancelled => println!("Cancelled"),
    }
    Ok(())
}

async fn run_export(handle: &StorageHandle, config: &AppConfig, args: ExportArgs) -> Result<()> {
    let rows = handle.get_all().await?;
    let path = export_records(&rows, &args.output, &config.export)
        .context("Failed to export spreadsheet")?;
    println!("Exported {} records to {}", rows.len(), path.display());
    Ok(())
}

fn read_text(args: TextArgs) -> Result<String> {
    match args.text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

fn run_options(args: TextArgs) -> Result<()> {
    println!("{}", editor::format_options(&read_text(args)?));
    Ok(())
}

fn run_stem(args: TextArgs) -> Result<()> {
    println!("{}", editor::strip_whitespace(&read_text(args)?));
    Ok(())
}

async fn run_status(global: &GlobalArgs, config: &AppConfig) -> Result<()> {
    let db = &config.database;
    match config_path(global) {
        Ok(path) if path.exists() => println!("Config:     {}", path.display()),
        _ => println!("Config:     (defaults)"),
    }
    println!("Data dir:   {}", config.data_dir.display());
    println!("Database:   {} (version {})", db.name, db.version);
    println!("Store:      {}", db.store);

    let handle = StorageHandle::new(config.location());
    match handle.open(db.clone()).await {
        Ok(()) => {
            println!("State:      {}", handle.state());
            println!("Records:    {}", handle.count().await?);
        }
        Err(err) => {
            println!("State:      {}", handle.state());
            println!("Error:      {err}");
        }
    }
    Ok(())
}
