use std::cell::RefCell;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::atomic::Ordering;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;
use tracing::Level;

use textpatch::config::{AppConfig, ConfigManager, Provider};
use textpatch::core::{decode_input, Document, PatchError};
use textpatch::dictionary::{DictEntry, UserDictionary};
use textpatch::env::{core as core_env, EnvVar};
use textpatch::preview::PreviewMode;
use textpatch::sanitize;
use textpatch::store::EditStore;
use textpatch::storage::{LocalStore, Slot};
use textpatch::translation::{FallbackChain, TranslationError, TranslationLog, TranslationRun};
use textpatch::workspace::{self, Workspace};

#[derive(Parser)]
#[command(name = "textpatch")]
#[command(about = "Extract, edit and reinject translatable strings in HTML, XML and JSON")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors; wins over --verbose
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the strings export of a document
    Extract {
        file: PathBuf,
        /// Only list units whose value contains this text
        #[arg(long)]
        search: Option<String>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Apply a strings export and/or dictionary, then write the document
    Apply {
        file: PathBuf,
        #[command(flatten)]
        edits: EditArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Machine-translate every unlocked unit, then write the document
    Translate {
        file: PathBuf,
        /// Target language code
        #[arg(long)]
        to: Option<String>,
        /// Source language code, `auto` to detect
        #[arg(long)]
        from: Option<String>,
        /// Engine to try first: auto, google, mymemory, ai
        #[arg(long)]
        provider: Option<Provider>,
        #[command(flatten)]
        edits: EditArgs,
        /// Also write the strings export here
        #[arg(long)]
        strings_out: Option<PathBuf>,
        /// Also write the translation log here
        #[arg(long)]
        log_out: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Render the document with its edits as a standalone HTML page
    Preview {
        file: PathBuf,
        /// Strings export to show instead of the original values
        #[arg(long)]
        strings: Option<PathBuf>,
        /// code or page
        #[arg(long, default_value = "code")]
        mode: PreviewMode,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Strip scripts, iframes and event handlers from markup
    Sanitize {
        file: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the saved user dictionary
    Dict {
        #[command(subcommand)]
        action: DictAction,
    },
    /// Manage saved translation preferences
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
struct EditArgs {
    /// Strings export whose `translated` values are applied first
    #[arg(long)]
    strings: Option<PathBuf>,
    /// Dictionary file to apply
    #[arg(long)]
    dictionary: Option<PathBuf>,
    /// Apply the saved dictionary
    #[arg(long)]
    saved_dictionary: bool,
    /// Lock units holding code keywords and UI identifiers
    #[arg(long)]
    lock_reserved: bool,
    /// Replace leaked whitespace placeholders with spaces
    #[arg(long)]
    fix_spaces: bool,
}

#[derive(Subcommand)]
enum DictAction {
    List,
    Add {
        original: String,
        translated: String,
        /// Treat `original` as a regular expression
        #[arg(long)]
        regex: bool,
        /// Only apply when this attribute appears in the document
        #[arg(long)]
        attr_name: Option<String>,
    },
    Remove {
        original: String,
    },
    Clear,
    /// Merge a dictionary file into the saved one
    Import {
        file: PathBuf,
    },
    /// Write the saved dictionary, `dicionario.json` by default
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PrefsAction {
    Show,
    Set {
        #[arg(long)]
        provider: Option<Provider>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        key: Option<String>,
    },
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write the default configuration, `textpatch.toml` by default
    Init {
        path: Option<PathBuf>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// List the environment variables read at startup
    Env,
}

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error("translation setup failed: {0}")]
    Translation(#[from] TranslationError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CliError {
    fn exit_code(&self) -> u8 {
        match self {
            CliError::Patch(PatchError::Parse { .. })
            | CliError::Patch(PatchError::UnsupportedFormat(_))
            | CliError::Patch(PatchError::Serialization(_))
            | CliError::Patch(PatchError::InvalidPattern { .. }) => 65,
            CliError::Patch(PatchError::Io(_)) | CliError::Io(_) => 74,
            CliError::Patch(PatchError::Config(_)) => 78,
            CliError::Translation(_) => 69,
        }
    }
}

type CliResult<T> = Result<T, CliError>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        core_env::LogLevel::get()
            .ok()
            .and_then(|level| Level::from_str(&level).ok())
            .unwrap_or(Level::INFO)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(!core_env::NoColor::get_or_default(false))
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> CliResult<()> {
    let manager = ConfigManager::load(cli.config.as_deref())?;
    let source = manager.source().map(Path::to_path_buf);
    let mut config = manager.into_config();
    let local = LocalStore::from_config(&config);
    match &local {
        Ok(local) => local.apply_preferences(&mut config),
        Err(e) => tracing::debug!("No saved preferences: {}", e),
    }

    match cli.command {
        Command::Extract {
            file,
            search,
            output,
        } => {
            let workspace = Workspace::open(&file)?;
            match search {
                Some(term) => {
                    for unit in workspace.store().search(&term) {
                        println!("{}\t{}", unit.id, unit.current);
                    }
                    Ok(())
                }
                None => emit(output.as_deref(), &workspace.strings_json()?),
            }
        }
        Command::Apply {
            file,
            edits,
            output,
        } => {
            let mut workspace = Workspace::open(&file)?;
            apply_edits(&mut workspace, &edits, &local)?;
            write_document(&workspace, &file, output.as_deref())
        }
        Command::Translate {
            file,
            to,
            from,
            provider,
            edits,
            strings_out,
            log_out,
            output,
        } => {
            if let Some(to) = to {
                config.target_lang = to;
            }
            if let Some(from) = from {
                config.source_lang = from;
            }
            if let Some(provider) = provider {
                config.provider = provider;
            }

            let document = Document::from_path(&file)?;
            let mut workspace = Workspace::load_cooperative(document, config.batch_size).await?;
            if let Some(strings) = &edits.strings {
                workspace.import_strings(strings)?;
            }
            if edits.lock_reserved {
                workspace.store_mut().lock_reserved_terms();
            }

            let log = translate(&mut workspace, &config).await?;

            let post = EditArgs {
                strings: None,
                lock_reserved: false,
                ..edits
            };
            apply_edits(&mut workspace, &post, &local)?;

            if let Some(path) = strings_out {
                workspace.write_strings(&path)?;
            }
            if let Some(path) = log_out {
                workspace::write_log(&log, &path)?;
            }
            write_document(&workspace, &file, output.as_deref())
        }
        Command::Preview {
            file,
            strings,
            mode,
            output,
        } => {
            let mut workspace = Workspace::open(&file)?;
            if let Some(strings) = strings {
                workspace.import_strings(&strings)?;
            }
            emit(output.as_deref(), &workspace.preview(mode))
        }
        Command::Sanitize { file, output } => {
            let markup = decode_input(&fs::read(&file)?);
            emit(output.as_deref(), &sanitize(&markup))
        }
        Command::Dict { action } => run_dict(action, state(&local)?),
        Command::Prefs { action } => run_prefs(action, state(&local)?, &config),
        Command::Config { action } => run_config(action, &config, source.as_deref()),
    }
}

/// The state directory, which only dictionary and preference commands require
fn state(local: &Result<LocalStore, PatchError>) -> CliResult<&LocalStore> {
    local
        .as_ref()
        .map_err(|e| CliError::Patch(PatchError::Config(e.to_string())))
}

fn apply_edits(
    workspace: &mut Workspace,
    edits: &EditArgs,
    local: &Result<LocalStore, PatchError>,
) -> CliResult<()> {
    if let Some(strings) = &edits.strings {
        let changed = workspace.import_strings(strings)?;
        tracing::info!("Strings export changed {} units", changed);
    }
    if edits.lock_reserved {
        workspace.store_mut().lock_reserved_terms();
    }

    let mut dictionary = UserDictionary::new();
    if edits.saved_dictionary {
        dictionary.merge(state(local)?.load_dictionary()?);
    }
    if let Some(path) = &edits.dictionary {
        dictionary.merge(UserDictionary::load(path)?);
    }
    if !dictionary.is_empty() {
        let (_, errors) = workspace.apply_dictionary(&dictionary);
        for error in errors {
            eprintln!("Skipped dictionary entry: {error}");
        }
    }

    if edits.fix_spaces {
        let fixed = workspace.store_mut().fix_space_tokens();
        tracing::info!("Fixed spacing in {} units", fixed);
    }
    Ok(())
}

async fn translate(workspace: &mut Workspace, config: &AppConfig) -> CliResult<TranslationLog> {
    let chain = FallbackChain::from_config(config)?;
    let run = TranslationRun::new(&chain, &config.source_lang, &config.target_lang);

    let cancel = run.cancel_flag();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nCancelling after the current unit...");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    let generation = workspace.document().generation();
    let store = RefCell::new(workspace.replace_store(EditStore::new(generation)));
    let mut log = TranslationLog::new();
    let summary = run
        .run(&store, &mut log, |progress| {
            tracing::debug!("{}/{}", progress.completed, progress.total);
            eprint!("\rTranslating... {:>3}%", progress.percent());
            // Progress display only; the run goes on without it
            if let Err(e) = io::stderr().flush() {
                tracing::debug!("Progress line not flushed: {}", e);
            }
        })
        .await;
    eprintln!();
    watcher.abort();

    workspace.replace_store(store.into_inner());

    if summary.cancelled {
        tracing::warn!("Translation cancelled; applied translations are kept");
    }
    if summary.failed > 0 {
        tracing::warn!("{} units kept their value after every engine failed", summary.failed);
    }
    eprintln!(
        "Translated {}, unchanged {}, failed {}, skipped {}, discarded {}",
        summary.translated, summary.unchanged, summary.failed, summary.skipped, summary.discarded
    );

    Ok(log)
}

fn write_document(workspace: &Workspace, input: &Path, output: Option<&Path>) -> CliResult<()> {
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => input
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(workspace.output_file_name()),
    };

    let export = workspace.write_document(&path)?;
    for id in &export.report.skipped {
        eprintln!("Skipped stale unit {id}");
    }
    eprintln!(
        "Wrote {} ({} edits applied)",
        export.file.path.display(),
        export.report.applied
    );
    Ok(())
}

/// Writes `content` to `output`, or stdout
fn emit(output: Option<&Path>, content: &str) -> CliResult<()> {
    match output {
        Some(path) => fs::write(path, content)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn run_dict(action: DictAction, local: &LocalStore) -> CliResult<()> {
    let mut dictionary = local.load_dictionary()?;

    match action {
        DictAction::List => {
            for entry in dictionary.entries() {
                let mut flags = Vec::new();
                if entry.regex {
                    flags.push("regex".to_string());
                }
                if let Some(attr_name) = &entry.attr_name {
                    flags.push(format!("attr={attr_name}"));
                }
                if flags.is_empty() {
                    println!("{}\t{}", entry.original, entry.translated);
                } else {
                    println!("{}\t{}\t[{}]", entry.original, entry.translated, flags.join(", "));
                }
            }
            return Ok(());
        }
        DictAction::Add {
            original,
            translated,
            regex,
            attr_name,
        } => {
            let mut entry = if regex {
                DictEntry::pattern(&original, &translated)
            } else {
                DictEntry::literal(&original, &translated)
            };
            if let Some(attr_name) = attr_name {
                entry = entry.with_attr_name(&attr_name);
            }
            dictionary.insert(entry);
        }
        DictAction::Remove { original } => {
            if !dictionary.remove(&original) {
                eprintln!("No entry for \"{original}\"");
                return Ok(());
            }
        }
        DictAction::Clear => dictionary.clear(),
        DictAction::Import { file } => {
            let added = dictionary.merge(UserDictionary::load(&file)?);
            eprintln!("Imported {added} entries");
        }
        DictAction::Export { output } => {
            let file = match output {
                Some(path) => workspace::write_dictionary(&dictionary, &path)?,
                None => workspace::export_dictionary(&dictionary, Path::new("."))?,
            };
            eprintln!("Wrote {}", file.path.display());
            return Ok(());
        }
    }

    local.save_dictionary(&dictionary)?;
    Ok(())
}

fn run_prefs(action: PrefsAction, local: &LocalStore, config: &AppConfig) -> CliResult<()> {
    match action {
        PrefsAction::Show => {
            println!("provider\t{}", config.provider);
            println!("model\t{}", config.ai_model);
            println!(
                "key\t{}",
                if config.ai_key().is_some() { "set" } else { "unset" }
            );
            println!("state\t{}", local.dir().display());
        }
        PrefsAction::Set {
            provider,
            model,
            key,
        } => {
            if let Some(provider) = provider {
                local.set_provider(provider)?;
            }
            if let Some(model) = model {
                local.set_ai_model(&model)?;
            }
            if let Some(key) = key {
                local.set_ai_key(&key)?;
            }
        }
        PrefsAction::Clear => {
            for slot in [Slot::SelectedAiModel, Slot::TranslationProvider, Slot::CustomAiKey] {
                local.remove(slot)?;
            }
        }
    }
    Ok(())
}

fn run_config(action: ConfigAction, config: &AppConfig, source: Option<&Path>) -> CliResult<()> {
    match action {
        ConfigAction::Show => {
            match source {
                Some(path) => eprintln!("# from {}", path.display()),
                None => eprintln!("# no configuration file, defaults and environment only"),
            }
            let mut shown = config.clone();
            if shown.ai_key.is_some() {
                shown.ai_key = Some("<redacted>".to_string());
            }
            let rendered = toml::to_string_pretty(&shown)
                .map_err(|e| PatchError::Config(format!("failed to serialize configuration: {e}")))?;
            print!("{rendered}");
        }
        ConfigAction::Init { path, force } => {
            let path = path.unwrap_or_else(|| PathBuf::from("textpatch.toml"));
            if path.exists() && !force {
                return Err(PatchError::Config(format!(
                    "{} already exists, pass --force to overwrite",
                    path.display()
                ))
                .into());
            }
            ConfigManager::generate_example_config(&path)?;
            eprintln!("Wrote {}", path.display());
        }
        ConfigAction::Env => print!("{}", textpatch::env::generate_env_docs()),
    }
    Ok(())
}
