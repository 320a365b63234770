//! CLI entry point for `maildoc`.

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser as ClapParser, Subcommand};

use maildoc::config::Config;
use maildoc::export::attachment::export_entries;
use maildoc::parser::eml::parse_eml;
use maildoc::source::{self, SearchCriteria};
use maildoc::{Document, Entry, Parser};

#[derive(ClapParser)]
#[command(
    name = "maildoc",
    version,
    about = "Decompose RFC 822 / MIME email messages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the envelope and content parts of a message
    Show {
        /// `.eml` file, mbox file or Maildir directory
        path: PathBuf,
        /// Message id inside an mbox or Maildir (1-based)
        #[arg(long)]
        id: Option<u32>,
        #[arg(long)]
        json: bool,
    },
    /// List the messages of an mbox file or Maildir directory
    List {
        path: PathBuf,
        /// Only messages not yet marked as read
        #[arg(long)]
        unseen: bool,
        #[arg(long)]
        json: bool,
    },
    /// Write each content part of a message to a directory
    Extract {
        path: PathBuf,
        #[arg(long)]
        id: Option<u32>,
        /// Output directory (defaults to the configured export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the configuration file
        #[arg(long)]
        save: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = maildoc::config::load_config();

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let parser = Parser::from_config(&config.parser);

    match cli.command {
        Commands::Show { path, id, json } => cmd_show(&path, id, json, &parser),
        Commands::List { path, unseen, json } => cmd_list(&path, unseen, json, &parser),
        Commands::Extract { path, id, output } => {
            cmd_extract(&path, id, output.as_deref(), &parser, &config)
        }
        Commands::Config { save } => cmd_config(&config, save),
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    // Try to set up file logging
    let log_dir = maildoc::config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "maildoc.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        // Fall back to stderr only
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Print the effective configuration, optionally saving it.
fn cmd_config(config: &Config, save: bool) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    if save {
        maildoc::config::save_config(config)?;
        if let Some(path) = maildoc::config::config_file_path() {
            eprintln!("  Saved to {}", path.display());
        }
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "maildoc", &mut std::io::stdout());
    Ok(())
}

/// Load one message: an `.eml` file directly, or message `id` of a mailbox.
fn load_document(path: &Path, id: Option<u32>, parser: &Parser) -> anyhow::Result<Document> {
    match id {
        None if path.is_file() => Ok(parse_eml(path, parser)?),
        None => anyhow::bail!("{} is a mailbox, pass --id to pick a message", path.display()),
        Some(id) => {
            let mut mailbox = source::open(path)?;
            Ok(mailbox.fetch_document(id, parser)?)
        }
    }
}

/// Parse one message and print its envelope and content parts.
fn cmd_show(path: &Path, id: Option<u32>, json: bool, parser: &Parser) -> anyhow::Result<()> {
    let doc = load_document(path, id, parser)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&document_json(&doc))?);
    } else {
        print_document(&doc);
    }
    Ok(())
}

/// List the messages of a mailbox.
fn cmd_list(path: &Path, unseen: bool, json: bool, parser: &Parser) -> anyhow::Result<()> {
    let mut mailbox = source::open(path)?;
    let criteria = if unseen {
        SearchCriteria::Unseen
    } else {
        SearchCriteria::All
    };
    let ids = mailbox.search(criteria)?;

    let mut rows = Vec::with_capacity(ids.len());
    for id in ids {
        let doc = mailbox.fetch_document(id, parser)?;
        rows.push((id, doc));
    }

    if json {
        let items: Vec<serde_json::Value> = rows
            .iter()
            .map(|(id, doc)| {
                serde_json::json!({
                    "id": id,
                    "date": doc.date().map(|d| d.to_rfc3339()),
                    "from": doc.from(),
                    "subject": doc.subject(),
                    "size": doc.raw().len(),
                })
            })
            .collect();
        let output = serde_json::json!({
            "message_count": mailbox.len(),
            "result_count": items.len(),
            "results": items,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_list_table(&rows);
    }
    Ok(())
}

/// Write the content leaves of one message to disk.
fn cmd_extract(
    path: &Path,
    id: Option<u32>,
    output: Option<&Path>,
    parser: &Parser,
    config: &Config,
) -> anyhow::Result<()> {
    let output = output
        .map(Path::to_path_buf)
        .or_else(|| config.export.default_output_dir.clone())
        .ok_or_else(|| anyhow::anyhow!("No output directory given (use -o)"))?;

    let doc = load_document(path, id, parser)?;
    let paths = export_entries(&doc, &output, config.export.max_filename_len)?;
    println!(
        "  Extracted {} part(s) to {}",
        paths.len(),
        output.display()
    );
    Ok(())
}

/// Print a message as a human-readable summary.
fn print_document(doc: &Document) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<12} {}", "From", doc.from());
    println!("  {:<12} {}", "To", doc.to());
    println!("  {:<12} {}", "Subject", doc.subject());
    if let Some(date) = doc.date() {
        println!("  {:<12} {}", "Date", date.to_rfc2822());
    }
    if !doc.return_path().is_empty() {
        println!("  {:<12} {}", "Return-Path", doc.return_path());
    }

    let entries = doc.entries();
    println!();
    println!("  {} part(s)", entries.len());
    if entries.is_empty() {
        println!();
        return;
    }

    println!("  {:<4} {:<26} {:<30} {:>10}", "#", "Type", "Name", "Size");
    println!("  {}", "-".repeat(73));
    for (i, entry) in entries.iter().enumerate() {
        let name: String = entry.name.as_deref().unwrap_or("").chars().take(29).collect();
        let mime: String = entry_type(entry).chars().take(25).collect();
        println!(
            "  {:<4} {:<26} {:<30} {:>10}",
            i + 1,
            mime,
            name,
            format_size(entry.content.len(), BINARY)
        );
    }

    if let Some(text) = doc.text_body() {
        println!();
        println!("{text}");
    }
    println!();
}

/// Print mailbox rows as a table.
fn print_list_table(rows: &[(u32, Document)]) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {} message(s)", rows.len());
    println!();
    if rows.is_empty() {
        return;
    }

    println!(
        "  {:<6} {:<17} {:<25} {:<40} {:>8}",
        "#", "Date", "From", "Subject", "Size"
    );
    println!("  {}", "-".repeat(100));

    for (id, doc) in rows {
        let date = doc
            .date()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let from = if doc.from().name.is_empty() {
            &doc.from().address
        } else {
            &doc.from().name
        };
        let from_trunc: String = from.chars().take(24).collect();
        let subj_trunc: String = doc.subject().chars().take(39).collect();

        println!(
            "  {:<6} {:<17} {:<25} {:<40} {:>8}",
            id,
            date,
            from_trunc,
            subj_trunc,
            format_size(doc.raw().len(), BINARY)
        );
    }
    println!();
}

/// Declared type string, or the classification label when none was given.
fn entry_type(entry: &Entry) -> &str {
    if entry.mime_type.is_empty() {
        entry.content_type.label()
    } else {
        &entry.mime_type
    }
}

/// Message as JSON: envelope plus one object per content leaf.
fn document_json(doc: &Document) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = doc
        .entries()
        .into_iter()
        .map(|e| {
            serde_json::json!({
                "content_type": e.content_type,
                "mime_type": entry_type(e),
                "name": e.name,
                "charset": e.charset,
                "transfer_encoding": e.transfer_encoding,
                "size": e.content.len(),
                "truncated": e.truncated,
                "text": e.text(),
            })
        })
        .collect();

    serde_json::json!({
        "return_path": doc.return_path(),
        "from": doc.from(),
        "to": doc.to(),
        "subject": doc.subject(),
        "date": doc.date().map(|d| d.to_rfc3339()),
        "entries": entries,
    })
}
