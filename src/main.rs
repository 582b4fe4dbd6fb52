//! CLI entry point for `elogsubmit`.

use std::path::{Path, PathBuf};

use clap::{Args, CommandFactory, Parser, Subcommand};

use elogsubmit::config::{self, Config};
use elogsubmit::delivery;
use elogsubmit::{Entry, Outcome, StructuralValidator, Submitter};

#[derive(Parser)]
#[command(
    name = "elogsubmit",
    version,
    about = "Create electronic logbook entries and submit them to the logbook server"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an entry, queueing it if the server is unreachable
    Submit {
        #[command(flatten)]
        entry: EntryArgs,
        /// Fail instead of queueing when the server is unreachable
        #[arg(long)]
        now: bool,
    },
    /// Write an entry to the queue directory without contacting the server
    Queue {
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Validate a Logentry XML file
    Validate {
        file: PathBuf,
    },
    /// Print the XML of an entry (or save it with --output)
    Print {
        #[command(flatten)]
        entry: EntryArgs,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        save: bool,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

/// Fields of the entry to build.
#[derive(Args)]
struct EntryArgs {
    /// Entry title
    #[arg(short, long)]
    title: String,

    /// Logbook to file the entry in (repeatable)
    #[arg(short, long = "logbook", value_name = "LOGBOOK", required = true)]
    logbooks: Vec<String>,

    /// Body text
    #[arg(short, long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the body from a file
    #[arg(long, value_name = "FILE")]
    body_file: Option<PathBuf>,

    /// Body format: text, html, full_html, ...
    #[arg(long, default_value = "text")]
    body_type: String,

    /// Author username (defaults to the current user)
    #[arg(short, long)]
    author: Option<String>,

    /// Username of someone who made the entry (repeatable)
    #[arg(long = "entrymaker", value_name = "USERNAME")]
    entrymakers: Vec<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,

    /// Email address or username to notify (repeatable)
    #[arg(short, long = "notify", value_name = "WHO")]
    notify: Vec<String>,

    /// Reference as TYPE:ID, e.g. atlis:100 (repeatable)
    #[arg(short, long = "reference", value_name = "TYPE:ID")]
    references: Vec<String>,

    /// File to attach (repeatable)
    #[arg(long = "attach", value_name = "FILE")]
    attachments: Vec<PathBuf>,

    /// URL to attach (repeatable)
    #[arg(long = "attach-url", value_name = "URL")]
    attachment_urls: Vec<String>,

    /// Creation time (RFC 3339, RFC 2822, Unix time, ...)
    #[arg(long)]
    created: Option<String>,

    /// Existing lognumber (re-imports only)
    #[arg(long)]
    lognumber: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = config::load_config()?;

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    let json = cli.json;

    match cli.command {
        Commands::Submit { entry, now } => cmd_submit(&entry, now, json, config),
        Commands::Queue { entry } => cmd_queue(&entry, json, config),
        Commands::Validate { file } => cmd_validate(&file, json, &config),
        Commands::Print { entry, output } => cmd_print(&entry, output.as_deref(), &config),
        Commands::Config { save } => cmd_config(save, json, &config),
        Commands::Completions { shell } => cmd_completions(shell),
        Commands::Manpage => cmd_manpage(),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "elogsubmit.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

/// Build an entry from command-line fields.
fn build_entry(args: &EntryArgs, config: &Config) -> anyhow::Result<Entry> {
    let mut entry = Entry::new(args.title.as_str(), &args.logbooks)?;
    entry.set_email_domain(config.notify.email_domain.clone());

    if let Some(author) = &args.author {
        entry.set_author(author)?;
    }
    if let Some(created) = &args.created {
        entry.set_created_str(created)?;
    }
    if let Some(lognumber) = args.lognumber {
        entry.set_lognumber(lognumber);
    }

    let body = match (&args.body, &args.body_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(
            std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?,
        ),
        (None, None) => None,
    };
    if let Some(body) = body {
        entry.set_body_typed(body, &args.body_type);
    }

    for maker in &args.entrymakers {
        entry.add_entry_maker(maker)?;
    }
    for tag in &args.tags {
        entry.add_tag(tag);
    }
    for who in &args.notify {
        entry.add_notify(who);
    }
    for reference in &args.references {
        let (kind, id) = reference
            .split_once(':')
            .ok_or_else(|| anyhow::anyhow!("reference '{reference}' is not TYPE:ID"))?;
        entry.add_reference(kind, id);
    }
    for path in &args.attachments {
        entry.add_attachment(path, None, None)?;
    }
    for url in &args.attachment_urls {
        entry.add_attachment_url(url, None, None);
    }

    Ok(entry)
}

fn cmd_submit(args: &EntryArgs, now: bool, json: bool, config: Config) -> anyhow::Result<()> {
    let mut entry = build_entry(args, &config)?;
    let submitter = Submitter::from_config(config)?;

    let outcome = if now {
        Outcome::Delivered(submitter.submit_now(&mut entry)?)
    } else {
        submitter.submit(&mut entry)?
    };
    print_outcome(&outcome, json)
}

fn cmd_queue(args: &EntryArgs, json: bool, config: Config) -> anyhow::Result<()> {
    let entry = build_entry(args, &config)?;
    let submitter = Submitter::from_config(config)?;
    let path = submitter.queue(&entry)?;
    print_outcome(&Outcome::Queued(path), json)
}

fn cmd_validate(file: &Path, json: bool, config: &Config) -> anyhow::Result<()> {
    let validator =
        StructuralValidator::new().with_known_logbooks(&config.service.known_logbooks);
    delivery::validate_file(&validator, &config.service.schema_url, file)?;
    if json {
        let out = serde_json::json!({ "file": file.display().to_string(), "valid": true });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}: valid", file.display());
    }
    Ok(())
}

fn cmd_print(args: &EntryArgs, output: Option<&Path>, config: &Config) -> anyhow::Result<()> {
    let entry = build_entry(args, config)?;
    match output {
        Some(path) => {
            entry.save_to_file(path)?;
            println!("Saved to {}", path.display());
        }
        None => println!("{}", entry.to_xml()?),
    }
    Ok(())
}

fn cmd_config(save: bool, json: bool, config: &Config) -> anyhow::Result<()> {
    if save {
        let path = config::save_config(config)?;
        println!("Saved to {}", path.display());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        if let Some(path) = config::config_file_path() {
            println!("# {}", path.display());
        }
        print!("{}", toml::to_string_pretty(config)?);
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }
    match outcome {
        Outcome::Delivered(receipt) => {
            println!("Lognumber: {}", receipt.lognumber);
            if let Some(url) = &receipt.url {
                println!("URL:       {url}");
            }
            if let Some(msg) = &receipt.msg {
                println!("Message:   {msg}");
            }
        }
        Outcome::Queued(path) => println!("Queued:    {}", path.display()),
    }
    Ok(())
}

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "elogsubmit", &mut std::io::stdout());
    Ok(())
}

/// Generate a man page and print to stdout.
fn cmd_manpage() -> anyhow::Result<()> {
    let cmd = Cli::command();
    let man = clap_mangen::Man::new(cmd);
    let mut buf = Vec::new();
    man.render(&mut buf)?;
    std::io::Write::write_all(&mut std::io::stdout(), &buf)?;
    Ok(())
}
