//! CLI entry point for `mboxsplit`.

use std::path::PathBuf;
use std::time::Instant;

use clap::{CommandFactory, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use mboxsplit::config::{self, Config};
use mboxsplit::extract::{extract_mbox, RunSummary};

/// Split an MBOX archive into batched text digests and attachment files.
#[derive(Parser)]
#[command(name = "mboxsplit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// MBOX file to split (overrides `mbox_path`)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Config file (TOML)
    #[arg(short, long, value_name = "PATH", env = config::CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Output root directory (overrides `result_path`)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Messages per batch (overrides `grouped_messages_number`)
    #[arg(short, long, value_name = "N")]
    batch_size: Option<usize>,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
    /// Generate a man page
    Manpage,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => return cmd_completions(shell),
        Some(Commands::Manpage) => return cmd_manpage(),
        None => {}
    }

    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(file) = cli.file {
        config.mbox_path = file;
    }
    if let Some(output) = cli.output {
        config.result_path = output;
    }
    if let Some(batch_size) = cli.batch_size {
        config.grouped_messages_number = batch_size;
    }

    // Configure logging: stderr + optional log file
    let log_level = match cli.verbose {
        0 => config.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    cmd_split(&config, cli.json)
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
        let file_appender = tracing_appender::rolling::never(&log_dir, "mboxsplit.log");
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

/// Generate shell completions and print to stdout.
fn cmd_completions(shell: clap_complete::Shell) -> anyhow::Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "mboxsplit", &mut std::io::stdout());
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

/// Split the configured archive and print a summary.
fn cmd_split(config: &Config, json: bool) -> anyhow::Result<()> {
    config.validate()?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} Splitting [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let summary = extract_mbox(
        config,
        Some(&|current, total| {
            pb.set_length(total);
            pb.set_position(current);
        }),
    )?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    if json {
        print_summary_json(config, &summary, elapsed)?;
    } else {
        print_summary_table(config, &summary, elapsed);
    }

    Ok(())
}

/// Print the run summary as a human-readable table.
fn print_summary_table(config: &Config, summary: &RunSummary, elapsed: std::time::Duration) {
    use humansize::{format_size, BINARY};

    println!();
    println!("  {:<25} {}", "Archive", config.mbox_path.display());
    println!("  {:<25} {}", "Output", config.result_path.display());
    println!("  {:<25} {}", "Messages read", summary.messages_seen);
    println!("  {:<25} {}", "Messages extracted", summary.messages_parsed);
    if summary.messages_failed > 0 {
        println!("  {:<25} {}", "Messages skipped", summary.messages_failed);
    }
    println!("  {:<25} {}", "Batches written", summary.batches_written);
    println!("  {:<25} {}", "Attachments written", summary.attachments_written);
    if summary.attachments_failed > 0 {
        println!("  {:<25} {}", "Attachments failed", summary.attachments_failed);
    }
    println!(
        "  {:<25} {}",
        "Data written",
        format_size(summary.bytes_written, BINARY)
    );
    println!("  {:<25} {:.2?}", "Elapsed", elapsed);
    println!();
}

/// Print the run summary as JSON.
fn print_summary_json(
    config: &Config,
    summary: &RunSummary,
    elapsed: std::time::Duration,
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "mbox_path": config.mbox_path.to_string_lossy(),
        "result_path": config.result_path.to_string_lossy(),
        "summary": summary,
        "elapsed_ms": elapsed.as_millis(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
