//! ctxpack CLI - pack a source tree into one LLM-ready document

// CLI tools legitimately use print macros for user output
#![allow(clippy::print_stdout, clippy::print_stderr)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

mod scanner;

use ctxpack_engine::{
    pack, security::summarize, Config, MetricsSummary, PackInputs, PackOptions,
    SecurityCheckResult,
};
use scanner::{scan_directory, ScanConfig};

/// ctxpack - pack a source tree into one document for LLMs
#[derive(Parser)]
#[command(
    name = "ctxpack",
    version,
    about = "Pack a source tree into a single LLM-ready document",
    long_about = "ctxpack renders selected files into one xml, plain or markdown document,\n\
                  with token metrics and a scan for committed secrets."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory into a single document
    Pack {
        /// Directory to pack (default: current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output style
        #[arg(short, long, value_enum)]
        style: Option<Style>,

        /// Token encoding (o200k_base, cl100k_base, p50k_base, p50k_edit, r50k_base)
        #[arg(long)]
        encoding: Option<String>,

        /// Output file (relative paths resolve against the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the artifact to stdout instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Path to config file (default: ctxpack.config.* in the packed directory)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Custom header text to include near the top
        #[arg(long)]
        header_text: Option<String>,

        /// Skip the secret scan
        #[arg(long)]
        no_security_check: bool,

        /// Secret scan rule set (recommend, strict)
        #[arg(long)]
        rule_set: Option<String>,

        /// Number of files shown in the top files report
        #[arg(long)]
        top_files: Option<usize>,

        /// Worker threads for metrics and scanning
        #[arg(long)]
        threads: Option<usize>,

        /// Include hidden files
        #[arg(long)]
        hidden: bool,

        /// Don't respect .gitignore
        #[arg(long)]
        no_gitignore: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a default configuration file
    Init {
        /// Output path (default: ctxpack.config.yaml in current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[derive(ValueEnum, Clone, Copy)]
enum Style {
    /// XML tags with CDATA file bodies
    Xml,
    /// Plain text with separator rules
    Plain,
    /// Markdown headings and code fences
    Markdown,
}

impl Style {
    fn identifier(self) -> &'static str {
        match self {
            Style::Xml => "xml",
            Style::Plain => "plain",
            Style::Markdown => "markdown",
        }
    }
}

/// Settings for one `pack` invocation
struct PackArgs {
    path: PathBuf,
    style: Option<Style>,
    encoding: Option<String>,
    output: Option<PathBuf>,
    stdout: bool,
    config: Option<PathBuf>,
    header_text: Option<String>,
    no_security_check: bool,
    rule_set: Option<String>,
    top_files: Option<usize>,
    threads: Option<usize>,
    hidden: bool,
    no_gitignore: bool,
    json: bool,
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Pack { verbose: true, .. });
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(if verbose { "info" } else { "warn" }),
    )
    .init();

    let result = match cli.command {
        Commands::Pack {
            path,
            style,
            encoding,
            output,
            stdout,
            config,
            header_text,
            no_security_check,
            rule_set,
            top_files,
            threads,
            hidden,
            no_gitignore,
            json,
            verbose,
        } => cmd_pack(PackArgs {
            path,
            style,
            encoding,
            output,
            stdout,
            config,
            header_text,
            no_security_check,
            rule_set,
            top_files,
            threads,
            hidden,
            no_gitignore,
            json,
            verbose,
        }),
        Commands::Init { output, force } => cmd_init(output, force),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

/// Load config and layer command-line overrides on top
fn resolve_config(args: &PackArgs) -> Result<Config> {
    let mut config = Config::load(&args.path, args.config.as_deref())?;

    if let Some(style) = args.style {
        config.output.style = style.identifier().to_owned();
    }
    if let Some(encoding) = &args.encoding {
        config.token_count.encoding = encoding.clone();
    }
    if let Some(output) = &args.output {
        config.output.file_path = output.to_string_lossy().into_owned();
    }
    if let Some(header) = &args.header_text {
        config.output.header_text = Some(header.clone());
    }
    if args.no_security_check {
        config.security.enable_security_check = false;
    }
    if let Some(rule_set) = &args.rule_set {
        config.security.rule_set = rule_set.clone();
    }
    if let Some(top) = args.top_files {
        config.output.top_files_length = top;
    }
    if args.threads.is_some() {
        config.performance.threads = args.threads;
    }

    Ok(config)
}

fn cmd_pack(args: PackArgs) -> Result<()> {
    let start = Instant::now();
    let config = resolve_config(&args)?;

    // a configured relative output path lives in the packed directory
    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => args.path.join(&config.output.file_path),
    };

    let pb = if args.verbose && !args.json {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Scanning directory...");
        Some(pb)
    } else {
        None
    };

    let scan_config = ScanConfig {
        include_hidden: args.hidden,
        respect_gitignore: !args.no_gitignore,
        exclude: vec![output_path.clone()],
        ..ScanConfig::default()
    };
    let scanned = scan_directory(&args.path, &scan_config)?;
    if scanned.skipped > 0 {
        log::info!("Skipped {} binary, unreadable or oversized files", scanned.skipped);
    }
    let inputs = PackInputs::from_raw(scanned.files);

    let progress = |message: &str| {
        if let Some(pb) = &pb {
            pb.set_message(message.to_owned());
        }
    };
    let result = pack(&inputs, &config, &PackOptions::default(), &progress)?;

    if let Some(pb) = &pb {
        pb.finish_and_clear();
    }

    if args.stdout {
        print!("{}", result.output);
    } else {
        std::fs::write(&output_path, &result.output)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
    }

    if args.json {
        let written_to = (!args.stdout).then(|| output_path.display().to_string());
        let summary = serde_json::json!({
            "output_path": written_to,
            "style": config.output.output_style().name(),
            "encoding": config.token_count.encoding,
            "metrics": result.metrics,
            "security": result.security,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    // keep the artifact clean when it goes to stdout
    if !args.stdout {
        print_top_files(&result.metrics, config.output.top_files_length);
        print_security(result.security.as_ref());
        print_summary(&result.metrics, &output_path, result.output.len(), start.elapsed());
    }

    Ok(())
}

fn print_top_files(metrics: &MetricsSummary, count: usize) {
    if count == 0 || metrics.total_files == 0 {
        return;
    }
    println!("{}", format!("Top {} Files by Character Count:", count).cyan().bold());
    for (i, (path, chars)) in metrics.top_files(count).into_iter().enumerate() {
        let tokens = metrics.file_tokens(path).unwrap_or(0);
        println!("{:>3}. {} ({} chars, {} tokens)", i + 1, path, chars, tokens);
    }
    println!();
}

fn print_security(security: Option<&SecurityCheckResult>) {
    let Some(security) = security else {
        println!("{} {}", "Security:".cyan().bold(), "check disabled".dimmed());
        println!();
        return;
    };

    if security.is_clean() {
        println!("{} {}", "Security:".cyan().bold(), summarize(security).green());
        println!();
        return;
    }

    println!("{} {}", "Security:".cyan().bold(), summarize(security).yellow());
    for file in &security.suspicious_files {
        println!("  {}", file.file_path.yellow());
        for message in &file.messages {
            println!("    - {}", message);
        }
    }
    for fault in &security.faults {
        println!("  {} {}", fault.file_path.red(), fault.message.dimmed());
    }
    println!("  {}", "Review these files before sharing the output.".dimmed());
    println!();
}

fn print_summary(metrics: &MetricsSummary, output_path: &Path, bytes: usize, elapsed: Duration) {
    println!("{}", "Pack Summary:".cyan().bold());
    println!("  Total Files: {}", metrics.total_files);
    println!("  Total Lines: {}", metrics.total_lines);
    println!("  Total Chars: {}", metrics.total_characters);
    println!("  Total Tokens: {}", metrics.total_tokens);
    println!("  Output: {} ({})", output_path.display(), format_size(bytes, BINARY));
    println!(
        "  Time: {}",
        humantime::format_duration(Duration::from_millis(elapsed.as_millis() as u64))
    );
    println!();
    println!("{}", "All done!".green().bold());
}

fn cmd_init(output: Option<PathBuf>, force: bool) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from("ctxpack.config.yaml"));
    if path.exists() && !force {
        anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
    }
    let yaml = Config::default_yaml()?;
    std::fs::write(&path, yaml)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("{} {}", "Created".green().bold(), path.display());
    Ok(())
}
