use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use md_corpus::VERSION;
use md_corpus::config::{Config, ProviderKind, ProviderSettings};
use md_corpus::corpus::Corpus;
use md_corpus::error::Error;
use md_corpus::formatter::CommonMarkFormatter;
use md_corpus::storage;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "md-corpus",
    version,
    about = "Convert local resource links in Markdown files to cloud storage URLs"
)]
struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
    /// Log debug output to stderr (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload local resources and rewrite their links to cloud storage URLs
    Convert(ConvertArgs),
    /// Normalize markdown formatting in place
    Format {
        /// Markdown file or directory of markdown files
        #[arg(value_parser = existing_path)]
        path: PathBuf,
    },
    /// Show the version of md-corpus
    Version,
}

/// Flags for `convert`. Unset values fall back to the provider's environment
/// variables, then to `.md-corpus.toml`.
#[derive(Args)]
struct ConvertArgs {
    /// Provider access key
    #[arg(long)]
    access_key: Option<String>,
    /// Storage bucket name
    #[arg(long)]
    bucket: Option<String>,
    /// Custom domain name (CNAME) for the bucket
    #[arg(long)]
    cname: Option<String>,
    /// Storage endpoint (Aliyun), or an S3-compatible endpoint (AWS)
    #[arg(long)]
    endpoint: Option<String>,
    /// Upload through the internal endpoint (Aliyun)
    #[arg(long)]
    internal: bool,
    /// Markdown file or directory of markdown files
    #[arg(value_parser = existing_path)]
    path: PathBuf,
    /// Storage provider to use
    #[arg(long, value_enum)]
    provider: ProviderKind,
    /// AWS region
    #[arg(long)]
    region: Option<String>,
    /// Provider secret key
    #[arg(long)]
    secret_key: Option<String>,
}

/// Reject paths that don't exist at argument-parsing time.
///
/// # Errors
///
/// Returns a usage message naming the missing path.
fn existing_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if !path.exists() {
        return Err(format!("path '{raw}' does not exist"));
    }
    return Ok(path);
}

/// Log to stderr so stdout carries only the report.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "md_corpus=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_err| return EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert(args) => run_convert(&args),
        Commands::Format { path } => run_format(&path),
        Commands::Version => {
            println!("md-corpus version {VERSION}");
            Ok(())
        },
    };

    return match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
        Ok(()) => ExitCode::SUCCESS,
    };
}

/// Layer flags over environment variables over the config file's `[storage]` table.
fn provider_settings(args: &ConvertArgs, file_defaults: ProviderSettings) -> ProviderSettings {
    let flags = ProviderSettings {
        access_key: args.access_key.clone(),
        bucket: args.bucket.clone(),
        cname: args.cname.clone(),
        endpoint: args.endpoint.clone(),
        internal: args.internal.then_some(true),
        region: args.region.clone(),
        secret_key: args.secret_key.clone(),
    };
    let env = ProviderSettings::from_env(args.provider, |name| return std::env::var(name).ok());
    return flags.or(env).or(file_defaults);
}

/// Print the list of processed files.
fn report(processed: &[PathBuf]) {
    println!("Processed {} files:", processed.len());
    for file in processed {
        println!("  - {}", file.display());
    }
}

/// Build the provider, then convert a file or every markdown file in a directory.
///
/// # Errors
///
/// Returns provider construction errors before touching any document,
/// then the first document error.
fn run_convert(args: &ConvertArgs) -> Result<(), Error> {
    let config = Config::load(Path::new("."))?;
    let settings = provider_settings(args, config.storage);
    let provider = storage::connect(args.provider, &settings)?;
    let corpus = Corpus::new(Box::new(CommonMarkFormatter)).with_exclude(config.exclude);

    if args.path.is_file() {
        println!("Processing file: {}", args.path.display());
        corpus.convert(&args.path, provider.as_ref())?;
        println!("Done!");
    } else {
        println!("Processing directory: {}", args.path.display());
        let processed = corpus.convert_directory(&args.path, provider.as_ref())?;
        report(&processed);
    }
    return Ok(());
}

/// Format a file or every markdown file in a directory.
///
/// # Errors
///
/// Returns the first document error.
fn run_format(path: &Path) -> Result<(), Error> {
    let config = Config::load(Path::new("."))?;
    let corpus = Corpus::new(Box::new(CommonMarkFormatter)).with_exclude(config.exclude);

    if path.is_file() {
        println!("Formatting file: {}", path.display());
        corpus.format(path)?;
        println!("Done!");
    } else {
        println!("Formatting directory: {}", path.display());
        let processed = corpus.format_directory(path)?;
        report(&processed);
    }
    return Ok(());
}
