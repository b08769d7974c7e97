use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reposcribe::cli::Output;
use reposcribe::cli::commands::{self, ReportFormat, generate::GenerateOptions};
use reposcribe::pipeline::InputKind;

fn parse_input_kind(s: &str) -> Result<InputKind, String> {
    s.parse().map_err(|e: reposcribe::ScribeError| e.to_string())
}

fn parse_format(s: &str) -> Result<ReportFormat, String> {
    s.parse().map_err(|e: reposcribe::ScribeError| e.to_string())
}

#[derive(Parser)]
#[command(name = "reposcribe")]
#[command(
    version,
    about = "Generate READMEs, file summaries and architecture diagrams for a repository"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the documentation pipeline over a repository
    Generate {
        #[arg(help = "GitHub URL or owner/repo, ZIP file, file-map JSON, or directory")]
        source: String,
        #[arg(long, value_parser = parse_input_kind, help = "Input kind: github, zip, upload, local (inferred when omitted)")]
        kind: Option<InputKind>,
        #[arg(long, help = "Branch to fetch (GitHub only)")]
        branch: Option<String>,
        #[arg(long, short, help = "Output directory (default: reposcribe-output)")]
        output: Option<PathBuf>,
        #[arg(long, help = "LLM provider (openai, offline)")]
        provider: Option<String>,
        #[arg(long, help = "Model to use")]
        model: Option<String>,
        #[arg(long, help = "Skip per-file summaries")]
        no_summaries: bool,
        #[arg(long, help = "Skip README generation")]
        no_readme: bool,
        #[arg(long, help = "Skip the architecture diagram")]
        no_visualize: bool,
        #[arg(long, help = "Run detailed per-file analysis")]
        analyze: bool,
        #[arg(long, help = "Files summarized or analyzed at once")]
        concurrency: Option<usize>,
        #[arg(long, short = 'f', value_parser = parse_format, help = "Also write a combined report: json, yaml, markdown")]
        format: Option<ReportFormat>,
    },

    /// Parse local directories and print languages and symbols
    Parse {
        #[arg(required = true, num_args = 1.., help = "Directories to parse")]
        paths: Vec<PathBuf>,
        #[arg(short = 'f', long, default_value = "json", value_parser = parse_format, help = "Output format: json, yaml")]
        format: ReportFormat,
        #[arg(long, help = "Include comment-free source in the output")]
        with_code: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, default_value = "toml", value_parser = parse_format, help = "Output format: toml, json")]
        format: ReportFormat,
    },
    /// Show configuration file paths
    Path,
    /// Write a project config to .reposcribe/config.toml
    Init {
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mreposcribe encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            Output::default().error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let output = Output::new(cli.quiet);

    match cli.command {
        Commands::Generate {
            source,
            kind,
            branch,
            output: output_dir,
            provider,
            model,
            no_summaries,
            no_readme,
            no_visualize,
            analyze,
            concurrency,
            format,
        } => {
            commands::generate::run(
                GenerateOptions {
                    source,
                    kind,
                    branch,
                    output: output_dir,
                    provider,
                    model,
                    no_summaries,
                    no_readme,
                    no_visualize,
                    analyze,
                    concurrency,
                    format,
                },
                &output,
            )?;
        }
        Commands::Parse {
            paths,
            format,
            with_code,
        } => {
            commands::parse::run(&paths, format, with_code)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(format)?,
            ConfigAction::Path => commands::config::path(&output)?,
            ConfigAction::Init { force } => commands::config::init(force, &output)?,
        },
    }

    Ok(())
}
