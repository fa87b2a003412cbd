use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lograg")]
#[command(
    version,
    about = "Embed application logs and chat with them through vector search"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a batch of log records with embeddings
    Embed {
        #[arg(long, short, help = "Invocation payload JSON file; stdin if omitted")]
        input: Option<PathBuf>,
        #[arg(long, short, help = "Write the enriched payload here; stdout if omitted")]
        output: Option<PathBuf>,
        #[arg(long, help = "Request id attached to every log line")]
        request_id: Option<String>,
    },

    /// Ask questions about the embedded logs
    Chat {
        #[arg(long, help = "Secrets/settings file (default: .lograg/secrets.toml)")]
        secrets: Option<PathBuf>,
        #[arg(long, short = 'k', help = "Number of log records to retrieve per question")]
        size: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show resolved configuration (defaults, secrets file, environment)
    Show {
        #[arg(long, default_value = "batch", value_parser = ["batch", "chat"])]
        variant: String,
        #[arg(
            short = 'f',
            long,
            default_value = "text",
            help = "Output format: text, json"
        )]
        format: String,
        #[arg(long, help = "Secrets/settings file for the chat variant")]
        secrets: Option<PathBuf>,
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
        eprintln!("\x1b[31mlograg encountered an unexpected error:\x1b[0m");
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

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging is installed by each command once its configuration resolves
    match cli.command {
        Commands::Embed {
            input,
            output,
            request_id,
        } => {
            lograg::cli::commands::embed::run(input, output, request_id)?;
        }
        Commands::Chat { secrets, size } => {
            lograg::cli::commands::chat::run(secrets, size)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show {
                variant,
                format,
                secrets,
            } => {
                lograg::cli::commands::config::show(&variant, &format, secrets.as_deref())?;
            }
        },
    }

    Ok(())
}
