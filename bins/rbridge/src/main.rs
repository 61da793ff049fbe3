mod cmd;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "rbridge", about = "Convert values between relational and runtime representations")]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(long, env = "RBRIDGE_CONFIG")]
    config: Option<String>,

    /// Pretty-print JSON output.
    #[arg(long)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert call arguments to runtime values.
    Args {
        /// JSON call file (`-` for stdin).
        file: String,
    },
    /// Convert a runtime value into the call's relational result.
    Result {
        /// JSON call file (`-` for stdin).
        file: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let bridge = match cmd::load_bridge(cli.config.as_deref()) {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(error = %e, "failed to load config");
            std::process::exit(1);
        }
    };

    let output = match &cli.command {
        Command::Args { file } => cmd::args::run(&bridge, file),
        Command::Result { file } => cmd::result::run(&bridge, file),
    };

    let rendered = output.and_then(|doc| cmd::render(&doc, cli.pretty));
    match rendered {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
