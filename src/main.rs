use clap::Parser;
use ticklist::cli::commands::Cli;
use ticklist::cli::handlers;
use tracing_subscriber::EnvFilter;

fn main() {
    // Default level is error; RUST_LOG overrides. stdout is reserved for output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    if let Err(e) = handlers::dispatch(cli) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
