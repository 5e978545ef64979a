//! timeoutguard CLI entry point.

use clap::Parser;
use timeoutguard::cli::{self, Cli, Commands, EXIT_ERROR};

/// Initialize logger; `RUST_LOG` applies unless `--verbose` is set.
fn init_logger(verbose: bool) {
    let mut log_builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        log_builder.filter_level(log::LevelFilter::Debug);
    }
    log_builder.init();
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let exit_code = match cli.command {
        Commands::Check(args) => match cli::run_check(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
        Commands::Init(args) => match cli::run_init(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {}", e);
                EXIT_ERROR
            }
        },
    };

    std::process::exit(exit_code);
}
