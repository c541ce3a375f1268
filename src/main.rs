use std::io;
use std::process::ExitCode;

use formease_admin::cli::{build_cli, run};
use formease_admin::utils::logging::initialize_logging;
use log::error;

fn main() -> ExitCode {
    let matches = build_cli().get_matches();

    // .env is optional; real environment variables take precedence.
    // Loaded before logging so a RUST_LOG set there applies.
    dotenvy::dotenv().ok();

    if let Err(e) = initialize_logging(matches.get_flag("verbose")) {
        eprintln!("Failed to initialize logging: {}", e);
    }
    let lookup = |key: &str| std::env::var(key).ok();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run(&matches, &lookup, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Erreur : {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
