#![forbid(unsafe_code)]

use std::process;

use subtui::{app, cli};

fn main() {
    let opts = cli::Opts::parse();
    match app::run(&opts) {
        Ok(reason) => tracing::info!(?reason, "exiting"),
        Err(e) => {
            tracing::error!(error = %e, "exiting with error");
            eprintln!("subtui: {e}");
            process::exit(1);
        }
    }
}
