//! Decisionflow CLI - edit decision workflow snapshots from the terminal

mod cli;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();

    // Logging is initialised inside run() once flags and env are resolved
    let mut app = cli::DecisionflowApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
