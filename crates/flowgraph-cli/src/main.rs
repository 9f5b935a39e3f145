//! Flowgraph CLI - Lay out and extend flow graphs stored as JSON

mod cli;

use clap::Parser;

fn main() {
    let cli_args = cli::Cli::parse();

    // Logging is initialized by the app from the flags and environment
    let mut app = cli::FlowgraphApp::new();

    if let Err(e) = app.run(cli_args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
