use clap::Parser;
use ignition_bmh::{match_and_print, run, Cli};

fn main() {
    let cli = Cli::parse();
    match_and_print(run(cli));
}
