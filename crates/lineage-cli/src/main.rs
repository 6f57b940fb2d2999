use std::error::Error;
use std::io::Write;

use clap::{Parser, Subcommand};
use env_logger::{fmt, Builder, Env};
use log::Level;

use commands::{
    batch::{self, BatchArgs},
    forest::{self, ForestArgs},
    parse::{self, ParseArgs},
    sample::{self, SampleArgs},
};

mod commands;
mod config;
mod output;

#[derive(Parser, Debug)]
#[command(name = "lineage", about = "Reconstructs program lineage from fuzzer traces")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a trace and export the program registry.
    Parse(ParseArgs),
    /// Build the lineage forest and export its analytics.
    Forest(ForestArgs),
    /// Render a size-bounded sample of the lineage forest.
    Sample(SampleArgs),
    /// Analyse several traces independently in parallel.
    Batch(BatchArgs),
}

fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", "info");

    Builder::from_env(env)
        .format(|buf, record| {
            let mut style = buf.style();
            match record.level() {
                Level::Error => {
                    style.set_color(fmt::Color::Red).set_bold(true);
                }
                Level::Warn => {
                    style.set_color(fmt::Color::Yellow).set_bold(true);
                }
                Level::Info => {
                    style.set_color(fmt::Color::Blue).set_bold(true);
                }
                Level::Debug | Level::Trace => {}
            };
            let timestamp = buf.timestamp();
            writeln!(buf, "{} {}", timestamp, style.value(record.args()))
        })
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logger();
    let cli = Cli::parse();
    match cli.command {
        Command::Parse(args) => parse::run(&args),
        Command::Forest(args) => forest::run(&args),
        Command::Sample(args) => sample::run(&args),
        Command::Batch(args) => batch::run(&args),
    }
}
