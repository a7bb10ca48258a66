//! # BASIC
//!
//! Interactive BASIC with bytecode compilation and threads.
//!

use basic::mach::Config;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Program file to load and run.
    file: Option<String>,

    /// Run one line of statements and exit.
    #[arg(short, long)]
    execute: Option<String>,

    /// Skip the peephole optimizer.
    #[arg(long)]
    no_optimize: bool,

    /// Log every executed instruction (needs RUST_LOG=trace).
    #[arg(long)]
    trace: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let config = Config {
        optimize: !args.no_optimize,
        trace: args.trace,
        ..Config::default()
    };
    basic::term::main(config, args.file, args.execute);
}
