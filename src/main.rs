use std::process::ExitCode;

use clap::Parser;

use cutoutfe::cli::{self, CliArgs};
use cutoutfe::logger;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init(args.verbose);
    cli::run(args)
}
