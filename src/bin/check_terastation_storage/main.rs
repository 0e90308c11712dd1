#![deny(clippy::all)]
#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]

mod cli;

use std::process::ExitCode;

use terastation_storage::{check, logging, CheckError, CheckResult, SnmpAgent};

fn main() -> ExitCode {
    let result = check::conclude(run());

    println!("{}", result);

    ExitCode::from(result.exit_code())
}

fn run() -> Result<CheckResult, CheckError> {
    let args = cli::args()?;

    if let Err(e) = logging::init(args.verbosity) {
        eprintln!("{:#}", e);
    }

    let input = args.into_input()?;
    let mut agent = SnmpAgent::connect(&input)?;

    check::run(&mut agent, &input)
}
