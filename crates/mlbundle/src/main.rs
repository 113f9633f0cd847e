use std::io;
use std::process::ExitCode;

use clap::Parser;
use mlbundle::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    mlbundle::init(cli.verbose);

    let mut stdout = io::stdout().lock();
    match mlbundle::cli::run(&cli, &mut stdout) {
        Ok(Some(outcome)) if !outcome.is_success() => ExitCode::from(1),
        Ok(_) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}
