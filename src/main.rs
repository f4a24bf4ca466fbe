use std::process::ExitCode;

use clap::Parser;

use semwave::config::Options;

fn main() -> ExitCode {
    let options = Options::parse();

    let level = if options.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match semwave::simulation::run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fatal: {err}");
            ExitCode::FAILURE
        }
    }
}
