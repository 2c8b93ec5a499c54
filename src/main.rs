use std::process::ExitCode;

use clap::Parser;
use log::debug;

use facematch::Opts;
use facematch::cli::{ErrorReport, SubCommandExtend};
use facematch::config::SubCommand;

fn main() -> ExitCode {
    let opts = Opts::parse();

    env_logger::Builder::new().filter_level(opts.log_level).parse_default_env().init();

    let result = match &opts.subcmd {
        Some(SubCommand::Detect(config)) => config.run(&opts),
        None => opts.compare.run(&opts),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!("{err:?}");
            ErrorReport::new(&err).print()
        }
    }
}
