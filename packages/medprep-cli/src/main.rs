use clap::Parser;

mod cli;
mod commands;
mod exit_codes;
mod output;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .init();

    let exit_code = match cli.command {
        cli::Command::Ecg(args) => commands::ecg::execute(args),
        cli::Command::Organize(args) => commands::organize::execute(args),
        cli::Command::Split(args) => commands::split::execute(args),
        cli::Command::Resize(args) => commands::resize::execute(args),
        cli::Command::Run(args) => commands::run::execute(args),
    };

    std::process::exit(exit_code);
}
