//! qoi CLI entry point: argument parsing, logging setup and command dispatch.

use clap::Parser;
use miette::Result;
use qoi_cli::{cli, commands, error, logger, ui};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);
    ui::init_colors(args.no_color);

    let result = match args.command {
        cli::Command::Build(build_args) => commands::build_execute(build_args).await,
        cli::Command::Run(run_args) => run(run_args).await,
        cli::Command::Script(raw) => match cli::RunArgs::from_shorthand(&raw) {
            Ok(run_args) => run(run_args).await,
            Err(err) => err.exit(),
        },
    };

    result.map_err(error::cli_error_to_miette)
}

async fn run(args: cli::RunArgs) -> error::Result<()> {
    let code = commands::run_execute(args).await?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
