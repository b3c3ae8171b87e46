mod cli;
mod logging;
mod migrate_cmd;
mod render;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    logging::init();
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Paginate(args) => render::run_paginate(args),
        cli::Command::Limit(args) => render::run_limit(args),
        cli::Command::Migrate(args) => migrate_cmd::run(args).await,
    }
}
