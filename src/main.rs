use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

use botd::cli::{Cli, Command};
use botd::config::SourceLocation;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    botd::logging::init().context("init logging")?;

    let cli = Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    let location = SourceLocation::resolve(cli.source.as_deref()).context("resolve source")?;
    tracing::debug!(?location, "resolved data source");

    match cli.command {
        Command::Stage(args) => {
            botd::stage::run(args).await.context("stage")?;
        }
        Command::Serve(args) => {
            botd::serve::run(args, location).await.context("serve")?;
        }
        Command::Burgers => {
            botd::report::burgers(&location.loader()?)
                .await
                .context("burgers")?;
        }
        Command::Burger(args) => {
            botd::report::burger(&location.loader()?, args)
                .await
                .context("burger")?;
        }
        Command::Episodes(args) => {
            botd::report::episodes(&location.loader()?, args)
                .await
                .context("episodes")?;
        }
        Command::Episode(args) => {
            botd::report::episode(&location.loader()?, args)
                .await
                .context("episode")?;
        }
        Command::ThisWeek(args) => {
            botd::report::this_week(&location.loader()?, args)
                .await
                .context("this-week")?;
        }
        Command::Export => {
            botd::report::export(&location.loader()?)
                .await
                .context("export")?;
        }
    }

    Ok(())
}
