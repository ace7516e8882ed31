use std::process::ExitCode;

use anyhow::Context as _;
use clap::Parser as _;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(err) = try_main().await {
        eprintln!("{err:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

async fn try_main() -> anyhow::Result<()> {
    titikfiksi::logging::init().context("init logging")?;

    let cli = titikfiksi::cli::Cli::parse();
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        titikfiksi::cli::Command::Render(args) => {
            titikfiksi::page::run(args, &cli.global).await.context("render")?;
        }
        titikfiksi::cli::Command::Generate(args) => {
            titikfiksi::generate::run(args, &cli.global)
                .await
                .context("generate")?;
        }
        titikfiksi::cli::Command::Build(args) => {
            titikfiksi::build::run(args, &cli.global).await.context("build")?;
        }
    }

    Ok(())
}
