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
    let cli = hn_slurp::cli::Cli::parse();
    hn_slurp::logging::init(cli.quiet, cli.verbose).context("init logging")?;
    tracing::debug!(?cli, "parsed cli");

    match cli.command {
        hn_slurp::cli::Command::Stories(args) => {
            hn_slurp::slurp::run(args).await.context("stories")?;
        }
        hn_slurp::cli::Command::Discussion(args) => {
            hn_slurp::discussion::run(args)
                .await
                .context("discussion")?;
        }
    }

    Ok(())
}
