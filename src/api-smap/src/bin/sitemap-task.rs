use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use core_smap::{BuildCoordinator, TASK_LOG_SETTINGS, get_build_config, get_output_dir, setup_logging};
use data_model_smap::{PgAdvisoryLock, PgCacheStore, PgContentRepository, get_db_pool};

use api_smap::task::{Command, TaskCli, execute};

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    setup_logging(TASK_LOG_SETTINGS);

    let cli = TaskCli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("sitemap-task failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: TaskCli) -> anyhow::Result<()> {
    let config = get_build_config()?;
    let pool = get_db_pool().await?;
    let coordinator = BuildCoordinator::new(
        Arc::new(PgContentRepository::new(pool.clone())),
        Arc::new(PgCacheStore::new(pool.clone())),
        Arc::new(PgAdvisoryLock::new(pool)),
    );

    let report = execute(&cli.command, &coordinator, config, get_output_dir()).await?;
    match (&cli.command, report) {
        (Command::Generate(_), Some(report)) => tracing::info!(
            "Generated {} for {} locale(s)",
            report
                .artifacts
                .iter()
                .map(|a| a.name.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            report.locales.len()
        ),
        (Command::Clear, _) => tracing::info!("Sitemap cache cleared"),
        _ => {}
    }
    Ok(())
}
