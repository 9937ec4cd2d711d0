use anyhow::Result;
use clap::Parser;

use connwatch_core::config::ConnwatchConfig;
use connwatch_daemon::cli::DaemonCli;
use connwatch_daemon::logging;
use connwatch_daemon::orchestrator::Orchestrator;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = DaemonCli::parse();

    // 설정 로드
    let mut config = ConnwatchConfig::load(&cli.config).await.map_err(|e| {
        anyhow::anyhow!("failed to load config from {}: {}", cli.config.display(), e)
    })?;

    // CLI 인자가 설정 파일보다 우선합니다
    if let Some(log_level) = &cli.log_level {
        config.general.log_level = log_level.clone();
    }
    if let Some(log_format) = &cli.log_format {
        config.general.log_format = log_format.clone();
    }
    if let Some(pid_file) = &cli.pid_file {
        config.general.pid_file = pid_file.clone();
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("config validation failed: {}", e))?;

    // --validate 모드: 검증 결과만 출력하고 종료
    if cli.validate {
        println!("config ok: {}", cli.config.display());
        return Ok(());
    }

    // 로깅 초기화
    logging::init_tracing(&config.general)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %cli.config.display(),
        "connwatch-daemon starting"
    );

    // 오케스트레이터 빌드 및 실행
    let mut orchestrator = Orchestrator::build_from_config(config)?;
    orchestrator.run().await?;

    tracing::info!("connwatch-daemon shut down");
    Ok(())
}
