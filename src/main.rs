use clap::Parser;
use coverage_monitor::core::deadline::Deadline;
use coverage_monitor::utils::error::ErrorSeverity;
use coverage_monitor::utils::{logger, validation::Validate};
use coverage_monitor::{
    CliConfig, Command, DataMonitor, LocalDataset, MonitorConfig, MonitorError, ProviderFetcher,
};
use serde_json::json;
use std::sync::Arc;

type Monitor = DataMonitor<LocalDataset, ProviderFetcher<LocalDataset>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入 TOML 配置
    let config = match MonitorConfig::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", cli.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    if cli.json_logs || config.json_logs() {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting coverage-monitor");
    tracing::debug!("CLI args: {:?}", cli);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if matches!(cli.command, Command::CheckConfig) {
        display_config_summary(&config);
        return Ok(());
    }

    let dataset = Arc::new(LocalDataset::new(
        config.dataset.path.clone(),
        config.dataset.industries.clone(),
        config.dataset.countries.clone(),
    ));
    let fetcher = match ProviderFetcher::new(
        &config.provider.endpoint,
        config.provider.api_key.clone(),
        config.request_timeout(),
        Arc::clone(&dataset),
    ) {
        Ok(fetcher) => Arc::new(fetcher),
        Err(e) => exit_with(e),
    };
    let monitor: Monitor = DataMonitor::new(dataset, fetcher, config.settings());

    match run_command(&monitor, &cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            tracing::info!("✅ Done");
        }
        Err(e) => {
            if let MonitorError::BatchExhausted { report } = &e {
                println!("{}", serde_json::to_string_pretty(&report.summary())?);
            }
            exit_with(e);
        }
    }

    Ok(())
}

async fn run_command(monitor: &Monitor, command: &Command) -> Result<serde_json::Value, MonitorError> {
    match command {
        Command::LowData { threshold } => {
            let deadline = monitor.detection_deadline();
            let pairs = monitor.detect_low_data(*threshold, &deadline).await?;
            Ok(json!({
                "threshold": monitor.settings().defaults.threshold_or_default(*threshold),
                "count": pairs.len(),
                "pairs": pairs,
            }))
        }
        Command::Missing => {
            let pairs = monitor.detect_missing(&monitor.detection_deadline()).await?;
            Ok(json!({ "count": pairs.len(), "pairs": pairs }))
        }
        Command::Fetch { pair, limit } => {
            let deadline = cancellable(monitor.batch_deadline());
            let records = monitor.trigger_fetch(pair.clone(), *limit, &deadline).await?;
            Ok(json!({ "pair": pair, "records": records }))
        }
        Command::Batch { pairs, batch } => {
            let deadline = cancellable(monitor.batch_deadline());
            let report = monitor
                .trigger_batch(pairs.clone(), batch.limit, batch.max_concurrent, &deadline)
                .await?;
            Ok(serde_json::to_value(report.summary())?)
        }
        Command::Stats => {
            let stats = monitor.stats(&monitor.detection_deadline()).await?;
            Ok(serde_json::to_value(stats)?)
        }
        Command::AutoPopulate { .. } => {
            let request = command.auto_populate_request().unwrap_or_default();
            let deadline = cancellable(monitor.batch_deadline());
            let report = monitor.auto_populate(request, &deadline).await?;
            Ok(json!({
                "threshold": report.params.threshold,
                "limit": report.params.limit,
                "max_concurrent": report.params.max_concurrent,
                "include_missing": report.params.include_missing,
                "low_data_found": report.low_data_found,
                "missing_found": report.missing_found,
                "count": report.count(),
                "pairs": report.pairs,
                "batch": report.batch.as_ref().map(|b| b.summary()),
            }))
        }
        Command::CheckConfig => Ok(json!({ "valid": true })),
    }
}

/// Ctrl-C 時停止啟動新的 fetch，進行中的讓它們自然結束
fn cancellable(deadline: Deadline) -> Deadline {
    let token = deadline.token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("🛑 Interrupt received, no new fetches will start");
            token.cancel();
        }
    });
    deadline
}

fn display_config_summary(config: &MonitorConfig) {
    let settings = config.settings();
    println!("📋 Configuration Summary:");
    println!("  Provider: {}", config.provider.endpoint);
    println!("  Dataset: {}", config.dataset.path);
    println!(
        "  Pair space: {} industries × {} countries",
        config.dataset.industries.len(),
        config.dataset.countries.len()
    );
    println!(
        "  Defaults: threshold={}, count={}, max_concurrent={}, limit={}, include_missing={}",
        settings.defaults.threshold,
        settings.defaults.count,
        settings.defaults.max_concurrent,
        settings.defaults.limit,
        settings.defaults.include_missing
    );
    println!(
        "  Deadlines: detection={:?}, batch={:?}",
        settings.detection_timeout, settings.batch_timeout
    );
}

fn exit_with(e: MonitorError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ coverage-monitor failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());

    // 根據錯誤嚴重程度決定退出碼
    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
