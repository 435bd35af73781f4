use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 將 LOG_LEVEL 環境變數（Python logging 風格）對應到 tracing 的等級
fn level_from_env() -> &'static str {
    match std::env::var("LOG_LEVEL")
        .unwrap_or_default()
        .to_uppercase()
        .as_str()
    {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" => "error",
        "CRITICAL" => "error",
        "TRACE" => "trace",
        _ => "info",
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default_directive = if verbose {
        "rgbw_bridge=debug,info".to_string()
    } else {
        format!("rgbw_bridge={}", level_from_env())
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

pub fn init_cli_logger(verbose: bool) {
    let filter = env_filter(verbose);

    // LOG_JSON=1 時輸出 JSON 格式，方便容器日誌收集
    let json_logs = matches!(
        std::env::var("LOG_JSON").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE") | Ok("yes")
    );

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init();
    }
}
