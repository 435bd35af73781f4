use std::sync::Arc;

use clap::Parser;
use rgbw_bridge::adapters::mqtt::{run_bridge, MqttBus};
use rgbw_bridge::core::topics;
use rgbw_bridge::utils::monitor::SystemMonitor;
use rgbw_bridge::utils::{error::ErrorSeverity, logger, validation::Validate};
use rgbw_bridge::{BridgeConfig, CliConfig, DeviceManager};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("Starting rgbw-bridge");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入配置：檔案 < 環境變數 < CLI 旗標
    let mut config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration loading failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };
    if let Some(host) = &cli.broker_host {
        config.mqtt.host = host.clone();
    }
    if let Some(port) = cli.broker_port {
        config.mqtt.port = port;
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    if cli.dry_run {
        print_summary(&config);
        return Ok(());
    }

    let monitor_enabled = cli.monitor || config.monitoring_enabled();
    let monitor = SystemMonitor::new(monitor_enabled);
    if monitor.is_enabled() {
        tracing::info!("🔍 System monitoring enabled");
    }

    // 建立 MQTT 連線與設備管理器
    let (bus, mut eventloop) = MqttBus::connect(&config.mqtt);
    let bus = Arc::new(bus);
    let mut manager = DeviceManager::from_config(&config, bus.clone());

    tracing::info!(
        "🌈 Bridging {} device(s) via {}:{}",
        manager.device_count(),
        config.mqtt.host,
        config.mqtt.port
    );
    monitor.log_stats("Startup");

    match run_bridge(bus, &mut manager, &mut eventloop, &monitor).await {
        Ok(()) => {
            monitor.log_final_stats();
            tracing::info!("✅ Bridge shut down cleanly");
        }
        Err(e) => {
            // 記錄詳細錯誤信息
            tracing::error!(
                "❌ Bridge failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            // 輸出用戶友好的錯誤信息
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            // 根據錯誤嚴重程度決定退出碼
            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn load_config(cli: &CliConfig) -> rgbw_bridge::Result<BridgeConfig> {
    let mut config = BridgeConfig::from_file(&cli.config)?;
    config.apply_env_overrides()?;
    Ok(config)
}

/// --dry-run：印出設備與主題的摘要後離開
fn print_summary(config: &BridgeConfig) {
    println!("✅ Configuration is valid");
    println!("📡 Broker: {}:{}", config.mqtt.host, config.mqtt.port);
    println!("💡 Devices ({}):", config.devices.len());
    for device in &config.devices {
        println!(
            "   {} ({}): R={} G={} B={} W={}",
            device.name,
            device.r#type,
            device.channels.r,
            device.channels.g,
            device.channels.b,
            device.channels.w
        );
        println!("      state:   {}", topics::light_state(&device.name));
        println!("      command: {}", topics::light_command(&device.name));
    }
}
