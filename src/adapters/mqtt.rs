use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};

use crate::config::MqttConfig;
use crate::core::manager::DeviceManager;
use crate::domain::ports::MessageBus;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// --monitor 模式下定期輸出資源統計的間隔
const STATS_INTERVAL: Duration = Duration::from_secs(300);

/// 斷線後下一次 poll 前的緩衝，避免對 broker 打連線風暴
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// rumqttc 的 `MessageBus` 實作
pub struct MqttBus {
    client: AsyncClient,
}

impl MqttBus {
    /// 依配置建立 client 與事件迴圈。keepalive 沿用原服務的 60 秒預設。
    pub fn connect(config: &MqttConfig) -> (Self, EventLoop) {
        let client_id = format!("rgbw-bridge-{}", std::process::id());
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(config.keepalive_secs));

        let (client, eventloop) = AsyncClient::new(options, 64);
        (Self { client }, eventloop)
    }

    pub async fn disconnect(&self) -> Result<()> {
        self.client.disconnect().await?;
        Ok(())
    }
}

#[async_trait]
impl MessageBus for MqttBus {
    async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }

    async fn subscribe(&self, filter: &str) -> Result<()> {
        self.client.subscribe(filter, QoS::AtMostOnce).await?;
        Ok(())
    }
}

/// 橋接主迴圈：poll 事件、路由訊息、處理重連與關機訊號。
/// 正常結束只有一種：收到 SIGINT/SIGTERM。
pub async fn run_bridge(
    bus: Arc<MqttBus>,
    manager: &mut DeviceManager<MqttBus>,
    eventloop: &mut EventLoop,
    monitor: &SystemMonitor,
) -> Result<()> {
    let mut stats_tick = tokio::time::interval(STATS_INTERVAL);
    stats_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // 第一個 tick 立即到期，跳過
    stats_tick.tick().await;

    loop {
        tokio::select! {
            event = eventloop.poll() => match event {
                Ok(Event::Incoming(Packet::ConnAck(_))) => {
                    tracing::info!("Connected to MQTT broker");
                    // 每次重連都要重新訂閱
                    manager.subscribe_all().await?;
                }
                Ok(Event::Incoming(Packet::Publish(publish))) => {
                    match std::str::from_utf8(&publish.payload) {
                        Ok(payload) => {
                            if let Err(e) = manager.handle_message(&publish.topic, payload).await {
                                tracing::warn!("Failed to handle {}: {}", publish.topic, e);
                            }
                        }
                        Err(_) => {
                            tracing::warn!("Non-UTF-8 payload on {}", publish.topic);
                        }
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::warn!("Disconnected from MQTT broker: {}", e);
                    tokio::time::sleep(RECONNECT_DELAY).await;
                }
            },
            _ = stats_tick.tick() => {
                monitor.log_stats("Bridge");
            }
            _ = shutdown_signal() => {
                tracing::info!("Application stopped by user");
                let _ = bus.disconnect().await;
                return Ok(());
            }
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("Cannot install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {}
        _ = sigterm.recv() => {}
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
