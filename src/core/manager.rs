use std::collections::HashMap;
use std::sync::Arc;

use crate::config::BridgeConfig;
use crate::core::device::RgbwDevice;
use crate::core::topics::{self, ParsedTopic};
use crate::domain::model::{LightCommand, PowerState, Publication};
use crate::domain::ports::MessageBus;
use crate::utils::error::Result;

/// 橋接核心：持有所有設備、路由進站訊息、透過 bus 發佈命令與狀態。
/// 對 bus 泛型，測試用記錄式的記憶體 bus。
pub struct DeviceManager<B: MessageBus> {
    bus: Arc<B>,
    devices: HashMap<String, RgbwDevice>,
}

impl<B: MessageBus> DeviceManager<B> {
    /// 從已驗證的配置建立。未知的設備型別記 error 後跳過，
    /// 其餘設備照常啟動；重複名稱以後者為準並記 warning。
    pub fn from_config(config: &BridgeConfig, bus: Arc<B>) -> Self {
        let mut devices = HashMap::new();

        for dev in &config.devices {
            if dev.r#type != "RazumdomRGBW" {
                tracing::error!("Unknown device type: {}", dev.r#type);
                continue;
            }
            if devices.contains_key(&dev.name) {
                tracing::warn!("Duplicate device name '{}', keeping the later entry", dev.name);
            }
            devices.insert(
                dev.name.clone(),
                RgbwDevice::new(dev.name.clone(), dev.channels),
            );
        }

        Self { bus, devices }
    }

    pub fn device_count(&self) -> usize {
        self.devices.len()
    }

    pub fn device_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.devices.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// 每次（重）連線後都要重新訂閱所有設備
    pub async fn subscribe_all(&self) -> Result<()> {
        for name in self.devices.keys() {
            self.bus.subscribe(&topics::device_filter(name)).await?;
        }
        Ok(())
    }

    /// 路由一筆進站訊息。設備層的問題（壞 payload、未知控制）只記日誌，
    /// 回傳 Err 僅代表 bus 發佈失敗。
    pub async fn handle_message(&mut self, topic: &str, payload: &str) -> Result<()> {
        tracing::debug!("Received message: {} - {}", topic, payload);

        match topics::parse(topic) {
            ParsedTopic::ControlState { device, control } => {
                self.handle_control_state(device, control, payload).await
            }
            ParsedTopic::LightCommand { device } => {
                self.handle_light_command(device, payload).await
            }
            // 自己發出的命令與狀態回聲，不處理
            ParsedTopic::ControlEcho { .. } | ParsedTopic::LightState { .. } => Ok(()),
            ParsedTopic::Other { device } => {
                tracing::debug!("Ignoring topic for device '{}': {}", device, topic);
                Ok(())
            }
            ParsedTopic::Foreign => {
                tracing::debug!("Ignoring foreign topic: {}", topic);
                Ok(())
            }
        }
    }

    async fn handle_control_state(
        &mut self,
        device: &str,
        control: &str,
        payload: &str,
    ) -> Result<()> {
        let Some(dev) = self.devices.get_mut(device) else {
            tracing::debug!("Control update for unknown device '{}'", device);
            return Ok(());
        };

        match dev.apply_control(control, payload) {
            Ok(true) => {
                // 每筆接受的更新都回報狀態（對應原本的 update callback 鏈）
                let report = serde_json::to_string(&dev.state_report())?;
                tracing::debug!("Publishing state for device {}: {}", device, report);
                self.bus.publish(&topics::light_state(device), &report).await
            }
            Ok(false) => Ok(()),
            Err(e) => {
                tracing::warn!("Error processing message {}: {}", topic_of(device, control), e);
                Ok(())
            }
        }
    }

    async fn handle_light_command(&mut self, device: &str, payload: &str) -> Result<()> {
        let Some(dev) = self.devices.get(device) else {
            tracing::debug!("Light command for unknown device '{}'", device);
            return Ok(());
        };

        let command: LightCommand = match serde_json::from_str(payload) {
            Ok(cmd) => cmd,
            Err(_) => {
                tracing::error!("Invalid JSON payload: {}", payload);
                return Ok(());
            }
        };

        // 與原實作相同的處理順序：
        // OFF 即停；ON 只在目前是關的時候送電；只有亮度時調亮度；最後才是設色。
        let mut batch: Vec<Publication> = Vec::new();

        if command.state == Some(PowerState::Off) {
            batch.extend(dev.power_commands(false));
            return self.publish_batch(batch).await;
        }

        if command.state == Some(PowerState::On) && !dev.is_on() {
            batch.extend(dev.power_commands(true));
        }

        if let (Some(brightness), None) = (command.brightness, command.color) {
            batch.extend(dev.brightness_commands(brightness));
            return self.publish_batch(batch).await;
        }

        if let Some(color) = command.color {
            batch.extend(dev.rgbw_commands(color));
        }

        self.publish_batch(batch).await
    }

    async fn publish_batch(&self, batch: Vec<Publication>) -> Result<()> {
        for publication in batch {
            self.bus
                .publish(&publication.topic, &publication.payload)
                .await?;
        }
        Ok(())
    }
}

fn topic_of(device: &str, control: &str) -> String {
    topics::control_state(device, control)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DeviceConfig, MqttConfig};
    use crate::domain::model::ChannelMap;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// 記錄式 bus：收集 publish 與 subscribe 呼叫
    #[derive(Default)]
    struct RecordingBus {
        published: Mutex<Vec<(String, String)>>,
        subscribed: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageBus for RecordingBus {
        async fn publish(&self, topic: &str, payload: &str) -> Result<()> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload.to_string()));
            Ok(())
        }

        async fn subscribe(&self, filter: &str) -> Result<()> {
            self.subscribed.lock().unwrap().push(filter.to_string());
            Ok(())
        }
    }

    fn reference_channels() -> ChannelMap {
        ChannelMap {
            r: 2,
            g: 4,
            b: 1,
            w: 3,
        }
    }

    fn test_config(devices: Vec<DeviceConfig>) -> BridgeConfig {
        BridgeConfig {
            mqtt: MqttConfig::default(),
            monitoring: None,
            devices,
        }
    }

    fn manager_with(devices: Vec<DeviceConfig>) -> (DeviceManager<RecordingBus>, Arc<RecordingBus>) {
        let bus = Arc::new(RecordingBus::default());
        let manager = DeviceManager::from_config(&test_config(devices), bus.clone());
        (manager, bus)
    }

    fn rgbw_device(name: &str) -> DeviceConfig {
        DeviceConfig {
            name: name.to_string(),
            r#type: "RazumdomRGBW".to_string(),
            channels: reference_channels(),
        }
    }

    #[tokio::test]
    async fn test_unknown_device_type_is_skipped() {
        let mut other = rgbw_device("heater");
        other.r#type = "Thermostat".to_string();
        let (manager, _) = manager_with(vec![rgbw_device("UD12"), other]);
        assert_eq!(manager.device_names(), vec!["UD12"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_last_definition_wins() {
        let mut second = rgbw_device("UD12");
        second.channels = ChannelMap {
            r: 1,
            g: 2,
            b: 3,
            w: 4,
        };
        let (manager, _) = manager_with(vec![rgbw_device("UD12"), second]);
        assert_eq!(manager.device_count(), 1);
    }

    #[tokio::test]
    async fn test_subscribe_all_covers_every_device() {
        let (manager, bus) = manager_with(vec![rgbw_device("UD11"), rgbw_device("UD12")]);
        manager.subscribe_all().await.unwrap();

        let mut filters = bus.subscribed.lock().unwrap().clone();
        filters.sort();
        assert_eq!(filters, vec!["/devices/UD11/#", "/devices/UD12/#"]);
    }

    #[tokio::test]
    async fn test_control_update_publishes_state_report() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message("/devices/UD12/controls/K1", "1")
            .await
            .unwrap();

        let published = bus.published.lock().unwrap().clone();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "/devices/UD12/rgbw");
        let report: serde_json::Value = serde_json::from_str(&published[0].1).unwrap();
        assert_eq!(report["state"], "OFF"); // only one relay closed
        assert_eq!(report["color_mode"], "rgbw");
    }

    #[tokio::test]
    async fn test_off_command_short_circuits() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message(
                "/devices/UD12/rgbw/set",
                r#"{"state": "OFF", "color": {"r": 255}, "brightness": 200}"#,
            )
            .await
            .unwrap();

        let published = bus.published.lock().unwrap().clone();
        // Only the four power-off commands, nothing about color or brightness
        assert_eq!(published.len(), 4);
        assert!(published.iter().all(|(t, p)| t.ends_with("/on") && p == "0"));
        assert!(published.iter().all(|(t, _)| t.contains("/controls/K")));
    }

    #[tokio::test]
    async fn test_on_command_powers_up_only_when_off() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message("/devices/UD12/rgbw/set", r#"{"state": "ON"}"#)
            .await
            .unwrap();
        assert_eq!(bus.published.lock().unwrap().len(), 4);

        // Mark the device as on, then send ON again: no power commands this time
        for i in 1..=4 {
            manager
                .handle_message(&format!("/devices/UD12/controls/K{}", i), "1")
                .await
                .unwrap();
        }
        bus.published.lock().unwrap().clear();

        manager
            .handle_message("/devices/UD12/rgbw/set", r#"{"state": "ON"}"#)
            .await
            .unwrap();
        assert!(bus.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_brightness_without_color_sets_uniform_channels() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message("/devices/UD12/rgbw/set", r#"{"brightness": 255}"#)
            .await
            .unwrap();

        let published = bus.published.lock().unwrap().clone();
        assert_eq!(published.len(), 4);
        assert!(published
            .iter()
            .all(|(t, p)| t.contains("/controls/Channel ") && p == "1000"));
    }

    #[tokio::test]
    async fn test_color_wins_over_brightness_when_both_present() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message(
                "/devices/UD12/rgbw/set",
                r#"{"color": {"r": 255, "g": 0, "b": 0, "w": 0}, "brightness": 10}"#,
            )
            .await
            .unwrap();

        let published = bus.published.lock().unwrap().clone();
        assert_eq!(published.len(), 4);
        // R is wired to Channel 2
        assert!(published
            .iter()
            .any(|(t, p)| t == "/devices/UD12/controls/Channel 2/on" && p == "1000"));
    }

    #[tokio::test]
    async fn test_invalid_json_and_unknown_devices_are_ignored() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message("/devices/UD12/rgbw/set", "not json")
            .await
            .unwrap();
        manager
            .handle_message("/devices/UD99/rgbw/set", r#"{"state": "ON"}"#)
            .await
            .unwrap();
        manager
            .handle_message("/devices/UD12/controls/K1/on", "1")
            .await
            .unwrap();

        assert!(bus.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_control_payload_is_logged_not_fatal() {
        let (mut manager, bus) = manager_with(vec![rgbw_device("UD12")]);

        manager
            .handle_message("/devices/UD12/controls/K1", "garbage")
            .await
            .unwrap();
        manager
            .handle_message("/devices/UD12/controls/Voltage", "12")
            .await
            .unwrap();

        assert!(bus.published.lock().unwrap().is_empty());
    }
}
