use async_trait::async_trait;
use rgbw_bridge::domain::ports::MessageBus;
use rgbw_bridge::{BridgeConfig, DeviceManager, Result};
use std::sync::{Arc, Mutex};

/// 記錄式 bus：把 publish/subscribe 收進 Vec，模擬 broker 的觀察面
#[derive(Default)]
struct RecordingBus {
    published: Mutex<Vec<(String, String)>>,
    subscribed: Mutex<Vec<String>>,
}

impl RecordingBus {
    fn published(&self) -> Vec<(String, String)> {
        self.published.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.published.lock().unwrap().clear();
    }
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

const CONFIG_TOML: &str = r#"
[mqtt]
host = "localhost"

[[devices]]
name = "UD12"
type = "RazumdomRGBW"
channels = { r = 2, g = 4, b = 1, w = 3 }

[[devices]]
name = "UD11"
type = "RazumdomRGBW"
channels = { r = 2, g = 4, b = 1, w = 3 }
"#;

fn bridge() -> (DeviceManager<RecordingBus>, Arc<RecordingBus>) {
    let config = BridgeConfig::from_toml_str(CONFIG_TOML).unwrap();
    config.validate_config().unwrap();

    let bus = Arc::new(RecordingBus::default());
    let manager = DeviceManager::from_config(&config, bus.clone());
    (manager, bus)
}

#[tokio::test]
async fn test_startup_subscribes_every_configured_device() {
    let (manager, bus) = bridge();
    manager.subscribe_all().await.unwrap();

    let mut filters = bus.subscribed.lock().unwrap().clone();
    filters.sort();
    assert_eq!(filters, vec!["/devices/UD11/#", "/devices/UD12/#"]);
}

/// 完整往返：燈具命令 → 控制命令 → 硬體回報 → 狀態發佈
#[tokio::test]
async fn test_command_to_state_report_round_trip() {
    let (mut manager, bus) = bridge();

    // Home-Assistant 端送出開燈加設色
    manager
        .handle_message(
            "/devices/UD12/rgbw/set",
            r#"{"state": "ON", "color": {"r": 255, "g": 0, "b": 0, "w": 0}}"#,
        )
        .await
        .unwrap();

    let published = bus.published();
    // 四個繼電器的送電命令 + 四個通道的設色命令
    assert_eq!(published.len(), 8);
    assert!(published
        .iter()
        .any(|(t, p)| t == "/devices/UD12/controls/K1/on" && p == "1"));
    // R 接在 Channel 2
    assert!(published
        .iter()
        .any(|(t, p)| t == "/devices/UD12/controls/Channel 2/on" && p == "1000"));
    assert!(published
        .iter()
        .any(|(t, p)| t == "/devices/UD12/controls/Channel 4/on" && p == "0"));
    bus.clear();

    // 硬體逐一回報新狀態，每筆都會觸發一次狀態發佈
    for i in 1..=4 {
        manager
            .handle_message(&format!("/devices/UD12/controls/K{}", i), "1")
            .await
            .unwrap();
    }
    manager
        .handle_message("/devices/UD12/controls/Channel 2", "1000")
        .await
        .unwrap();

    let reports = bus.published();
    assert_eq!(reports.len(), 5);
    assert!(reports.iter().all(|(t, _)| t == "/devices/UD12/rgbw"));

    let last: serde_json::Value = serde_json::from_str(&reports.last().unwrap().1).unwrap();
    assert_eq!(last["state"], "ON");
    assert_eq!(last["color"]["r"], 255);
    assert_eq!(last["color"]["g"], 0);
    assert_eq!(last["color_mode"], "rgbw");
    assert_eq!(last["brightness"], 64);
}

#[tokio::test]
async fn test_devices_are_isolated_from_each_other() {
    let (mut manager, bus) = bridge();

    manager
        .handle_message("/devices/UD11/controls/K1", "1")
        .await
        .unwrap();

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "/devices/UD11/rgbw");
}

#[tokio::test]
async fn test_off_overrides_everything_else_in_command() {
    let (mut manager, bus) = bridge();

    manager
        .handle_message(
            "/devices/UD12/rgbw/set",
            r#"{"state": "OFF", "color": {"r": 10}, "brightness": 99}"#,
        )
        .await
        .unwrap();

    let published = bus.published();
    assert_eq!(published.len(), 4);
    assert!(published.iter().all(|(t, p)| t.contains("/controls/K") && p == "0"));
}

#[tokio::test]
async fn test_brightness_only_command_drives_all_channels() {
    let (mut manager, bus) = bridge();

    manager
        .handle_message("/devices/UD12/rgbw/set", r#"{"brightness": 128}"#)
        .await
        .unwrap();

    let published = bus.published();
    assert_eq!(published.len(), 4);
    // 128 * 1000 / 255 = 501.96 → 502
    assert!(published
        .iter()
        .all(|(t, p)| t.contains("/controls/Channel ") && p == "502"));
}

#[tokio::test]
async fn test_own_echoes_and_garbage_do_not_loop() {
    let (mut manager, bus) = bridge();

    // 自己的命令回聲、自己的狀態主題、壞 JSON、陌生主題
    manager
        .handle_message("/devices/UD12/controls/K1/on", "1")
        .await
        .unwrap();
    manager
        .handle_message("/devices/UD12/rgbw", r#"{"state": "ON"}"#)
        .await
        .unwrap();
    manager
        .handle_message("/devices/UD12/rgbw/set", "{broken")
        .await
        .unwrap();
    manager
        .handle_message("/somewhere/else", "x")
        .await
        .unwrap();

    assert!(bus.published().is_empty());
}
