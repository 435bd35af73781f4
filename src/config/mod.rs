#[cfg(feature = "cli")]
pub mod cli;

use crate::domain::model::ChannelMap;
use crate::utils::error::{BridgeError, Result};
use crate::utils::validation::{
    validate_device_name, validate_non_empty_string, validate_positive_number, validate_range,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 橋接服務配置，來源為 bridge.toml。
/// 載入後依序套用環境變數覆寫（MQTT_HOST/MQTT_PORT，沿用原服務的變數名），
/// 再由 CLI 旗標覆寫：檔案 < 環境 < CLI。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub mqtt: MqttConfig,
    pub monitoring: Option<MonitoringConfig>,
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    #[serde(default = "default_mqtt_host")]
    pub host: String,
    #[serde(default = "default_mqtt_port")]
    pub port: u16,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
}

fn default_mqtt_host() -> String {
    "localhost".to_string()
}

fn default_mqtt_port() -> u16 {
    1883
}

fn default_keepalive_secs() -> u64 {
    60
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            keepalive_secs: default_keepalive_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub system_stats: Option<bool>,
}

/// 一台設備的宣告，對應原 config.py 的 DEVICE_CONFIGS 項目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    pub r#type: String,
    pub channels: ChannelMap,
}

impl BridgeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BridgeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BridgeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${MQTT_PASSWORD})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 套用 MQTT_HOST / MQTT_PORT 環境變數覆寫
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("MQTT_HOST") {
            self.mqtt.host = host;
        }
        if let Ok(port) = std::env::var("MQTT_PORT") {
            self.mqtt.port = port.parse().map_err(|_| BridgeError::InvalidConfigValueError {
                field: "MQTT_PORT".to_string(),
                value: port.clone(),
                reason: "not a valid port number".to_string(),
            })?;
        }
        Ok(())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("mqtt.host", &self.mqtt.host)?;
        validate_positive_number("mqtt.port", self.mqtt.port as usize, 1)?;
        validate_positive_number("mqtt.keepalive_secs", self.mqtt.keepalive_secs as usize, 1)?;

        if self.devices.is_empty() {
            return Err(BridgeError::MissingConfigError {
                field: "devices".to_string(),
            });
        }

        for device in &self.devices {
            validate_device_name("devices.name", &device.name)?;
            validate_non_empty_string("devices.type", &device.r#type)?;
            validate_range("channels.r", device.channels.r, 1, 4)?;
            validate_range("channels.g", device.channels.g, 1, 4)?;
            validate_range("channels.b", device.channels.b, 1, 4)?;
            validate_range("channels.w", device.channels.w, 1, 4)?;
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl Validate for BridgeConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
