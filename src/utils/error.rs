use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("MQTT client error: {0}")]
    MqttError(#[from] rumqttc::ClientError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Environment setup failed: {message}")]
    EnvironmentSetupError { message: String },

    #[error("Dependency resolution failed for '{package}': {reason}")]
    DependencyResolutionError { package: String, reason: String },

    #[error("Missing source file: {path}")]
    MissingSourceError { path: String },

    #[error("Device '{device}' error: {message}")]
    DeviceError { device: String, message: String },
}

/// 錯誤分類，用於日誌與診斷
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Serialization,
    Configuration,
    Bootstrap,
    Device,
}

/// 錯誤嚴重程度，決定程式退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BridgeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            BridgeError::MqttError(_) => ErrorCategory::Network,
            BridgeError::IoError(_) => ErrorCategory::Io,
            BridgeError::SerializationError(_) => ErrorCategory::Serialization,
            BridgeError::ConfigError { .. }
            | BridgeError::InvalidConfigValueError { .. }
            | BridgeError::MissingConfigError { .. } => ErrorCategory::Configuration,
            BridgeError::EnvironmentSetupError { .. }
            | BridgeError::DependencyResolutionError { .. }
            | BridgeError::MissingSourceError { .. } => ErrorCategory::Bootstrap,
            BridgeError::DeviceError { .. } => ErrorCategory::Device,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網路錯誤通常可以重試
            BridgeError::MqttError(_) => ErrorSeverity::Medium,
            BridgeError::IoError(_) | BridgeError::EnvironmentSetupError { .. } => {
                ErrorSeverity::Critical
            }
            BridgeError::SerializationError(_) => ErrorSeverity::High,
            BridgeError::ConfigError { .. }
            | BridgeError::InvalidConfigValueError { .. }
            | BridgeError::MissingConfigError { .. } => ErrorSeverity::High,
            BridgeError::DependencyResolutionError { .. }
            | BridgeError::MissingSourceError { .. } => ErrorSeverity::High,
            BridgeError::DeviceError { .. } => ErrorSeverity::Low,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            BridgeError::MqttError(_) => {
                "Check that the MQTT broker is reachable and that MQTT_HOST/MQTT_PORT are correct"
                    .to_string()
            }
            BridgeError::IoError(_) => {
                "Check file permissions and that the paths involved exist".to_string()
            }
            BridgeError::SerializationError(_) => {
                "Check that the payload is valid JSON with the expected fields".to_string()
            }
            BridgeError::ConfigError { .. } => {
                "Check that the configuration file exists and is valid TOML".to_string()
            }
            BridgeError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' in the configuration", field)
            }
            BridgeError::MissingConfigError { field } => {
                format!("Add the missing '{}' entry to the configuration", field)
            }
            BridgeError::EnvironmentSetupError { .. } => {
                "Check that the working directory can be created and written to".to_string()
            }
            BridgeError::DependencyResolutionError { package, .. } => format!(
                "Check that '{}' exists in the package index and the installer command works",
                package
            ),
            BridgeError::MissingSourceError { path } => {
                format!("Make sure '{}' is present in the build context", path)
            }
            BridgeError::DeviceError { device, .. } => {
                format!("Check the messages published for device '{}'", device)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BridgeError::MqttError(_) => "Could not talk to the MQTT broker".to_string(),
            BridgeError::IoError(e) => format!("A file operation failed: {}", e),
            BridgeError::SerializationError(_) => "Received data could not be decoded".to_string(),
            BridgeError::ConfigError { message } => {
                format!("Configuration problem: {}", message)
            }
            BridgeError::InvalidConfigValueError { field, value, .. } => {
                format!("Configuration value '{}' = '{}' is not valid", field, value)
            }
            BridgeError::MissingConfigError { field } => {
                format!("Configuration entry '{}' is missing", field)
            }
            BridgeError::EnvironmentSetupError { message } => {
                format!("Could not prepare the working directory: {}", message)
            }
            BridgeError::DependencyResolutionError { package, reason } => {
                format!("Could not install dependency '{}': {}", package, reason)
            }
            BridgeError::MissingSourceError { path } => {
                format!("Source file '{}' was not found", path)
            }
            BridgeError::DeviceError { device, message } => {
                format!("Device '{}' reported a problem: {}", device, message)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
