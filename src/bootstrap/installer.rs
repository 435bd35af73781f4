use crate::bootstrap::manifest::Requirement;
use crate::utils::error::{BridgeError, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// 依賴安裝的 port。實際建置用 `CommandInstaller`，測試用記錄式 mock。
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, requirement: &Requirement) -> Result<()>;
}

/// 呼叫外部安裝程式，一條依賴一個行程，循序執行。
/// 完整命令為 `<program> <args...> <name><op><version>`。
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    program: String,
    args: Vec<String>,
}

impl CommandInstaller {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 從一條命令列字串建立，例如 "pip install --no-cache-dir"
    pub fn from_command_line(command: &str) -> Result<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| BridgeError::EnvironmentSetupError {
            message: "installer command is empty".to_string(),
        })?;
        Ok(Self::new(program, parts.collect()))
    }
}

#[async_trait]
impl Installer for CommandInstaller {
    async fn install(&self, requirement: &Requirement) -> Result<()> {
        let rendered = requirement.to_string();
        tracing::info!("📦 Installing {}", rendered);

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&rendered)
            .output()
            .await
            .map_err(|e| BridgeError::DependencyResolutionError {
                package: requirement.name.clone(),
                reason: format!("failed to run '{}': {}", self.program, e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let excerpt: String = stderr.trim().chars().take(200).collect();
            return Err(BridgeError::DependencyResolutionError {
                package: requirement.name.clone(),
                reason: if excerpt.is_empty() {
                    format!("installer exited with {}", output.status)
                } else {
                    excerpt
                },
            });
        }

        Ok(())
    }
}
