use std::path::{Path, PathBuf};
use std::process::Stdio;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::bootstrap::installer::Installer;
use crate::bootstrap::manifest::Manifest;
use crate::utils::error::{BridgeError, Result};

/// 建置收據檔名，放在工作目錄裡，同時作為「已建置完成」的證明
pub const RECEIPT_FILE: &str = "bootstrap-receipt.json";

const WRITE_PROBE: &str = ".write-probe";

/// 啟動流程的狀態機。`launch` 只能從 `DependenciesInstalled` 出發，
/// `Terminated` 之後不會自動回到 `Running`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    DependenciesInstalled,
    Running,
    Terminated(i32),
}

/// 一次建置的輸入：依賴清單、來源檔、進入點、工作目錄
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub manifest_path: PathBuf,
    pub sources: Vec<PathBuf>,
    pub entry_point: String,
    pub workdir: PathBuf,
}

/// 建置完成後寫入工作目錄的收據。相同輸入重跑建置，
/// `requirements` 與 `staged` 必然相同（確定性建置）。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReceipt {
    pub requirements: Vec<String>,
    pub staged: Vec<String>,
    pub staged_at: DateTime<Utc>,
}

pub struct BootstrapRunner<I: Installer> {
    plan: BuildPlan,
    installer: I,
    state: BootstrapState,
}

impl<I: Installer> BootstrapRunner<I> {
    /// 建立 runner 並驗證計畫：進入點必須是來源檔之一
    pub fn new(plan: BuildPlan, installer: I) -> Result<Self> {
        if plan.sources.is_empty() {
            return Err(BridgeError::EnvironmentSetupError {
                message: "build plan declares no source files".to_string(),
            });
        }

        let entry_is_declared = plan
            .sources
            .iter()
            .any(|s| s.file_name().map(|n| n.to_string_lossy() == plan.entry_point) == Some(true));
        if !entry_is_declared {
            return Err(BridgeError::EnvironmentSetupError {
                message: format!(
                    "entry point '{}' is not one of the declared sources",
                    plan.entry_point
                ),
            });
        }

        Ok(Self {
            plan,
            installer,
            state: BootstrapState::Uninitialized,
        })
    }

    /// 接手一個已建置好的工作目錄（容器啟動時的 --launch-only 模式）。
    /// 收據檔就是建置完成的證明；沒有收據就拒絕。
    pub fn resume(plan: BuildPlan, installer: I) -> Result<Self> {
        let mut runner = Self::new(plan, installer)?;
        if !runner.plan.workdir.join(RECEIPT_FILE).is_file() {
            return Err(BridgeError::EnvironmentSetupError {
                message: format!(
                    "no build receipt in '{}', run the build phase first",
                    runner.plan.workdir.display()
                ),
            });
        }
        runner.state = BootstrapState::DependenciesInstalled;
        Ok(runner)
    }

    pub fn state(&self) -> BootstrapState {
        self.state
    }

    pub fn workdir(&self) -> &Path {
        &self.plan.workdir
    }

    /// 建置：準備目錄 → 安裝依賴 → 放置來源檔。三個階段循序執行，
    /// 任一失敗都是致命的：盡力清掉工作目錄，不留部分建置狀態。
    pub async fn build(&mut self) -> Result<BuildReceipt> {
        self.prepare()?;

        let result = self.install_and_materialize().await;
        if result.is_err() {
            // 建置失敗不留半成品
            let _ = std::fs::remove_dir_all(&self.plan.workdir);
        }
        result
    }

    async fn install_and_materialize(&mut self) -> Result<BuildReceipt> {
        let manifest = self.install_dependencies().await?;
        self.state = BootstrapState::DependenciesInstalled;
        self.materialize_sources(&manifest)
    }

    /// 建立工作目錄並以寫入探針驗證可寫
    fn prepare(&self) -> Result<()> {
        let workdir = &self.plan.workdir;
        std::fs::create_dir_all(workdir).map_err(|e| BridgeError::EnvironmentSetupError {
            message: format!("cannot create '{}': {}", workdir.display(), e),
        })?;

        let probe = workdir.join(WRITE_PROBE);
        std::fs::write(&probe, b"probe").map_err(|e| BridgeError::EnvironmentSetupError {
            message: format!("'{}' is not writable: {}", workdir.display(), e),
        })?;
        std::fs::remove_file(&probe).map_err(|e| BridgeError::EnvironmentSetupError {
            message: format!("cannot clean up write probe: {}", e),
        })?;

        Ok(())
    }

    /// 依宣告順序逐條安裝，第一個失敗即中止
    async fn install_dependencies(&self) -> Result<Manifest> {
        let manifest = Manifest::from_file(&self.plan.manifest_path).map_err(|e| match e {
            BridgeError::IoError(io) => BridgeError::DependencyResolutionError {
                package: self.plan.manifest_path.display().to_string(),
                reason: format!("cannot read manifest: {}", io),
            },
            other => other,
        })?;

        for requirement in manifest.requirements() {
            self.installer.install(requirement).await?;
        }

        tracing::info!("✅ Installed {} dependencies", manifest.len());
        Ok(manifest)
    }

    /// 先確認所有來源檔都在，再開始複製；缺一個就整個失敗
    fn materialize_sources(&self, manifest: &Manifest) -> Result<BuildReceipt> {
        for source in &self.plan.sources {
            if !source.is_file() {
                return Err(BridgeError::MissingSourceError {
                    path: source.display().to_string(),
                });
            }
        }

        let mut staged = Vec::new();
        for source in &self.plan.sources {
            let file_name = source
                .file_name()
                .ok_or_else(|| BridgeError::MissingSourceError {
                    path: source.display().to_string(),
                })?;
            std::fs::copy(source, self.plan.workdir.join(file_name))?;
            staged.push(file_name.to_string_lossy().into_owned());
        }

        let receipt = BuildReceipt {
            requirements: manifest
                .requirements()
                .iter()
                .map(|r| r.to_string())
                .collect(),
            staged,
            staged_at: Utc::now(),
        };
        let rendered = serde_json::to_string_pretty(&receipt)?;
        std::fs::write(self.plan.workdir.join(RECEIPT_FILE), rendered)?;

        tracing::info!(
            "✅ Staged {} source files into {}",
            receipt.staged.len(),
            self.plan.workdir.display()
        );
        Ok(receipt)
    }

    /// 啟動進入點：工作目錄內、無參數、stdio 直通，等待結束並
    /// 原封不動回傳退出碼。不重試、不重啟、不監管。
    pub async fn launch(&mut self, runtime: Option<&[String]>) -> Result<i32> {
        if self.state != BootstrapState::DependenciesInstalled {
            return Err(BridgeError::EnvironmentSetupError {
                message: format!(
                    "launch requires a completed build, current state is {:?}",
                    self.state
                ),
            });
        }

        let entry = self.plan.workdir.join(&self.plan.entry_point);
        let mut command = match runtime {
            Some([program, args @ ..]) => {
                let mut c = Command::new(program);
                c.args(args);
                c.arg(&entry);
                c
            }
            _ => Command::new(&entry),
        };

        let mut child = command
            .current_dir(&self.plan.workdir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| BridgeError::EnvironmentSetupError {
                message: format!("cannot launch '{}': {}", entry.display(), e),
            })?;

        self.state = BootstrapState::Running;
        let status = child.wait().await?;

        let code = exit_code_of(status);
        self.state = BootstrapState::Terminated(code);
        Ok(code)
    }
}

/// 訊號死亡依容器慣例對應為 128 + signo
fn exit_code_of(status: std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    1
}
