//! 容器啟動契約：準備工作目錄、安裝依賴、放置來源檔、執行進入點。
//! 建置階段全部成功之前，進入點永遠不會被執行。

pub mod installer;
pub mod manifest;
pub mod runner;

pub use installer::{CommandInstaller, Installer};
pub use manifest::{Manifest, Requirement};
pub use runner::{BootstrapRunner, BootstrapState, BuildPlan, BuildReceipt};
