use std::path::PathBuf;

use clap::Parser;
use rgbw_bridge::bootstrap::{BootstrapRunner, BuildPlan, CommandInstaller};
use rgbw_bridge::utils::error::ErrorSeverity;
use rgbw_bridge::utils::logger;
use rgbw_bridge::BridgeError;

/// 容器啟動器：建置工作目錄（安裝依賴、放置來源檔），
/// 然後以無參數執行進入點，並原封不動回傳其退出碼。
#[derive(Debug, Clone, Parser)]
#[command(name = "bootstrap")]
#[command(about = "Stage a working directory from a manifest and launch the entry point")]
pub struct BootstrapArgs {
    #[arg(long, default_value = "requirements.txt")]
    pub manifest: PathBuf,

    #[arg(long = "source", required = true, help = "Source file to stage; repeatable")]
    pub sources: Vec<PathBuf>,

    #[arg(long, help = "File name of the source to execute on start")]
    pub entrypoint: String,

    #[arg(long, default_value = "/app")]
    pub workdir: PathBuf,

    #[arg(
        long,
        default_value = "pip install --no-cache-dir",
        help = "Installer command; the rendered requirement is appended"
    )]
    pub installer: String,

    #[arg(long, help = "Runtime command prefix for the entry point, e.g. 'python3'")]
    pub runtime: Option<String>,

    #[arg(long, help = "Run the build phase only, do not launch")]
    pub build_only: bool,

    #[arg(long, help = "Launch a previously built working directory")]
    pub launch_only: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = BootstrapArgs::parse();
    logger::init_cli_logger(args.verbose);

    if args.build_only && args.launch_only {
        eprintln!("❌ --build-only and --launch-only are mutually exclusive");
        std::process::exit(1);
    }

    match run(&args).await {
        Ok(None) => {}
        // 子行程的退出碼就是容器的退出碼
        Ok(Some(code)) => std::process::exit(code),
        Err(e) => {
            tracing::error!(
                "❌ Bootstrap failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            std::process::exit(exit_code.max(1));
        }
    }
}

async fn run(args: &BootstrapArgs) -> Result<Option<i32>, BridgeError> {
    let plan = BuildPlan {
        manifest_path: args.manifest.clone(),
        sources: args.sources.clone(),
        entry_point: args.entrypoint.clone(),
        workdir: args.workdir.clone(),
    };
    let installer = CommandInstaller::from_command_line(&args.installer)?;

    let mut runner = if args.launch_only {
        BootstrapRunner::resume(plan, installer)?
    } else {
        let mut runner = BootstrapRunner::new(plan, installer)?;
        tracing::info!("🔧 Building working directory {}", args.workdir.display());
        let receipt = runner.build().await?;
        tracing::info!(
            "✅ Build complete: {} dependencies, {} sources",
            receipt.requirements.len(),
            receipt.staged.len()
        );
        runner
    };

    if args.build_only {
        return Ok(None);
    }

    let runtime: Option<Vec<String>> = args
        .runtime
        .as_ref()
        .map(|r| r.split_whitespace().map(str::to_string).collect());

    tracing::info!("🚀 Launching {}", args.entrypoint);
    let code = runner.launch(runtime.as_deref()).await?;
    tracing::info!("Entry point exited with code {}", code);
    Ok(Some(code))
}
