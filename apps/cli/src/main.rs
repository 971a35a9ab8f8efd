//! # FreeD CLI
//!
//! FreeD 跟踪数据的命令行工具。
//!
//! ```bash
//! # 监听一路或多路跟踪器，打印姿态采样
//! freed-cli listen --bind 0.0.0.0:40000 --bind 0.0.0.0:40001
//!
//! # 以 50 Hz 发送合成测试帧（联调 / 回归用）
//! freed-cli send --target 127.0.0.1:40000 --rate 50 --pan 12.5
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{ListenCommand, SendCommand};

/// FreeD CLI - 摄像机跟踪数据命令行工具
#[derive(Parser, Debug)]
#[command(name = "freed-cli")]
#[command(about = "Command-line interface for FreeD camera tracking", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// 监听 UDP 端口并打印姿态采样
    Listen {
        #[command(flatten)]
        args: ListenCommand,
    },

    /// 发送合成的 FreeD 测试帧
    Send {
        #[command(flatten)]
        args: SendCommand,
    },
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("freed_cli=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listen { args } => args.execute(),
        Commands::Send { args } => args.execute(),
    }
}
