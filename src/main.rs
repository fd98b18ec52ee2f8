//! Wren - Rust 语音编码助手智能体
//!
//! 入口：初始化日志与配置，创建 Agent，运行控制台 REPL。
//! 语音前端（麦克风 / STT / TTS）在核心之外：这里用 stdin/stdout 代替，
//! 每行输入即一轮对话，过程事件实时打印。

use std::io::Write;

use anyhow::Context;
use tokio::sync::mpsc;
use wren::config::load_config;
use wren::graph::TurnEvent;
use wren::Agent;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    wren::observability::init();

    let cfg = load_config(None).context("Failed to load config")?;
    std::fs::create_dir_all(cfg.workspace_root()).context("Failed to create workspace")?;

    // 会话 ID：第一个命令行参数，缺省用配置值；同一 ID 续接既有对话
    let session_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| cfg.app.default_session_id.clone());
    tracing::info!(session_id = %session_id, "Session ready");

    let agent = Agent::from_config(&cfg);
    let stdin = std::io::stdin();

    loop {
        print!("you> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let user_text = line.trim();
        if user_text.is_empty() {
            continue;
        }
        if user_text == "exit" || user_text == "quit" {
            break;
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let printer = tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                print_event(&ev);
            }
        });

        match agent.run_turn(&session_id, user_text, Some(&tx)).await {
            Ok(outcome) => {
                drop(tx);
                let _ = printer.await;
                println!("wren> {}", outcome.response);
            }
            Err(e) => {
                drop(tx);
                let _ = printer.await;
                // 推理失败只中止本轮，会话下一轮仍可用
                eprintln!("turn failed: {}", e);
            }
        }
    }

    Ok(())
}

fn print_event(ev: &TurnEvent) {
    match ev {
        TurnEvent::ToolInvoked { tool, .. } => println!("  [tool] {} ...", tool),
        TurnEvent::ToolCompleted { tool, preview } => {
            println!("  [tool] {} -> {}", tool, preview)
        }
        TurnEvent::Error { text } => eprintln!("  [error] {}", text),
        // 节点进入 / 草稿字段事件仅在 debug 日志展示，不打扰用户
        _ => tracing::debug!(event = ?ev, "turn event"),
    }
}
