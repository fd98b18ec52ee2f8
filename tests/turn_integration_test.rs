//! 整轮集成测试：Agent + 图执行器 + 沙箱工具 + 文件检查点

use std::sync::Arc;

use wren::graph::GraphExecutor;
use wren::llm::ScriptedLlm;
use wren::memory::{CheckpointStore, FileCheckpointStore, Message};
use wren::tools::{PreviewServer, ToolBox, ToolExecutor, Workspace};
use wren::Agent;

fn make_agent(
    workspace: &std::path::Path,
    checkpoint_dir: &std::path::Path,
    chat: Vec<Message>,
    helper: Vec<Message>,
) -> Agent {
    let ws = Workspace::new(workspace);
    let executor = ToolExecutor::new(ToolBox::new(ws.clone(), PreviewServer::new(ws, 0)), 5);
    let graph = GraphExecutor::new(
        Arc::new(ScriptedLlm::new(chat)),
        Arc::new(ScriptedLlm::new(helper)),
        executor,
    );
    Agent::new(graph, Arc::new(FileCheckpointStore::new(checkpoint_dir)))
}

#[tokio::test]
async fn turn_persists_and_resumes_across_agent_instances() {
    let ws_dir = tempfile::tempdir().unwrap();
    let ck_dir = tempfile::tempdir().unwrap();

    // 第一轮：创建 demo 项目
    let agent = make_agent(
        ws_dir.path(),
        ck_dir.path(),
        vec![
            ScriptedLlm::tool_call_reply(vec![
                ("create_folder", serde_json::json!({"folder_name": "demo"})),
                (
                    "create_code_file",
                    serde_json::json!({"filename": "hello.txt", "content": "hi", "folder_name": "demo"}),
                ),
            ]),
            ScriptedLlm::reply("Created the demo project with hello.txt."),
        ],
        vec![
            ScriptedLlm::reply("Create a folder demo containing hello.txt with content hi"),
            ScriptedLlm::reply("1. create_folder 2. create_code_file"),
        ],
    );

    let outcome = agent
        .run_turn(
            "session-8",
            "make a folder called demo and a file hello.txt with content 'hi' inside it",
            None,
        )
        .await
        .unwrap();
    assert_eq!(outcome.tool_events.len(), 2);
    assert_eq!(
        std::fs::read_to_string(ws_dir.path().join("demo/hello.txt")).unwrap(),
        "hi"
    );

    // 新的 Agent 实例（模拟新进程）：同一会话 ID 续接历史，删除 demo
    let agent = make_agent(
        ws_dir.path(),
        ck_dir.path(),
        vec![
            ScriptedLlm::tool_call_reply(vec![(
                "delete_folder",
                serde_json::json!({"folder_name": "demo"}),
            )]),
            ScriptedLlm::reply("The demo project has been deleted."),
        ],
        vec![
            ScriptedLlm::reply("Delete the folder demo"),
            ScriptedLlm::reply("1. delete_folder"),
        ],
    );

    let outcome = agent
        .run_turn("session-8", "delete the demo project", None)
        .await
        .unwrap();
    assert_eq!(outcome.tool_events.len(), 1);
    assert!(outcome.tool_events[0].result.contains("deleted"));
    assert!(!ws_dir.path().join("demo").exists());

    // 检查点中保留两轮完整历史，草稿字段只反映第二轮
    let store = FileCheckpointStore::new(ck_dir.path());
    let state = store.load("session-8").await.unwrap().unwrap();
    let user_texts: Vec<&str> = state
        .messages
        .iter()
        .filter(|m| m.role == wren::memory::Role::User)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(user_texts.len(), 2);
    assert!(user_texts[1].contains("delete"));
    assert_eq!(
        state.rewritten_instruction.as_deref(),
        Some("Delete the folder demo")
    );
    assert_eq!(state.plan.as_deref(), Some("1. delete_folder"));
}

#[tokio::test]
async fn reasoning_failure_leaves_checkpoint_at_previous_turn() {
    let ws_dir = tempfile::tempdir().unwrap();
    let ck_dir = tempfile::tempdir().unwrap();

    let agent = make_agent(
        ws_dir.path(),
        ck_dir.path(),
        vec![ScriptedLlm::reply("First reply.")],
        vec![
            ScriptedLlm::reply("rewrite"),
            ScriptedLlm::reply("plan"),
            // 第二轮的 rewrite 之后脚本耗尽，plan 调用将失败
            ScriptedLlm::reply("rewrite again"),
        ],
    );

    agent.run_turn("s", "first request", None).await.unwrap();
    let err = agent.run_turn("s", "second request", None).await.unwrap_err();
    assert!(matches!(err, wren::core::AgentError::ReasoningFailure(_)));

    // 会话仍然可用，且检查点停留在第一轮结束的状态
    let store = FileCheckpointStore::new(ck_dir.path());
    let state = store.load("s").await.unwrap().unwrap();
    assert_eq!(state.messages.len(), 2);
    assert_eq!(state.messages[1].content, "First reply.");
}

#[tokio::test]
async fn missing_checkpoint_starts_a_fresh_session() {
    let ws_dir = tempfile::tempdir().unwrap();
    let ck_dir = tempfile::tempdir().unwrap();

    let agent = make_agent(
        ws_dir.path(),
        ck_dir.path(),
        vec![ScriptedLlm::reply("Hi, I can manage your workspace.")],
        vec![
            ScriptedLlm::reply("Greet the user"),
            ScriptedLlm::reply("1. reply"),
        ],
    );

    let outcome = agent.run_turn("brand-new", "hello", None).await.unwrap();
    assert_eq!(outcome.response, "Hi, I can manage your workspace.");
    assert!(outcome.tool_events.is_empty());
}
