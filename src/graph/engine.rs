//! 图执行器
//!
//! 状态机：Rewrite -> Plan -> Chatbot -> (Tools -> Chatbot)* -> End。
//! rewrite / plan 用辅助模型（无工具），chatbot 用主模型（带工具声明）；
//! 工具调用按请求顺序逐个执行，每个调用恰好写回一条 tool 结果消息。
//! 推理调用失败时整轮中止并回滚到轮前快照；工具失败非致命，作为结果
//! 文本反馈给下一次 chatbot 调用，让模型自行纠正。

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::core::AgentError;
use crate::graph::events::send_event;
use crate::graph::{prompts, Node, TurnEvent, TurnState};
use crate::llm::LlmClient;
use crate::memory::Message;
use crate::tools::ToolExecutor;

/// 单轮最大 Tools -> Chatbot 回环次数，防止工具死循环
const MAX_TOOL_ROUNDS: usize = 8;
/// 工具结果事件预览最大字符数
const RESULT_PREVIEW_CHARS: usize = 200;

/// 一轮中发生的一次工具调用及其结果文本
#[derive(Debug, Clone, PartialEq)]
pub struct ToolEvent {
    pub tool: String,
    pub result: String,
}

/// 一轮执行的产出：最终回复与按序的工具事件
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub tool_events: Vec<ToolEvent>,
}

/// 图执行器：串行推进节点，一轮内无并发
pub struct GraphExecutor {
    /// 工具调用模型（chatbot 节点）
    chat_llm: Arc<dyn LlmClient>,
    /// 轻量辅助模型（rewrite / plan 节点，无工具）
    helper_llm: Arc<dyn LlmClient>,
    executor: ToolExecutor,
}

impl GraphExecutor {
    pub fn new(
        chat_llm: Arc<dyn LlmClient>,
        helper_llm: Arc<dyn LlmClient>,
        executor: ToolExecutor,
    ) -> Self {
        Self {
            chat_llm,
            helper_llm,
            executor,
        }
    }

    /// 执行一轮：追加用户消息并驱动状态机到 End
    ///
    /// 成功时 state 含本轮全部消息与覆盖后的草稿字段；ReasoningFailure 时
    /// state 回滚到调用前的快照，会话在下一轮仍然可用。
    pub async fn run_turn(
        &self,
        state: &mut TurnState,
        user_text: &str,
        event_tx: Option<&UnboundedSender<TurnEvent>>,
    ) -> Result<TurnOutcome, AgentError> {
        let snapshot = state.clone();
        state.messages.push(Message::user(user_text));

        match self.drive(state, &event_tx).await {
            Ok(tool_events) => {
                let response = state
                    .latest_assistant_text()
                    .unwrap_or_default()
                    .to_string();
                send_event(
                    &event_tx,
                    TurnEvent::AssistantMessage {
                        text: response.clone(),
                    },
                );
                Ok(TurnOutcome {
                    response,
                    tool_events,
                })
            }
            Err(e) => {
                send_event(&event_tx, TurnEvent::Error { text: e.to_string() });
                *state = snapshot;
                Err(e)
            }
        }
    }

    /// 节点循环；返回按请求顺序记录的工具事件
    async fn drive(
        &self,
        state: &mut TurnState,
        event_tx: &Option<&UnboundedSender<TurnEvent>>,
    ) -> Result<Vec<ToolEvent>, AgentError> {
        let original = state.latest_user_text().unwrap_or_default().to_string();
        let mut tool_events = Vec::new();
        let mut tool_rounds = 0;
        let mut node = Node::Rewrite;

        loop {
            send_event(event_tx, TurnEvent::NodeEntered { node });
            match node {
                Node::Rewrite => {
                    let reply = self
                        .helper_llm
                        .complete(
                            prompts::REWRITE_SYSTEM,
                            &[Message::user(original.as_str())],
                            None,
                        )
                        .await
                        .map_err(AgentError::ReasoningFailure)?;
                    send_event(
                        event_tx,
                        TurnEvent::Rewritten {
                            text: reply.content.clone(),
                        },
                    );
                    state.rewritten_instruction = Some(reply.content);
                    node = Node::Plan;
                }
                Node::Plan => {
                    let rewritten = state
                        .rewritten_instruction
                        .clone()
                        .unwrap_or_else(|| original.clone());
                    let input = prompts::plan_input(&original, &rewritten);
                    let reply = self
                        .helper_llm
                        .complete(prompts::PLAN_SYSTEM, &[Message::user(input)], None)
                        .await
                        .map_err(AgentError::ReasoningFailure)?;
                    send_event(
                        event_tx,
                        TurnEvent::Planned {
                            text: reply.content.clone(),
                        },
                    );
                    state.plan = Some(reply.content);
                    node = Node::Chatbot;
                }
                Node::Chatbot => {
                    let rewritten = state.rewritten_instruction.as_deref().unwrap_or(&original);
                    let plan = state.plan.as_deref().unwrap_or_default();
                    let system = prompts::chatbot_system(&original, rewritten, plan);
                    // 达到回环上限后收回工具声明，强制模型给出文本收尾
                    let tools_allowed = tool_rounds < MAX_TOOL_ROUNDS;
                    let specs = self.executor.specs();
                    let tools = if tools_allowed {
                        Some(specs.as_slice())
                    } else {
                        None
                    };
                    let mut reply = self
                        .chat_llm
                        .complete(&system, &state.messages, tools)
                        .await
                        .map_err(AgentError::ReasoningFailure)?;
                    if !tools_allowed && reply.has_tool_calls() {
                        tracing::warn!("Dropping tool calls issued after round limit");
                        reply.tool_calls.clear();
                    }
                    let has_tools = reply.has_tool_calls();
                    state.messages.push(reply);
                    node = if has_tools { Node::Tools } else { Node::End };
                }
                Node::Tools => {
                    // 待执行的调用来自刚追加的 assistant 消息
                    let pending = state
                        .messages
                        .last()
                        .filter(|m| m.has_tool_calls())
                        .map(|m| m.tool_calls.clone())
                        .unwrap_or_default();
                    for call in pending {
                        send_event(
                            event_tx,
                            TurnEvent::ToolInvoked {
                                tool: call.name.clone(),
                                args: call.arguments.clone(),
                            },
                        );
                        // 工具失败非致命：错误文本作为结果写回，模型下一轮自行处理
                        let result = match self.executor.execute(&call.name, &call.arguments).await
                        {
                            Ok(text) => text,
                            Err(e) => format!("Error: {}", e),
                        };
                        let preview: String =
                            result.chars().take(RESULT_PREVIEW_CHARS).collect();
                        send_event(
                            event_tx,
                            TurnEvent::ToolCompleted {
                                tool: call.name.clone(),
                                preview,
                            },
                        );
                        state.messages.push(Message::tool(result.clone(), call.id.clone()));
                        tool_events.push(ToolEvent {
                            tool: call.name,
                            result,
                        });
                    }
                    tool_rounds += 1;
                    if tool_rounds >= MAX_TOOL_ROUNDS {
                        tracing::warn!(
                            rounds = tool_rounds,
                            "Tool round limit reached, forcing a final reply"
                        );
                    }
                    node = Node::Chatbot;
                }
                Node::End => return Ok(tool_events),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;
    use crate::memory::Role;
    use crate::tools::{PreviewServer, ToolBox, Workspace};

    fn make_executor(root: &std::path::Path) -> ToolExecutor {
        let ws = Workspace::new(root);
        ToolExecutor::new(ToolBox::new(ws.clone(), PreviewServer::new(ws, 0)), 5)
    }

    fn make_graph(
        root: &std::path::Path,
        chat: Vec<Message>,
        helper: Vec<Message>,
    ) -> (GraphExecutor, Arc<ScriptedLlm>, Arc<ScriptedLlm>) {
        let chat_llm = Arc::new(ScriptedLlm::new(chat));
        let helper_llm = Arc::new(ScriptedLlm::new(helper));
        let graph = GraphExecutor::new(
            chat_llm.clone(),
            helper_llm.clone(),
            make_executor(root),
        );
        (graph, chat_llm, helper_llm)
    }

    #[tokio::test]
    async fn zero_tool_turn_runs_exactly_three_reasoning_calls() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, chat_llm, helper_llm) = make_graph(
            dir.path(),
            vec![ScriptedLlm::reply("Hello there!")],
            vec![
                ScriptedLlm::reply("Say hello"),
                ScriptedLlm::reply("1. reply politely"),
            ],
        );

        let mut state = TurnState::default();
        let outcome = graph.run_turn(&mut state, "hi", None).await.unwrap();

        assert_eq!(outcome.response, "Hello there!");
        assert!(outcome.tool_events.is_empty());
        // rewrite + plan 无工具，chatbot 带工具声明
        assert_eq!(helper_llm.tools_enabled_log(), vec![false, false]);
        assert_eq!(chat_llm.tools_enabled_log(), vec![true]);
        // user + assistant
        assert_eq!(state.messages.len(), 2);
    }

    #[tokio::test]
    async fn tool_calls_each_get_one_result_in_request_order() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, _, _) = make_graph(
            dir.path(),
            vec![
                ScriptedLlm::tool_call_reply(vec![
                    (
                        "create_folder",
                        serde_json::json!({"folder_name": "demo"}),
                    ),
                    (
                        "create_code_file",
                        serde_json::json!({"filename": "hello.txt", "content": "hi", "folder_name": "demo"}),
                    ),
                ]),
                ScriptedLlm::reply("Created demo/hello.txt for you."),
            ],
            vec![
                ScriptedLlm::reply("Create folder demo with hello.txt containing hi"),
                ScriptedLlm::reply("1. create_folder 2. create_code_file"),
            ],
        );

        let mut state = TurnState::default();
        let outcome = graph
            .run_turn(
                &mut state,
                "make a folder called demo and a file hello.txt with content 'hi' inside it",
                None,
            )
            .await
            .unwrap();

        let tools: Vec<&str> = outcome.tool_events.iter().map(|e| e.tool.as_str()).collect();
        assert_eq!(tools, vec!["create_folder", "create_code_file"]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join("demo/hello.txt")).unwrap(),
            "hi"
        );

        // 结果消息与请求一一对应且顺序一致
        let assistant = state
            .messages
            .iter()
            .find(|m| m.has_tool_calls())
            .unwrap()
            .clone();
        let tool_msgs: Vec<&Message> = state
            .messages
            .iter()
            .filter(|m| m.role == Role::Tool)
            .collect();
        assert_eq!(tool_msgs.len(), assistant.tool_calls.len());
        for (call, msg) in assistant.tool_calls.iter().zip(tool_msgs) {
            assert_eq!(msg.tool_call_id.as_deref(), Some(call.id.as_str()));
        }
    }

    #[tokio::test]
    async fn delete_missing_folder_feeds_not_found_back_to_chatbot() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, _, _) = make_graph(
            dir.path(),
            vec![
                ScriptedLlm::tool_call_reply(vec![(
                    "delete_folder",
                    serde_json::json!({"folder_name": "demo"}),
                )]),
                ScriptedLlm::reply("The demo folder does not exist, nothing to delete."),
            ],
            vec![
                ScriptedLlm::reply("Delete the folder demo"),
                ScriptedLlm::reply("1. delete_folder"),
            ],
        );

        let mut state = TurnState::default();
        let outcome = graph
            .run_turn(&mut state, "delete the demo project", None)
            .await
            .unwrap();

        assert_eq!(outcome.tool_events.len(), 1);
        assert!(outcome.tool_events[0].result.contains("Not found"));
        // 失败结果进入对话，最终回复基于它产生
        assert!(outcome.response.contains("does not exist"));
    }

    #[tokio::test]
    async fn reasoning_failure_rolls_state_back_to_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        // helper 只有一条回复：plan 节点的调用将失败
        let (graph, _, _) = make_graph(
            dir.path(),
            vec![],
            vec![ScriptedLlm::reply("rewritten")],
        );

        let mut state = TurnState::default();
        state.messages.push(Message::user("earlier turn"));
        state.messages.push(Message::assistant("earlier reply"));
        let before = state.clone();

        let err = graph.run_turn(&mut state, "hi", None).await.unwrap_err();
        assert!(matches!(err, AgentError::ReasoningFailure(_)));
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn second_turn_overwrites_scratch_fields_and_keeps_history() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, _, _) = make_graph(
            dir.path(),
            vec![
                ScriptedLlm::reply("First answer"),
                ScriptedLlm::reply("Second answer"),
            ],
            vec![
                ScriptedLlm::reply("rewrite one"),
                ScriptedLlm::reply("plan one"),
                ScriptedLlm::reply("rewrite two"),
                ScriptedLlm::reply("plan two"),
            ],
        );

        let mut state = TurnState::default();
        graph.run_turn(&mut state, "first request", None).await.unwrap();
        graph.run_turn(&mut state, "second request", None).await.unwrap();

        assert_eq!(state.rewritten_instruction.as_deref(), Some("rewrite two"));
        assert_eq!(state.plan.as_deref(), Some("plan two"));
        // 两轮各 user + assistant
        assert_eq!(state.messages.len(), 4);
        assert_eq!(state.messages[0].content, "first request");
        assert_eq!(state.messages[2].content, "second request");
    }

    #[tokio::test]
    async fn tool_round_limit_still_produces_a_final_reply() {
        let dir = tempfile::tempdir().unwrap();
        // 模型连续请求工具直到上限，最后一次调用被收回工具声明
        let mut chat = vec![
            ScriptedLlm::tool_call_reply(vec![(
                "create_folder",
                serde_json::json!({"folder_name": "demo"}),
            )]);
            MAX_TOOL_ROUNDS
        ];
        chat.push(ScriptedLlm::reply(
            "I reached the action limit, stopping here.",
        ));
        let (graph, chat_llm, _) = make_graph(
            dir.path(),
            chat,
            vec![
                ScriptedLlm::reply("Keep creating folders"),
                ScriptedLlm::reply("1. create_folder repeatedly"),
            ],
        );

        let mut state = TurnState::default();
        let outcome = graph
            .run_turn(&mut state, "keep creating folders forever", None)
            .await
            .unwrap();

        assert_eq!(outcome.response, "I reached the action limit, stopping here.");
        assert_eq!(outcome.tool_events.len(), MAX_TOOL_ROUNDS);
        // 前 MAX_TOOL_ROUNDS 次 chatbot 调用带工具，收尾那次不带
        let mut expected = vec![true; MAX_TOOL_ROUNDS];
        expected.push(false);
        assert_eq!(chat_llm.tools_enabled_log(), expected);
    }

    #[tokio::test]
    async fn events_arrive_in_node_order() {
        let dir = tempfile::tempdir().unwrap();
        let (graph, _, _) = make_graph(
            dir.path(),
            vec![ScriptedLlm::reply("done")],
            vec![
                ScriptedLlm::reply("rewritten"),
                ScriptedLlm::reply("plan"),
            ],
        );

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let mut state = TurnState::default();
        graph.run_turn(&mut state, "hi", Some(&tx)).await.unwrap();
        drop(tx);

        let mut nodes = Vec::new();
        while let Some(ev) = rx.recv().await {
            if let TurnEvent::NodeEntered { node } = ev {
                nodes.push(node);
            }
        }
        assert_eq!(nodes, vec![Node::Rewrite, Node::Plan, Node::Chatbot, Node::End]);
    }
}
