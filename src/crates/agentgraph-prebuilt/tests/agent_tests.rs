//! End-to-end ReAct agent runs against scripted models

use agentgraph_checkpoint::InMemoryCheckpointer;
use agentgraph_core::{
    ChatModel, ChatRequest, ChatResponse, CompiledGraph, GraphError, Message, MessageRole,
    NodeOutcome, ProviderError, RunConfig, State, StateGraph, ToolCall, ToolResult,
};
use agentgraph_prebuilt::{
    create_react_agent, AgentConfig, BatchTool, FnTool, SubAgentDelegation, Tool, ToolContext,
    ToolError, DELEGATE_TOOL_NAME, TOOL_CALLS_KEY,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Returns queued responses in order, then a fixed final answer
struct ScriptedModel {
    script: Mutex<VecDeque<Message>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedModel {
    fn new(script: Vec<Message>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Message::assistant("final answer"));
        Ok(ChatResponse::new(next))
    }
}

/// Asks for the same tool on every call
struct LoopingModel {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatModel for LoopingModel {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let call = ToolCall::new(format!("call-{}", n), "ping", json!({}));
        Ok(ChatResponse::new(
            Message::assistant("").with_tool_calls(vec![call]),
        ))
    }
}

fn tool_request(calls: Vec<ToolCall>) -> Message {
    Message::assistant("").with_tool_calls(calls)
}

fn counting_tool(name: &str, counter: Arc<AtomicUsize>) -> Arc<dyn Tool> {
    Arc::new(FnTool::new(name, "counts invocations", move |_| {
        let counter = counter.clone();
        Box::pin(async move {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(json!(format!("pong {}", n)))
        })
    }))
}

fn tool_results(state: &State) -> Vec<ToolResult> {
    state
        .history
        .iter()
        .flat_map(|m| m.tool_results_iter().cloned())
        .collect()
}

fn input(text: &str) -> State {
    State::new().with_messages(vec![Message::human(text)])
}

#[tokio::test]
async fn test_max_tool_calls_stops_gracefully() {
    let counter = Arc::new(AtomicUsize::new(0));
    let agent = create_react_agent(
        Arc::new(LoopingModel {
            calls: AtomicUsize::new(0),
        }),
        vec![counting_tool("ping", counter.clone())],
    )
    .with_config(AgentConfig::new().with_max_tool_calls(2))
    .build()
    .unwrap();

    let state = agent
        .invoke(input("ping forever"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(state.get_metadata_as::<usize>(TOOL_CALLS_KEY), Some(2));

    // the third call is answered without running
    let results = tool_results(&state);
    assert_eq!(results.len(), 3);
    assert!(results[..2].iter().all(|r| !r.is_error));
    assert!(results[2].is_error);
    assert!(results[2].content.contains("limit of 2"));
    assert_eq!(state.last_message().unwrap().role, MessageRole::Tool);
}

#[tokio::test]
async fn test_tool_budget_resets_between_turns() {
    let counter = Arc::new(AtomicUsize::new(0));
    let model = ScriptedModel::new(vec![
        tool_request(vec![ToolCall::new("p1", "ping", json!({}))]),
        tool_request(vec![ToolCall::new("p2", "ping", json!({}))]),
        Message::assistant("first done"),
        tool_request(vec![ToolCall::new("p3", "ping", json!({}))]),
        Message::assistant("second done"),
    ]);
    let agent = create_react_agent(model, vec![counting_tool("ping", counter.clone())])
        .with_config(AgentConfig::new().with_max_tool_calls(2))
        .build()
        .unwrap();

    let mut state = agent
        .invoke(input("turn one"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();
    assert_eq!(state.last_response(), "first done");
    assert_eq!(state.get_metadata_as::<usize>(TOOL_CALLS_KEY), Some(2));

    state.append_message(Message::human("turn two"));
    let state = agent
        .invoke(state)
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(state.last_response(), "second done");
    assert_eq!(state.get_metadata_as::<usize>(TOOL_CALLS_KEY), Some(1));
    assert!(tool_results(&state).iter().all(|r| !r.is_error));
}

#[tokio::test]
async fn test_runaway_tool_use_hits_step_limit() {
    let agent = create_react_agent(
        Arc::new(LoopingModel {
            calls: AtomicUsize::new(0),
        }),
        vec![counting_tool("ping", Arc::new(AtomicUsize::new(0)))],
    )
    .with_config(AgentConfig::new().with_run(RunConfig::new().with_max_steps(6)))
    .build()
    .unwrap();

    let err = agent.invoke(input("go")).await.unwrap_err();
    assert!(matches!(err, GraphError::StepLimit { limit: 6, .. }));
}

#[tokio::test]
async fn test_batch_of_k_calls_with_m_matches() {
    let counter = Arc::new(AtomicUsize::new(0));
    let model = ScriptedModel::new(vec![tool_request(vec![
        ToolCall::new("a", "ping", json!({})),
        ToolCall::new("b", "missing", json!({})),
        ToolCall::new("c", "ping", json!({})),
        ToolCall::new("d", "other_missing", json!({})),
    ])]);

    let agent = create_react_agent(model.clone(), vec![counting_tool("ping", counter.clone())])
        .build()
        .unwrap();
    let state = agent
        .invoke(input("go"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    let results = tool_results(&state);
    assert_eq!(results.len(), 4);
    let not_found: Vec<&str> = results
        .iter()
        .filter(|r| r.content.starts_with("Tool not found"))
        .map(|r| r.call_id.as_str())
        .collect();
    assert_eq!(not_found.len(), 2);
    assert!(not_found.contains(&"b") && not_found.contains(&"d"));
    assert_eq!(counter.load(Ordering::SeqCst), 2);

    // the model saw every result before answering
    let last_request = model.requests().pop().unwrap();
    let tool_message = last_request
        .messages
        .iter()
        .find(|m| m.role == MessageRole::Tool)
        .unwrap();
    assert_eq!(tool_message.tool_results_iter().count(), 4);
    assert_eq!(state.last_response(), "final answer");
}

#[tokio::test]
async fn test_tool_error_becomes_result() {
    let failing: Arc<dyn Tool> = Arc::new(FnTool::new("flaky", "fails", |_| {
        Box::pin(async { Err(ToolError::Execution("upstream timeout".into())) })
    }));
    let model = ScriptedModel::new(vec![tool_request(vec![ToolCall::new(
        "x",
        "flaky",
        json!({}),
    )])]);

    let state = create_react_agent(model, vec![failing])
        .build()
        .unwrap()
        .invoke(input("go"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    let results = tool_results(&state);
    assert_eq!(results.len(), 1);
    assert!(results[0].is_error);
    assert!(results[0].content.contains("upstream timeout"));
}

#[tokio::test]
async fn test_tool_schemas_are_sent() {
    let model = ScriptedModel::new(vec![]);
    let delegation = SubAgentDelegation::new(child_agent());
    create_react_agent(
        model.clone(),
        vec![counting_tool("ping", Arc::new(AtomicUsize::new(0)))],
    )
    .with_delegation(delegation)
    .build()
    .unwrap()
    .invoke(input("hi"))
    .await
    .unwrap();

    let names: Vec<String> = model.requests()[0]
        .options
        .tools
        .iter()
        .map(|t| t.name.clone())
        .collect();
    assert_eq!(names, vec!["ping".to_string(), DELEGATE_TOOL_NAME.to_string()]);
}

fn child_agent() -> CompiledGraph {
    let mut graph = StateGraph::new();
    graph.add_fn("child", |_ctx, state| {
        let leaked = state.get_metadata("secret");
        let task = state.last_message().map(|m| m.text()).unwrap_or_default();
        state.append_message(Message::assistant(format!(
            "done: {} (history {}, secret {})",
            task,
            state.history.len(),
            leaked
        )));
        state.set_metadata("child_scratch", true);
        Ok(NodeOutcome::Continue)
    });
    graph.set_entry("child").add_finish("child");
    graph.compile().unwrap()
}

#[tokio::test]
async fn test_delegation_isolates_state() {
    let model = ScriptedModel::new(vec![tool_request(vec![ToolCall::new(
        "d1",
        DELEGATE_TOOL_NAME,
        json!({"task": "count the files"}),
    )])]);

    let parent_input = State::for_thread("parent")
        .with_messages(vec![
            Message::human("earlier question"),
            Message::assistant("earlier answer"),
            Message::human("now delegate"),
        ])
        .with_metadata("secret", "parent-only");

    let state = create_react_agent(model, vec![])
        .with_delegation(SubAgentDelegation::new(child_agent()))
        .build()
        .unwrap()
        .invoke(parent_input)
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    let results = tool_results(&state);
    assert_eq!(results.len(), 1);
    assert_eq!(
        results[0].content,
        "done: count the files (history 1, secret null)"
    );
    assert!(state.metadata.get("child_scratch").is_none());
}

#[tokio::test]
async fn test_compaction_keeps_system_and_tail() {
    let model = ScriptedModel::new(vec![]);
    let mut history = vec![Message::system("rules")];
    history.extend((0..8).map(|i| Message::human(format!("m{}", i))));

    let state = create_react_agent(model.clone(), vec![])
        .with_config(AgentConfig::new().with_keep_last_messages(3))
        .build()
        .unwrap()
        .invoke(State::new().with_messages(history))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    let sent: Vec<String> = model.requests()[0]
        .messages
        .iter()
        .map(|m| m.text())
        .collect();
    assert_eq!(sent, vec!["rules", "m5", "m6", "m7"]);
    assert_eq!(state.history.len(), 5);
}

#[tokio::test]
async fn test_validation_retries_until_valid() {
    let model = ScriptedModel::new(vec![
        Message::assistant("maybe"),
        Message::assistant("ANSWER: 42"),
    ]);

    let state = create_react_agent(model.clone(), vec![])
        .with_validator(|m: &Message| {
            if m.text().starts_with("ANSWER:") {
                Ok(())
            } else {
                Err("start with ANSWER:".to_string())
            }
        })
        .build()
        .unwrap()
        .invoke(input("question"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(model.requests().len(), 2);
    assert_eq!(state.last_response(), "ANSWER: 42");
    let diagnostic = &state.history[2];
    assert_eq!(diagnostic.role, MessageRole::Human);
    assert!(diagnostic.text().contains("start with ANSWER:"));
}

#[tokio::test]
async fn test_validation_retries_are_bounded() {
    let model = ScriptedModel::new(vec![
        Message::assistant("a"),
        Message::assistant("b"),
        Message::assistant("c"),
    ]);

    let state = create_react_agent(model.clone(), vec![])
        .with_validator(|_: &Message| Err("never good enough".to_string()))
        .with_config(AgentConfig::new().with_max_validation_retries(1))
        .build()
        .unwrap()
        .invoke(input("question"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(model.requests().len(), 2);
    assert_eq!(state.last_response(), "b");
}

#[tokio::test]
async fn test_validation_budget_resets_between_turns() {
    let model = ScriptedModel::new(vec![
        Message::assistant("a"),
        Message::assistant("b"),
        Message::assistant("c"),
        Message::assistant("d"),
    ]);
    let agent = create_react_agent(model.clone(), vec![])
        .with_validator(|_: &Message| Err("never good enough".to_string()))
        .with_config(AgentConfig::new().with_max_validation_retries(1))
        .build()
        .unwrap();

    let mut state = agent
        .invoke(input("first"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();
    assert_eq!(state.last_response(), "b");

    state.append_message(Message::human("second"));
    let state = agent
        .invoke(state)
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    assert_eq!(model.requests().len(), 4);
    assert_eq!(state.last_response(), "d");
}

struct SummingBatch;

#[async_trait]
impl BatchTool for SummingBatch {
    fn name(&self) -> &str {
        "math"
    }

    fn definitions(&self) -> Vec<agentgraph_core::ToolDefinition> {
        vec![
            agentgraph_core::ToolDefinition::new("add", "Add two numbers"),
            agentgraph_core::ToolDefinition::new("mul", "Multiply two numbers"),
        ]
    }

    async fn run_batch(
        &self,
        _ctx: &ToolContext,
        state: &mut State,
        calls: Vec<ToolCall>,
    ) -> Result<(), ToolError> {
        let results = calls
            .iter()
            .filter(|call| call.name == "add")
            .map(|call| {
                let a = call.arguments["a"].as_i64().unwrap_or(0);
                let b = call.arguments["b"].as_i64().unwrap_or(0);
                ToolResult::success(&call.id, &call.name, (a + b).to_string())
            })
            .collect();
        state.append_message(Message::tool_results(results));
        Ok(())
    }
}

#[tokio::test]
async fn test_batch_tool_inserts_own_results() {
    let counter = Arc::new(AtomicUsize::new(0));
    let model = ScriptedModel::new(vec![tool_request(vec![
        ToolCall::new("s1", "add", json!({"a": 2, "b": 3})),
        ToolCall::new("s2", "ping", json!({})),
        ToolCall::new("s3", "mul", json!({"a": 2, "b": 3})),
    ])]);

    let state = create_react_agent(model, vec![counting_tool("ping", counter)])
        .with_batch_tool(Arc::new(SummingBatch))
        .build()
        .unwrap()
        .invoke(input("go"))
        .await
        .unwrap()
        .into_completed()
        .unwrap();

    let results = tool_results(&state);
    assert_eq!(results.len(), 3);
    let by_id = |id: &str| results.iter().find(|r| r.call_id == id).unwrap();
    assert_eq!(by_id("s1").content, "5");
    assert_eq!(by_id("s2").content, "pong 1");
    assert!(by_id("s3").is_error);
    assert_eq!(state.get_metadata_as::<usize>(TOOL_CALLS_KEY), Some(3));
}

#[tokio::test]
async fn test_cancelled_run_never_calls_model() {
    let model = ScriptedModel::new(vec![]);
    let agent = create_react_agent(model.clone(), vec![]).build().unwrap();

    let token = CancellationToken::new();
    token.cancel();
    let err = agent.execute(token, input("hi"), None).await.unwrap_err();

    assert!(matches!(err, GraphError::Cancelled));
    assert!(model.requests().is_empty());
}

#[tokio::test]
async fn test_tool_count_survives_checkpoints() {
    let checkpointer = Arc::new(InMemoryCheckpointer::new());
    let model = ScriptedModel::new(vec![tool_request(vec![
        ToolCall::new("a", "ping", json!({})),
        ToolCall::new("b", "ping", json!({})),
    ])]);

    let agent = create_react_agent(model, vec![counting_tool("ping", Arc::new(AtomicUsize::new(0)))])
        .with_checkpointer(checkpointer)
        .build()
        .unwrap();
    agent.invoke(State::for_thread("counted")).await.unwrap();

    let snapshot = agent.get_state("counted").await.unwrap().unwrap();
    assert!(snapshot.is_complete());
    assert_eq!(snapshot.state.get_metadata_as::<usize>(TOOL_CALLS_KEY), Some(2));
}
