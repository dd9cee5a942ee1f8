//! Cancellation abandons the in-flight turn without folding partial state.

mod common;

use std::sync::Arc;

use common::{test_profiles, tool_call_response, ScriptedProvider, SlowTool};
use quill_agent::permission::{PermissionLevel, PermissionPolicy};
use quill_agent::{AgentError, ToolRegistry, TurnEngine};
use serde_json::json;

#[tokio::test]
async fn cancelling_mid_dispatch_leaves_no_orphaned_tool_call() {
    let mut registry = ToolRegistry::new();
    registry.register(SlowTool);

    let provider = Arc::new(ScriptedProvider::looping(tool_call_response(
        "call_1",
        "slow",
        json!({}),
    )));
    let profiles = Arc::new(test_profiles(
        PermissionPolicy::new(PermissionLevel::Allow),
        10,
    ));

    let mut engine = TurnEngine::new(
        provider,
        Arc::new(registry),
        profiles,
        "main",
        "stub-model",
    )
    .unwrap();

    let token = engine.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        token.cancel();
    });

    let err = engine.run_to_completion("run the slow tool").await.unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));

    // The abandoned turn folded nothing: just the seed and the submission.
    // In particular there is no assistant message carrying a tool call
    // without its paired result.
    let messages = engine.session().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, "system");
    assert_eq!(messages[1].role, "user");
    assert!(messages.iter().all(|m| m.tool_calls.is_none()));
}

#[tokio::test]
async fn already_cancelled_engine_refuses_to_run() {
    let provider = Arc::new(ScriptedProvider::looping(
        quill_provider::ChatResponse::text("never seen"),
    ));
    let registry = Arc::new(ToolRegistry::new());
    let profiles = Arc::new(test_profiles(
        PermissionPolicy::new(PermissionLevel::Allow),
        10,
    ));

    let mut engine = TurnEngine::new(
        provider.clone(),
        registry,
        profiles,
        "main",
        "stub-model",
    )
    .unwrap();
    engine.cancellation_token().cancel();

    let err = engine.run_to_completion("hello").await.unwrap_err();
    assert!(matches!(err, AgentError::Cancelled));
    assert_eq!(provider.calls(), 0);
}
