//! Shared fixtures for tool tests.

use std::sync::Arc;
use std::time::Duration;

use mcremote_core::{ConnectOptions, Session, Tool, ToolOutcome};
use mcremote_sim::{SimConnector, SimWorld};

pub fn options(username: &str) -> ConnectOptions {
    ConnectOptions {
        host: "localhost".into(),
        port: 25565,
        username: username.into(),
        password: None,
        version: None,
    }
}

/// A session already connected to `world`.
pub async fn connected(world: &SimWorld) -> Arc<Session> {
    let session = Arc::new(Session::new());
    let connector = SimConnector::new(world.clone());
    session
        .connect(&connector, options("bot"), Duration::from_secs(10))
        .await
        .unwrap();
    session
}

/// Run a tool and return its outcome, panicking on dispatch errors.
pub async fn run(tool: &dyn Tool, args: serde_json::Value) -> ToolOutcome {
    tool.execute(args).await.unwrap()
}

/// Connect, disconnect, then call `tool`: it must answer `NotConnected`
/// without touching the client.
pub async fn assert_gated(make: impl FnOnce(Arc<Session>) -> Box<dyn Tool>, args: serde_json::Value) {
    let world = SimWorld::demo();
    let session = connected(&world).await;
    session.disconnect().await.unwrap();
    let before = world.calls().len();

    let tool = make(session);
    assert_eq!(run(tool.as_ref(), args).await, ToolOutcome::NotConnected);
    assert_eq!(world.calls().len(), before, "gated tool touched the client");
}
