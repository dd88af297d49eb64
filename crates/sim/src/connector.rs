use std::sync::Arc;

use async_trait::async_trait;
use mcremote_core::{ConnectOptions, GameConnector, GameError, PendingConnection};
use tokio::sync::mpsc;

use crate::client::SimClient;
use crate::world::{SimCall, SimOp, SimWorld};

/// Connects to a [`SimWorld`]. Login signals follow the world's script.
pub struct SimConnector {
    world: SimWorld,
}

impl SimConnector {
    pub fn new(world: SimWorld) -> Self {
        Self { world }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }
}

#[async_trait]
impl GameConnector for SimConnector {
    fn name(&self) -> &str {
        "sim"
    }

    async fn connect(&self, options: ConnectOptions) -> Result<PendingConnection, GameError> {
        let script = {
            let mut state = self.world.state();
            state.record(SimCall::Connect {
                host: options.host.clone(),
                port: options.port,
                username: options.username.clone(),
            });
            if let Some(message) = state.failure(SimOp::Connect) {
                return Err(GameError::Rejected(message));
            }
            state.username = options.username.clone();
            state.online = true;
            state.login_script.clone()
        };

        let (tx, rx) = mpsc::unbounded_channel();
        for (delay, event) in script {
            let tx = tx.clone();
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let _ = tx.send(event);
            });
        }

        tracing::debug!(host = %options.host, "Simulated login started");
        Ok(PendingConnection {
            client: Arc::new(SimClient::new(self.world.clone())),
            events: rx,
        })
    }
}
