// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented TCP front end for the Tandem service.
//!
//! Each connected client speaks the protocol in [`protocol`]: a `HELLO`
//! handshake binds the connection to a platform identity, after which every
//! line is an event fed into the engine. Outbound delivery goes through
//! [`LineChannel`], which writes frames onto the connection's writer queue;
//! rich operations (edits, reactions) are plain annotated lines, since a
//! terminal client has nothing richer to offer.

pub mod protocol;
pub mod server;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tandem_core::{
    Channel, ChannelHub, Directory, MessageId, Outgoing, ParticipantId, TandemError,
};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::escape;

/// Live connections, keyed by platform identity. Values are the writer
/// queues of the connection tasks.
#[derive(Default)]
pub struct Registry {
    connections: DashMap<String, mpsc::UnboundedSender<String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn register(&self, platform_id: &str, tx: mpsc::UnboundedSender<String>) {
        self.connections.insert(platform_id.to_string(), tx);
    }

    /// Drop the registration, but only if it still belongs to this
    /// connection: a reconnect may have replaced it already.
    pub(crate) fn unregister(&self, platform_id: &str, tx: &mpsc::UnboundedSender<String>) {
        self.connections
            .remove_if(platform_id, |_, current| current.same_channel(tx));
    }

    fn sender(&self, platform_id: &str) -> Option<mpsc::UnboundedSender<String>> {
        self.connections.get(platform_id).map(|e| e.value().clone())
    }

    pub fn connected(&self) -> usize {
        self.connections.len()
    }
}

/// One participant's delivery channel: frames pushed to their connection.
pub struct LineChannel {
    participant: ParticipantId,
    tx: mpsc::UnboundedSender<String>,
}

impl LineChannel {
    fn push(&self, line: String) -> Result<(), TandemError> {
        self.tx.send(line).map_err(|_| TandemError::Unreachable {
            participant: self.participant,
        })
    }
}

#[async_trait]
impl Channel for LineChannel {
    async fn send(&self, msg: Outgoing) -> Result<MessageId, TandemError> {
        let id = MessageId(Uuid::new_v4().to_string());
        let reply = msg
            .reply_to
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("-");
        self.push(format!("MSG {id} {reply} {}", escape(&msg.content)))?;
        for url in &msg.attachments {
            self.push(format!("ATTACH {id} {url}"))?;
        }
        Ok(id)
    }

    async fn send_typing(&self) -> Result<(), TandemError> {
        self.push("TYPING".to_string())
    }

    async fn edit(&self, id: &MessageId, content: &str) -> Result<(), TandemError> {
        self.push(format!("EDIT {id} {}", escape(content)))
    }

    async fn react(&self, id: &MessageId, emoji: &str) -> Result<(), TandemError> {
        self.push(format!("REACT {id} {emoji}"))
    }

    async fn unreact(&self, id: &MessageId, emoji: &str) -> Result<(), TandemError> {
        self.push(format!("UNREACT {id} {emoji}"))
    }
}

/// Resolves participants to their live connection, via the directory's
/// platform identity mapping.
pub struct GatewayHub {
    registry: Arc<Registry>,
    directory: Arc<dyn Directory>,
}

impl GatewayHub {
    pub fn new(registry: Arc<Registry>, directory: Arc<dyn Directory>) -> Self {
        Self {
            registry,
            directory,
        }
    }
}

#[async_trait]
impl ChannelHub for GatewayHub {
    async fn channel_for(&self, id: ParticipantId) -> Result<Arc<dyn Channel>, TandemError> {
        let participant = self.directory.get(id).await?;
        let tx = self
            .registry
            .sender(&participant.platform_id)
            .ok_or(TandemError::Unreachable { participant: id })?;
        Ok(Arc::new(LineChannel {
            participant: id,
            tx,
        }))
    }
}
