// SPDX-FileCopyrightText: 2026 Tandem Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TCP accept loop and per-connection tasks.

use std::sync::Arc;

use tandem_config::model::GatewayConfig;
use tandem_core::{InboundMessage, MessageId, ReactionChange, TandemError};
use tandem_engine::Engine;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::protocol::{escape, parse_frame, ClientFrame};
use crate::Registry;

/// Bind the gateway listener.
pub async fn bind(config: &GatewayConfig) -> Result<TcpListener, TandemError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| TandemError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;
    info!(%addr, "gateway listening");
    Ok(listener)
}

/// Accept connections until the shutdown token fires.
pub async fn serve(
    listener: TcpListener,
    engine: Arc<Engine>,
    registry: Arc<Registry>,
    shutdown: CancellationToken,
) -> Result<(), TandemError> {
    loop {
        let (stream, peer) = tokio::select! {
            () = shutdown.cancelled() => {
                info!("gateway shutting down");
                return Ok(());
            }
            accepted = listener.accept() => accepted.map_err(|e| TandemError::Channel {
                message: format!("accept failed: {e}"),
                source: Some(Box::new(e)),
            })?,
        };
        debug!(%peer, "connection accepted");
        let engine = engine.clone();
        let registry = registry.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, engine, registry, shutdown).await {
                debug!(%peer, error = %err, "connection closed with error");
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    engine: Arc<Engine>,
    registry: Arc<Registry>,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if write_half.write_all(line.as_bytes()).await.is_err() {
                break;
            }
            if write_half.write_all(b"\n").await.is_err() {
                break;
            }
        }
    });

    let mut identity: Option<(String, String)> = None;
    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        let frame = match parse_frame(&line) {
            Ok(frame) => frame,
            Err(err) => {
                let _ = tx.send(format!("ERR {}", escape(&err)));
                continue;
            }
        };

        // Everything except the handshake requires a bound identity.
        if let ClientFrame::Hello {
            platform_id,
            handle,
        } = frame
        {
            registry.register(&platform_id, tx.clone());
            identity = Some((platform_id, handle));
            let _ = tx.send("OK".to_string());
            continue;
        }
        let Some((platform_id, handle)) = identity.as_ref() else {
            let _ = tx.send("ERR say HELLO first".to_string());
            continue;
        };

        let result = match frame {
            ClientFrame::Hello { .. } => unreachable!("handled above"),
            ClientFrame::Msg { id, text } => {
                engine
                    .handle_message(&inbound(platform_id, handle, id, text, None, None))
                    .await
            }
            ClientFrame::File { id, url, text } => {
                engine
                    .handle_message(&inbound(platform_id, handle, id, text, Some(url), None))
                    .await
            }
            ClientFrame::Reply { id, replied, text } => {
                engine
                    .handle_message(&inbound(
                        platform_id,
                        handle,
                        id,
                        text,
                        None,
                        Some(replied),
                    ))
                    .await
            }
            ClientFrame::Edit { id, text } => {
                engine.handle_edit(&MessageId(id), Some(&text)).await;
                Ok(())
            }
            ClientFrame::Delete { id } => {
                engine.handle_edit(&MessageId(id), None).await;
                Ok(())
            }
            ClientFrame::React { id, emoji } => {
                engine
                    .handle_reaction(&MessageId(id), &emoji, ReactionChange::Add)
                    .await;
                Ok(())
            }
            ClientFrame::Unreact { id, emoji } => {
                engine
                    .handle_reaction(&MessageId(id), &emoji, ReactionChange::Remove)
                    .await;
                Ok(())
            }
            ClientFrame::Typing => engine.handle_typing(platform_id, handle).await,
        };

        if let Err(err) = result {
            warn!(platform_id = %platform_id, error = %err, "event handling failed");
            let _ = tx.send("ERR something went wrong, try again".to_string());
        }
    }

    if let Some((platform_id, _)) = identity {
        registry.unregister(&platform_id, &tx);
    }
    drop(tx);
    let _ = writer.await;
    Ok(())
}

fn inbound(
    platform_id: &str,
    handle: &str,
    message_id: String,
    content: String,
    attachment: Option<String>,
    reply_to: Option<String>,
) -> InboundMessage {
    InboundMessage {
        platform_id: platform_id.to_string(),
        handle: handle.to_string(),
        message_id: MessageId(message_id),
        content,
        attachments: attachment.into_iter().collect(),
        reply_to: reply_to.map(MessageId),
    }
}
