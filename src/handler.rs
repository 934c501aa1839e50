//! WebSocket connection handler
//!
//! Handles individual client connections: WebSocket handshake,
//! event decoding, and bidirectional communication with the RelayServer.

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use crate::error::AppError;
use crate::message::{ClientEvent, ServerEvent};
use crate::server::ServerCommand;
use crate::types::PlayerId;

/// Accept connections forever, spawning a handler task for each
pub async fn serve(listener: TcpListener, cmd_tx: mpsc::Sender<ServerCommand>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New connection from {}", addr);
                let cmd_tx = cmd_tx.clone();

                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, cmd_tx).await {
                        error!("Connection handler error: {}", e);
                    }
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

/// Handle a new TCP connection
///
/// Performs the WebSocket handshake, registers the connection with the
/// RelayServer, and pumps events both ways until either side closes.
/// Always reports the disconnect once registration succeeded.
pub async fn handle_connection(
    stream: TcpStream,
    cmd_tx: mpsc::Sender<ServerCommand>,
) -> Result<(), AppError> {
    let peer_addr = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    // WebSocket handshake
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let player_id = PlayerId::new();
    info!("Connection {} from {}", player_id, peer_addr);

    // Channel for server -> client events, unbounded so the actor never waits on a slow client
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ServerEvent>();

    if cmd_tx
        .send(ServerCommand::Connect {
            player_id,
            sender: event_tx,
        })
        .await
        .is_err()
    {
        error!("Failed to register {} - server closed", player_id);
        return Err(AppError::ChannelSend);
    }

    let cmd_tx_read = cmd_tx.clone();

    // Read task (WebSocket -> ServerCommand)
    let mut read_task = tokio::spawn(async move {
        while let Some(msg_result) = ws_receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => match decode_event(&text) {
                    Ok(event) => {
                        let cmd = ServerCommand::Event { player_id, event };
                        if cmd_tx_read.send(cmd).await.is_err() {
                            debug!("Server closed, ending read task for {}", player_id);
                            break;
                        }
                    }
                    Err(e) => {
                        // Malformed input only costs this one event.
                        warn!("Dropping malformed event from {}: {}", player_id, e);
                    }
                },
                Ok(Message::Close(_)) => {
                    debug!("Connection {} sent close frame", player_id);
                    break;
                }
                Ok(_) => {
                    // Ping/pong is answered by tungstenite, binary frames are not part of the protocol
                }
                Err(e) => {
                    warn!("WebSocket error for {}: {}", player_id, e);
                    break;
                }
            }
        }
        debug!("Read task ended for {}", player_id);
    });

    // Write task (ServerEvent -> WebSocket)
    let mut write_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        debug!("WebSocket send failed, ending write task");
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize event: {}", e);
                }
            }
        }

        let _ = ws_sender.close().await;
    });

    tokio::select! {
        _ = &mut read_task => {
            debug!("Read task completed for {}", player_id);
            write_task.abort();
        }
        _ = &mut write_task => {
            debug!("Write task completed for {}", player_id);
            read_task.abort();
        }
    }

    let _ = cmd_tx.send(ServerCommand::Disconnect { player_id }).await;

    Ok(())
}

/// Decode one text frame into a client event
pub fn decode_event(text: &str) -> Result<ClientEvent, AppError> {
    Ok(serde_json::from_str(text)?)
}
