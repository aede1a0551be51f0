use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::tungstenite::protocol::Message;

use crate::timer::registry::Phase;

/// Command frame from a client, dispatched by the `cmd` tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum TimerCommand {
    Start,
    Pause,
    Reset,
    SelectDuration { phase: Phase, minutes: u32 },
    CustomDuration { phase: Phase, value: String },
    Status,
}

/// Per-frame acknowledgement: confirms the frame parsed, nothing more.
/// Validation failures arrive later as an `error` event.
#[derive(Debug, Serialize)]
pub struct WebSocketResponse {
    pub success: bool,
    pub message: Option<String>,
}

/// Event broadcast to every connected client, tagged by `event`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StateEvent {
    State {
        minutes_text: String,
        seconds_text: String,
        status_text: String,
        phase: Phase,
        running: bool,
        completed_cycles: u32,
        clock: String,
    },
    Error {
        message: String,
    },
}

pub type CommandSender = mpsc::UnboundedSender<TimerCommand>;
pub type CommandReceiver = mpsc::UnboundedReceiver<TimerCommand>;

pub fn create_command_channel() -> (CommandSender, CommandReceiver) {
    mpsc::unbounded_channel()
}

pub fn create_event_channel() -> broadcast::Sender<StateEvent> {
    let (event_tx, _) = broadcast::channel(64);
    event_tx
}

pub async fn start_websocket_server(
    addr: SocketAddr,
    command_tx: CommandSender,
    event_tx: broadcast::Sender<StateEvent>,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(&addr).await?;
    println!("WebSocket server listening on: {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        println!("New WebSocket connection from: {}", peer_addr);
        let tx = command_tx.clone();
        let events = event_tx.subscribe();
        tokio::spawn(handle_connection(stream, peer_addr, tx, events));
    }

    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    command_tx: CommandSender,
    mut events: broadcast::Receiver<StateEvent>,
) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            eprintln!("WebSocket handshake failed with {}: {}", peer_addr, e);
            return;
        }
    };

    println!("WebSocket handshake completed with {}", peer_addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            msg = ws_receiver.next() => {
                let Some(msg) = msg else { break };
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<TimerCommand>(&text) {
                            Ok(command) => {
                                if let Err(e) = command_tx.send(command) {
                                    eprintln!("Failed to forward command: {}", e);
                                }

                                let response = WebSocketResponse {
                                    success: true,
                                    message: Some("Command received".to_string()),
                                };

                                if let Ok(response_json) = serde_json::to_string(&response) {
                                    if let Err(e) = ws_sender.send(Message::Text(response_json)).await {
                                        eprintln!("Failed to send WebSocket response: {}", e);
                                        break;
                                    }
                                }
                            }
                            Err(e) => {
                                eprintln!("Failed to parse command frame: {}", e);
                                let response = WebSocketResponse {
                                    success: false,
                                    message: Some(format!("Parse error: {}", e)),
                                };
                                if let Ok(response_json) = serde_json::to_string(&response) {
                                    let _ = ws_sender.send(Message::Text(response_json)).await;
                                }
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        println!("WebSocket connection closed by {}", peer_addr);
                        break;
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = ws_sender.send(Message::Pong(data)).await {
                            eprintln!("Failed to send pong: {}", e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        eprintln!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                }
            }
            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if let Ok(event_json) = serde_json::to_string(&event) {
                            if let Err(e) = ws_sender.send(Message::Text(event_json)).await {
                                eprintln!("Failed to push event to {}: {}", peer_addr, e);
                                break;
                            }
                        }
                    }
                    // A slow client skips missed states and catches up
                    // on the next one.
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    println!("WebSocket connection with {} terminated", peer_addr);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_frames_deserialize() {
        let cmd: TimerCommand = serde_json::from_str(r#"{"cmd":"start"}"#).unwrap();
        assert!(matches!(cmd, TimerCommand::Start));

        let cmd: TimerCommand =
            serde_json::from_str(r#"{"cmd":"select_duration","phase":"break","minutes":15}"#)
                .unwrap();
        assert!(matches!(
            cmd,
            TimerCommand::SelectDuration {
                phase: Phase::Break,
                minutes: 15
            }
        ));

        let cmd: TimerCommand =
            serde_json::from_str(r#"{"cmd":"custom_duration","phase":"work","value":"90"}"#)
                .unwrap();
        match cmd {
            TimerCommand::CustomDuration { phase, value } => {
                assert_eq!(phase, Phase::Work);
                assert_eq!(value, "90");
            }
            other => panic!("unexpected command: {:?}", other),
        }

        assert!(serde_json::from_str::<TimerCommand>(r#"{"cmd":"explode"}"#).is_err());
        assert!(serde_json::from_str::<TimerCommand>("not json").is_err());
    }

    #[test]
    fn test_response_serialization() {
        let response = WebSocketResponse {
            success: true,
            message: Some("Command received".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"message\":\"Command received\""));
    }

    #[test]
    fn test_event_serialization_tags() {
        let event = StateEvent::State {
            minutes_text: "24".to_string(),
            seconds_text: "59".to_string(),
            status_text: "Focusing".to_string(),
            phase: Phase::Work,
            running: true,
            completed_cycles: 2,
            clock: "14:05".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"state\""));
        assert!(json.contains("\"phase\":\"work\""));
        assert!(json.contains("\"completed_cycles\":2"));
        assert!(json.contains("\"clock\":\"14:05\""));

        let event = StateEvent::Error {
            message: "work duration must be 1-120 minutes, got 121".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"error\""));
    }
}
