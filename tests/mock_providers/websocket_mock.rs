//! WebSocket mock server for the read-aloud synthesis protocol.
//!
//! Speaks the same wire protocol as the hosted endpoint: expects a
//! `speech.config` text frame followed by an `ssml` text frame, then streams
//! binary frames framed as `<headers>Path:audio\r\n<payload>` and finishes
//! with a `turn.end` text frame. The audio payload echoes the text extracted
//! from the SSML request, so tests can observe content and ordering of the
//! assembled audio.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{
    ErrorResponse, Request, Response,
};

/// Shaping and fault injection for the mock synthesis server.
#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// Number of binary frames the payload is split across.
    pub frames_per_request: usize,
    /// Emit the frame at this index without the audio separator.
    pub malformed_frame: Option<usize>,
    /// Close the stream after the audio frames instead of sending turn.end.
    pub drop_before_turn_end: bool,
    /// Accept the request but never respond.
    pub stall: bool,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            frames_per_request: 2,
            malformed_frame: None,
            drop_before_turn_end: false,
            stall: false,
        }
    }
}

/// Observable server-side state, shared with the test.
pub struct MockServerState {
    pub behavior: MockBehavior,
    /// Total connections accepted.
    pub connections: AtomicU64,
    /// Query string of the most recent connection.
    pub last_query: Mutex<Option<String>>,
    /// Whether a speech.config frame arrived before the ssml frame.
    pub config_seen_first: Mutex<Option<bool>>,
}

impl MockServerState {
    fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            connections: AtomicU64::new(0),
            last_query: Mutex::new(None),
            config_seen_first: Mutex::new(None),
        }
    }
}

/// Pulls the synthesis text back out of an SSML message.
fn extract_ssml_text(message: &str) -> Option<&str> {
    let start = message.find("volume='+0%'>")? + "volume='+0%'>".len();
    let end = message.find("</prosody>")?;
    message.get(start..end)
}

/// Pulls the request id out of the SSML message headers.
fn extract_request_id(message: &str) -> &str {
    message
        .lines()
        .find_map(|line| line.strip_prefix("X-RequestId:"))
        .unwrap_or("unknown")
}

/// Handle a single synthesis connection.
async fn handle_connection(
    stream: TcpStream,
    state: Arc<MockServerState>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let state_for_headers = state.clone();
    let ws_stream = accept_hdr_async(
        stream,
        move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            *state_for_headers.last_query.lock().unwrap() =
                request.uri().query().map(str::to_string);
            Ok(response)
        },
    )
    .await?;

    state.connections.fetch_add(1, Ordering::SeqCst);
    let (mut write, mut read) = ws_stream.split();

    let mut config_received = false;

    while let Some(msg) = read.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if text.contains("Path:speech.config") {
                    config_received = true;
                    continue;
                }

                if text.contains("Path:ssml") {
                    *state.config_seen_first.lock().unwrap() = Some(config_received);

                    if state.behavior.stall {
                        continue;
                    }

                    let request_id = extract_request_id(&text).to_string();
                    let payload = extract_ssml_text(&text).unwrap_or("").as_bytes().to_vec();

                    // Split the payload across the configured number of frames
                    let frame_count = state.behavior.frames_per_request.max(1);
                    let part_size = payload.len().div_ceil(frame_count).max(1);

                    for (index, part) in payload.chunks(part_size).enumerate() {
                        let mut frame = Vec::new();
                        if state.behavior.malformed_frame == Some(index) {
                            // header only, no audio separator
                            frame.extend_from_slice(
                                format!("X-RequestId:{request_id}\r\nContent-Type:audio/mpeg\r\n\r\n")
                                    .as_bytes(),
                            );
                        } else {
                            frame.extend_from_slice(
                                format!("X-RequestId:{request_id}\r\nContent-Type:audio/mpeg\r\nPath:audio\r\n")
                                    .as_bytes(),
                            );
                        }
                        frame.extend_from_slice(part);
                        write.send(Message::Binary(frame.into())).await?;
                    }

                    if state.behavior.drop_before_turn_end {
                        write.send(Message::Close(None)).await?;
                        break;
                    }

                    let turn_end = format!(
                        "X-RequestId:{request_id}\r\nContent-Type:application/json; charset=utf-8\r\nPath:turn.end\r\n\r\n{{}}"
                    );
                    write.send(Message::Text(turn_end.into())).await?;
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(data)) => {
                write.send(Message::Pong(data)).await?;
            }
            Err(_) => break,
            _ => {}
        }
    }

    Ok(())
}

/// Starts the mock server on an ephemeral port.
///
/// Returns the `ws://` endpoint URL, the shared observable state, and the
/// accept-loop task handle.
pub async fn spawn_synthesis_mock(
    behavior: MockBehavior,
) -> (String, Arc<MockServerState>, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server");
    let addr = listener.local_addr().expect("mock server address");
    let state = Arc::new(MockServerState::new(behavior));

    let accept_state = state.clone();
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let state = accept_state.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, state).await {
                            eprintln!("mock connection error: {e}");
                        }
                    });
                }
                Err(e) => {
                    eprintln!("mock accept error: {e}");
                    break;
                }
            }
        }
    });

    (format!("ws://{addr}"), state, handle)
}
