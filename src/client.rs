use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};
use url::Url;

use crate::error::ClientError;
use crate::model::{
    BrowseItem, MediaType, Player, PlayerQueue, QueueItem, QueueOption, RepeatMode, SearchResults,
};

/// The Music Assistant operations consumed by the tool handlers.
///
/// `MusicClient` is the production implementation; tests substitute a
/// scripted mock behind the same trait.
#[async_trait]
pub trait MusicApi: Send + Sync {
    /// Cheap local liveness flag. Never a round trip.
    fn is_connected(&self) -> bool;

    /// Close the session. Idempotent; errors are swallowed.
    async fn disconnect(&self);

    /// Warm up player and queue state after a fresh connect.
    async fn fetch_state(&self) -> Result<(), ClientError>;

    async fn get_players(&self) -> Result<Vec<Player>, ClientError>;
    async fn get_queues(&self) -> Result<Vec<PlayerQueue>, ClientError>;

    async fn volume_set(&self, player_id: &str, level: u8) -> Result<(), ClientError>;
    async fn volume_up(&self, player_id: &str) -> Result<(), ClientError>;
    async fn volume_down(&self, player_id: &str) -> Result<(), ClientError>;
    async fn volume_mute(&self, player_id: &str, muted: bool) -> Result<(), ClientError>;

    async fn group(&self, player_id: &str, target_player: &str) -> Result<(), ClientError>;
    async fn group_many(
        &self,
        target_player: &str,
        child_player_ids: &[String],
    ) -> Result<(), ClientError>;
    async fn ungroup(&self, player_id: &str) -> Result<(), ClientError>;
    async fn ungroup_many(&self, player_ids: &[String]) -> Result<(), ClientError>;

    async fn play(&self, queue_id: &str) -> Result<(), ClientError>;
    async fn pause(&self, queue_id: &str) -> Result<(), ClientError>;
    async fn stop(&self, queue_id: &str) -> Result<(), ClientError>;
    async fn play_pause(&self, queue_id: &str) -> Result<(), ClientError>;
    async fn next(&self, queue_id: &str) -> Result<(), ClientError>;
    async fn previous(&self, queue_id: &str) -> Result<(), ClientError>;
    async fn seek(&self, queue_id: &str, position: u64) -> Result<(), ClientError>;

    async fn play_media(
        &self,
        queue_id: &str,
        media: &[String],
        option: QueueOption,
        radio_mode: bool,
    ) -> Result<(), ClientError>;

    async fn set_shuffle(&self, queue_id: &str, enabled: bool) -> Result<(), ClientError>;
    async fn set_repeat(&self, queue_id: &str, mode: RepeatMode) -> Result<(), ClientError>;
    async fn clear_queue(&self, queue_id: &str) -> Result<(), ClientError>;

    async fn move_item_up(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError>;
    async fn move_item_down(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError>;
    async fn move_item_next(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError>;
    async fn delete_item(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError>;

    async fn transfer_queue(
        &self,
        source_queue_id: &str,
        target_queue_id: &str,
    ) -> Result<(), ClientError>;

    async fn search(
        &self,
        query: &str,
        media_types: &[MediaType],
        limit: u32,
    ) -> Result<SearchResults, ClientError>;

    async fn browse(&self, path: Option<&str>) -> Result<Vec<BrowseItem>, ClientError>;

    async fn get_queue_items(
        &self,
        queue_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<QueueItem>, ClientError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = HashMap<u64, oneshot::Sender<Result<Value, ClientError>>>;

/// A frame received from the server. Command results carry `message_id` plus
/// either `result` or `error_code`/`details`; frames without a `message_id`
/// are the initial server-info greeting or unsolicited events.
#[derive(Debug, Deserialize)]
struct IncomingMessage {
    message_id: Option<u64>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    server_version: Option<String>,
    #[serde(default)]
    event: Option<String>,
}

/// WebSocket session with a Music Assistant server.
///
/// Outgoing commands are JSON frames tagged with a monotonically increasing
/// `message_id`; a background reader task routes each response to the oneshot
/// channel registered for that id. When the stream ends, every in-flight
/// request fails with `ConnectionClosed` and the liveness flag drops.
pub struct MusicClient {
    connected: Arc<AtomicBool>,
    next_id: AtomicU64,
    pending: Arc<Mutex<PendingMap>>,
    sink: tokio::sync::Mutex<SplitSink<WsStream, Message>>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl MusicClient {
    /// Connect to the server's `/ws` endpoint, read the server-info greeting
    /// and authenticate when a token is supplied.
    pub async fn connect(
        server_url: &str,
        token: Option<&str>,
    ) -> Result<Arc<Self>, ClientError> {
        let ws_url = websocket_url(server_url)?;
        debug!(url = %ws_url, "connecting to Music Assistant");

        let (stream, _response) = connect_async(ws_url.as_str())
            .await
            .map_err(|e| ClientError::Connection(format!("WebSocket handshake failed: {e}")))?;
        let (sink, mut rx) = stream.split();

        // The server greets with an info frame before accepting commands.
        let greeting = read_text_frame(&mut rx).await?;
        match serde_json::from_str::<IncomingMessage>(&greeting) {
            Ok(info) => {
                debug!(
                    server_version = info.server_version.as_deref().unwrap_or("unknown"),
                    "received server info"
                );
            }
            Err(e) => {
                return Err(ClientError::Protocol(format!(
                    "malformed server info frame: {e}"
                )))
            }
        }

        let connected = Arc::new(AtomicBool::new(true));
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));
        let client = Arc::new(Self {
            connected: connected.clone(),
            next_id: AtomicU64::new(1),
            pending: pending.clone(),
            sink: tokio::sync::Mutex::new(sink),
            reader: Mutex::new(None),
        });

        let handle = tokio::spawn(read_loop(rx, pending, connected));
        *lock_ignoring_poison(&client.reader) = Some(handle);

        if let Some(token) = token {
            if let Err(e) = client.request("auth", json!({ "token": token })).await {
                client.disconnect().await;
                return Err(ClientError::Connection(format!("authentication failed: {e}")));
            }
        }

        Ok(client)
    }

    /// Send one command frame and wait for its correlated response.
    async fn request(&self, command: &str, args: Value) -> Result<Value, ClientError> {
        if !self.is_connected() {
            return Err(ClientError::ConnectionClosed);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        lock_ignoring_poison(&self.pending).insert(id, tx);

        let mut frame = serde_json::Map::new();
        frame.insert("message_id".into(), json!(id));
        frame.insert("command".into(), json!(command));
        if let Value::Object(args) = args {
            frame.extend(args);
        }
        let text = Value::Object(frame).to_string();
        trace!(command, message_id = id, "sending command");

        let send_result = self.sink.lock().await.send(Message::Text(text)).await;
        if let Err(e) = send_result {
            self.connected.store(false, Ordering::SeqCst);
            lock_ignoring_poison(&self.pending).remove(&id);
            return Err(ClientError::Connection(format!("send failed: {e}")));
        }

        rx.await.map_err(|_| ClientError::ConnectionClosed)?
    }

    async fn command(&self, command: &str, args: Value) -> Result<(), ClientError> {
        self.request(command, args).await.map(|_| ())
    }

    async fn typed_request<T: DeserializeOwned>(
        &self,
        command: &str,
        args: Value,
    ) -> Result<T, ClientError> {
        let value = self.request(command, args).await?;
        serde_json::from_value(value)
            .map_err(|e| ClientError::Protocol(format!("unexpected {command} response: {e}")))
    }
}

#[async_trait]
impl MusicApi for MusicClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        // Best effort: the peer may already be gone.
        let _ = self.sink.lock().await.send(Message::Close(None)).await;
        if let Some(handle) = lock_ignoring_poison(&self.reader).take() {
            handle.abort();
        }
        fail_all_pending(&self.pending);
    }

    async fn fetch_state(&self) -> Result<(), ClientError> {
        self.get_players().await?;
        self.get_queues().await?;
        Ok(())
    }

    async fn get_players(&self) -> Result<Vec<Player>, ClientError> {
        self.typed_request("players/all", json!({})).await
    }

    async fn get_queues(&self) -> Result<Vec<PlayerQueue>, ClientError> {
        self.typed_request("player_queues/all", json!({})).await
    }

    async fn volume_set(&self, player_id: &str, level: u8) -> Result<(), ClientError> {
        self.command(
            "players/cmd/volume_set",
            json!({ "player_id": player_id, "volume_level": level }),
        )
        .await
    }

    async fn volume_up(&self, player_id: &str) -> Result<(), ClientError> {
        self.command("players/cmd/volume_up", json!({ "player_id": player_id }))
            .await
    }

    async fn volume_down(&self, player_id: &str) -> Result<(), ClientError> {
        self.command("players/cmd/volume_down", json!({ "player_id": player_id }))
            .await
    }

    async fn volume_mute(&self, player_id: &str, muted: bool) -> Result<(), ClientError> {
        self.command(
            "players/cmd/volume_mute",
            json!({ "player_id": player_id, "muted": muted }),
        )
        .await
    }

    async fn group(&self, player_id: &str, target_player: &str) -> Result<(), ClientError> {
        self.command(
            "players/cmd/group",
            json!({ "player_id": player_id, "target_player": target_player }),
        )
        .await
    }

    async fn group_many(
        &self,
        target_player: &str,
        child_player_ids: &[String],
    ) -> Result<(), ClientError> {
        self.command(
            "players/cmd/group_many",
            json!({ "target_player": target_player, "child_player_ids": child_player_ids }),
        )
        .await
    }

    async fn ungroup(&self, player_id: &str) -> Result<(), ClientError> {
        self.command("players/cmd/ungroup", json!({ "player_id": player_id }))
            .await
    }

    async fn ungroup_many(&self, player_ids: &[String]) -> Result<(), ClientError> {
        self.command("players/cmd/ungroup_many", json!({ "player_ids": player_ids }))
            .await
    }

    async fn play(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/play", json!({ "queue_id": queue_id }))
            .await
    }

    async fn pause(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/pause", json!({ "queue_id": queue_id }))
            .await
    }

    async fn stop(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/stop", json!({ "queue_id": queue_id }))
            .await
    }

    async fn play_pause(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/play_pause", json!({ "queue_id": queue_id }))
            .await
    }

    async fn next(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/next", json!({ "queue_id": queue_id }))
            .await
    }

    async fn previous(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/previous", json!({ "queue_id": queue_id }))
            .await
    }

    async fn seek(&self, queue_id: &str, position: u64) -> Result<(), ClientError> {
        self.command(
            "player_queues/seek",
            json!({ "queue_id": queue_id, "position": position }),
        )
        .await
    }

    async fn play_media(
        &self,
        queue_id: &str,
        media: &[String],
        option: QueueOption,
        radio_mode: bool,
    ) -> Result<(), ClientError> {
        self.command(
            "player_queues/play_media",
            json!({
                "queue_id": queue_id,
                "media": media,
                "option": option,
                "radio_mode": radio_mode,
            }),
        )
        .await
    }

    async fn set_shuffle(&self, queue_id: &str, enabled: bool) -> Result<(), ClientError> {
        self.command(
            "player_queues/shuffle",
            json!({ "queue_id": queue_id, "shuffle_enabled": enabled }),
        )
        .await
    }

    async fn set_repeat(&self, queue_id: &str, mode: RepeatMode) -> Result<(), ClientError> {
        self.command(
            "player_queues/repeat",
            json!({ "queue_id": queue_id, "repeat_mode": mode }),
        )
        .await
    }

    async fn clear_queue(&self, queue_id: &str) -> Result<(), ClientError> {
        self.command("player_queues/clear", json!({ "queue_id": queue_id }))
            .await
    }

    async fn move_item_up(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.command(
            "player_queues/move_item",
            json!({ "queue_id": queue_id, "queue_item_id": item_id, "pos_shift": -1 }),
        )
        .await
    }

    async fn move_item_down(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.command(
            "player_queues/move_item",
            json!({ "queue_id": queue_id, "queue_item_id": item_id, "pos_shift": 1 }),
        )
        .await
    }

    async fn move_item_next(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.command(
            "player_queues/move_item",
            json!({ "queue_id": queue_id, "queue_item_id": item_id, "pos_shift": 0 }),
        )
        .await
    }

    async fn delete_item(&self, queue_id: &str, item_id: &str) -> Result<(), ClientError> {
        self.command(
            "player_queues/delete_item",
            json!({ "queue_id": queue_id, "item_id_or_index": item_id }),
        )
        .await
    }

    async fn transfer_queue(
        &self,
        source_queue_id: &str,
        target_queue_id: &str,
    ) -> Result<(), ClientError> {
        self.command(
            "player_queues/transfer",
            json!({
                "source_queue_id": source_queue_id,
                "target_queue_id": target_queue_id,
            }),
        )
        .await
    }

    async fn search(
        &self,
        query: &str,
        media_types: &[MediaType],
        limit: u32,
    ) -> Result<SearchResults, ClientError> {
        self.typed_request(
            "music/search",
            json!({
                "search_query": query,
                "media_types": media_types,
                "limit": limit,
            }),
        )
        .await
    }

    async fn browse(&self, path: Option<&str>) -> Result<Vec<BrowseItem>, ClientError> {
        self.typed_request("music/browse", json!({ "path": path })).await
    }

    async fn get_queue_items(
        &self,
        queue_id: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<QueueItem>, ClientError> {
        self.typed_request(
            "player_queues/items",
            json!({ "queue_id": queue_id, "limit": limit, "offset": offset }),
        )
        .await
    }
}

/// Derive the WebSocket endpoint from the configured server URL:
/// `http(s)` becomes `ws(s)` and `/ws` is appended to the path.
fn websocket_url(server_url: &str) -> Result<Url, ClientError> {
    let mut url = Url::parse(server_url)
        .map_err(|e| ClientError::Config(format!("invalid server URL '{server_url}': {e}")))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ClientError::Config(format!(
                "unsupported URL scheme '{other}' (expected http, https, ws or wss)"
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ClientError::Config(format!("cannot rewrite scheme of '{server_url}'")))?;
    let path = url.path().trim_end_matches('/').to_string();
    if !path.ends_with("/ws") {
        url.set_path(&format!("{path}/ws"));
    }
    Ok(url)
}

async fn read_text_frame(rx: &mut SplitStream<WsStream>) -> Result<String, ClientError> {
    loop {
        let frame = rx
            .next()
            .await
            .ok_or(ClientError::ConnectionClosed)?
            .map_err(|e| ClientError::Connection(format!("read failed: {e}")))?;
        match frame {
            Message::Text(text) => return Ok(text),
            Message::Close(_) => return Err(ClientError::ConnectionClosed),
            // Control frames are handled by tungstenite itself.
            _ => continue,
        }
    }
}

async fn read_loop(
    mut rx: SplitStream<WsStream>,
    pending: Arc<Mutex<PendingMap>>,
    connected: Arc<AtomicBool>,
) {
    while let Some(frame) = rx.next().await {
        match frame {
            Ok(Message::Text(text)) => dispatch_frame(&text, &pending),
            Ok(Message::Close(_)) => {
                debug!("server closed the connection");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket read error");
                break;
            }
        }
    }
    connected.store(false, Ordering::SeqCst);
    fail_all_pending(&pending);
}

fn dispatch_frame(text: &str, pending: &Arc<Mutex<PendingMap>>) {
    let message: IncomingMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "discarding malformed frame");
            return;
        }
    };

    let Some(id) = message.message_id else {
        if let Some(event) = message.event {
            trace!(event, "ignoring server event");
        }
        return;
    };

    let Some(tx) = lock_ignoring_poison(pending).remove(&id) else {
        trace!(message_id = id, "response for unknown message id");
        return;
    };

    let outcome = match message.error_code {
        Some(code) => Err(ClientError::Remote {
            code,
            message: message.details.unwrap_or_default(),
        }),
        None => Ok(message.result.unwrap_or(Value::Null)),
    };
    // The requester may have gone away; that's fine.
    let _ = tx.send(outcome);
}

fn fail_all_pending(pending: &Arc<Mutex<PendingMap>>) {
    for (_, tx) in lock_ignoring_poison(pending).drain() {
        let _ = tx.send(Err(ClientError::ConnectionClosed));
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
