use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use super::{client_error, text_result};
use super::params::{QueueItemAction, QueueItemParams, QueueParams, TransferQueueParams};
use crate::client::MusicApi;
use crate::connection::ConnectionManager;
use crate::error::ClientError;

/// How many queue entries a single `ma_queue` response renders before
/// falling back to a "... and N more" trailer.
const QUEUE_RENDER_LIMIT: u64 = 20;

pub(super) async fn handle_queue(
    connection: &ConnectionManager,
    params: QueueParams,
) -> Result<CallToolResult, McpError> {
    let queue_id = params.queue_id.as_str();
    let clear = params.clear.unwrap_or(false);
    let get_items = params.get_items.unwrap_or(true);

    // Settings changes are applied before any read so the rendered state
    // reflects them.
    let mut changes = Vec::new();

    if let Some(shuffle) = params.shuffle {
        connection
            .with_reconnect(move |api| async move { api.set_shuffle(queue_id, shuffle).await })
            .await
            .map_err(client_error)?;
        changes.push(format!(
            "Shuffle {}",
            if shuffle { "enabled" } else { "disabled" }
        ));
    }

    if let Some(repeat) = params.repeat {
        connection
            .with_reconnect(move |api| async move { api.set_repeat(queue_id, repeat).await })
            .await
            .map_err(client_error)?;
        changes.push(format!("Repeat set to '{repeat}'"));
    }

    if clear {
        connection
            .with_reconnect(move |api| async move { api.clear_queue(queue_id).await })
            .await
            .map_err(client_error)?;
        changes.push("Queue cleared".to_string());
    }

    if get_items && !clear {
        let state = connection
            .with_reconnect(move |api| async move { format_queue_state(&*api, queue_id).await })
            .await
            .map_err(client_error)?;
        if changes.is_empty() {
            return text_result(state);
        }
        return text_result(format!(
            "**Changes applied:** {}\n\n{state}",
            changes.join(", ")
        ));
    }

    if changes.is_empty() {
        return text_result("No changes made and get_items=false".to_string());
    }
    text_result(format!("Changes applied: {}", changes.join(", ")))
}

/// Render settings, current item and contents of one queue.
///
/// The queue snapshot's `items` field is a count; the actual entries come
/// from a second bounded fetch, skipped entirely when the count is zero.
pub(super) async fn format_queue_state(
    api: &dyn MusicApi,
    queue_id: &str,
) -> Result<String, ClientError> {
    let queues = api.get_queues().await?;
    let Some(queue) = queues.iter().find(|q| q.queue_id == queue_id) else {
        return Ok(format!(
            "Queue not found: {queue_id}. Use ma_list_players to find valid IDs."
        ));
    };

    let mut lines = vec![format!("# Queue: {queue_id}\n")];

    lines.push(format!(
        "**Settings:** Shuffle: {} | Repeat: {}\n",
        if queue.shuffle_enabled { "on" } else { "off" },
        queue.repeat_mode
    ));

    if let Some(current) = &queue.current_item {
        let artist = current
            .media_item
            .as_ref()
            .and_then(|m| m.artists.first())
            .map(|a| format!(" by {}", a.name))
            .unwrap_or_default();
        lines.push(format!("**Now Playing:** {}{artist}\n", current.name));
    }

    if queue.items > 0 {
        let entries = api
            .get_queue_items(queue_id, QUEUE_RENDER_LIMIT as u32, 0)
            .await?;
        if entries.is_empty() {
            lines.push("Queue is empty".to_string());
        } else {
            lines.push("**Queue:**".to_string());
            for (i, entry) in entries.iter().enumerate() {
                lines.push(format!(
                    "{}. {} (`{}`)",
                    i + 1,
                    entry.name,
                    entry.queue_item_id
                ));
            }
            if queue.items > QUEUE_RENDER_LIMIT {
                lines.push(format!(
                    "... and {} more items",
                    queue.items - QUEUE_RENDER_LIMIT
                ));
            }
        }
    } else {
        lines.push("Queue is empty".to_string());
    }

    Ok(lines.join("\n"))
}

pub(super) async fn handle_queue_item(
    connection: &ConnectionManager,
    params: QueueItemParams,
) -> Result<CallToolResult, McpError> {
    let queue_id = params.queue_id.as_str();
    let item_id = params.item_id.as_str();

    match params.action {
        QueueItemAction::MoveUp => {
            connection
                .with_reconnect(move |api| async move {
                    api.move_item_up(queue_id, item_id).await
                })
                .await
                .map_err(client_error)?;
            text_result(format!("Moved item {item_id} up in queue"))
        }
        QueueItemAction::MoveDown => {
            connection
                .with_reconnect(move |api| async move {
                    api.move_item_down(queue_id, item_id).await
                })
                .await
                .map_err(client_error)?;
            text_result(format!("Moved item {item_id} down in queue"))
        }
        QueueItemAction::MoveNext => {
            connection
                .with_reconnect(move |api| async move {
                    api.move_item_next(queue_id, item_id).await
                })
                .await
                .map_err(client_error)?;
            text_result(format!("Moved item {item_id} to play next"))
        }
        QueueItemAction::Remove => {
            connection
                .with_reconnect(move |api| async move { api.delete_item(queue_id, item_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Removed item {item_id} from queue"))
        }
    }
}

pub(super) async fn handle_transfer_queue(
    connection: &ConnectionManager,
    params: TransferQueueParams,
) -> Result<CallToolResult, McpError> {
    let source = params.source_queue_id.as_str();
    let target = params.target_queue_id.as_str();

    connection
        .with_reconnect(move |api| async move { api.transfer_queue(source, target).await })
        .await
        .map_err(client_error)?;

    text_result(format!("Transferred queue from {source} to {target}"))
}
