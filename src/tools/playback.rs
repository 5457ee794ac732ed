use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use super::{client_error, text_result};
use super::params::{PlayMediaParams, PlaybackCommand, PlaybackParams};
use crate::connection::ConnectionManager;
use crate::model::QueueOption;

pub(super) async fn handle_playback(
    connection: &ConnectionManager,
    params: PlaybackParams,
) -> Result<CallToolResult, McpError> {
    if params.seek_seconds.is_some() && params.command != PlaybackCommand::Play {
        return text_result(
            "Error: seek_seconds is only valid with the 'play' command".to_string(),
        );
    }

    let queue_id = params.queue_id.as_str();

    match params.command {
        PlaybackCommand::Play => {
            if let Some(position) = params.seek_seconds {
                connection
                    .with_reconnect(move |api| async move { api.seek(queue_id, position).await })
                    .await
                    .map_err(client_error)?;
                return text_result(format!("Seeked to {position}s and playing on {queue_id}"));
            }
            connection
                .with_reconnect(move |api| async move { api.play(queue_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Playing on {queue_id}"))
        }
        PlaybackCommand::Pause => {
            connection
                .with_reconnect(move |api| async move { api.pause(queue_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Paused {queue_id}"))
        }
        PlaybackCommand::Stop => {
            connection
                .with_reconnect(move |api| async move { api.stop(queue_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Stopped {queue_id}"))
        }
        PlaybackCommand::Toggle => {
            connection
                .with_reconnect(move |api| async move { api.play_pause(queue_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Toggled play/pause on {queue_id}"))
        }
        PlaybackCommand::Next => {
            connection
                .with_reconnect(move |api| async move { api.next(queue_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Skipped to next track on {queue_id}"))
        }
        PlaybackCommand::Previous => {
            connection
                .with_reconnect(move |api| async move { api.previous(queue_id).await })
                .await
                .map_err(client_error)?;
            text_result(format!("Went to previous track on {queue_id}"))
        }
    }
}

pub(super) async fn handle_play_media(
    connection: &ConnectionManager,
    params: PlayMediaParams,
) -> Result<CallToolResult, McpError> {
    let media = params.media.into_vec();
    if media.is_empty() {
        return text_result("Error: Provide at least one media URI".to_string());
    }

    let queue_id = params.queue_id.as_str();
    let option = params.option.unwrap_or_default();
    let radio_mode = params.radio_mode.unwrap_or(false);
    let media = media.as_slice();

    connection
        .with_reconnect(move |api| async move {
            api.play_media(queue_id, media, option, radio_mode).await
        })
        .await
        .map_err(client_error)?;

    let action = match option {
        QueueOption::Play => "Playing",
        QueueOption::Replace => "Replaced queue with",
        QueueOption::Next => "Added as next",
        QueueOption::Add => "Added to queue",
    };
    let radio_note = if radio_mode { " (radio mode enabled)" } else { "" };
    text_result(format!(
        "{action} {} item(s) on {queue_id}{radio_note}",
        media.len()
    ))
}
