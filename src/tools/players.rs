use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use super::{client_error, text_result};
use super::params::{GroupAction, GroupParams, VolumeAdjust, VolumeParams};
use crate::connection::ConnectionManager;
use crate::model::Player;

pub(super) async fn handle_list_players(
    connection: &ConnectionManager,
) -> Result<CallToolResult, McpError> {
    let players = connection
        .with_reconnect(|api| async move { api.get_players().await })
        .await
        .map_err(client_error)?;

    if players.is_empty() {
        return text_result(
            "No players found. Ensure Music Assistant has player providers configured."
                .to_string(),
        );
    }

    text_result(format_players(&players))
}

/// Render the full player snapshot, one block per player. Fields absent on a
/// player are omitted from its status line.
fn format_players(players: &[Player]) -> String {
    let mut lines = vec!["# Available Players\n".to_string()];

    for player in players {
        let mut status = Vec::new();

        if let Some(level) = player.volume_level {
            status.push(format!("Volume: {level}%"));
        }
        if player.volume_muted == Some(true) {
            status.push("(muted)".to_string());
        }

        // An active source equal to the player's own id means Music Assistant
        // itself is the source; only external sources are worth showing.
        if let Some(source) = &player.active_source {
            if source != &player.player_id {
                let name = player
                    .source_list
                    .iter()
                    .find(|s| &s.id == source)
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| source.clone());
                status.push(format!("Source: {name}"));
            }
        }

        if !player.group_childs.is_empty() {
            status.push(format!(
                "Group leader with {} members",
                player.group_childs.len()
            ));
        } else if let Some(leader) = &player.synced_to {
            status.push(format!("Synced to: {leader}"));
        }

        if let Some(state) = player.state {
            status.push(format!("State: {state}"));
        }

        let status = if status.is_empty() {
            "No status".to_string()
        } else {
            status.join(" | ")
        };
        lines.push(format!("- **{}** (`{}`)", player.name, player.player_id));
        lines.push(format!("  {status}\n"));
    }

    lines.join("\n")
}

pub(super) async fn handle_volume(
    connection: &ConnectionManager,
    params: VolumeParams,
) -> Result<CallToolResult, McpError> {
    let options_provided = [
        params.level.is_some(),
        params.adjust.is_some(),
        params.mute.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();

    if options_provided == 0 {
        return text_result(
            "Error: Provide one of: level (0-100), adjust ('up'/'down'), or mute (true/false)"
                .to_string(),
        );
    }
    if options_provided > 1 {
        return text_result("Error: Provide only one of: level, adjust, or mute".to_string());
    }

    let player_id = params.player_id.as_str();

    if let Some(level) = params.level {
        if level > 100 {
            return text_result(format!("Error: level must be 0-100, got {level}"));
        }
        connection
            .with_reconnect(move |api| async move { api.volume_set(player_id, level).await })
            .await
            .map_err(client_error)?;
        return text_result(format!("Volume set to {level}% on {player_id}"));
    }

    if let Some(adjust) = params.adjust {
        match adjust {
            VolumeAdjust::Up => {
                connection
                    .with_reconnect(move |api| async move { api.volume_up(player_id).await })
                    .await
                    .map_err(client_error)?;
                return text_result(format!("Volume increased on {player_id}"));
            }
            VolumeAdjust::Down => {
                connection
                    .with_reconnect(move |api| async move { api.volume_down(player_id).await })
                    .await
                    .map_err(client_error)?;
                return text_result(format!("Volume decreased on {player_id}"));
            }
        }
    }

    if let Some(mute) = params.mute {
        connection
            .with_reconnect(move |api| async move { api.volume_mute(player_id, mute).await })
            .await
            .map_err(client_error)?;
        let state = if mute { "muted" } else { "unmuted" };
        return text_result(format!("Player {player_id} {state}"));
    }

    text_result("Error: No action specified".to_string())
}

pub(super) async fn handle_group(
    connection: &ConnectionManager,
    params: GroupParams,
) -> Result<CallToolResult, McpError> {
    if params.player_ids.is_empty() {
        return text_result("Error: Provide at least one player ID".to_string());
    }

    let player_ids = params.player_ids.as_slice();
    let player_list = player_ids.join(", ");

    match params.action {
        GroupAction::Join => {
            let Some(target) = params.target_player_id.as_deref() else {
                return text_result(
                    "Error: target_player_id is required when joining a group".to_string(),
                );
            };

            // A single follower uses the pair form, several use the batch
            // form; both are equivalent in effect.
            if let [follower] = player_ids {
                let follower = follower.as_str();
                connection
                    .with_reconnect(move |api| async move { api.group(follower, target).await })
                    .await
                    .map_err(client_error)?;
            } else {
                connection
                    .with_reconnect(move |api| async move {
                        api.group_many(target, player_ids).await
                    })
                    .await
                    .map_err(client_error)?;
            }

            text_result(format!(
                "Players [{player_list}] joined to group led by {target}"
            ))
        }
        GroupAction::Leave => {
            if let [player] = player_ids {
                let player = player.as_str();
                connection
                    .with_reconnect(move |api| async move { api.ungroup(player).await })
                    .await
                    .map_err(client_error)?;
            } else {
                connection
                    .with_reconnect(move |api| async move { api.ungroup_many(player_ids).await })
                    .await
                    .map_err(client_error)?;
            }

            text_result(format!("Players [{player_list}] removed from their groups"))
        }
    }
}
