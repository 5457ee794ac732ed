use schemars::JsonSchema;
use serde::Deserialize;

use crate::model::{MediaType, QueueOption, RepeatMode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VolumeAdjust {
    Up,
    Down,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct VolumeParams {
    #[schemars(description = "The player ID to control (use ma_list_players to find IDs)")]
    pub player_id: String,
    #[schemars(
        description = "Set volume to this level (0-100). Omit to use adjust or mute instead."
    )]
    pub level: Option<u8>,
    #[schemars(
        description = "Adjust volume up or down by a step. Omit to use level or mute instead."
    )]
    pub adjust: Option<VolumeAdjust>,
    #[schemars(
        description = "Set mute state. True to mute, false to unmute. Omit to use level or adjust instead."
    )]
    pub mute: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum GroupAction {
    Join,
    Leave,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GroupParams {
    #[schemars(description = "'join' to add players to a group, 'leave' to remove from groups")]
    pub action: GroupAction,
    #[schemars(description = "List of player IDs to group/ungroup")]
    pub player_ids: Vec<String>,
    #[schemars(
        description = "For 'join': the leader player to sync to. Required for join action."
    )]
    pub target_player_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackCommand {
    Play,
    Pause,
    Stop,
    Toggle,
    Next,
    Previous,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlaybackParams {
    #[schemars(description = "The queue/player ID to control (typically same as player_id)")]
    pub queue_id: String,
    #[schemars(
        description = "Playback command: play, pause, stop, toggle (play/pause), next, previous"
    )]
    pub command: PlaybackCommand,
    #[schemars(
        description = "Seek to this position in seconds (only valid with the 'play' command)"
    )]
    pub seek_seconds: Option<u64>,
}

/// Media URIs accepted either as a single string or as an ordered list. Both
/// forms normalize to one sequence before submission.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MediaInput {
    One(String),
    Many(Vec<String>),
}

impl MediaInput {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(uri) => vec![uri],
            Self::Many(uris) => uris,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PlayMediaParams {
    #[schemars(description = "The queue/player ID to play on")]
    pub queue_id: String,
    #[schemars(description = "Media URI(s) to play. Get URIs from ma_search or ma_browse.")]
    pub media: MediaInput,
    #[schemars(
        description = "How to handle the queue: 'play' = clear queue and play immediately, \
                       'replace' = replace queue but keep settings, 'next' = insert as next \
                       track, 'add' = add to end of queue (default 'play')"
    )]
    pub option: Option<QueueOption>,
    #[schemars(
        description = "Enable radio mode to auto-play similar tracks when the queue ends (default false)"
    )]
    pub radio_mode: Option<bool>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueueParams {
    #[schemars(description = "The queue/player ID to get or modify")]
    pub queue_id: String,
    #[schemars(description = "Include queue items in the response (default true)")]
    pub get_items: Option<bool>,
    #[schemars(description = "Set shuffle mode: true to enable, false to disable")]
    pub shuffle: Option<bool>,
    #[schemars(
        description = "Set repeat mode: 'off', 'one' (repeat current track), or 'all' (repeat queue)"
    )]
    pub repeat: Option<RepeatMode>,
    #[schemars(description = "Clear all items from the queue (default false)")]
    pub clear: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueueItemAction {
    MoveUp,
    MoveDown,
    MoveNext,
    Remove,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct QueueItemParams {
    #[schemars(description = "The queue/player ID")]
    pub queue_id: String,
    #[schemars(description = "The queue item ID to manage (from ma_queue output)")]
    pub item_id: String,
    #[schemars(
        description = "Action to perform: 'move_up' = move one position earlier, 'move_down' = \
                       move one position later, 'move_next' = move to play next, 'remove' = \
                       remove from queue"
    )]
    pub action: QueueItemAction,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TransferQueueParams {
    #[schemars(description = "The queue/player to transfer from")]
    pub source_queue_id: String,
    #[schemars(description = "The queue/player to transfer to")]
    pub target_queue_id: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchParams {
    #[schemars(description = "Search query - artist name, album title, song name, or playlist")]
    pub query: String,
    #[schemars(
        description = "Filter by media type(s): 'artist', 'album', 'track', 'playlist', 'radio'. \
                       Omit to search all types."
    )]
    pub media_types: Option<Vec<MediaType>>,
    #[schemars(description = "Maximum results per media type (1-50, default 10)")]
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct BrowseParams {
    #[schemars(
        description = "Path to browse. Omit for root level (shows all providers). Use paths \
                       from previous browse results to navigate deeper."
    )]
    pub path: Option<String>,
    #[schemars(description = "Maximum items to return (1-100, default 20)")]
    pub limit: Option<u32>,
    #[schemars(description = "Number of items to skip for pagination (default 0)")]
    pub offset: Option<u32>,
}
