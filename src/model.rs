use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Playback state reported by a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    Idle,
    Paused,
    Playing,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Paused => write!(f, "paused"),
            Self::Playing => write!(f, "playing"),
        }
    }
}

/// Queue repeat mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepeatMode {
    #[default]
    Off,
    One,
    All,
}

impl fmt::Display for RepeatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::One => write!(f, "one"),
            Self::All => write!(f, "all"),
        }
    }
}

/// How newly submitted media interacts with the existing queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueueOption {
    /// Clear the queue and play immediately.
    #[default]
    Play,
    /// Replace queue contents but keep current settings.
    Replace,
    /// Insert as the next item(s) to play.
    Next,
    /// Append to the end of the queue.
    Add,
}

/// Media classification used by search filters and browse listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Artist,
    Album,
    Track,
    Playlist,
    Radio,
    Library,
    Folder,
    Provider,
    #[serde(other)]
    Unknown,
}

impl MediaType {
    /// All searchable media types, used when no filter is given.
    pub const SEARCHABLE: [MediaType; 5] = [
        MediaType::Artist,
        MediaType::Album,
        MediaType::Track,
        MediaType::Playlist,
        MediaType::Radio,
    ];

    /// Types that represent navigable containers rather than playable media.
    pub fn is_container(self) -> bool {
        matches!(self, Self::Library | Self::Folder | Self::Provider)
    }
}

/// A named external source a player can switch to (TV, AUX, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerSource {
    pub id: String,
    pub name: String,
}

/// A player as reported by the server. Optional fields are absent on
/// providers that do not support the corresponding feature.
#[derive(Debug, Clone, Deserialize)]
pub struct Player {
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub volume_level: Option<u8>,
    #[serde(default)]
    pub volume_muted: Option<bool>,
    #[serde(default)]
    pub state: Option<PlayerState>,
    #[serde(default)]
    pub active_source: Option<String>,
    #[serde(default)]
    pub source_list: Vec<PlayerSource>,
    /// Player ids this player leads, when it is a group leader.
    #[serde(default)]
    pub group_childs: Vec<String>,
    /// Leader id this player is synced to, when it is a group member.
    #[serde(default)]
    pub synced_to: Option<String>,
}

/// Reference to an artist or album hanging off a media item.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemRef {
    pub name: String,
}

/// A playable media item from search results or a queue entry.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaItem {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub artists: Vec<ItemRef>,
    #[serde(default)]
    pub album: Option<ItemRef>,
}

/// One entry in a player queue.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueItem {
    pub queue_item_id: String,
    pub name: String,
    #[serde(default)]
    pub media_item: Option<MediaItem>,
}

/// Snapshot of a player queue. `items` is the total item count; the ordered
/// item list is only available through the paged `get_queue_items` call.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerQueue {
    pub queue_id: String,
    #[serde(default)]
    pub shuffle_enabled: bool,
    #[serde(default)]
    pub repeat_mode: RepeatMode,
    #[serde(default)]
    pub current_item: Option<QueueItem>,
    #[serde(default)]
    pub items: u64,
}

/// A node in the hierarchical browse tree.
#[derive(Debug, Clone, Deserialize)]
pub struct BrowseItem {
    pub name: String,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub is_folder: bool,
}

impl BrowseItem {
    /// Whether this item can be browsed into, as opposed to played.
    pub fn is_navigable(&self) -> bool {
        self.is_folder || self.media_type.is_some_and(MediaType::is_container)
    }
}

/// Search results, one independent sequence per media type. Any may be empty.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub artists: Vec<MediaItem>,
    #[serde(default)]
    pub albums: Vec<MediaItem>,
    #[serde(default)]
    pub tracks: Vec<MediaItem>,
    #[serde(default)]
    pub playlists: Vec<MediaItem>,
    #[serde(default)]
    pub radio: Vec<MediaItem>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.artists.is_empty()
            && self.albums.is_empty()
            && self.tracks.is_empty()
            && self.playlists.is_empty()
            && self.radio.is_empty()
    }
}
