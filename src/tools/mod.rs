use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, ServerCapabilities, ServerInfo};
use rmcp::{tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};

mod music;
mod params;
mod playback;
mod players;
mod queue;

use params::*;

use crate::connection::ConnectionManager;
use crate::error::ClientError;

fn text_result(text: String) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

fn client_error(e: ClientError) -> McpError {
    McpError::internal_error(e.to_string(), None)
}

/// Shared per-process state: the one connection manager every tool call
/// goes through.
struct ServerState {
    connection: ConnectionManager,
}

#[derive(Clone)]
pub struct MusicAssistantServer {
    state: Arc<ServerState>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl MusicAssistantServer {
    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            state: Arc::new(ServerState { connection }),
            tool_router: Self::tool_router(),
        }
    }

    /// Close the shared connection. Safe to call when never connected.
    pub async fn shutdown(&self) {
        self.state.connection.disconnect().await;
    }

    #[tool(
        description = "List all available players with their current state: id, name, volume, \
                       active source and group membership. Use this to discover speakers before \
                       controlling them."
    )]
    async fn ma_list_players(&self) -> Result<CallToolResult, McpError> {
        players::handle_list_players(&self.state.connection).await
    }

    #[tool(
        description = "Control player volume - set a level, adjust up/down, or mute/unmute. \
                       Provide exactly one of: level, adjust, or mute."
    )]
    async fn ma_volume(
        &self,
        params: Parameters<VolumeParams>,
    ) -> Result<CallToolResult, McpError> {
        players::handle_volume(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Manage speaker groups. 'join' syncs players to a target leader player, \
                       'leave' removes players from any sync groups."
    )]
    async fn ma_group(&self, params: Parameters<GroupParams>) -> Result<CallToolResult, McpError> {
        players::handle_group(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Control playback state - play, pause, stop, toggle, skip tracks, or seek. \
                       Use seek_seconds with 'play' to jump to a specific position."
    )]
    async fn ma_playback(
        &self,
        params: Parameters<PlaybackParams>,
    ) -> Result<CallToolResult, McpError> {
        playback::handle_playback(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Play media on a player/queue. First use ma_search to find media and get \
                       URIs, then use this tool to play them. The option controls whether the \
                       queue is cleared, replaced, or appended to."
    )]
    async fn ma_play_media(
        &self,
        params: Parameters<PlayMediaParams>,
    ) -> Result<CallToolResult, McpError> {
        playback::handle_play_media(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Get queue state and items, or modify queue settings (shuffle, repeat, \
                       clear). Settings changes are applied before the state is read back."
    )]
    async fn ma_queue(&self, params: Parameters<QueueParams>) -> Result<CallToolResult, McpError> {
        queue::handle_queue(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Reorder or remove individual items in the queue. Use ma_queue first to \
                       see queue items and their IDs."
    )]
    async fn ma_queue_item(
        &self,
        params: Parameters<QueueItemParams>,
    ) -> Result<CallToolResult, McpError> {
        queue::handle_queue_item(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Transfer playback from one player to another, moving the entire queue, \
                       position and settings."
    )]
    async fn ma_transfer_queue(
        &self,
        params: Parameters<TransferQueueParams>,
    ) -> Result<CallToolResult, McpError> {
        queue::handle_transfer_queue(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Search for music across all configured providers. Returns matching \
                       artists, albums, tracks, playlists and radio stations with URIs for \
                       ma_play_media."
    )]
    async fn ma_search(
        &self,
        params: Parameters<SearchParams>,
    ) -> Result<CallToolResult, McpError> {
        music::handle_search(&self.state.connection, params.0).await
    }

    #[tool(
        description = "Browse music provider content hierarchically. Start with no path to see \
                       available providers, then use returned folder paths to navigate deeper."
    )]
    async fn ma_browse(
        &self,
        params: Parameters<BrowseParams>,
    ) -> Result<CallToolResult, McpError> {
        music::handle_browse(&self.state.connection, params.0).await
    }
}

#[tool_handler]
impl ServerHandler for MusicAssistantServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Music Assistant control server. Discover players, control playback and \
                 volume, manage speaker groups and queues, and search or browse the music \
                 library."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
