use rmcp::model::CallToolResult;
use rmcp::ErrorData as McpError;

use super::{client_error, text_result};
use super::params::{BrowseParams, SearchParams};
use crate::connection::ConnectionManager;
use crate::model::{BrowseItem, MediaItem, MediaType, SearchResults};

const SEARCH_LIMIT_DEFAULT: u32 = 10;
const SEARCH_LIMIT_MAX: u32 = 50;
const BROWSE_LIMIT_DEFAULT: u32 = 20;
const BROWSE_LIMIT_MAX: u32 = 100;

pub(super) async fn handle_search(
    connection: &ConnectionManager,
    params: SearchParams,
) -> Result<CallToolResult, McpError> {
    let query = params.query.trim();
    if query.is_empty() {
        return text_result("Error: query must not be empty".to_string());
    }

    let limit = params.limit.unwrap_or(SEARCH_LIMIT_DEFAULT);
    if limit == 0 || limit > SEARCH_LIMIT_MAX {
        return text_result(format!(
            "Error: limit must be 1-{SEARCH_LIMIT_MAX}, got {limit}"
        ));
    }

    // An explicit empty filter means the same as no filter at all.
    let media_types = params
        .media_types
        .filter(|types| !types.is_empty())
        .unwrap_or_else(|| MediaType::SEARCHABLE.to_vec());
    let media_types = media_types.as_slice();

    let results = connection
        .with_reconnect(move |api| async move { api.search(query, media_types, limit).await })
        .await
        .map_err(client_error)?;

    text_result(format_search_results(query, &results, limit as usize))
}

/// Render search results with categories in fixed order, omitting empty ones.
fn format_search_results(query: &str, results: &SearchResults, limit: usize) -> String {
    let mut lines = vec![format!("# Search Results for '{query}'\n")];

    let sections: [(&str, &[MediaItem], MediaType); 5] = [
        ("Artists", &results.artists, MediaType::Artist),
        ("Albums", &results.albums, MediaType::Album),
        ("Tracks", &results.tracks, MediaType::Track),
        ("Playlists", &results.playlists, MediaType::Playlist),
        ("Radio Stations", &results.radio, MediaType::Radio),
    ];

    if results.is_empty() {
        lines.push("No results found.".to_string());
    } else {
        for (heading, items, media_type) in sections {
            if items.is_empty() {
                continue;
            }
            lines.push(format!("## {heading}"));
            for item in items.iter().take(limit) {
                lines.push(format_media_item(item, media_type));
            }
            lines.push(String::new());
        }
    }

    lines.push("\n*Use the URI with ma_play_media to play an item.*".to_string());
    lines.join("\n")
}

fn format_media_item(item: &MediaItem, media_type: MediaType) -> String {
    let mut extra = String::new();
    match media_type {
        MediaType::Track => {
            if let Some(artist) = item.artists.first() {
                extra.push_str(&format!(" by {}", artist.name));
            }
            if let Some(album) = &item.album {
                extra.push_str(&format!(" ({})", album.name));
            }
        }
        MediaType::Album => {
            if let Some(artist) = item.artists.first() {
                extra.push_str(&format!(" by {}", artist.name));
            }
        }
        _ => {}
    }

    let uri = item
        .uri
        .as_deref()
        .map(|uri| format!(" `{uri}`"))
        .unwrap_or_default();
    format!("- {}{extra}{uri}", item.name)
}

pub(super) async fn handle_browse(
    connection: &ConnectionManager,
    params: BrowseParams,
) -> Result<CallToolResult, McpError> {
    let limit = params.limit.unwrap_or(BROWSE_LIMIT_DEFAULT);
    if limit == 0 || limit > BROWSE_LIMIT_MAX {
        return text_result(format!(
            "Error: limit must be 1-{BROWSE_LIMIT_MAX}, got {limit}"
        ));
    }
    let offset = params.offset.unwrap_or(0);
    let path = params.path.as_deref();

    let items = connection
        .with_reconnect(move |api| async move { api.browse(path).await })
        .await
        .map_err(client_error)?;

    text_result(format_browse(path, &items, limit as usize, offset as usize))
}

/// Strip the internal `folder/` marker the server places right after the
/// provider scheme, turning `provider://folder/albums` into
/// `provider://albums`. Identifiers without the marker pass through
/// unchanged, which makes the transform idempotent.
pub(super) fn normalize_browse_path(uri: &str) -> String {
    if let Some((scheme, rest)) = uri.split_once("://") {
        if let Some(stripped) = rest.strip_prefix("folder/") {
            return format!("{scheme}://{stripped}");
        }
    }
    uri.to_string()
}

/// Render one page of browse results: folders first with normalized paths,
/// then media entries with type markers, then pagination guidance.
fn format_browse(path: Option<&str>, items: &[BrowseItem], limit: usize, offset: usize) -> String {
    let total = items.len();

    let mut lines = vec![match path {
        Some(path) => format!("# Browsing: {path}\n"),
        None => "# Music Providers\n".to_string(),
    }];

    if items.is_empty() {
        lines.push("No items found at this path.".to_string());
        return lines.join("\n");
    }

    if offset >= total {
        lines.push(format!("Offset {offset} exceeds total items ({total})."));
        return lines.join("\n");
    }

    let page = &items[offset..total.min(offset + limit)];
    let (folders, media): (Vec<&BrowseItem>, Vec<&BrowseItem>) =
        page.iter().partition(|item| item.is_navigable());

    if !folders.is_empty() {
        lines.push("## Folders".to_string());
        for item in &folders {
            let path = item
                .uri
                .as_deref()
                .map(|uri| format!(" → `{}`", normalize_browse_path(uri)))
                .unwrap_or_default();
            lines.push(format!("- 📁 {}{path}", item.name));
        }
        lines.push(String::new());
    }

    if !media.is_empty() {
        lines.push("## Media".to_string());
        for item in &media {
            let marker = match item.media_type {
                Some(MediaType::Artist) => "👤",
                Some(MediaType::Album) => "💿",
                Some(MediaType::Track) => "🎵",
                Some(MediaType::Playlist) => "📋",
                Some(MediaType::Radio) => "📻",
                _ => "•",
            };
            let uri = item
                .uri
                .as_deref()
                .map(|uri| format!(" `{uri}`"))
                .unwrap_or_default();
            lines.push(format!("- {marker} {}{uri}", item.name));
        }
        lines.push(String::new());
    }

    let showing_end = offset + page.len();
    if showing_end < total {
        lines.push(format!(
            "\n**Showing {}-{showing_end} of {total} items.** Use `offset={showing_end}` to \
             see more, or use ma_search to find specific items.",
            offset + 1
        ));
    } else {
        lines.push(format!(
            "\n*Showing {}-{showing_end} of {total} items.*",
            offset + 1
        ));
    }

    lines.push(
        "\n*Use folder paths with ma_browse to navigate. Use media URIs with ma_play_media to play.*"
            .to_string(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::normalize_browse_path;

    #[test]
    fn strips_folder_marker_after_scheme() {
        assert_eq!(
            normalize_browse_path("provider://folder/albums"),
            "provider://albums"
        );
    }

    #[test]
    fn passes_through_without_marker() {
        assert_eq!(
            normalize_browse_path("provider://albums"),
            "provider://albums"
        );
        assert_eq!(normalize_browse_path("no-scheme-at-all"), "no-scheme-at-all");
    }

    #[test]
    fn is_idempotent() {
        let once = normalize_browse_path("spotify://folder/playlists/workout");
        assert_eq!(once, "spotify://playlists/workout");
        assert_eq!(normalize_browse_path(&once), once);
    }

    #[test]
    fn only_strips_marker_directly_after_scheme() {
        assert_eq!(
            normalize_browse_path("provider://library/folder/deep"),
            "provider://library/folder/deep"
        );
    }
}
