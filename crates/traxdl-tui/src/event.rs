//! The closed set of messages the model consumes: terminal input plus the
//! completion events background commands send back.

use ratatui::crossterm::event::KeyEvent;

use traxdl_provider::provider::{ProviderError, SearchHit, TrackMetadata};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Paste(String),
    Resize(u16),

    SearchCompleted(Result<Vec<SearchHit>, ProviderError>),
    MetadataFetched(Result<TrackMetadata, ProviderError>),
    DownloadCompleted(Result<(), ProviderError>),
    PlaylistFetched(Result<Vec<SearchHit>, ProviderError>),
    /// One playlist item finished. `index` is 1-based; `error` is `None`
    /// on success.
    PlaylistItemCompleted {
        index: usize,
        title: String,
        error: Option<String>,
    },
    /// The chain walked past the last item and reports its totals.
    PlaylistRunCompleted {
        ok: usize,
        failed: usize,
        failed_labels: Vec<String>,
        error: Option<ProviderError>,
    },
}
