//! Background command execution.
//!
//! Each dispatched command runs on its own tokio task and reports back with
//! exactly one event over the shared channel. The model never polls, and the
//! playlist chain only advances once the previous step's completion event
//! has been folded into the state.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use traxdl_provider::provider::{Provider, SearchHit};

use crate::event::Event;

/// A one-shot unit of background work scheduled by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Search {
        query: String,
        limit: usize,
    },
    FetchMetadata {
        id: String,
    },
    Download {
        id: String,
        title: String,
    },
    FetchPlaylist {
        id: String,
    },
    /// One link of the sequential playlist chain, carrying the accumulated
    /// outcome so the terminal step can report totals.
    PlaylistStep {
        items: Vec<SearchHit>,
        cursor: usize,
        ok: usize,
        failed: usize,
        failed_labels: Vec<String>,
    },
}

pub struct CommandRunner {
    provider: Arc<Provider>,
    event_tx: mpsc::Sender<Event>,
}

impl CommandRunner {
    pub fn new(provider: Arc<Provider>, event_tx: mpsc::Sender<Event>) -> Self {
        Self { provider, event_tx }
    }

    /// Spawn one task for `command`. The task sends exactly one completion
    /// event back; a closed channel means the UI is gone and the result is
    /// dropped.
    pub fn dispatch(&self, command: Command) {
        let provider = self.provider.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let event = run(provider, command).await;
            if tx.send(event).await.is_err() {
                debug!("event channel closed before command completion");
            }
        });
    }
}

async fn run(provider: Arc<Provider>, command: Command) -> Event {
    match command {
        Command::Search { query, limit } => {
            Event::SearchCompleted(provider.search(&query, limit).await)
        }
        Command::FetchMetadata { id } => Event::MetadataFetched(provider.fetch_metadata(&id).await),
        Command::Download { id, title } => {
            Event::DownloadCompleted(provider.download(&id, &title).await)
        }
        Command::FetchPlaylist { id } => Event::PlaylistFetched(provider.list_playlist(&id).await),
        Command::PlaylistStep {
            items,
            cursor,
            ok,
            failed,
            failed_labels,
        } => playlist_step(provider, items, cursor, ok, failed, failed_labels).await,
    }
}

/// Run one link of the playlist chain. Past the end of the item list the
/// accumulated totals are reported; otherwise the item at `cursor` is
/// downloaded and its outcome emitted for the model to fold in before it
/// schedules the next step. At most one download is ever in flight.
async fn playlist_step(
    provider: Arc<Provider>,
    items: Vec<SearchHit>,
    cursor: usize,
    ok: usize,
    failed: usize,
    failed_labels: Vec<String>,
) -> Event {
    if cursor >= items.len() {
        return Event::PlaylistRunCompleted {
            ok,
            failed,
            failed_labels,
            error: None,
        };
    }
    let item = &items[cursor];
    let error = match provider.download_playlist_item(&item.id, &item.title).await {
        Ok(()) => None,
        Err(e) => {
            warn!("playlist item '{}' failed: {}", item.title, e);
            Some(e.to_string())
        }
    };
    Event::PlaylistItemCompleted {
        index: cursor + 1,
        title: item.title.clone(),
        error,
    }
}

#[cfg(test)]
mod command_tests {
    use std::path::PathBuf;

    use traxdl_provider::provider::ProviderError;

    use super::*;

    fn runner_with_bogus_tool() -> (CommandRunner, mpsc::Receiver<Event>) {
        let provider = Arc::new(Provider::new(
            PathBuf::from("/nonexistent/yt-dlp"),
            PathBuf::from("."),
        ));
        let (tx, rx) = mpsc::channel(8);
        (CommandRunner::new(provider, tx), rx)
    }

    fn hit(title: &str, id: &str) -> SearchHit {
        SearchHit {
            title: title.to_string(),
            id: id.to_string(),
        }
    }

    #[tokio::test]
    async fn test_terminal_step_reports_totals() {
        let (runner, mut rx) = runner_with_bogus_tool();
        runner.dispatch(Command::PlaylistStep {
            items: vec![hit("a", "id1"), hit("b", "id2")],
            cursor: 2,
            ok: 1,
            failed: 1,
            failed_labels: vec!["b: download failed: 403".to_string()],
        });
        match rx.recv().await {
            Some(Event::PlaylistRunCompleted {
                ok,
                failed,
                failed_labels,
                error,
            }) => {
                assert_eq!(ok, 1);
                assert_eq!(failed, 1);
                assert_eq!(failed_labels, vec!["b: download failed: 403".to_string()]);
                assert!(error.is_none());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_item_reports_error_text() {
        let (runner, mut rx) = runner_with_bogus_tool();
        runner.dispatch(Command::PlaylistStep {
            items: vec![hit("a", "id1")],
            cursor: 0,
            ok: 0,
            failed: 0,
            failed_labels: Vec::new(),
        });
        match rx.recv().await {
            Some(Event::PlaylistItemCompleted {
                index,
                title,
                error,
            }) => {
                assert_eq!(index, 1);
                assert_eq!(title, "a");
                assert!(error.is_some());
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_search_spawn_failure_surfaces_as_event() {
        let (runner, mut rx) = runner_with_bogus_tool();
        runner.dispatch(Command::Search {
            query: "lofi".to_string(),
            limit: 20,
        });
        match rx.recv().await {
            Some(Event::SearchCompleted(Err(e))) => {
                assert!(matches!(e, ProviderError::Spawn { .. }));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
