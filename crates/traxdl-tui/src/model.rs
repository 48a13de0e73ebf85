//! Application state and the transition function.
//!
//! `Model::update` folds exactly one event into the state and returns the
//! commands to schedule. It never blocks and never touches the terminal, so
//! every transition is testable without a UI.

use std::path::PathBuf;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use traxdl_provider::links;
use traxdl_provider::provider::{ProviderError, SearchHit, TrackMetadata};

use crate::command::Command;
use crate::event::Event;
use crate::preview::PreviewController;

pub const MENU_ITEMS: [&str; 3] = [
    "Search music",
    "Download from URL",
    "Download from playlist",
];

/// Coarse UI mode. Exactly one is active and decides how input is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    SearchInput,
    UrlInput,
    PlaylistInput,
    Searching,
    Results,
    Loading,
    Details,
    Downloading,
    PlaylistDownloading,
}

/// Accumulator for one sequential playlist download pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaylistRun {
    pub items: Vec<SearchHit>,
    /// Items already resolved. Only ever moves forward.
    pub cursor: usize,
    pub ok: usize,
    pub failed: usize,
    pub failed_labels: Vec<String>,
}

impl PlaylistRun {
    fn new(items: Vec<SearchHit>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    /// The next link of the chain, carrying the accumulators forward.
    fn step_command(&self) -> Command {
        Command::PlaylistStep {
            items: self.items.clone(),
            cursor: self.cursor,
            ok: self.ok,
            failed: self.failed,
            failed_labels: self.failed_labels.clone(),
        }
    }
}

pub struct Model {
    pub screen: Screen,
    pub menu_cursor: usize,
    pub text_input: String,
    pub search_query: String,
    pub search_limit: usize,
    pub results: Vec<SearchHit>,
    /// Selection in the results list; `results.len()` is the load-more row.
    pub cursor: usize,
    pub selected: Option<TrackMetadata>,
    /// Whether Details was reached from URL input rather than a result row.
    pub from_url: bool,
    pub downloading: bool,
    pub message: Option<String>,
    /// A fatal provider failure; set once, then the app shuts down.
    pub error: Option<ProviderError>,
    pub height: u16,
    pub preview: PreviewController,
    pub playlist: Option<PlaylistRun>,
    pub should_quit: bool,
    page_size: usize,
}

impl Model {
    pub fn new(query: Option<String>, page_size: usize, player: PathBuf) -> Self {
        let screen = if query.is_some() {
            Screen::Searching
        } else {
            Screen::Menu
        };
        Self {
            screen,
            menu_cursor: 0,
            text_input: String::new(),
            search_query: query.unwrap_or_default(),
            search_limit: page_size,
            results: Vec::new(),
            cursor: 0,
            selected: None,
            from_url: false,
            downloading: false,
            message: None,
            error: None,
            height: 24,
            preview: PreviewController::new(player),
            playlist: None,
            should_quit: false,
            page_size,
        }
    }

    /// The startup command when a query came in on the command line.
    pub fn init_command(&self) -> Option<Command> {
        if self.search_query.is_empty() {
            None
        } else {
            Some(Command::Search {
                query: self.search_query.clone(),
                limit: self.search_limit,
            })
        }
    }

    /// Fold one event into the state and return the commands to schedule.
    pub fn update(&mut self, event: Event) -> Vec<Command> {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Paste(text) => {
                self.handle_paste(text);
                Vec::new()
            }
            Event::Resize(height) => {
                self.height = height;
                Vec::new()
            }
            Event::SearchCompleted(result) => self.on_search_completed(result),
            Event::MetadataFetched(result) => self.on_metadata_fetched(result),
            Event::DownloadCompleted(result) => {
                self.on_download_completed(result);
                Vec::new()
            }
            Event::PlaylistFetched(result) => self.on_playlist_fetched(result),
            Event::PlaylistItemCompleted {
                index,
                title,
                error,
            } => self.on_playlist_item(index, title, error),
            Event::PlaylistRunCompleted {
                ok,
                failed,
                failed_labels,
                error,
            } => {
                self.on_playlist_run_completed(ok, failed, failed_labels, error);
                Vec::new()
            }
        }
    }

    // ── Key handling ─────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match self.screen {
            Screen::Menu => self.key_menu(key),
            Screen::SearchInput | Screen::UrlInput | Screen::PlaylistInput => self.key_input(key),
            Screen::Results => self.key_results(key),
            Screen::Details => self.key_details(key),
            // Busy screens take no input; a running download cannot be
            // cancelled.
            Screen::Searching | Screen::Loading | Screen::Downloading
            | Screen::PlaylistDownloading => Vec::new(),
        }
    }

    fn handle_paste(&mut self, text: String) {
        if matches!(
            self.screen,
            Screen::SearchInput | Screen::UrlInput | Screen::PlaylistInput
        ) {
            self.text_input.push_str(&text);
        }
    }

    fn key_menu(&mut self, key: KeyEvent) -> Vec<Command> {
        if is_ctrl_c(&key) {
            return self.quit();
        }
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.quit(),
            KeyCode::Up | KeyCode::Char('k') => {
                if self.menu_cursor > 0 {
                    self.menu_cursor -= 1;
                }
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.menu_cursor + 1 < MENU_ITEMS.len() {
                    self.menu_cursor += 1;
                }
                Vec::new()
            }
            KeyCode::Enter => {
                self.screen = match self.menu_cursor {
                    0 => Screen::SearchInput,
                    1 => Screen::UrlInput,
                    _ => Screen::PlaylistInput,
                };
                self.text_input.clear();
                self.message = None;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn key_input(&mut self, key: KeyEvent) -> Vec<Command> {
        if is_ctrl_c(&key) {
            return self.quit();
        }
        match key.code {
            KeyCode::Esc => {
                self.screen = Screen::Menu;
                self.text_input.clear();
                Vec::new()
            }
            KeyCode::Enter => self.submit_input(),
            KeyCode::Backspace => {
                self.text_input.pop();
                Vec::new()
            }
            KeyCode::Char(c)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                self.text_input.push(c);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Enter on an input screen. Empty input is ignored; invalid URLs set a
    /// message and stay put.
    fn submit_input(&mut self) -> Vec<Command> {
        if self.text_input.is_empty() {
            return Vec::new();
        }
        match self.screen {
            Screen::SearchInput => {
                self.search_query = self.text_input.clone();
                self.search_limit = self.page_size;
                self.results.clear();
                self.cursor = 0;
                self.screen = Screen::Searching;
                vec![Command::Search {
                    query: self.search_query.clone(),
                    limit: self.search_limit,
                }]
            }
            Screen::UrlInput => match links::extract_video_id(&self.text_input) {
                Some(id) => {
                    self.from_url = true;
                    self.screen = Screen::Loading;
                    vec![Command::FetchMetadata { id }]
                }
                None => {
                    self.message = Some("Invalid YouTube URL".to_string());
                    Vec::new()
                }
            },
            Screen::PlaylistInput => match links::extract_playlist_id(&self.text_input) {
                Some(id) => {
                    self.screen = Screen::Loading;
                    self.message = Some("Fetching playlist...".to_string());
                    vec![Command::FetchPlaylist { id }]
                }
                None => {
                    self.message = Some("Invalid YouTube playlist URL".to_string());
                    Vec::new()
                }
            },
            _ => Vec::new(),
        }
    }

    fn key_results(&mut self, key: KeyEvent) -> Vec<Command> {
        if is_ctrl_c(&key) {
            return self.quit();
        }
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.quit(),
            KeyCode::Esc => {
                self.screen = Screen::Menu;
                self.results.clear();
                self.cursor = 0;
                self.search_query.clear();
                self.search_limit = self.page_size;
                Vec::new()
            }
            KeyCode::Up | KeyCode::Char('k') => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                }
                Vec::new()
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.cursor < self.results.len() {
                    self.cursor += 1;
                }
                Vec::new()
            }
            KeyCode::Enter => {
                if self.cursor == self.results.len() {
                    self.search_limit += self.page_size;
                    self.cursor = 0;
                    self.screen = Screen::Searching;
                    return vec![Command::Search {
                        query: self.search_query.clone(),
                        limit: self.search_limit,
                    }];
                }
                let Some(hit) = self.results.get(self.cursor) else {
                    return Vec::new();
                };
                // Partial metadata so Details can render before the fetch
                // lands; preview starts off the row's id right away.
                self.selected = Some(TrackMetadata {
                    id: hit.id.clone(),
                    title: hit.title.clone(),
                    ..TrackMetadata::default()
                });
                let id = hit.id.clone();
                self.screen = Screen::Details;
                self.message = None;
                self.start_preview();
                vec![Command::FetchMetadata { id }]
            }
            _ => Vec::new(),
        }
    }

    fn key_details(&mut self, key: KeyEvent) -> Vec<Command> {
        if is_ctrl_c(&key) {
            return self.quit();
        }
        match key.code {
            KeyCode::Char('q') if key.modifiers.is_empty() => self.quit(),
            KeyCode::Esc => {
                self.preview.stop();
                if self.from_url {
                    self.screen = Screen::Menu;
                    self.from_url = false;
                } else {
                    self.screen = Screen::Results;
                }
                self.selected = None;
                self.message = None;
                Vec::new()
            }
            KeyCode::Char('p') if key.modifiers.is_empty() => {
                self.start_preview();
                Vec::new()
            }
            KeyCode::Char('s') if key.modifiers.is_empty() => {
                if self.preview.active() {
                    self.preview.stop();
                    self.message = Some("Preview stopped".to_string());
                }
                Vec::new()
            }
            KeyCode::Char('d') if key.modifiers.is_empty() => {
                self.preview.stop();
                let Some(selected) = &self.selected else {
                    return Vec::new();
                };
                let command = Command::Download {
                    id: selected.id.clone(),
                    title: selected.title.clone(),
                };
                self.downloading = true;
                self.screen = Screen::Downloading;
                vec![command]
            }
            _ => Vec::new(),
        }
    }

    // ── Command completions ──────────────────────────────────────────────

    fn on_search_completed(&mut self, result: Result<Vec<SearchHit>, ProviderError>) -> Vec<Command> {
        match result {
            Err(e) => self.fail(e),
            Ok(hits) => {
                self.merge_results(hits);
                self.screen = Screen::Results;
                Vec::new()
            }
        }
    }

    fn on_metadata_fetched(&mut self, result: Result<TrackMetadata, ProviderError>) -> Vec<Command> {
        match result {
            Err(e) => self.fail(e),
            Ok(metadata) => {
                self.selected = Some(metadata);
                self.screen = Screen::Details;
                // Covers the URL path, where no preview was started off a
                // result row. An already live session is left alone.
                self.start_preview();
                Vec::new()
            }
        }
    }

    fn on_download_completed(&mut self, result: Result<(), ProviderError>) {
        self.downloading = false;
        self.message = Some(match result {
            Ok(()) => "✓ Download complete!".to_string(),
            Err(e) => format!("Download failed: {}", e),
        });
        self.screen = Screen::Details;
    }

    fn on_playlist_fetched(&mut self, result: Result<Vec<SearchHit>, ProviderError>) -> Vec<Command> {
        match result {
            Err(e) => self.fail(e),
            Ok(items) => {
                self.message = Some(format!(
                    "Found {} songs in playlist. Starting download...",
                    items.len()
                ));
                let run = PlaylistRun::new(items);
                let first = run.step_command();
                self.playlist = Some(run);
                self.screen = Screen::PlaylistDownloading;
                vec![first]
            }
        }
    }

    fn on_playlist_item(
        &mut self,
        index: usize,
        title: String,
        error: Option<String>,
    ) -> Vec<Command> {
        let Some(run) = self.playlist.as_mut() else {
            debug!("playlist item event with no run in progress");
            return Vec::new();
        };
        run.cursor = index;
        let total = run.total();
        match error {
            None => {
                run.ok += 1;
                self.message = Some(format!("✓ Downloaded: {} ({}/{})", title, index, total));
            }
            Some(err) => {
                run.failed += 1;
                run.failed_labels.push(format!("{}: {}", title, err));
                self.message = Some(format!("✗ Failed: {} ({}/{})", title, index, total));
            }
        }
        vec![run.step_command()]
    }

    fn on_playlist_run_completed(
        &mut self,
        ok: usize,
        failed: usize,
        failed_labels: Vec<String>,
        error: Option<ProviderError>,
    ) {
        match error {
            Some(e) => {
                self.message = Some(format!("Playlist download failed: {}", e));
            }
            None => {
                let mut summary = format!(
                    "✓ Playlist download complete! Success: {}, Failed: {}",
                    ok, failed
                );
                if failed > 0 && !failed_labels.is_empty() {
                    summary.push_str("\n\nFailed downloads:\n");
                    for label in &failed_labels {
                        summary.push_str(&format!("  • {}\n", label));
                    }
                }
                self.message = Some(summary);
            }
        }
        self.screen = Screen::Menu;
        self.playlist = None;
    }

    // ── Shared helpers ───────────────────────────────────────────────────

    /// Append hits, dropping ids already present so a grown-limit re-search
    /// keeps earlier rows stable.
    fn merge_results(&mut self, hits: Vec<SearchHit>) {
        for hit in hits {
            if !self.results.iter().any(|r| r.id == hit.id) {
                self.results.push(hit);
            }
        }
    }

    /// Kick off a preview for the current selection unless one is already
    /// playing. The message only appears when the player actually spawned.
    fn start_preview(&mut self) {
        if self.preview.active() {
            return;
        }
        let Some(selected) = &self.selected else {
            return;
        };
        let id = selected.id.clone();
        self.preview.start(&id);
        if self.preview.active() {
            self.message = Some("Playing preview... (press 's' to stop)".to_string());
        }
    }

    /// Record a fatal failure and shut down. The preview child, if any, is
    /// killed when the controller drops.
    fn fail(&mut self, error: ProviderError) -> Vec<Command> {
        self.error = Some(error);
        self.should_quit = true;
        Vec::new()
    }

    fn quit(&mut self) -> Vec<Command> {
        self.preview.stop();
        self.should_quit = true;
        Vec::new()
    }
}

fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}
