//! The yt-dlp adapter: search, metadata, single downloads, and playlist
//! enumeration.
//!
//! Every operation shells out to yt-dlp and maps its output into typed
//! values. The adapter is stateless beyond the resolved binary path and the
//! downloads directory, so one instance can be shared across tasks.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

/// A candidate track from search or playlist enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub id: String,
}

/// Full metadata for a selected track, decoded from `yt-dlp -j`.
///
/// Fields yt-dlp omits or reports as null decode to their zero values;
/// only malformed JSON is a decode error.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackMetadata {
    #[serde(deserialize_with = "null_to_default")]
    pub id: String,
    #[serde(deserialize_with = "null_to_default")]
    pub title: String,
    #[serde(deserialize_with = "null_to_default")]
    pub channel: String,
    #[serde(deserialize_with = "null_to_default")]
    pub duration: u64,
    #[serde(deserialize_with = "null_to_default")]
    pub view_count: i64,
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let value = Option::<T>::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// Failures surfaced by the adapter. Search, metadata and playlist errors
/// are fatal to a session; download errors are reported and recoverable.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("search failed: {0}")]
    Search(String),
    #[error("no results found")]
    NoResults,
    #[error("failed to fetch metadata: {0}")]
    MetadataFetch(String),
    #[error("failed to parse metadata: {0}")]
    MetadataDecode(#[from] serde_json::Error),
    #[error("download failed: {0}")]
    Download(String),
    #[error("failed to fetch playlist: {0}")]
    Playlist(String),
    #[error("no items found in playlist")]
    EmptyPlaylist,
}

/// Canonical watch URL for a video identifier.
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", id)
}

fn playlist_url(id: &str) -> String {
    format!("https://www.youtube.com/playlist?list={}", id)
}

// ── Adapter ──────────────────────────────────────────────────────────────

pub struct Provider {
    yt_dlp: PathBuf,
    downloads_dir: PathBuf,
}

impl Provider {
    pub fn new(yt_dlp: PathBuf, downloads_dir: PathBuf) -> Self {
        Self {
            yt_dlp,
            downloads_dir,
        }
    }

    /// Search for up to `limit` tracks matching `query`, in provider order.
    /// An empty result set is an error.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>, ProviderError> {
        let target = format!("ytsearch{}:{}", limit, query);
        debug!("searching: {}", target);
        let output = Command::new(&self.yt_dlp)
            .arg(&target)
            .arg("--flat-playlist")
            .arg("--print")
            .arg("%(title)s|||%(id)s")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProviderError::Spawn {
                tool: "yt-dlp",
                source: e,
            })?;
        if !output.status.success() {
            return Err(ProviderError::Search(run_error(&output)));
        }
        let hits = parse_hits(&String::from_utf8_lossy(&output.stdout));
        if hits.is_empty() {
            return Err(ProviderError::NoResults);
        }
        debug!("search returned {} hits", hits.len());
        Ok(hits)
    }

    /// Fetch full metadata for a video.
    pub async fn fetch_metadata(&self, id: &str) -> Result<TrackMetadata, ProviderError> {
        let output = Command::new(&self.yt_dlp)
            .arg("-j")
            .arg(watch_url(id))
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProviderError::Spawn {
                tool: "yt-dlp",
                source: e,
            })?;
        if !output.status.success() {
            return Err(ProviderError::MetadataFetch(run_error(&output)));
        }
        let metadata: TrackMetadata = serde_json::from_slice(&output.stdout)?;
        Ok(metadata)
    }

    /// Download a single track as a tagged mp3 into the downloads directory.
    /// `title` is for logging only; yt-dlp names the file itself.
    pub async fn download(&self, id: &str, title: &str) -> Result<(), ProviderError> {
        self.run_download(id, title, &[]).await
    }

    /// Download one item of a playlist run. Identical to [`download`] but
    /// with warnings suppressed so per-item failures stay on one line.
    ///
    /// [`download`]: Provider::download
    pub async fn download_playlist_item(&self, id: &str, title: &str) -> Result<(), ProviderError> {
        self.run_download(id, title, &["--no-warnings"]).await
    }

    async fn run_download(&self, id: &str, title: &str, extra: &[&str]) -> Result<(), ProviderError> {
        if let Err(e) = tokio::fs::create_dir_all(&self.downloads_dir).await {
            return Err(ProviderError::Download(format!(
                "cannot create {}: {}",
                self.downloads_dir.display(),
                e
            )));
        }
        let template = self.downloads_dir.join("%(title)s.%(ext)s");
        info!(
            "downloading '{}' ({}) into {}",
            title,
            id,
            self.downloads_dir.display()
        );
        let output = Command::new(&self.yt_dlp)
            .args(extraction_args(&template, extra, id))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .output()
            .await
            .map_err(|e| ProviderError::Spawn {
                tool: "yt-dlp",
                source: e,
            })?;
        if !output.status.success() {
            return Err(ProviderError::Download(run_error(&output)));
        }
        info!("download complete: '{}'", title);
        Ok(())
    }

    /// List every entry of a playlist without downloading anything.
    /// An empty playlist is an error.
    pub async fn list_playlist(&self, id: &str) -> Result<Vec<SearchHit>, ProviderError> {
        let output = Command::new(&self.yt_dlp)
            .arg(playlist_url(id))
            .arg("--flat-playlist")
            .arg("--print")
            .arg("%(title)s|||%(id)s")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ProviderError::Spawn {
                tool: "yt-dlp",
                source: e,
            })?;
        if !output.status.success() {
            return Err(ProviderError::Playlist(run_error(&output)));
        }
        let hits = parse_hits(&String::from_utf8_lossy(&output.stdout));
        if hits.is_empty() {
            return Err(ProviderError::EmptyPlaylist);
        }
        Ok(hits)
    }
}

/// The yt-dlp argument list for an audio extraction: best audio, mp3 at the
/// highest quality, embedded thumbnail and tags, quiet except for progress.
fn extraction_args(template: &Path, extra: &[&str], id: &str) -> Vec<OsString> {
    let mut args: Vec<OsString> = [
        "-f",
        "bestaudio",
        "--extract-audio",
        "--audio-format",
        "mp3",
        "--audio-quality",
        "0",
        "--embed-thumbnail",
        "--add-metadata",
        "--quiet",
        "--progress",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    args.extend(extra.iter().map(OsString::from));
    args.push("-o".into());
    args.push(template.as_os_str().to_os_string());
    args.push(watch_url(id).into());
    args
}

// ── Output decoding ──────────────────────────────────────────────────────

/// One hit per line, `title|||id`. Lines that do not split into exactly two
/// fields are skipped.
fn parse_hits(raw: &str) -> Vec<SearchHit> {
    raw.trim()
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split("|||").collect();
            if parts.len() != 2 {
                return None;
            }
            Some(SearchHit {
                title: parts[0].to_string(),
                id: parts[1].to_string(),
            })
        })
        .collect()
}

/// Condense a failed invocation into one line. yt-dlp puts the decisive
/// `ERROR:` line on stderr among progress noise.
fn run_error(output: &std::process::Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let mut last = "";
    for line in stderr.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("ERROR:") {
            return line.to_string();
        }
        last = line;
    }
    if !last.is_empty() {
        return last.to_string();
    }
    match output.status.code() {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod provider_tests {
    use super::*;

    #[test]
    fn test_parse_hits_well_formed() {
        let raw = "First Song|||abc123DEF45\nSecond Song|||xyz789XYZ12\n";
        let hits = parse_hits(raw);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "First Song");
        assert_eq!(hits[0].id, "abc123DEF45");
        assert_eq!(hits[1].title, "Second Song");
    }

    #[test]
    fn test_parse_hits_skips_malformed_lines() {
        let raw = "good|||id1\nno separator here\ntoo|||many|||fields\nalso good|||id2";
        let hits = parse_hits(raw);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "id1");
        assert_eq!(hits[1].id, "id2");
    }

    #[test]
    fn test_parse_hits_empty_output() {
        assert!(parse_hits("").is_empty());
        assert!(parse_hits("\n\n  \n").is_empty());
    }

    #[test]
    fn test_metadata_decodes_full_object() {
        let raw = r#"{
            "id": "abc123DEF45",
            "title": "A Song",
            "channel": "A Channel",
            "duration": 215,
            "view_count": 1234567,
            "formats": [{"format_id": "251"}],
            "uploader": "ignored"
        }"#;
        let m: TrackMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(m.id, "abc123DEF45");
        assert_eq!(m.title, "A Song");
        assert_eq!(m.channel, "A Channel");
        assert_eq!(m.duration, 215);
        assert_eq!(m.view_count, 1234567);
    }

    #[test]
    fn test_metadata_tolerates_missing_and_null_fields() {
        let raw = r#"{"id": "abc123DEF45", "title": "T", "channel": null, "view_count": null}"#;
        let m: TrackMetadata = serde_json::from_str(raw).unwrap();
        assert_eq!(m.channel, "");
        assert_eq!(m.duration, 0);
        assert_eq!(m.view_count, 0);
    }

    #[test]
    fn test_metadata_rejects_malformed_json() {
        assert!(serde_json::from_str::<TrackMetadata>("not json").is_err());
    }

    #[test]
    fn test_watch_url() {
        assert_eq!(
            watch_url("dQw4w9WgXcQ"),
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ"
        );
    }

    #[tokio::test]
    async fn test_search_spawn_failure() {
        let provider = Provider::new(
            PathBuf::from("/nonexistent/yt-dlp"),
            PathBuf::from("."),
        );
        let err = provider.search("anything", 20).await.unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { tool: "yt-dlp", .. }));
    }

    #[tokio::test]
    async fn test_download_creates_downloads_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let provider = Provider::new(PathBuf::from("/nonexistent/yt-dlp"), dir.clone());
        let err = provider.download("abc123DEF45", "A Song").await.unwrap_err();
        assert!(matches!(err, ProviderError::Spawn { .. }));
        assert!(dir.is_dir());
    }

    #[test]
    fn test_extraction_args_single_vs_playlist_item() {
        let template = Path::new("/music/%(title)s.%(ext)s");
        let single = extraction_args(template, &[], "abc123DEF45");
        assert!(single.contains(&OsString::from("--embed-thumbnail")));
        assert!(single.contains(&OsString::from("--add-metadata")));
        assert!(!single.contains(&OsString::from("--no-warnings")));
        assert_eq!(
            single.last(),
            Some(&OsString::from(
                "https://www.youtube.com/watch?v=abc123DEF45"
            ))
        );
        let audio_format = single
            .iter()
            .position(|a| a == "--audio-format")
            .unwrap();
        assert_eq!(single[audio_format + 1], OsString::from("mp3"));
        let out = single.iter().position(|a| a == "-o").unwrap();
        assert_eq!(single[out + 1], template.as_os_str());

        let item = extraction_args(template, &["--no-warnings"], "abc123DEF45");
        assert!(item.contains(&OsString::from("--no-warnings")));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("yt-dlp");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_empty_output_is_no_results() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_tool(tmp.path(), "#!/bin/sh\nexit 0\n");
        let provider = Provider::new(tool, tmp.path().to_path_buf());
        let err = provider.search("anything", 5).await.unwrap_err();
        assert!(matches!(err, ProviderError::NoResults));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_decodes_tool_output() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_tool(
            tmp.path(),
            "#!/bin/sh\necho 'First|||id1'\necho 'Second|||id2'\n",
        );
        let provider = Provider::new(tool, tmp.path().to_path_buf());
        let hits = provider.search("anything", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].title, "First");
        assert_eq!(hits[1].id, "id2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_empty_playlist_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_tool(tmp.path(), "#!/bin/sh\nexit 0\n");
        let provider = Provider::new(tool, tmp.path().to_path_buf());
        let err = provider.list_playlist("PLabc123").await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyPlaylist));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_failure_carries_stderr_error_line() {
        let tmp = tempfile::tempdir().unwrap();
        let tool = fake_tool(tmp.path(), "#!/bin/sh\necho 'ERROR: boom' >&2\nexit 1\n");
        let provider = Provider::new(tool, tmp.path().to_path_buf());
        let err = provider.search("anything", 5).await.unwrap_err();
        assert_eq!(err.to_string(), "search failed: ERROR: boom");
    }

    #[test]
    fn test_error_display_strings() {
        assert_eq!(ProviderError::NoResults.to_string(), "no results found");
        assert_eq!(
            ProviderError::EmptyPlaylist.to_string(),
            "no items found in playlist"
        );
        assert_eq!(
            ProviderError::Search("boom".into()).to_string(),
            "search failed: boom"
        );
        assert_eq!(
            ProviderError::Download("404".into()).to_string(),
            "download failed: 404"
        );
    }
}
