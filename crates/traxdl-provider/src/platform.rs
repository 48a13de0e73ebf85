//! Discovery of the external tools traxdl drives, plus the per-user
//! directories it writes to.

use std::path::PathBuf;

use thiserror::Error;

/// A required external tool could not be found anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Required tool '{0}' is not installed. Please install it first")]
pub struct MissingTool(pub &'static str);

/// Absolute paths of the three tools every session needs. ffmpeg is never
/// invoked directly, but yt-dlp needs it for audio extraction, so a missing
/// install is caught up front rather than mid-download.
#[derive(Debug, Clone)]
pub struct ResolvedTools {
    pub yt_dlp: PathBuf,
    pub mpv: PathBuf,
    pub ffmpeg: PathBuf,
}

/// Locate yt-dlp, mpv and ffmpeg, failing on the first one missing.
pub fn check_dependencies() -> Result<ResolvedTools, MissingTool> {
    let yt_dlp = find_yt_dlp_binary().ok_or(MissingTool("yt-dlp"))?;
    let mpv = find_mpv_binary().ok_or(MissingTool("mpv"))?;
    let ffmpeg = find_ffmpeg_binary().ok_or(MissingTool("ffmpeg"))?;
    Ok(ResolvedTools { yt_dlp, mpv, ffmpeg })
}

// ── Binary discovery ─────────────────────────────────────────────────────

fn yt_dlp_binary_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["yt-dlp.exe"]
    } else {
        &["yt-dlp"]
    }
}

fn mpv_binary_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["mpv.exe"]
    } else {
        &["mpv"]
    }
}

fn ffmpeg_binary_names() -> &'static [&'static str] {
    if cfg!(windows) {
        &["ffmpeg.exe"]
    } else {
        &["ffmpeg"]
    }
}

/// Look for one of `names` next to the running executable.
fn find_beside_exe(names: &[&str]) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    for name in names {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Walk the PATH directories for one of `names`.
fn find_on_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in names {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// yt-dlp location: `YT_DLP_PATH` override, then beside the executable,
/// then PATH.
pub fn find_yt_dlp_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("YT_DLP_PATH") {
        let candidate = PathBuf::from(path);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    find_beside_exe(yt_dlp_binary_names()).or_else(|| find_on_path(yt_dlp_binary_names()))
}

/// mpv location: `MPV_PATH` override, then beside the executable, then PATH.
pub fn find_mpv_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("MPV_PATH") {
        let candidate = PathBuf::from(path);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    find_beside_exe(mpv_binary_names()).or_else(|| find_on_path(mpv_binary_names()))
}

/// ffmpeg location: `FFMPEG_PATH` override, then beside the executable,
/// then PATH.
pub fn find_ffmpeg_binary() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("FFMPEG_PATH") {
        let candidate = PathBuf::from(path);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    find_beside_exe(ffmpeg_binary_names()).or_else(|| find_on_path(ffmpeg_binary_names()))
}

// ── Per-user directories ─────────────────────────────────────────────────

/// Data directory for logs and other mutable state.
/// `~/.local/share/traxdl` on unix.
pub fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("traxdl")
}

/// Configuration directory. `~/.config/traxdl` on unix.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("traxdl")
}
