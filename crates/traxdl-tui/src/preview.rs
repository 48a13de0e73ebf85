//! Best-effort audio preview through a background player process.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

use traxdl_provider::provider::watch_url;

/// Owns at most one live playback process. `kill_on_drop` covers every exit
/// path that would otherwise strand the child, including fatal errors that
/// unwind the whole app.
pub struct PreviewController {
    program: PathBuf,
    session: Option<Child>,
}

impl PreviewController {
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            session: None,
        }
    }

    pub fn active(&self) -> bool {
        self.session.is_some()
    }

    /// Spawn playback for `video_id` and return immediately. Spawn failures
    /// are logged and swallowed; preview is a convenience, not a correctness
    /// path. A live session keeps playing and the call is ignored.
    pub fn start(&mut self, video_id: &str) {
        if self.session.is_some() {
            warn!("preview already running, ignoring start for {}", video_id);
            return;
        }
        let spawned = Command::new(&self.program)
            .arg("--no-video")
            .arg("--really-quiet")
            .arg("--ytdl-format=bestaudio")
            .arg(watch_url(video_id))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        match spawned {
            Ok(child) => {
                debug!("preview started for {} (pid {:?})", video_id, child.id());
                self.session = Some(child);
            }
            Err(e) => warn!("failed to start preview: {}", e),
        }
    }

    /// Terminate the live session, if any. Stopping with nothing playing is
    /// a no-op; kill errors are swallowed.
    pub fn stop(&mut self) {
        if let Some(mut child) = self.session.take() {
            if let Err(e) = child.start_kill() {
                debug!("preview kill failed: {}", e);
            }
        }
    }
}
