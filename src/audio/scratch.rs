//! # Scratch Audio Files
//!
//! A learner's recording is written to a temporary WAV file for the length of
//! one attempt, so transcription and pronunciation assessment read the same
//! canonical file. The file is owned by a [`ScratchAudio`] value and deleted
//! when that value is dropped: after success, after a service error, and
//! when the handler returns early.

use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// A temporary WAV file that is removed on drop.
#[derive(Debug)]
pub struct ScratchAudio {
    file: NamedTempFile,
}

impl ScratchAudio {
    /// Write `wav` to a new temp file, in `dir` if given, otherwise the system temp dir.
    pub fn stage(dir: Option<&Path>, wav: &[u8]) -> io::Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("attempt-").suffix(".wav");

        let mut file = match dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        file.write_all(wav)?;
        file.flush()?;

        debug!(path = %file.path().display(), bytes = wav.len(), "Staged scratch audio");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Read the staged WAV back.
    pub async fn read(&self) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path()).await
    }
}
