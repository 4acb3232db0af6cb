use std::path::{Path, PathBuf};

use crate::models::config::CaptureFormat;
use crate::models::error::CaptureError;

/// What a sink produced once finalized.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkReport {
    pub output_path: PathBuf,
    /// Payload bytes written, excluding any container header.
    pub bytes_written: u64,
    /// SHA-256 hex digest of the finished file.
    pub checksum: String,
}

/// Destination for captured PCM frames.
///
/// One sink instance is reused across recordings: `open` starts a fresh
/// output, `finalize` completes it. The container format behind the sink is
/// a collaborator detail; the session only streams frames into it.
pub trait RecordingSink: Send {
    fn open(&mut self, path: &Path, format: &CaptureFormat) -> Result<(), CaptureError>;

    fn write_frame(&mut self, frame: &[i16]) -> Result<(), CaptureError>;

    /// Complete the current output and return what was written.
    fn finalize(&mut self) -> Result<SinkReport, CaptureError>;

    fn is_open(&self) -> bool;
}
