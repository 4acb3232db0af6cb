use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::config::CaptureFormat;

/// Result returned when a recording session stops successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingResult {
    pub file_path: PathBuf,
    pub duration_secs: f64,
    pub metadata: RecordingMetadata,
    pub checksum: String,
}

/// Metadata stored alongside a recording.
///
/// Serializable for the JSON sidecar written next to the output file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingMetadata {
    pub id: String,
    pub duration_secs: f64,
    pub file_path: String,
    pub checksum: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub created_at: String,
}

impl RecordingMetadata {
    pub fn new(
        duration_secs: f64,
        file_path: &str,
        checksum: &str,
        format: &CaptureFormat,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            duration_secs,
            file_path: file_path.to_string(),
            checksum: checksum.to_string(),
            sample_rate: format.sample_rate,
            channels: format.channels,
            bit_depth: format.bit_depth,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_roundtrips_through_json() {
        let meta = RecordingMetadata::new(1.5, "/tmp/r.wav", "abc123", &CaptureFormat::default());
        let json = serde_json::to_string(&meta).unwrap();
        let back: RecordingMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(meta, back);
        assert_eq!(back.sample_rate, 16_000);
        assert_eq!(back.channels, 1);
    }

    #[test]
    fn metadata_ids_are_unique() {
        let format = CaptureFormat::default();
        let a = RecordingMetadata::new(0.0, "a.wav", "x", &format);
        let b = RecordingMetadata::new(0.0, "b.wav", "x", &format);
        assert_ne!(a.id, b.id);
    }
}
