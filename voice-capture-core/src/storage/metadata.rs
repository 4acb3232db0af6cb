use std::fs;
use std::path::Path;

use crate::models::error::CaptureError;
use crate::models::recording_result::RecordingMetadata;

/// Write recording metadata as a JSON sidecar file.
///
/// Creates `{recording}.metadata.json` alongside the recording.
pub fn write_sidecar(metadata: &RecordingMetadata, recording_path: &Path) -> Result<(), CaptureError> {
    let sidecar_path = recording_path.with_extension("metadata.json");
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {e}")))?;
    fs::write(&sidecar_path, json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {e}")))?;
    Ok(())
}

/// Read recording metadata back from its JSON sidecar file.
pub fn read_sidecar(recording_path: &Path) -> Result<RecordingMetadata, CaptureError> {
    let sidecar_path = recording_path.with_extension("metadata.json");
    let json = fs::read_to_string(&sidecar_path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {e}")))?;
    serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::config::CaptureFormat;

    #[test]
    fn sidecar_roundtrip() {
        let dir = std::env::temp_dir();
        let recording = dir.join("voice_capture_meta_test.wav");
        let metadata =
            RecordingMetadata::new(2.5, &recording.to_string_lossy(), "cafe", &CaptureFormat::default());

        write_sidecar(&metadata, &recording).unwrap();
        let back = read_sidecar(&recording).unwrap();
        assert_eq!(metadata, back);

        fs::remove_file(recording.with_extension("metadata.json")).ok();
    }

    #[test]
    fn missing_sidecar_is_storage_error() {
        let missing = std::env::temp_dir().join("voice_capture_meta_missing.wav");
        assert!(matches!(
            read_sidecar(&missing),
            Err(CaptureError::StorageError(_))
        ));
    }
}
