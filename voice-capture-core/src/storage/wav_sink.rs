//! Streaming WAV sink for the fixed capture format.

use std::fs::{self, File};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::config::CaptureFormat;
use crate::models::error::CaptureError;
use crate::processing::conversion::pcm16_bytes;
use crate::storage::wav::{generate_wav_header, WAV_HEADER_SIZE};
use crate::traits::recording_sink::{RecordingSink, SinkReport};

/// Streaming WAV file writer.
///
/// One instance is reused across recordings: `open` writes a fresh file
/// with a placeholder header, `finalize` patches the RIFF/data sizes,
/// flushes, and computes the SHA-256 checksum of the finished file.
pub struct WavSink {
    file: Option<File>,
    path: Option<PathBuf>,
    format: Option<CaptureFormat>,
    total_bytes_written: u64,
}

impl WavSink {
    pub fn new() -> Self {
        Self {
            file: None,
            path: None,
            format: None,
            total_bytes_written: 0,
        }
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        file.write_all(data)
            .map_err(|e| CaptureError::StorageError(format!("write failed: {e}")))?;
        self.total_bytes_written += data.len() as u64;
        Ok(())
    }
}

impl Default for WavSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSink for WavSink {
    fn open(&mut self, path: &Path, format: &CaptureFormat) -> Result<(), CaptureError> {
        if self.file.is_some() {
            return Err(CaptureError::StorageError(
                "sink already has an open file".into(),
            ));
        }
        format.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::StorageError(format!("failed to create directory: {e}"))
            })?;
        }

        let file = File::create(path)
            .map_err(|e| CaptureError::StorageError(format!("failed to create file: {e}")))?;
        self.file = Some(file);
        self.path = Some(path.to_path_buf());
        self.format = Some(*format);
        self.total_bytes_written = 0;

        // Size fields are placeholders until finalize.
        let header = generate_wav_header(format.sample_rate, format.bit_depth, format.channels, 0);
        self.write_raw(&header)
    }

    fn write_frame(&mut self, frame: &[i16]) -> Result<(), CaptureError> {
        self.write_raw(&pcm16_bytes(frame))
    }

    fn finalize(&mut self) -> Result<SinkReport, CaptureError> {
        let mut file = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        let path = self.path.take().unwrap_or_default();
        self.format = None;

        let data_size = self.total_bytes_written - WAV_HEADER_SIZE as u64;

        // Patch RIFF chunk size at offset 4.
        file.seek(SeekFrom::Start(4))
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        let chunk_size = (self.total_bytes_written - 8) as u32;
        file.write_all(&chunk_size.to_le_bytes())
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;

        // Patch data size at offset 40.
        file.seek(SeekFrom::Start(40))
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        file.write_all(&(data_size as u32).to_le_bytes())
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;

        file.flush()
            .map_err(|e| CaptureError::StorageError(e.to_string()))?;
        drop(file);

        let checksum = sha256_file(&path)?;
        let report = SinkReport {
            output_path: path,
            bytes_written: data_size,
            checksum,
        };
        self.total_bytes_written = 0;
        Ok(report)
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

/// Compute the SHA-256 hex digest of a file.
fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {e}")))?;
    let digest = Sha256::digest(&data);
    Ok(hex_encode(&digest))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_file_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("voice_capture_test_{name}"))
    }

    #[test]
    fn writes_patched_wav() {
        let path = temp_file_path("basic.wav");
        let format = CaptureFormat::default();

        let mut sink = WavSink::new();
        sink.open(&path, &format).unwrap();
        assert!(sink.is_open());

        // Two 512-sample frames = 2048 data bytes.
        sink.write_frame(&vec![0i16; 512]).unwrap();
        sink.write_frame(&vec![100i16; 512]).unwrap();

        let report = sink.finalize().unwrap();
        assert!(!sink.is_open());
        assert_eq!(report.bytes_written, 2048);
        assert_eq!(report.output_path, path);
        assert_eq!(report.checksum.len(), 64);

        let file_data = fs::read(&path).unwrap();
        assert_eq!(file_data.len(), 44 + 2048);
        assert_eq!(&file_data[0..4], b"RIFF");
        assert_eq!(&file_data[8..12], b"WAVE");

        let data_size =
            u32::from_le_bytes([file_data[40], file_data[41], file_data[42], file_data[43]]);
        assert_eq!(data_size, 2048);
        let chunk_size =
            u32::from_le_bytes([file_data[4], file_data[5], file_data[6], file_data[7]]);
        assert_eq!(chunk_size, 36 + 2048);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn checksum_matches_file_contents() {
        let path = temp_file_path("checksum.wav");
        let format = CaptureFormat::default();

        let mut sink = WavSink::new();
        sink.open(&path, &format).unwrap();
        sink.write_frame(&vec![42i16; 512]).unwrap();
        let report = sink.finalize().unwrap();

        assert_eq!(report.checksum, sha256_file(&path).unwrap());

        fs::remove_file(&path).ok();
    }

    #[test]
    fn reusable_across_recordings() {
        let first = temp_file_path("reuse_a.wav");
        let second = temp_file_path("reuse_b.wav");
        let format = CaptureFormat::default();

        let mut sink = WavSink::new();
        sink.open(&first, &format).unwrap();
        sink.write_frame(&vec![1i16; 512]).unwrap();
        sink.finalize().unwrap();

        sink.open(&second, &format).unwrap();
        sink.write_frame(&vec![2i16; 512]).unwrap();
        let report = sink.finalize().unwrap();
        assert_eq!(report.output_path, second);

        fs::remove_file(&first).ok();
        fs::remove_file(&second).ok();
    }

    #[test]
    fn write_without_open_fails() {
        let mut sink = WavSink::new();
        assert!(matches!(
            sink.write_frame(&[0i16; 512]),
            Err(CaptureError::StorageError(_))
        ));
        assert!(matches!(
            sink.finalize(),
            Err(CaptureError::StorageError(_))
        ));
    }

    #[test]
    fn double_open_fails() {
        let path = temp_file_path("double_open.wav");
        let format = CaptureFormat::default();

        let mut sink = WavSink::new();
        sink.open(&path, &format).unwrap();
        assert!(sink.open(&path, &format).is_err());
        sink.finalize().unwrap();

        fs::remove_file(&path).ok();
    }

    #[test]
    fn rejects_invalid_format() {
        let path = temp_file_path("bad_format.wav");
        let format = CaptureFormat {
            channels: 2,
            ..Default::default()
        };
        let mut sink = WavSink::new();
        assert!(sink.open(&path, &format).is_err());
        assert!(!sink.is_open());
    }
}
