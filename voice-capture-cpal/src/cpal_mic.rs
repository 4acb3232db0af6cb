//! cpal microphone capture provider.
//!
//! cpal delivers samples via a callback on its own audio thread, and its
//! `Stream` handle is not `Send`. Each opened source therefore spawns a
//! dedicated thread that owns the stream for its whole lifetime; the
//! `FrameSource` half communicates with it over channels: PCM chunks flow
//! out through a bounded data channel, pause/resume/shutdown commands flow
//! in through a command channel.

use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::SampleFormat;

use voice_capture_core::models::config::CaptureFormat;
use voice_capture_core::models::device::DeviceInfo;
use voice_capture_core::models::error::CaptureError;
use voice_capture_core::processing::conversion::{downmix_to_mono, f32_to_i16, resample_linear};
use voice_capture_core::processing::ring_buffer::RingBuffer;
use voice_capture_core::traits::capture_provider::{CaptureProvider, FrameSource};

/// Chunks buffered between the audio callback and the frame reader.
const CHANNEL_CAPACITY: usize = 64;

/// Samples held by the reader while assembling frames (1 s at 16 kHz).
const RING_CAPACITY: usize = 16_000;

/// How long `read_frame` waits for the next chunk before reporting a
/// read error. Well above the 32 ms frame cadence.
const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// How long `open` waits for the stream thread to come up.
const OPEN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamCommand {
    Pause,
    Resume,
    Shutdown,
}

/// List microphone names so callers can expose a device selector.
pub fn list_input_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    if let Ok(devices) = host.input_devices() {
        for device in devices {
            if let Ok(name) = device.name() {
                names.push(name);
            }
        }
    }
    names
}

/// Microphone capture provider backed by cpal.
///
/// `open` can be called more than once; every source gets its own stream,
/// so the session's primary capture path and the VAD loop never share a
/// device handle.
pub struct CpalMicProvider {
    preferred_device: Option<String>,
}

impl CpalMicProvider {
    /// Provider for the system default input device.
    pub fn default_device() -> Self {
        Self {
            preferred_device: None,
        }
    }

    /// Provider pinned to a specific input device by name.
    pub fn with_device(name: impl Into<String>) -> Self {
        Self {
            preferred_device: Some(name.into()),
        }
    }
}

impl CaptureProvider for CpalMicProvider {
    fn is_available(&self) -> bool {
        let host = cpal::default_host();
        match &self.preferred_device {
            Some(name) => host
                .input_devices()
                .map(|mut devices| {
                    devices.any(|d| d.name().map(|n| &n == name).unwrap_or(false))
                })
                .unwrap_or(false),
            None => host.default_input_device().is_some(),
        }
    }

    fn open(&self, format: &CaptureFormat) -> Result<Box<dyn FrameSource>, CaptureError> {
        format.validate()?;
        let target_rate = f64::from(format.sample_rate);

        let (cmd_tx, cmd_rx) = unbounded::<StreamCommand>();
        let (data_tx, data_rx) = bounded::<Vec<i16>>(CHANNEL_CAPACITY);
        let (ready_tx, ready_rx) = bounded::<Result<(), CaptureError>>(1);
        let preferred = self.preferred_device.clone();

        thread::Builder::new()
            .name("cpal-capture".into())
            .spawn(move || {
                let stream = match build_stream(preferred.as_deref(), target_rate, data_tx) {
                    Ok(stream) => {
                        let _ = ready_tx.send(Ok(()));
                        stream
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };

                // The stream lives on this thread until shutdown (or until
                // the source drops its command sender).
                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        StreamCommand::Pause => {
                            if let Err(e) = stream.pause() {
                                log::warn!("failed to pause cpal stream: {e}");
                            }
                        }
                        StreamCommand::Resume => {
                            if let Err(e) = stream.play() {
                                log::warn!("failed to resume cpal stream: {e}");
                            }
                        }
                        StreamCommand::Shutdown => break,
                    }
                }
                drop(stream);
            })
            .map_err(|e| {
                CaptureError::DeviceInitFailed(format!("failed to spawn capture thread: {e}"))
            })?;

        match ready_rx.recv_timeout(OPEN_TIMEOUT) {
            Ok(Ok(())) => Ok(Box::new(CpalFrameSource {
                cmd_tx,
                data_rx,
                pending: RingBuffer::new(RING_CAPACITY),
            })),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(CaptureError::DeviceInitFailed(
                "timed out waiting for capture stream".into(),
            )),
        }
    }

    fn device_info(&self) -> DeviceInfo {
        match &self.preferred_device {
            Some(name) => DeviceInfo {
                id: name.clone(),
                name: name.clone(),
                is_default: false,
            },
            None => {
                let name = cpal::default_host()
                    .default_input_device()
                    .and_then(|d| d.name().ok())
                    .unwrap_or_else(|| "Default Input".to_string());
                DeviceInfo {
                    id: "default-input".into(),
                    name,
                    is_default: true,
                }
            }
        }
    }
}

/// Blocking frame reader over the chunks produced by the stream thread.
struct CpalFrameSource {
    cmd_tx: Sender<StreamCommand>,
    data_rx: Receiver<Vec<i16>>,
    pending: RingBuffer,
}

impl FrameSource for CpalFrameSource {
    fn read_frame(&mut self, frame: &mut [i16]) -> Result<usize, CaptureError> {
        while self.pending.count() < frame.len() {
            match self.data_rx.recv_timeout(READ_TIMEOUT) {
                Ok(chunk) => self.pending.write(&chunk),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(CaptureError::ReadError(
                        "timed out waiting for audio data".into(),
                    ))
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::ReadError("capture stream closed".into()))
                }
            }
        }
        Ok(self.pending.read_into(frame))
    }

    fn pause(&mut self) -> Result<(), CaptureError> {
        self.cmd_tx
            .send(StreamCommand::Pause)
            .map_err(|_| CaptureError::ReadError("capture stream thread exited".into()))
    }

    fn resume(&mut self) -> Result<(), CaptureError> {
        self.cmd_tx
            .send(StreamCommand::Resume)
            .map_err(|_| CaptureError::ReadError("capture stream thread exited".into()))
    }
}

impl Drop for CpalFrameSource {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(StreamCommand::Shutdown);
    }
}

/// Build and start an input stream that forwards 16 kHz mono i16 chunks.
///
/// Every supported device format is converted to f32 up front so the
/// downmix/resample path stays format-agnostic.
fn build_stream(
    preferred: Option<&str>,
    target_rate: f64,
    data_tx: Sender<Vec<i16>>,
) -> Result<cpal::Stream, CaptureError> {
    let host = cpal::default_host();

    let device = match preferred {
        Some(name) => host
            .input_devices()
            .map_err(|e| CaptureError::DeviceInitFailed(format!("no input devices: {e}")))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| {
                CaptureError::DeviceInitFailed(format!("input device '{name}' not found"))
            })?,
        None => host
            .default_input_device()
            .ok_or(CaptureError::PermissionDenied)?,
    };

    let default_config = device
        .default_input_config()
        .map_err(|e| CaptureError::DeviceInitFailed(format!("no default input config: {e}")))?;
    let sample_format = default_config.sample_format();
    let stream_config: cpal::StreamConfig = default_config.into();
    let device_rate = f64::from(stream_config.sample_rate.0);
    let channels = usize::from(stream_config.channels.max(1));

    log::debug!(
        "cpal input: format={sample_format:?} rate={device_rate} Hz channels={channels}"
    );

    let err_fn = |err| log::warn!("audio stream error: {err}");

    let stream = match sample_format {
        SampleFormat::F32 => {
            let tx = data_tx;
            device.build_input_stream(
                &stream_config,
                move |data: &[f32], _| forward_chunk(data, channels, device_rate, target_rate, &tx),
                err_fn,
                None,
            )
        }
        SampleFormat::I16 => {
            let tx = data_tx;
            device.build_input_stream(
                &stream_config,
                move |data: &[i16], _| {
                    let floats: Vec<f32> =
                        data.iter().map(|&s| f32::from(s) / 32_768.0).collect();
                    forward_chunk(&floats, channels, device_rate, target_rate, &tx)
                },
                err_fn,
                None,
            )
        }
        SampleFormat::U16 => {
            let tx = data_tx;
            device.build_input_stream(
                &stream_config,
                move |data: &[u16], _| {
                    let floats: Vec<f32> = data
                        .iter()
                        .map(|&s| (f32::from(s) - 32_768.0) / 32_768.0)
                        .collect();
                    forward_chunk(&floats, channels, device_rate, target_rate, &tx)
                },
                err_fn,
                None,
            )
        }
        other => {
            return Err(CaptureError::DeviceInitFailed(format!(
                "unsupported sample format: {other:?}"
            )))
        }
    }
    .map_err(|e| CaptureError::DeviceInitFailed(format!("failed to build input stream: {e}")))?;

    stream
        .play()
        .map_err(|e| CaptureError::DeviceInitFailed(format!("failed to start stream: {e}")))?;

    Ok(stream)
}

/// Callback-side conversion: downmix → resample → i16, then hand off.
///
/// Runs on the audio thread; a full channel drops the chunk rather than
/// blocking.
fn forward_chunk(
    samples: &[f32],
    channels: usize,
    device_rate: f64,
    target_rate: f64,
    tx: &Sender<Vec<i16>>,
) {
    let mono = downmix_to_mono(samples, channels);
    let resampled = resample_linear(&mono, device_rate, target_rate);
    let pcm = f32_to_i16(&resampled);
    if tx.try_send(pcm).is_err() {
        log::trace!("capture channel full, dropping chunk");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_source() -> (CpalFrameSource, Sender<Vec<i16>>, Receiver<StreamCommand>) {
        let (cmd_tx, cmd_rx) = unbounded();
        let (data_tx, data_rx) = bounded(CHANNEL_CAPACITY);
        let source = CpalFrameSource {
            cmd_tx,
            data_rx,
            pending: RingBuffer::new(RING_CAPACITY),
        };
        (source, data_tx, cmd_rx)
    }

    #[test]
    fn assembles_frames_across_chunks() {
        let (mut source, data_tx, _cmd_rx) = test_source();
        data_tx.send(vec![1i16; 300]).unwrap();
        data_tx.send(vec![2i16; 300]).unwrap();

        let mut frame = [0i16; 512];
        assert_eq!(source.read_frame(&mut frame).unwrap(), 512);
        assert_eq!(frame[0], 1);
        assert_eq!(frame[299], 1);
        assert_eq!(frame[300], 2);
        assert_eq!(frame[511], 2);
        // Leftover samples stay buffered for the next frame.
        assert_eq!(source.pending.count(), 88);
    }

    #[test]
    fn disconnected_stream_is_read_error() {
        let (mut source, data_tx, _cmd_rx) = test_source();
        drop(data_tx);

        let mut frame = [0i16; 512];
        assert!(matches!(
            source.read_frame(&mut frame),
            Err(CaptureError::ReadError(_))
        ));
    }

    #[test]
    fn pause_resume_send_stream_commands() {
        let (mut source, _data_tx, cmd_rx) = test_source();
        source.pause().unwrap();
        source.resume().unwrap();
        assert_eq!(cmd_rx.try_recv().unwrap(), StreamCommand::Pause);
        assert_eq!(cmd_rx.try_recv().unwrap(), StreamCommand::Resume);
    }

    #[test]
    fn drop_requests_shutdown() {
        let (source, _data_tx, cmd_rx) = test_source();
        drop(source);
        assert_eq!(cmd_rx.try_recv().unwrap(), StreamCommand::Shutdown);
    }

    #[test]
    fn pause_after_thread_exit_is_read_error() {
        let (mut source, _data_tx, cmd_rx) = test_source();
        drop(cmd_rx);
        assert!(matches!(
            source.pause(),
            Err(CaptureError::ReadError(_))
        ));
    }

    #[test]
    fn provider_rejects_invalid_format() {
        let provider = CpalMicProvider::default_device();
        let format = CaptureFormat {
            sample_rate: 44_100,
            ..Default::default()
        };
        assert!(provider.open(&format).is_err());
    }

    #[test]
    fn pinned_provider_reports_its_device() {
        let provider = CpalMicProvider::with_device("USB Microphone");
        let info = provider.device_info();
        assert_eq!(info.name, "USB Microphone");
        assert!(!info.is_default);
    }
}
