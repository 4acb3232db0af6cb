use crate::models::config::CaptureFormat;
use crate::models::device::DeviceInfo;
use crate::models::error::CaptureError;

/// A stream of fixed-size PCM frames from one opened capture consumer.
///
/// Each opened source is an independent consumer: the session's primary
/// capture path and the VAD loop each hold their own, because some
/// platforms cannot share one capture device across two readers. Dropping
/// the source releases its underlying device resources.
pub trait FrameSource: Send {
    /// Read up to `frame.len()` samples, blocking until a full frame is
    /// available or the source fails.
    ///
    /// Returns the number of samples written into `frame`. A return shorter
    /// than the requested frame is a short read; callers treat it the same
    /// way as an `Err`.
    fn read_frame(&mut self, frame: &mut [i16]) -> Result<usize, CaptureError>;

    /// Pause the underlying stream without releasing the device.
    fn pause(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    /// Resume a paused stream.
    fn resume(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }
}

/// Factory for platform capture sources.
///
/// Implemented once per platform backend (e.g. the cpal microphone
/// backend); the session and VAD loop are written once against this
/// interface.
pub trait CaptureProvider: Send + Sync {
    /// Whether the capture capability is currently available.
    fn is_available(&self) -> bool;

    /// Open a new frame source at the given format.
    ///
    /// Called once for the session's primary capture path and again for
    /// the VAD loop's dedicated source.
    fn open(&self, format: &CaptureFormat) -> Result<Box<dyn FrameSource>, CaptureError>;

    /// Information about the device backing this provider.
    fn device_info(&self) -> DeviceInfo;
}
