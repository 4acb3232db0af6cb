//! Frame amplitude computation.
//!
//! Pure math over `&[i16]` frames with no platform dependencies. The
//! session's capture writer and the VAD loop both report levels through
//! this one function so the meter sees a single scale.

pub use crate::models::events::DB_FLOOR;

/// Compute the RMS level of a PCM frame in dBFS.
///
/// Each sample is normalized by the maximum representable magnitude
/// (32768), the RMS is taken over the frame, and the result is converted
/// via `20·log10(rms)` and clamped to `[-160.0, 0.0]`.
///
/// An empty or all-zero frame yields exactly `-160.0`. The result is never
/// NaN or infinite.
pub fn compute_db(frame: &[i16]) -> f32 {
    if frame.is_empty() {
        return DB_FLOOR;
    }
    let sum_sq: f64 = frame
        .iter()
        .map(|&s| {
            let normalized = f64::from(s) / 32_768.0;
            normalized * normalized
        })
        .sum();
    let rms = (sum_sq / frame.len() as f64).sqrt();
    if rms <= 0.0 {
        return DB_FLOOR;
    }
    (20.0 * rms.log10()).clamp(f64::from(DB_FLOOR), 0.0) as f32
}
