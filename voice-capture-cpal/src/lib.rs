//! # voice-capture-cpal
//!
//! cpal microphone backend for voice-capture-kit.
//!
//! Provides `CpalMicProvider`, an implementation of the core's
//! `CaptureProvider` trait on top of cpal's cross-platform audio input.
//! Each opened `FrameSource` owns a dedicated stream thread and converts
//! whatever the device delivers into the core's fixed 16 kHz mono
//! 16-bit frames.
//!
//! ## Usage
//! ```ignore
//! use voice_capture_core::{RecordingSession, SessionConfig, WavSink, EnergyClassifier};
//! use voice_capture_cpal::CpalMicProvider;
//!
//! let provider = CpalMicProvider::default_device();
//! let session = RecordingSession::new(
//!     provider,
//!     WavSink::new(),
//!     Box::new(EnergyClassifier::default()),
//!     delegate,
//!     SessionConfig::default(),
//! )?;
//! ```

pub mod cpal_mic;

pub use cpal_mic::{list_input_devices, CpalMicProvider};
