//! Voice-activity detection: event policy, the classification loop, and
//! classifier backends.

pub mod energy;
pub mod policy;
pub(crate) mod task;

#[cfg(feature = "vad_earshot")]
pub mod earshot;

#[cfg(feature = "vad_silero")]
pub mod silero;
