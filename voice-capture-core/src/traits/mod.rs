pub mod capture_provider;
pub mod classifier;
pub mod recording_sink;
pub mod session_delegate;
