pub mod audio_device;
pub mod call;
pub mod lock;
pub mod orchestrator;
pub mod state;
pub mod stream;
