pub mod audio_helper;
pub mod device_catalog;
pub mod output_backend;
pub mod process_attacher;
pub mod session_observer;
