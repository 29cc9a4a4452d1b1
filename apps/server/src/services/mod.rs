pub mod download_limit;
pub mod file;

pub use download_limit::{
    AttemptRecorder, DownloadGate, DownloadPolicy, FailurePolicy, GateError, LimitCheck,
};
pub use file::FileService;
