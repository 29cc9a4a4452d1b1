pub mod download_attempt;
pub mod file;

pub use download_attempt::{DownloadAttempt, NewDownloadAttempt};
pub use file::{CreateSharedFile, SharedFile, SharedFileResponse};
