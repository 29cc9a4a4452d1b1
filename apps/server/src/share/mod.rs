pub mod naming;
pub mod token;

pub use naming::storage_filename;
pub use token::{generate_share_token, is_valid_share_token};
