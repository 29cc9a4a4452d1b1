pub mod downloads;
pub mod files;
pub mod health;
