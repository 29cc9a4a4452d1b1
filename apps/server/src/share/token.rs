use rand::Rng;

/// Length of a share token in hex chars
pub const SHARE_TOKEN_LEN: usize = 32;

/// Generates a random 32-character hex share token
pub fn generate_share_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SHARE_TOKEN_LEN / 2] = rng.random();
    hex::encode(bytes)
}

/// Cheap format check so obviously bogus tokens never reach the database
pub fn is_valid_share_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= 64
        && token.chars().all(|c| c.is_ascii_alphanumeric())
}
