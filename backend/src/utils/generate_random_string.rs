use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Generates an opaque URL-safe token from `num_bytes` random bytes.
///
/// 32 bytes yields a 43 character token that can be embedded in a query string
/// without escaping.
pub fn generate_url_token(num_bytes: usize) -> String {
    let mut bytes = vec![0u8; num_bytes];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
