use rand::RngCore;
use sha2::{Digest, Sha256, Sha512};

/// Length in bytes of the random token behind each epoch id
pub const EPOCH_TOKEN_BYTES: usize = 32;

/// SHA-256 over `data`, hex encoded (64 chars)
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// SHA-512 over `data`, hex encoded (128 chars)
pub fn sha512_hex(data: &[u8]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Draw a fresh hex token from the supplied source
pub fn random_token(rng: &mut dyn RngCore) -> String {
    let mut bytes = [0u8; EPOCH_TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Epoch id binding a random token to the gate potential that admitted it
pub fn epoch_id(token: &str, potential: f64) -> String {
    sha256_hex(format!("{}:{}", token, potential).as_bytes())
}
