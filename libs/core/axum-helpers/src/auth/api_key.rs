use sha2::{Digest, Sha256};

use super::{AuthError, AuthMethod, Caller};

/// Accepts any key whose SHA-256 digest matches a configured key.
///
/// Only digests are held in memory.
#[derive(Clone)]
pub struct ApiKeyVerifier {
    digests: Vec<[u8; 32]>,
}

impl ApiKeyVerifier {
    pub fn new(keys: &[String]) -> Self {
        Self {
            digests: keys.iter().map(|k| digest(k)).collect(),
        }
    }

    pub fn verify(&self, key: &str) -> Result<Caller, AuthError> {
        let presented = digest(key);
        if self.digests.iter().any(|d| constant_time_eq(d, &presented)) {
            Ok(Caller {
                subject: fingerprint(&presented),
                method: AuthMethod::ApiKey,
            })
        } else {
            Err(AuthError::InvalidApiKey)
        }
    }
}

fn digest(key: &str) -> [u8; 32] {
    Sha256::digest(key.as_bytes()).into()
}

/// First 8 hex chars of the digest; safe to log.
fn fingerprint(digest: &[u8; 32]) -> String {
    let hex: String = digest.iter().take(4).map(|b| format!("{b:02x}")).collect();
    format!("key:{hex}")
}

fn constant_time_eq(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
