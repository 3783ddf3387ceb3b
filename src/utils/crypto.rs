use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Internal(format!("invalid signing key: {}", e)))?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

pub fn verify_signature(secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    match hex::decode(signature) {
        Ok(raw) => mac.verify_slice(&raw).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_verifies_only_for_same_body() {
        let sig = sign_payload("s3cret", br#"{"topic":"a"}"#).unwrap();
        assert_eq!(sig.len(), 64);
        assert!(verify_signature("s3cret", br#"{"topic":"a"}"#, &sig));
        assert!(!verify_signature("s3cret", br#"{"topic":"b"}"#, &sig));
        assert!(!verify_signature("other", br#"{"topic":"a"}"#, &sig));
    }
}
