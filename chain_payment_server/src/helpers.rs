use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Calculates the HMAC-SHA256 of `data` under `key`, base64 encoded.
pub fn calculate_hmac(key: &str, data: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC can take a key of any size"),
    };
    mac.update(data);
    base64::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hmac_sha256() {
        // RFC 4231, test case 2
        let sig = calculate_hmac("Jefe", b"what do ya want for nothing?");
        assert_eq!(sig, "W9zBRr9gdU5qBCQmCJV1x1oAPwidJzmDnexYuWTsOEM=");
    }

    #[test]
    fn empty_key() {
        let a = calculate_hmac("", b"{}");
        let b = calculate_hmac("", b"{}");
        assert_eq!(a, b);
        assert_ne!(a, calculate_hmac("k", b"{}"));
    }
}
