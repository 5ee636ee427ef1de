use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use p256::SecretKey;
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand_core::OsRng;
use web_push::VapidSignatureBuilder;

/// The server's VAPID signing identity.
#[derive(Clone)]
pub struct VapidKeys {
    /// URL-safe base64 encoded uncompressed P-256 public key, as
    /// expected by `PushManager.subscribe` on the client.
    pub public_key: String,
    /// URL-safe base64 encoded raw private scalar
    pub private_key: String,
    /// Contact claim, e.g. `mailto:ops@example.com`
    pub subject: String,
}

impl std::fmt::Debug for VapidKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VapidKeys")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("subject", &self.subject)
            .finish()
    }
}

impl VapidKeys {
    /// Build the key pair, deriving the public key from the private key
    /// when it is not supplied.
    pub fn new(private_key: &str, public_key: Option<&str>, subject: &str) -> Result<Self> {
        let private_key = private_key.trim().trim_end_matches('=').to_string();
        if private_key.is_empty() {
            return Err(anyhow!("VAPID private key is empty"));
        }

        let public_key = match public_key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => key.trim_end_matches('=').to_string(),
            None => derive_public_key(&private_key)?,
        };

        Ok(Self {
            public_key,
            private_key,
            subject: normalize_subject(subject),
        })
    }
}

pub fn derive_public_key(private_key: &str) -> Result<String> {
    let partial =
        VapidSignatureBuilder::from_base64_no_sub(private_key, web_push::URL_SAFE_NO_PAD)
            .context("Invalid VAPID private key")?;
    Ok(URL_SAFE_NO_PAD.encode(partial.get_public_key()))
}

/// Create a new P-256 key pair, returned as `(private_key, public_key)`
/// in URL-safe base64 without padding.
pub fn generate_key_pair() -> (String, String) {
    let secret = SecretKey::random(&mut OsRng);
    let public = secret.public_key().to_encoded_point(false);
    (
        URL_SAFE_NO_PAD.encode(secret.to_bytes()),
        URL_SAFE_NO_PAD.encode(public.as_bytes()),
    )
}

/// Push services require the subject to be a `mailto:` or `https:` URI.
fn normalize_subject(subject: &str) -> String {
    let subject = subject.trim();
    if subject.starts_with("mailto:") || subject.starts_with("https:") {
        subject.to_string()
    } else {
        format!("mailto:{}", subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::decode_application_server_key;

    // Private scalar 1, whose public key is the curve generator
    const PRIVATE_KEY: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAE";
    const GENERATOR: &str =
        "BGsX0fLhLEJH-Lzm5WOkQPJ3A32BLeszoPShOUXYmMKWT-NC4v4af5uO5-tKfA-eFivOM1drMV7Oy7ZAaDe_UfU";

    #[test]
    fn it_derives_public_key_from_private_key() {
        let keys = VapidKeys::new(PRIVATE_KEY, None, "ops@example.com").unwrap();
        assert_eq!(keys.public_key, GENERATOR);
        let bytes = decode_application_server_key(&keys.public_key).unwrap();
        assert_eq!(bytes.len(), 65);
        assert_eq!(bytes[0], 0x04);
    }

    #[test]
    fn it_rejects_malformed_private_key() {
        assert!(derive_public_key("not-a-key").is_err());
    }

    #[test]
    fn it_generates_a_usable_key_pair() {
        let (private_key, public_key) = generate_key_pair();
        assert_eq!(private_key.len(), 43);
        assert!(decode_application_server_key(&public_key).is_ok());

        // The public half is the one derived from the private half
        let keys = VapidKeys::new(&private_key, None, "ops@example.com").unwrap();
        assert_eq!(keys.public_key, public_key);
        assert_ne!(generate_key_pair().0, private_key);
    }

    #[test]
    fn it_prefixes_bare_email_subject() {
        assert_eq!(normalize_subject("ops@example.com"), "mailto:ops@example.com");
        assert_eq!(
            normalize_subject("mailto:ops@example.com"),
            "mailto:ops@example.com"
        );
        assert_eq!(
            normalize_subject("https://example.com"),
            "https://example.com"
        );
    }

    #[test]
    fn it_uses_supplied_public_key() {
        let keys = VapidKeys::new("private", Some("public=="), "ops@example.com").unwrap();
        assert_eq!(keys.public_key, "public");
        assert_eq!(keys.subject, "mailto:ops@example.com");
    }

    #[test]
    fn it_rejects_empty_private_key() {
        assert!(VapidKeys::new("  ", Some("public"), "ops@example.com").is_err());
    }

    #[test]
    fn it_redacts_private_key_in_debug() {
        let keys = VapidKeys::new("secret", Some("public"), "ops@example.com").unwrap();
        assert!(!format!("{:?}", keys).contains("secret"));
    }
}
