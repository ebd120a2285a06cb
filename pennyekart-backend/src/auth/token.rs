use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{AdminSession, AuthError};

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies admin session tokens with a server secret.
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size")
    }

    pub fn sign(&self, session: &AdminSession) -> Result<String, serde_json::Error> {
        let claims = serde_json::to_vec(session)?;
        let payload = BASE64_URL.encode(claims);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = hex::encode(mac.finalize().into_bytes());
        Ok(format!("{}.{}", payload, signature))
    }

    /// Check signature and expiry. Revocation is checked by the caller against the store.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AdminSession, AuthError> {
        let (payload, signature) = token.trim().split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = hex::decode(signature).map_err(|_| AuthError::InvalidToken)?;

        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let claims = BASE64_URL.decode(payload).map_err(|_| AuthError::InvalidToken)?;
        let session: AdminSession =
            serde_json::from_slice(&claims).map_err(|_| AuthError::InvalidToken)?;

        if session.is_expired(now) {
            return Err(AuthError::Expired);
        }
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn session(now: DateTime<Utc>, ttl: Duration) -> AdminSession {
        AdminSession {
            session_id: "sess-1".into(),
            admin_id: "admin-1".into(),
            username: "root".into(),
            issued_at: now.timestamp(),
            expires_at: (now + ttl).timestamp(),
        }
    }

    #[test]
    fn test_sign_then_verify() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let now = Utc::now();
        let original = session(now, Duration::hours(24));
        let token = signer.sign(&original).unwrap();
        assert_eq!(signer.verify(&token, now).unwrap(), original);
    }

    #[test]
    fn test_tampered_token_rejected() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let now = Utc::now();
        let token = signer.sign(&session(now, Duration::hours(1))).unwrap();

        let mut forged = session(now, Duration::hours(1));
        forged.username = "intruder".into();
        let forged_payload = BASE64_URL.encode(serde_json::to_vec(&forged).unwrap());
        let signature = token.split_once('.').unwrap().1;
        let tampered = format!("{}.{}", forged_payload, signature);

        assert_eq!(signer.verify(&tampered, now), Err(AuthError::InvalidToken));
        assert_eq!(signer.verify("garbage", now), Err(AuthError::InvalidToken));

        let other = TokenSigner::new(b"other-secret".to_vec());
        assert_eq!(other.verify(&token, now), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = TokenSigner::new(b"secret".to_vec());
        let now = Utc::now();
        let token = signer.sign(&session(now, Duration::minutes(5))).unwrap();
        assert_eq!(
            signer.verify(&token, now + Duration::minutes(6)),
            Err(AuthError::Expired)
        );
    }
}
