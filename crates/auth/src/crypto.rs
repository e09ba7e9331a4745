use super::Claims;

const ACCESS_TOKEN_DURATION: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// JWT signing and verification keys.
pub struct Crypto {
    encoding: jsonwebtoken::EncodingKey,
    decoding: jsonwebtoken::DecodingKey,
}

impl Crypto {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: jsonwebtoken::EncodingKey::from_secret(secret),
            decoding: jsonwebtoken::DecodingKey::from_secret(secret),
        }
    }
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("JWT_SECRET")
                .unwrap_or_else(|_| String::default())
                .as_bytes(),
        )
    }
    pub fn encode(&self, claims: &Claims) -> Result<String, jsonwebtoken::errors::Error> {
        jsonwebtoken::encode(&jsonwebtoken::Header::default(), claims, &self.encoding)
    }
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &jsonwebtoken::Validation::default())
            .map(|data| data.claims)
    }
    pub fn hash(token: &str) -> Vec<u8> {
        use sha2::Digest;
        sha2::Sha256::digest(token.as_bytes()).to_vec()
    }
    pub const fn duration() -> std::time::Duration {
        ACCESS_TOKEN_DURATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbt_core::ID;

    #[test]
    fn encode_decode_roundtrip() {
        let crypto = Crypto::new(b"test-secret");
        let claims = Claims::new(ID::default(), ID::default(), "magnus".to_string());
        let token = crypto.encode(&claims).unwrap();
        let decoded = crypto.decode(&token).unwrap();
        assert_eq!(decoded.user(), claims.user());
        assert_eq!(decoded.username(), "magnus");
        assert!(!decoded.expired());
    }

    #[test]
    fn wrong_secret_rejected() {
        let crypto = Crypto::new(b"secret-a");
        let other = Crypto::new(b"secret-b");
        let claims = Claims::new(ID::default(), ID::default(), "magnus".to_string());
        let token = crypto.encode(&claims).unwrap();
        assert!(other.decode(&token).is_err());
    }
}
