use crate::application_port::*;
use crate::domain_model::*;
use chrono::DateTime;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireClaims {
    sub: String,
    typ: TokenType,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
    jti: String,
}

/// HS256 JWT encoding of a [`Claim`]. Expiry is deliberately not checked on
/// decode; the validator owns that rule.
pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_audience(&[cfg.audience.clone()]);
        validation.set_issuer(&[cfg.issuer.clone()]);

        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(&cfg.signing_key),
            decoding_key: DecodingKey::from_secret(&cfg.signing_key),
            validation,
            cfg,
        }
    }

    fn from_wire(claims: WireClaims) -> Result<Claim, TokenError> {
        let subject = claims
            .sub
            .parse::<Subject>()
            .map_err(|_| TokenError::Malformed)?;
        let token_id = claims
            .jti
            .parse::<TokenId>()
            .map_err(|_| TokenError::Malformed)?;
        let issued_at = DateTime::from_timestamp(claims.iat, 0).ok_or(TokenError::Malformed)?;
        let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or(TokenError::Malformed)?;

        Ok(Claim {
            subject,
            token_type: claims.typ,
            issued_at,
            expires_at,
            token_id,
        })
    }
}

impl TokenCodec for JwtHs256Codec {
    fn encode(&self, claim: &Claim) -> Result<String, TokenError> {
        let claims = WireClaims {
            sub: claim.subject.to_string(),
            typ: claim.token_type,
            iat: claim.issued_at.timestamp(),
            exp: claim.expires_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: claim.token_id.to_string(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::StoreFailure(format!("jwt encode: {e}")))
    }

    fn decode(&self, token: &str) -> Result<Claim, TokenError> {
        let data = decode::<WireClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| TokenError::Malformed)?;
        Self::from_wire(data.claims)
    }
}
