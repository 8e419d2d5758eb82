use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use crate::claims::{SessionClaims, TokenValidationError, validate_claims};

#[derive(Debug, Error)]
pub enum SessionTokenError {
    /// Malformed token or bad signature.
    #[error("invalid session token")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Claims(#[from] TokenValidationError),
}

/// Verifies a bearer token into [`SessionClaims`].
pub trait SessionValidator: Send + Sync {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, SessionTokenError>;
}

/// HS256-signed session tokens, shared-secret with the identity provider.
pub struct Hs256SessionValidator {
    decoding: DecodingKey,
    validation: Validation,
}

impl Hs256SessionValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time-window checks run against the RFC3339 claims in
        // `validate_claims`, not against numeric exp/iat registered claims.
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Self {
            decoding: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl SessionValidator for Hs256SessionValidator {
    fn validate(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, SessionTokenError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)?;
        validate_claims(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::SessionUserId;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn mint(secret: &str, claims: &SessionClaims) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn fresh_claims() -> SessionClaims {
        let now = Utc::now();
        SessionClaims {
            sub: SessionUserId::new(),
            issued_at: now - Duration::minutes(1),
            expires_at: now + Duration::minutes(10),
        }
    }

    #[test]
    fn accepts_a_valid_token() {
        let claims = fresh_claims();
        let token = mint("secret", &claims);

        let validator = Hs256SessionValidator::new("secret");
        let decoded = validator.validate(&token, Utc::now()).unwrap();
        assert_eq!(decoded.sub, claims.sub);
    }

    #[test]
    fn rejects_a_token_signed_with_another_secret() {
        let token = mint("other-secret", &fresh_claims());

        let validator = Hs256SessionValidator::new("secret");
        let err = validator.validate(&token, Utc::now()).unwrap_err();
        assert!(matches!(err, SessionTokenError::Invalid(_)));
    }

    #[test]
    fn rejects_an_expired_token() {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: SessionUserId::new(),
            issued_at: now - Duration::minutes(20),
            expires_at: now - Duration::minutes(10),
        };
        let token = mint("secret", &claims);

        let validator = Hs256SessionValidator::new("secret");
        let err = validator.validate(&token, now).unwrap_err();
        assert!(matches!(
            err,
            SessionTokenError::Claims(TokenValidationError::Expired)
        ));
    }

    #[test]
    fn rejects_garbage() {
        let validator = Hs256SessionValidator::new("secret");
        let err = validator.validate("not-a-token", Utc::now()).unwrap_err();
        assert!(matches!(err, SessionTokenError::Invalid(_)));
    }
}
