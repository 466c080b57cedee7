use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::AuthConfig;
use crate::errors::{Result, SnaplinkError};
use crate::storage::{Account, AccountType};

const ACCESS_TOKEN_TYPE: &str = "access";

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Account id
    pub sub: String,
    pub username: String,
    pub account_type: AccountType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

impl SessionClaims {
    pub fn account_id(&self) -> Result<i64> {
        self.sub
            .parse()
            .map_err(|_| SnaplinkError::token_invalid("Token subject is not an account id"))
    }
}

/// A signed token together with its lifetime
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub lifetime: Duration,
    pub expires_at: DateTime<Utc>,
}

/// JWT Service for generating and validating session tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    registered_minutes: i64,
    guest_minutes: i64,
}

impl JwtService {
    pub fn new(secret: &str, registered_minutes: i64, guest_minutes: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // 过期时间精确到秒，不留宽限
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            registered_minutes: registered_minutes.max(1),
            guest_minutes: guest_minutes.max(1),
        }
    }

    /// Create JwtService from config
    pub fn from_config(config: &AuthConfig) -> Self {
        let secret = if config.jwt_secret.is_empty() {
            warn!("JWT secret not configured, generating a random one; sessions will not survive a restart");
            generate_secret()
        } else {
            config.jwt_secret.clone()
        };

        Self::new(
            &secret,
            config.registered_token_minutes as i64,
            config.guest_token_minutes as i64,
        )
    }

    /// Session lifetime for an account type
    pub fn lifetime(&self, account_type: AccountType) -> Duration {
        match account_type {
            AccountType::Guest => Duration::minutes(self.guest_minutes),
            AccountType::Registered => Duration::minutes(self.registered_minutes),
        }
    }

    pub fn issue(&self, account: &Account) -> Result<IssuedToken> {
        self.issue_at(account, Utc::now())
    }

    /// Signs a token as if issued at `now`
    pub fn issue_at(&self, account: &Account, now: DateTime<Utc>) -> Result<IssuedToken> {
        let lifetime = self.lifetime(account.account_type);
        let expires_at = now + lifetime;
        let claims = SessionClaims {
            sub: account.id.to_string(),
            username: account.username.clone(),
            account_type: account.account_type,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SnaplinkError::token_issue(format!("Failed to sign token: {}", e)))?;

        Ok(IssuedToken {
            token,
            lifetime,
            expires_at,
        })
    }

    /// Verifies signature, expiry and token type
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)?;

        if token_data.claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(SnaplinkError::token_invalid("Unexpected token type"));
        }

        Ok(token_data.claims)
    }
}

fn generate_secret() -> String {
    (0..32)
        .map(|_| format!("{:02x}", rand::random::<u8>()))
        .collect()
}
