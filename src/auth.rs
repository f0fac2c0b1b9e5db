use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use godo_config::Config;

use crate::store::{User, UserStore};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub jti: String, // JWT ID (unique per token)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub iss: String, // Issuer
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).context("Token subject is not a valid user id")
    }
}

pub struct AuthManager {
    /// HS256 secret, the only key this server can sign with
    encoding_key: Option<EncodingKey>,
    hs256_key: Option<DecodingKey>,
    rs256_key: Option<DecodingKey>,
    access_token_ttl_hours: i64,
    issuer: String,
}

impl AuthManager {
    pub fn new(config: &Config) -> Result<Self> {
        let secret = config
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty());
        let public_key = config
            .jwt_public_key
            .as_deref()
            .filter(|k| !k.trim().is_empty());

        let rs256_key = match public_key {
            Some(pem) => {
                tracing::info!("RS256 token verification enabled");
                Some(
                    DecodingKey::from_rsa_pem(pem.as_bytes())
                        .context("Failed to parse JWT_PUBLIC_KEY as RSA PEM")?,
                )
            }
            None => None,
        };

        let (encoding_key, hs256_key) = match secret {
            Some(secret) => (
                Some(EncodingKey::from_secret(secret.as_bytes())),
                Some(DecodingKey::from_secret(secret.as_bytes())),
            ),
            None => (None, None),
        };

        if rs256_key.is_none() && hs256_key.is_none() {
            anyhow::bail!(
                "No JWT configuration provided. Set JWT_SECRET (HS256) and/or JWT_PUBLIC_KEY (RS256)"
            );
        }

        Ok(Self {
            encoding_key,
            hs256_key,
            rs256_key,
            access_token_ttl_hours: config.access_token_ttl_hours,
            issuer: config.jwt_issuer.clone(),
        })
    }

    /// Create an HS256 access token. Returns (token, jti, exp).
    pub fn create_token(&self, user_id: &Uuid) -> Result<(String, String, i64)> {
        self.create_token_with_ttl(user_id, Duration::hours(self.access_token_ttl_hours))
    }

    pub fn create_token_with_ttl(
        &self,
        user_id: &Uuid,
        ttl: Duration,
    ) -> Result<(String, String, i64)> {
        let encoding_key = self.encoding_key.as_ref().ok_or_else(|| {
            anyhow::anyhow!("Cannot create tokens: no JWT_SECRET configured (verify-only mode)")
        })?;

        let now = Utc::now();
        let exp = now + ttl;
        let jti = Uuid::new_v4().to_string();

        let claims = Claims {
            sub: user_id.to_string(),
            jti: jti.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, encoding_key)
            .context("Failed to encode JWT token")?;

        Ok((token, jti, exp.timestamp()))
    }

    /// Verify a token with the key matching its header algorithm
    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let header = decode_header(token).context("Malformed token header")?;

        let key = match header.alg {
            Algorithm::HS256 => self
                .hs256_key
                .as_ref()
                .context("Token uses HS256, but JWT_SECRET is not configured")?,
            Algorithm::RS256 => self
                .rs256_key
                .as_ref()
                .context("Token uses RS256, but JWT_PUBLIC_KEY is not configured")?,
            other => anyhow::bail!("Unsupported JWT algorithm: {:?}", other),
        };

        let mut validation = Validation::new(header.alg);
        validation.set_issuer(&[self.issuer.clone()]);
        // Expired means expired: no grace window
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(token, key, &validation).context("Token verification failed")?;
        Ok(token_data.claims)
    }
}

/// Who is on the other end of a request or connection
#[derive(Debug, Clone)]
pub enum Identity {
    User(User),
    Anonymous,
}

impl Identity {
    pub fn user(&self) -> Option<&User> {
        match self {
            Identity::User(user) => Some(user),
            Identity::Anonymous => None,
        }
    }
}

/// Resolves a bearer credential to an active user.
///
/// Missing, invalid, or expired tokens and unknown or deactivated users all
/// resolve to `Anonymous`. Store failures propagate.
pub async fn resolve_identity<U>(
    auth: &AuthManager,
    users: &U,
    token: Option<&str>,
) -> Result<Identity>
where
    U: UserStore + ?Sized,
{
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return Ok(Identity::Anonymous);
    };

    let user_id = match auth.verify_token(token).and_then(|claims| claims.user_id()) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "Rejected bearer token");
            return Ok(Identity::Anonymous);
        }
    };

    match users.get_user(user_id).await? {
        Some(user) if user.is_active => Ok(Identity::User(user)),
        _ => Ok(Identity::Anonymous),
    }
}
