//! Tier detection.
//!
//! Supplies the tier the session starts in. Detection never fails: anything
//! that cannot be verified resolves to [`Tier::Noob`].

use crate::capability::Tier;
use crate::constants::DEFAULT_TIER_CLAIM;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Source of the current tier.
pub trait TierDetector: Send + Sync {
    fn detect(&self) -> Tier;
}

/// Always resolves to the lowest tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubTierDetector;

impl TierDetector for StubTierDetector {
    fn detect(&self) -> Tier {
        Tier::Noob
    }
}

/// Claims of a signed tier token.
#[derive(Debug, Serialize, Deserialize)]
pub struct TierClaims {
    pub sub: Option<String>,
    pub exp: Option<u64>,
    pub iat: Option<u64>,
    #[serde(flatten)]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

/// Reads the tier from an HS256-signed token.
///
/// The tier claim may be a single string (`"viper"`) or a list of
/// entitlements (`["registered", "viper"]`); a list grants the highest tier
/// it names, checking VIPer before Registered.
pub struct TokenTierDetector {
    secret: String,
    claim: String,
    token: Option<String>,
}

impl std::fmt::Debug for TokenTierDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenTierDetector")
            .field("claim", &self.claim)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl TokenTierDetector {
    pub fn new(secret: impl Into<String>, token: Option<String>) -> Self {
        Self {
            secret: secret.into(),
            claim: DEFAULT_TIER_CLAIM.to_string(),
            token,
        }
    }

    pub fn with_claim(mut self, claim: impl Into<String>) -> Self {
        self.claim = claim.into();
        self
    }

    fn validate(&self, token: &str) -> Result<TierClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false; // checked below, exp is optional
        validation.required_spec_claims.clear();

        let token_data = decode::<TierClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )?;
        Ok(token_data.claims)
    }

    fn tier_from_claims(&self, claims: &TierClaims) -> Option<Tier> {
        let grants = |name: &str| match claims.custom.get(&self.claim) {
            Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case(name),
            Some(serde_json::Value::Array(values)) => values
                .iter()
                .filter_map(|v| v.as_str())
                .any(|s| s.eq_ignore_ascii_case(name)),
            _ => false,
        };

        if grants(Tier::Viper.as_str()) {
            Some(Tier::Viper)
        } else if grants(Tier::Registered.as_str()) {
            Some(Tier::Registered)
        } else if grants(Tier::Noob.as_str()) {
            Some(Tier::Noob)
        } else {
            None
        }
    }
}

impl TierDetector for TokenTierDetector {
    fn detect(&self) -> Tier {
        let Some(token) = self.token.as_deref() else {
            tracing::debug!("No tier token presented");
            return Tier::Noob;
        };

        let claims = match self.validate(token) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(error = %e, "Tier token rejected");
                return Tier::Noob;
            }
        };

        if let Some(exp) = claims.exp {
            let now = chrono::Utc::now().timestamp();
            if now >= 0 && exp <= now as u64 {
                tracing::warn!(exp = exp, "Tier token expired");
                return Tier::Noob;
            }
        }

        match self.tier_from_claims(&claims) {
            Some(tier) => {
                tracing::debug!(tier = tier.as_str(), sub = ?claims.sub, "Tier token accepted");
                tier
            }
            None => {
                tracing::warn!(claim = %self.claim, "Tier token carries no recognised tier");
                Tier::Noob
            }
        }
    }
}
