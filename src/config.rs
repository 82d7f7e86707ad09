//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object is a valid config.
//!
//! ```json
//! { "unresolved_tokens": "reject", "default_page_size": 20 }
//! ```

use serde::{Deserialize, Serialize};
use crate::{Error, Result};

/// What a save does with a token that does not resolve to a byline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedTokens {
    /// Drop the token and keep the rest of the payload.
    #[default]
    Skip,
    /// Fail the whole save; the previous relation stays in place.
    Reject,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BylinesConfig {
    pub unresolved_tokens: UnresolvedTokens,
    /// Marker that turns `"<prefix><user id>"` into a user token.
    pub user_token_prefix: String,
    /// Taxonomy name used in the relation predicate of filtered queries.
    pub taxonomy: String,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for BylinesConfig {
    fn default() -> Self {
        Self {
            unresolved_tokens: UnresolvedTokens::Skip,
            user_token_prefix: "u".into(),
            taxonomy: "byline".into(),
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl BylinesConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_token_prefix.is_empty() {
            return Err(Error::ConfigError("user_token_prefix must not be empty".into()));
        }
        if self.user_token_prefix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::ConfigError(
                "user_token_prefix must not be numeric; it would shadow byline ids".into(),
            ));
        }
        if self.taxonomy.trim().is_empty() {
            return Err(Error::ConfigError("taxonomy must not be empty".into()));
        }
        if self.max_page_size == 0 {
            return Err(Error::ConfigError("max_page_size must be positive".into()));
        }
        Ok(())
    }

    /// Page size for a connection request, clamped to `1..=max_page_size`.
    pub fn page_size(&self, requested: Option<i64>) -> usize {
        let size = match requested {
            Some(n) if n > 0 => n as usize,
            _ => self.default_page_size,
        };
        size.clamp(1, self.max_page_size)
    }

    pub fn with_unresolved_tokens(mut self, policy: UnresolvedTokens) -> Self {
        self.unresolved_tokens = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = BylinesConfig::from_json_str("{}").unwrap();
        assert_eq!(config, BylinesConfig::default());
    }

    #[test]
    fn test_partial_override() {
        let config = BylinesConfig::from_json_str(
            r#"{"unresolved_tokens": "reject", "default_page_size": 25}"#,
        ).unwrap();
        assert_eq!(config.unresolved_tokens, UnresolvedTokens::Reject);
        assert_eq!(config.default_page_size, 25);
        assert_eq!(config.user_token_prefix, "u");
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            BylinesConfig::from_json_str(r#"{"user_token_prefix": ""}"#),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            BylinesConfig::from_json_str(r#"{"max_page_size": 0}"#),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(BylinesConfig::from_json_str("not json"), Err(Error::Json(_))));
    }

    #[test]
    fn test_page_size_clamps() {
        let config = BylinesConfig::default();
        assert_eq!(config.page_size(None), 10);
        assert_eq!(config.page_size(Some(0)), 10);
        assert_eq!(config.page_size(Some(5)), 5);
        assert_eq!(config.page_size(Some(10_000)), 100);
    }
}
