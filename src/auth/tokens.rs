//! # Token Registry
//!
//! Global tokens unlock every protected source. Granular tokens unlock
//! individual named sub-resources (e.g. one sensor). Each request checks
//! through an [`AuthSession`] that bounds how many comparisons it may
//! perform, limiting token probing through long resource lists.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::crypto::{digest_token, digests_match, TokenDigest};
use super::errors::{AuthError, AuthResult};

fn default_max_comparisons() -> usize {
    32
}

/// Token configuration as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default)]
    pub global: Vec<String>,
    /// Sub-resource name to the tokens that unlock it
    #[serde(default)]
    pub granular: HashMap<String, Vec<String>>,
    #[serde(default = "default_max_comparisons")]
    pub max_comparisons: usize,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            global: Vec::new(),
            granular: HashMap::new(),
            max_comparisons: default_max_comparisons(),
        }
    }
}

/// What a source demands before it touches storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequirement {
    None,
    /// A global token
    Global,
    /// A global token, or a granular token for every value of `param`
    Granular { param: String },
}

/// Digested tokens, built once at startup
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    global: Vec<TokenDigest>,
    granular: HashMap<String, Vec<TokenDigest>>,
    max_comparisons: usize,
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::from_config(&TokenConfig::default())
    }
}

impl TokenRegistry {
    pub fn from_config(config: &TokenConfig) -> Self {
        Self {
            global: config.global.iter().map(|t| digest_token(t)).collect(),
            granular: config
                .granular
                .iter()
                .map(|(name, tokens)| {
                    (name.clone(), tokens.iter().map(|t| digest_token(t)).collect())
                })
                .collect(),
            max_comparisons: config.max_comparisons,
        }
    }

    pub fn max_comparisons(&self) -> usize {
        self.max_comparisons
    }

    /// Starts the per-request check for `token`.
    pub fn session(&self, token: Option<&str>) -> AuthSession<'_> {
        AuthSession {
            registry: self,
            token: token.filter(|t| !t.is_empty()).map(digest_token),
            comparisons: 0,
        }
    }
}

/// Per-request token check with a comparison budget
#[derive(Debug)]
pub struct AuthSession<'a> {
    registry: &'a TokenRegistry,
    token: Option<TokenDigest>,
    comparisons: usize,
}

impl AuthSession<'_> {
    pub fn comparisons(&self) -> usize {
        self.comparisons
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the token is a global token.
    pub fn is_global(&mut self) -> AuthResult<bool> {
        let registry = self.registry;
        self.any_match(&registry.global)
    }

    /// Whether the token unlocks `resource` through its granular tokens.
    pub fn grants(&mut self, resource: &str) -> AuthResult<bool> {
        let registry = self.registry;
        match registry.granular.get(resource) {
            Some(tokens) => self.any_match(tokens),
            None => Ok(false),
        }
    }

    /// Enforces `requirement`; `resources` are the requested values of
    /// the granular parameter.
    pub fn check(&mut self, requirement: &AuthRequirement, resources: &[String]) -> AuthResult<()> {
        match requirement {
            AuthRequirement::None => Ok(()),
            AuthRequirement::Global => {
                if !self.has_token() {
                    return Err(AuthError::MissingToken);
                }
                if self.is_global()? {
                    Ok(())
                } else {
                    Err(AuthError::InvalidToken)
                }
            }
            AuthRequirement::Granular { .. } => {
                if !self.has_token() {
                    return Err(AuthError::MissingToken);
                }
                if self.is_global()? {
                    return Ok(());
                }
                for resource in resources {
                    if !self.grants(resource)? {
                        return Err(AuthError::Unauthorized(resource.clone()));
                    }
                }
                Ok(())
            }
        }
    }

    fn any_match(&mut self, candidates: &[TokenDigest]) -> AuthResult<bool> {
        let token = match &self.token {
            Some(t) => *t,
            None => return Ok(false),
        };
        for candidate in candidates {
            if self.comparisons >= self.registry.max_comparisons {
                return Err(AuthError::ComparisonLimit(self.registry.max_comparisons));
            }
            self.comparisons += 1;
            if digests_match(&token, candidate) {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
