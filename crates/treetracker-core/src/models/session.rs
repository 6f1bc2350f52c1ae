use serde::{Deserialize, Serialize};

/// Tokens returned by the identity provider's token endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
}

impl TokenSet {
    /// A token counts as valid when it is non-empty and has time left
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && self.expires_in > 0
    }
}

/// Authentication state handed to the session gate at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionContext {
    tokens: Option<TokenSet>,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(tokens: TokenSet) -> Self {
        Self {
            tokens: Some(tokens),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens.as_ref().is_some_and(TokenSet::is_valid)
    }

    pub fn tokens(&self) -> Option<&TokenSet> {
        self.tokens.as_ref()
    }

    pub fn clear(&mut self) {
        self.tokens = None;
    }
}
