//! User accounts, owned by the external user store.

use serde::{Deserialize, Serialize};

/// Opaque user account identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Read-only view of a user account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub login: String,
    /// URL-safe name; preferred slug source for bylines derived from this user.
    pub nicename: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

impl Default for UserId {
    fn default() -> Self {
        UserId(0)
    }
}

impl UserAccount {
    pub fn new(login: impl Into<String>, display_name: impl Into<String>) -> Self {
        let login = login.into();
        Self {
            nicename: login.clone(),
            login,
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    pub fn with_nicename(mut self, nicename: impl Into<String>) -> Self {
        self.nicename = nicename.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_names(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Slug seed: nicename, falling back to login.
    pub fn slug_source(&self) -> &str {
        if self.nicename.trim().is_empty() { &self.login } else { &self.nicename }
    }
}
