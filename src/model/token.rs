//! Authorship tokens, one save-request entry each.

use serde::{Deserialize, Serialize};
use super::{BylineId, UserId};

/// Either a direct byline reference or "resolve-or-create for this user".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorshipToken {
    Byline(BylineId),
    User(UserId),
}

impl AuthorshipToken {
    /// Parse `"<digits>"` as a byline id or `"<prefix><digits>"` as a user marker.
    /// Returns `None` for anything else.
    pub fn parse(raw: &str, user_prefix: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Some(rest) = raw.strip_prefix(user_prefix).filter(|_| !user_prefix.is_empty()) {
            return parse_id(rest).map(|id| AuthorshipToken::User(UserId(id)));
        }
        parse_id(raw).map(|id| AuthorshipToken::Byline(BylineId(id)))
    }
}

fn parse_id(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok().filter(|id| *id > 0)
}

impl From<BylineId> for AuthorshipToken {
    fn from(id: BylineId) -> Self { AuthorshipToken::Byline(id) }
}

impl From<UserId> for AuthorshipToken {
    fn from(id: UserId) -> Self { AuthorshipToken::User(id) }
}

impl std::fmt::Display for AuthorshipToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorshipToken::Byline(id) => write!(f, "{id}"),
            AuthorshipToken::User(id) => write!(f, "user:{id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tokens() {
        assert_eq!(AuthorshipToken::parse("42", "u"), Some(AuthorshipToken::Byline(BylineId(42))));
        assert_eq!(AuthorshipToken::parse("u7", "u"), Some(AuthorshipToken::User(UserId(7))));
        assert_eq!(AuthorshipToken::parse(" 3 ", "u"), Some(AuthorshipToken::Byline(BylineId(3))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(AuthorshipToken::parse("", "u"), None);
        assert_eq!(AuthorshipToken::parse("u", "u"), None);
        assert_eq!(AuthorshipToken::parse("ux", "u"), None);
        assert_eq!(AuthorshipToken::parse("-4", "u"), None);
        assert_eq!(AuthorshipToken::parse("0", "u"), None);
        assert_eq!(AuthorshipToken::parse("user:5", "u"), None);
    }

    #[test]
    fn test_custom_prefix() {
        assert_eq!(AuthorshipToken::parse("user:5", "user:"), Some(AuthorshipToken::User(UserId(5))));
        assert_eq!(AuthorshipToken::parse("u5", "user:"), None);
    }
}
