//! Byline: an authorship identity, distinct from a user account.

use serde::{Deserialize, Serialize};
use super::UserId;

/// Stable byline identifier ("term id"), assigned by the storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BylineId(pub u64);

impl std::fmt::Display for BylineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored byline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Byline {
    pub id: BylineId,
    /// Unique within the byline namespace.
    pub slug: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    /// Weak back-reference to a user account. Never ownership.
    pub linked_user_id: Option<UserId>,
}

impl Byline {
    /// Materialize a stored record from its creation attributes.
    pub fn from_new(id: BylineId, new: NewByline) -> Self {
        Self {
            id,
            slug: new.slug,
            display_name: new.display_name,
            first_name: new.first_name,
            last_name: new.last_name,
            bio: new.bio,
            email: new.email,
            url: new.url,
            linked_user_id: new.linked_user_id,
        }
    }

    pub fn get(&self, attr: BylineAttribute) -> Option<&str> {
        let value = match attr {
            BylineAttribute::DisplayName => &self.display_name,
            BylineAttribute::FirstName => &self.first_name,
            BylineAttribute::LastName => &self.last_name,
            BylineAttribute::Bio => &self.bio,
            BylineAttribute::Email => &self.email,
            BylineAttribute::Url => &self.url,
        };
        value.as_deref()
    }
}

/// Text attributes exposed as scalar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BylineAttribute {
    DisplayName,
    FirstName,
    LastName,
    Bio,
    Email,
    Url,
}

impl BylineAttribute {
    pub const ALL: [BylineAttribute; 6] = [
        BylineAttribute::DisplayName,
        BylineAttribute::FirstName,
        BylineAttribute::LastName,
        BylineAttribute::Bio,
        BylineAttribute::Email,
        BylineAttribute::Url,
    ];

    /// Schema field name (camelCase).
    pub fn field_name(self) -> &'static str {
        match self {
            BylineAttribute::DisplayName => "displayName",
            BylineAttribute::FirstName => "firstName",
            BylineAttribute::LastName => "lastName",
            BylineAttribute::Bio => "bio",
            BylineAttribute::Email => "email",
            BylineAttribute::Url => "url",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            BylineAttribute::DisplayName => "The display name of the byline",
            BylineAttribute::FirstName => "The first name of the byline",
            BylineAttribute::LastName => "The last name of the byline",
            BylineAttribute::Bio => "The biographical information for the byline",
            BylineAttribute::Email => "The email associated with the byline",
            BylineAttribute::Url => "The url (web address) associated with the byline",
        }
    }
}

/// Attributes for creating a byline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewByline {
    pub slug: String,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub linked_user_id: Option<UserId>,
}

impl NewByline {
    pub fn new(slug: impl Into<String>) -> Self {
        Self { slug: slug.into(), ..Self::default() }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn with_first_name(mut self, name: impl Into<String>) -> Self {
        self.first_name = Some(name.into());
        self
    }

    pub fn with_last_name(mut self, name: impl Into<String>) -> Self {
        self.last_name = Some(name.into());
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = Some(bio.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn linked_to(mut self, user: UserId) -> Self {
        self.linked_user_id = Some(user);
        self
    }
}

/// Change to a byline's user link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserLink {
    Link(UserId),
    Unlink,
}

/// Partial update. `None` leaves a field alone; `Some("")` clears a text attribute.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BylineUpdate {
    pub slug: Option<String>,
    pub display_name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub url: Option<String>,
    pub user: Option<UserLink>,
}

impl BylineUpdate {
    /// Apply every text change to `byline`. Slug and user link are validated by the caller.
    pub fn apply_attributes(&self, byline: &mut Byline) {
        fn patch(slot: &mut Option<String>, change: &Option<String>) {
            if let Some(v) = change {
                *slot = if v.is_empty() { None } else { Some(v.clone()) };
            }
        }
        patch(&mut byline.display_name, &self.display_name);
        patch(&mut byline.first_name, &self.first_name);
        patch(&mut byline.last_name, &self.last_name);
        patch(&mut byline.bio, &self.bio);
        patch(&mut byline.email, &self.email);
        patch(&mut byline.url, &self.url);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let b = Byline::from_new(
            BylineId(7),
            NewByline::new("ada").with_display_name("Ada").with_email("ada@example.com"),
        );
        assert_eq!(b.get(BylineAttribute::DisplayName), Some("Ada"));
        assert_eq!(b.get(BylineAttribute::Email), Some("ada@example.com"));
        assert_eq!(b.get(BylineAttribute::Bio), None);
    }

    #[test]
    fn test_update_clears_with_empty_string() {
        let mut b = Byline::from_new(BylineId(1), NewByline::new("x").with_bio("old"));
        let update = BylineUpdate {
            bio: Some(String::new()),
            first_name: Some("Grace".into()),
            ..Default::default()
        };
        update.apply_attributes(&mut b);
        assert_eq!(b.bio, None);
        assert_eq!(b.first_name.as_deref(), Some("Grace"));
        assert_eq!(b.slug, "x");
    }

    #[test]
    fn test_field_names_are_camel_case() {
        let names: Vec<_> = BylineAttribute::ALL.iter().map(|a| a.field_name()).collect();
        assert_eq!(names, vec!["displayName", "firstName", "lastName", "bio", "email", "url"]);
    }
}
