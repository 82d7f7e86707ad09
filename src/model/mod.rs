//! # Authorship Model
//!
//! Clean DTOs for bylines, user accounts, content items and the
//! request-scoped authorship tokens that link them.
//! These types cross every boundary: storage ↔ registry ↔ schema ↔ caller.
//!
//! Design rule: this module is pure data. No I/O, no state, no async.

pub mod byline;
pub mod content;
pub mod user;
pub mod token;
pub mod value;
pub mod property_map;

pub use byline::{Byline, BylineId, BylineAttribute, NewByline, BylineUpdate, UserLink};
pub use content::{ContentId, ContentItem, ContentType, ContentModel};
pub use user::{UserAccount, UserId};
pub use token::AuthorshipToken;
pub use value::Value;
pub use property_map::{PropertyMap, props};
