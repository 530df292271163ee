pub mod auth;
pub mod card;
pub mod gratitude;
pub mod map;
pub mod note;
pub mod streak;
