mod items;
mod schema;
mod sources;
mod types;

pub use schema::Database;
pub use types::{DatabaseError, FeedItem, FeedSource, NewFeedSource};
