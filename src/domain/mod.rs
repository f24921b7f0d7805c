pub mod feed;
pub mod post;

pub use feed::{Author, FeedSource, FeedType};
pub use post::Post;
