pub mod item;
pub mod preferences;
pub mod query;
pub mod urls;

pub use item::{ContentItem, FeedItem};
pub use preferences::{BrowsePreferences, FeedTarget, PREFERENCES_KEY};
pub use query::{ContentQuery, Cursor, Page, SortHint};
pub use urls::display_url;
