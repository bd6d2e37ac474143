mod lightbox;
mod photo_feed;
mod rows;
mod store;

pub use lightbox::Lightbox;
pub use photo_feed::PhotoFeed;
pub use rows::{RowLayout, PREFETCH_ROWS, TARGET_CELL_WIDTH};
pub use store::{PageCursor, PageCursorStore};
