use crate::api::{ApiError, PageResult};
use crate::feed::photo_feed::PhotoFeed;

/// Cursor over the loaded photo list. Navigation off the loaded end
/// triggers a page fetch and parks on `pending_advance` until the store
/// grows; every other out-of-range transition is a silent no-op.
pub struct Lightbox {
    open_index: Option<usize>,
    pending_advance: Option<usize>,
}

impl Lightbox {
    pub fn new() -> Self {
        Self {
            open_index: None,
            pending_advance: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open_index.is_some()
    }

    pub fn open_index(&self) -> Option<usize> {
        self.open_index
    }

    pub fn open(&mut self, index: usize, item_count: usize) {
        if index < item_count {
            self.open_index = Some(index);
            self.pending_advance = None;
        }
    }

    pub fn close(&mut self) {
        self.open_index = None;
        self.pending_advance = None;
    }

    pub fn previous(&mut self) {
        if let Some(index) = self.open_index {
            if index > 0 {
                self.open_index = Some(index - 1);
                self.pending_advance = None;
            }
        }
    }

    /// Advance within the loaded list, or trigger a fetch for the next
    /// page and remember the index the new records will start at. At the
    /// absolute end (nothing more to fetch) this is a no-op.
    pub fn next<F>(&mut self, feed: &mut PhotoFeed, fetch: F)
    where
        F: FnOnce(Option<String>) -> Result<PageResult, ApiError> + Send + 'static,
    {
        let Some(index) = self.open_index else {
            return;
        };
        if self.pending_advance.is_some() {
            return;
        }

        if index + 1 < feed.len() {
            self.open_index = Some(index + 1);
        } else if feed.has_more() {
            self.pending_advance = Some(feed.len());
            feed.request_more(fetch);
        }
    }

    /// Resolve a pending advance after the feed has been polled. Advances
    /// once the store has grown past the recorded target; if the fetch
    /// settled without growth (failure, or a page of nothing but already
    /// seen records) the cursor stays where it is. Also closes the
    /// lightbox if the list shrank under it (feed refresh).
    pub fn settle(&mut self, feed: &PhotoFeed) {
        if let Some(target) = self.pending_advance {
            if feed.len() > target {
                self.open_index = Some(target);
                self.pending_advance = None;
            } else if !feed.is_loading() {
                self.pending_advance = None;
            }
        }

        if let Some(index) = self.open_index {
            if index >= feed.len() {
                self.close();
            }
        }
    }

    /// "N / M" counter; falls back to the loaded count until the server
    /// has reported a total.
    pub fn counter(&self, feed: &PhotoFeed) -> Option<(usize, u64)> {
        let index = self.open_index?;
        let total = feed.total_count().unwrap_or(feed.len() as u64);
        Some((index + 1, total))
    }
}

impl Default for Lightbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::testing::{page, wait_idle};

    fn loaded_feed(ids: &[u64], next: Option<&str>, total: Option<u64>) -> PhotoFeed {
        let mut feed = PhotoFeed::new();
        let page = page(ids, next, total);
        feed.request_more(move |_| Ok(page));
        wait_idle(&mut feed);
        feed
    }

    #[test]
    fn open_requires_a_valid_index() {
        let feed = loaded_feed(&[1, 2, 3], None, Some(3));
        let mut lightbox = Lightbox::new();

        lightbox.open(5, feed.len());
        assert!(!lightbox.is_open());

        lightbox.open(2, feed.len());
        assert_eq!(lightbox.open_index(), Some(2));
    }

    #[test]
    fn previous_at_the_first_photo_is_a_no_op() {
        let feed = loaded_feed(&[1, 2], None, Some(2));
        let mut lightbox = Lightbox::new();
        lightbox.open(0, feed.len());

        lightbox.previous();
        assert_eq!(lightbox.open_index(), Some(0));
    }

    #[test]
    fn next_at_the_absolute_end_is_a_no_op() {
        let mut feed = loaded_feed(&[1, 2], None, Some(2));
        let mut lightbox = Lightbox::new();
        lightbox.open(1, feed.len());

        lightbox.next(&mut feed, |_| panic!("no page left to fetch"));
        assert_eq!(lightbox.open_index(), Some(1));
    }

    #[test]
    fn next_and_previous_walk_the_loaded_list() {
        let mut feed = loaded_feed(&[1, 2, 3], None, Some(3));
        let mut lightbox = Lightbox::new();
        lightbox.open(0, feed.len());

        lightbox.next(&mut feed, |_| panic!("all loaded"));
        lightbox.next(&mut feed, |_| panic!("all loaded"));
        assert_eq!(lightbox.open_index(), Some(2));

        lightbox.previous();
        assert_eq!(lightbox.open_index(), Some(1));
    }

    #[test]
    fn next_past_the_loaded_end_fetches_and_advances() {
        let mut feed = loaded_feed(&[1, 2], Some("2"), Some(4));
        let mut lightbox = Lightbox::new();
        lightbox.open(1, feed.len());

        lightbox.next(&mut feed, |_| Ok(page(&[3, 4], None, Some(4))));
        assert_eq!(lightbox.open_index(), Some(1));

        wait_idle(&mut feed);
        lightbox.settle(&feed);

        // First newly appended record.
        assert_eq!(lightbox.open_index(), Some(2));
        assert_eq!(feed.len(), 4);
    }

    #[test]
    fn failed_fetch_leaves_the_cursor_at_the_last_valid_index() {
        let mut feed = loaded_feed(&[1, 2], Some("2"), Some(4));
        let mut lightbox = Lightbox::new();
        lightbox.open(1, feed.len());

        lightbox.next(&mut feed, |_| {
            Err(ApiError::Server("connection reset".to_string()))
        });
        wait_idle(&mut feed);
        lightbox.settle(&feed);

        assert_eq!(lightbox.open_index(), Some(1));
        assert!(feed.error().is_some());

        // The abandoned advance does not block later navigation.
        lightbox.previous();
        assert_eq!(lightbox.open_index(), Some(0));
    }

    #[test]
    fn all_duplicate_page_abandons_the_pending_advance() {
        let mut feed = loaded_feed(&[1, 2], Some("2"), Some(2));
        let mut lightbox = Lightbox::new();
        lightbox.open(1, feed.len());

        lightbox.next(&mut feed, |_| Ok(page(&[1, 2], None, Some(2))));
        wait_idle(&mut feed);
        lightbox.settle(&feed);

        assert_eq!(lightbox.open_index(), Some(1));
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn feed_refresh_closes_a_dangling_lightbox() {
        let feed = loaded_feed(&[1, 2, 3], None, Some(3));
        let mut lightbox = Lightbox::new();
        lightbox.open(2, feed.len());

        let empty = PhotoFeed::new();
        lightbox.settle(&empty);
        assert!(!lightbox.is_open());
    }

    #[test]
    fn counter_degrades_to_loaded_count_without_a_total() {
        let feed = loaded_feed(&[1, 2, 3], Some("2"), None);
        let mut lightbox = Lightbox::new();

        assert_eq!(lightbox.counter(&feed), None);

        lightbox.open(0, feed.len());
        assert_eq!(lightbox.counter(&feed), Some((1, 3)));

        let with_total = loaded_feed(&[1, 2, 3], Some("2"), Some(40));
        assert_eq!(lightbox.counter(&with_total), Some((1, 40)));
    }
}
