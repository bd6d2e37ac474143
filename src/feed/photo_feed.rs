use std::sync::mpsc::{channel, Receiver, Sender};

use crate::api::{ApiError, PageResult, PhotoRecord};
use crate::feed::store::{PageCursor, PageCursorStore};

type PageReply = (u64, Result<PageResult, ApiError>);

/// Drives page loading for the photo stream. At most one fetch is ever
/// outstanding: `request_more` while loading is a no-op, which is what
/// absorbs the viewport signal firing on every frame. Completions come
/// back over a channel and are applied by `poll` on the UI thread, so
/// `append_page` calls are strictly sequential.
pub struct PhotoFeed {
    store: PageCursorStore,
    loading: bool,
    error: Option<String>,
    generation: u64,
    reply_tx: Sender<PageReply>,
    reply_rx: Receiver<PageReply>,
}

impl PhotoFeed {
    pub fn new() -> Self {
        let (reply_tx, reply_rx) = channel();
        Self {
            store: PageCursorStore::new(),
            loading: false,
            error: None,
            generation: 0,
            reply_tx,
            reply_rx,
        }
    }

    /// Start fetching the next page unless a fetch is already in flight or
    /// the listing is exhausted. The fetch closure runs on a worker thread
    /// and its result is picked up by the next `poll`.
    pub fn request_more<F>(&mut self, fetch: F)
    where
        F: FnOnce(Option<String>) -> Result<PageResult, ApiError> + Send + 'static,
    {
        if self.loading {
            return;
        }
        let cursor = match self.store.next_cursor() {
            PageCursor::Start => None,
            PageCursor::Token(token) => Some(token.clone()),
            PageCursor::End => return,
        };

        self.loading = true;
        self.error = None;
        let generation = self.generation;
        let reply_tx = self.reply_tx.clone();
        std::thread::spawn(move || {
            let _ = reply_tx.send((generation, fetch(cursor)));
        });
    }

    /// Discard whatever is in flight and start over from the first page.
    /// The outstanding fetch is not aborted; its eventual reply carries a
    /// stale generation and `poll` ignores it.
    pub fn refresh<F>(&mut self, fetch: F)
    where
        F: FnOnce(Option<String>) -> Result<PageResult, ApiError> + Send + 'static,
    {
        self.generation = self.generation.wrapping_add(1);
        self.loading = false;
        self.error = None;
        self.store.reset();
        self.request_more(fetch);
    }

    /// Apply completed fetches. A failure leaves the store untouched and
    /// re-arms `request_more`, so a retry re-issues the same cursor.
    pub fn poll(&mut self) {
        while let Ok((generation, result)) = self.reply_rx.try_recv() {
            if generation != self.generation {
                continue;
            }
            self.loading = false;
            match result {
                Ok(page) => self.store.append_page(page),
                Err(err) => {
                    eprintln!("Failed to load photo page: {}", err);
                    self.error = Some(err.to_string());
                }
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.store.has_more()
    }

    pub fn items(&self) -> &[PhotoRecord] {
        self.store.items()
    }

    pub fn get(&self, index: usize) -> Option<&PhotoRecord> {
        self.store.get(index)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.store.total_count()
    }
}

impl Default for PhotoFeed {
    fn default() -> Self {
        Self::new()
    }
}
