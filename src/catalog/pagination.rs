//! Page accumulation for infinite-scroll surfaces.
//!
//! A `Paginator` owns the accumulated items for one filter key. Fetches are
//! keyed by the filter parameters in effect when they were issued; a
//! response whose key no longer matches the current key is discarded, so a
//! filter change while a fetch is outstanding can never overwrite newer
//! state.

/// A fetch issued by [`Paginator::begin`]. `offset`/`limit` are the range
/// to request from the gateway.
#[derive(Debug, Clone)]
pub struct PageRequest<K> {
    pub key: K,
    pub page: usize,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug)]
pub struct Paginator<K, T> {
    key: K,
    items: Vec<T>,
    next_page: usize,
    page_size: usize,
    has_more: bool,
    in_flight: bool,
}

impl<K: Clone + PartialEq, T> Paginator<K, T> {
    pub fn new(key: K, page_size: usize) -> Self {
        Self::resume(key, page_size, 0)
    }

    /// Starts a paginator with its cursor already at `page`, for serving a
    /// single page of a stateless request.
    pub fn resume(key: K, page_size: usize, page: usize) -> Self {
        Paginator {
            key,
            items: Vec::new(),
            next_page: page,
            page_size,
            has_more: true,
            in_flight: false,
        }
    }

    /// Issues the next page fetch. Returns `None` while a fetch is already
    /// in flight (the duplicate load-more guard) or when the last page was
    /// short.
    pub fn begin(&mut self) -> Option<PageRequest<K>> {
        if self.in_flight || !self.has_more {
            return None;
        }
        self.in_flight = true;
        let offset = (self.next_page * self.page_size) as i64;
        Some(PageRequest {
            key: self.key.clone(),
            page: self.next_page,
            offset,
            limit: self.page_size as i64,
        })
    }

    /// Applies a fetched page. Responses carrying a stale key or page index
    /// are dropped without touching the accumulated items.
    ///
    /// A page of exactly `page_size` items leaves `has_more` true even when
    /// it was the final page; the next (empty) fetch corrects it.
    pub fn complete(&mut self, request: PageRequest<K>, page: Vec<T>) {
        if request.key != self.key || request.page != self.next_page {
            return;
        }
        self.in_flight = false;
        self.has_more = page.len() == self.page_size;
        self.next_page += 1;
        self.items.extend(page);
    }

    /// Switches to a new filter key: discards accumulated pages, rewinds the
    /// cursor, and forgets any outstanding fetch so its response is ignored.
    pub fn reset(&mut self, key: K) {
        self.key = key;
        self.items.clear();
        self.next_page = 0;
        self.has_more = true;
        self.in_flight = false;
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch(req: &PageRequest<&'static str>, total: usize) -> Vec<usize> {
        let start = req.offset as usize;
        let end = (start + req.limit as usize).min(total);
        if start >= total {
            return Vec::new();
        }
        (start..end).collect()
    }

    #[test]
    fn accumulates_pages_in_order_without_gaps() {
        let mut paginator: Paginator<&str, usize> = Paginator::new("recent", 5);

        for _ in 0..4 {
            let Some(req) = paginator.begin() else { break };
            let page = fetch(&req, 13);
            paginator.complete(req, page);
        }

        assert_eq!(paginator.items(), (0..13).collect::<Vec<_>>().as_slice());
        assert!(!paginator.has_more());
    }

    #[test]
    fn exactly_full_final_page_needs_one_extra_fetch() {
        let mut paginator: Paginator<&str, usize> = Paginator::new("recent", 5);

        let req = paginator.begin().unwrap();
        let page = fetch(&req, 5);
        assert_eq!(page.len(), 5);
        paginator.complete(req, page);
        // Indistinguishable from "there might be more".
        assert!(paginator.has_more());

        let req = paginator.begin().unwrap();
        let page = fetch(&req, 5);
        assert!(page.is_empty());
        paginator.complete(req, page);
        assert!(!paginator.has_more());
        assert_eq!(paginator.items().len(), 5);
    }

    #[test]
    fn begin_is_blocked_while_a_fetch_is_in_flight() {
        let mut paginator: Paginator<&str, usize> = Paginator::new("recent", 5);

        let req = paginator.begin().unwrap();
        assert!(paginator.begin().is_none());
        paginator.complete(req, vec![0, 1, 2, 3, 4]);
        assert!(paginator.begin().is_some());
    }

    #[test]
    fn reset_discards_items_and_ignores_stale_responses() {
        let mut paginator: Paginator<&str, usize> = Paginator::new("GAMES", 5);

        let stale = paginator.begin().unwrap();
        paginator.reset("TECH");
        assert!(paginator.items().is_empty());
        assert!(paginator.has_more());

        // The response for the old key arrives after the switch.
        paginator.complete(stale, vec![99, 98, 97, 96, 95]);
        assert!(paginator.items().is_empty());

        let req = paginator.begin().unwrap();
        assert_eq!(req.offset, 0);
        paginator.complete(req, vec![1, 2, 3]);
        assert_eq!(paginator.items(), &[1, 2, 3]);
        assert!(!paginator.has_more());
    }

    #[test]
    fn resume_serves_a_later_page_range() {
        let mut paginator: Paginator<&str, usize> = Paginator::resume("gadgets", 8, 2);
        let req = paginator.begin().unwrap();
        assert_eq!(req.offset, 16);
        assert_eq!(req.limit, 8);
    }
}
