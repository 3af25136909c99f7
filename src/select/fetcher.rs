use std::sync::Arc;

use tracing::{debug, warn};

use crate::select::types::{PageOutcome, PageRequest, QueryTicket, SearchSource};

/// In-flight bookkeeping for one query lifetime.
///
/// Два независимых флага: первая страница нового запроса и догрузка следующей.
/// Каждый запрещает дубль своего класса; догрузка запрещена, пока летит любой из них.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchState {
    pub loading_first: bool,
    pub loading_more: bool,
    /// First page resolved (successfully or not) for the current query.
    pub searched: bool,
    /// Last fetch for the current query failed.
    pub failed: bool,
}

impl FetchState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn in_flight(&self) -> bool {
        self.loading_first || self.loading_more
    }

    pub fn begin_first(&mut self, ticket: QueryTicket, limit: usize) -> Option<PageRequest> {
        if self.loading_first {
            return None;
        }
        self.loading_first = true;
        Some(PageRequest {
            ticket,
            offset: 0,
            limit,
            append: false,
        })
    }

    pub fn begin_more(
        &mut self,
        ticket: QueryTicket,
        cursor: usize,
        limit: usize,
        has_more: bool,
    ) -> Option<PageRequest> {
        if !has_more || self.in_flight() {
            return None;
        }
        self.loading_more = true;
        Some(PageRequest {
            ticket,
            offset: cursor,
            limit,
            append: true,
        })
    }

    pub fn finish(&mut self, request: &PageRequest, ok: bool) {
        if request.append {
            self.loading_more = false;
        } else {
            self.loading_first = false;
            self.searched = true;
        }
        self.failed = !ok;
    }
}

/// Issues one search per request and never fails: errors come back inside the outcome.
pub struct PagedFetcher<S: SearchSource> {
    source: Arc<S>,
}

impl<S: SearchSource> Clone for PagedFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<S: SearchSource> PagedFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    pub async fn fetch(&self, request: PageRequest) -> PageOutcome<S::Item> {
        let res = self
            .source
            .search(&request.ticket.query, request.offset, request.limit)
            .await;
        let result = match res {
            Ok(mut page) => {
                // offset страницы берём из запроса, а не из ответа источника
                page.offset = request.offset;
                debug!(
                    query = %request.ticket.query,
                    offset = request.offset,
                    got = page.items.len(),
                    total = page.total,
                    "page fetched"
                );
                Ok(page)
            }
            Err(err) => {
                warn!(query = %request.ticket.query, offset = request.offset, error = %err, "search failed");
                Err(format!("{err:#}"))
            }
        };
        PageOutcome { request, result }
    }
}
