use async_trait::async_trait;

/// Something the dropdown can list and the user can pick.
pub trait ResultItem: Clone + Send + Sync + 'static {
    /// Stable identity, used to highlight the committed value.
    fn identity(&self) -> &str;
    fn title(&self) -> &str;
    /// Secondary line fragments (code, instructor, ...).
    fn subtitle(&self) -> Vec<String>;
}

/// Backend seam: one offset/limit search call.
#[async_trait]
pub trait SearchSource: Send + Sync + 'static {
    type Item: ResultItem;

    async fn search(
        &self,
        query: &str,
        offset: usize,
        limit: usize,
    ) -> anyhow::Result<ResultPage<Self::Item>>;
}

/// One page as received. `offset` is where it was requested, `total` is the backend's count.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub offset: usize,
}

impl<T> ResultPage<T> {
    pub fn new(items: Vec<T>, total: usize, offset: usize) -> Self {
        Self { items, total, offset }
    }

    pub fn end(&self) -> usize {
        self.offset + self.items.len()
    }
}

/// Identifies the query lifetime a request belongs to. The epoch changes on every reset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTicket {
    pub epoch: u64,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub ticket: QueryTicket,
    pub offset: usize,
    pub limit: usize,
    /// false: first page of a new query (replaces); true: next page (appends)
    pub append: bool,
}

/// Result of a fetch as delivered back to the controller. Errors are already flattened to text.
#[derive(Debug, Clone)]
pub struct PageOutcome<T> {
    pub request: PageRequest,
    pub result: Result<ResultPage<T>, String>,
}

/// Scroll container geometry at the time of a scroll event, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn near_bottom(&self, threshold_px: f64) -> bool {
        self.scroll_height - self.scroll_top <= self.client_height + threshold_px
    }

    /// Geometry of a container scrolled all the way down.
    pub fn at_bottom() -> Self {
        Self {
            scroll_top: 1.0,
            scroll_height: 1.0,
            client_height: 1.0,
        }
    }
}

/// What the embedding form passes in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Props {
    /// Identity of the committed selection, if any.
    pub value: Option<String>,
    pub display_label: String,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropdownState {
    Closed,
    OpenEmpty,
    OpenLoading,
    OpenResults,
    OpenNoMatches,
    OpenLoadingMore,
}

impl DropdownState {
    pub fn is_open(self) -> bool {
        self != DropdownState::Closed
    }
}

/// Snapshot published after every handled event.
#[derive(Debug, Clone, PartialEq)]
pub struct View<T> {
    pub state: DropdownState,
    pub query: String,
    pub items: Vec<T>,
    pub cursor: usize,
    pub total: usize,
    pub has_more: bool,
    /// Last fetch for this query failed. Distinguishes an error from a genuine zero-match.
    pub error: bool,
    pub input_focused: bool,
    /// Text for the collapsed control.
    pub label: String,
    pub value: Option<String>,
    pub disabled: bool,
}

impl<T: ResultItem> View<T> {
    pub fn is_selected(&self, item: &T) -> bool {
        self.value.as_deref() == Some(item.identity())
    }
}

impl<T> View<T> {
    /// A scroll to the bottom would start a fetch right now.
    pub fn can_load_more(&self) -> bool {
        self.state == DropdownState::OpenResults && self.has_more
    }
}
