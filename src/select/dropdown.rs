//! Dropdown interaction controller.
//!
//! Pure state machine: every UI event and every async completion goes through
//! [`Controller::handle`], which mutates state and returns the side effects the driver
//! has to perform (arm/cancel the debounce timer, start a fetch). No I/O happens here,
//! so every transition can be exercised synchronously.

use tracing::debug;

use crate::config::SelectorConfig;
use crate::select::accumulator::{Applied, ResultList};
use crate::select::committer::SelectionCommitter;
use crate::select::fetcher::FetchState;
use crate::select::types::{
    DropdownState, PageOutcome, PageRequest, Props, QueryTicket, ResultItem, ScrollMetrics, View,
};

#[derive(Debug, Clone)]
pub enum Msg<T> {
    /// Focus on the control. Opens it; already open stays open.
    Activate,
    /// Click on the control header: opens when closed, closes when open.
    Toggle,
    OutsideClick,
    /// New value of the query input.
    Input(String),
    DebounceElapsed { epoch: u64 },
    Scrolled(ScrollMetrics),
    PageLoaded(PageOutcome<T>),
    /// Pick the item at this index of the displayed list.
    Select(usize),
    Clear,
    SetProps(Props),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)arm the debounce timer for this query lifetime.
    Debounce(QueryTicket),
    CancelDebounce,
    Fetch(PageRequest),
}

pub struct Controller<T, S> {
    config: SelectorConfig,
    props: Props,
    open: bool,
    input_focused: bool,
    query: String,
    epoch: u64,
    results: ResultList<T>,
    fetch: FetchState,
    committer: SelectionCommitter<T, S>,
}

impl<T: ResultItem, S: Default> Controller<T, S> {
    pub fn new(config: SelectorConfig, props: Props, committer: SelectionCommitter<T, S>) -> Self {
        Self {
            config,
            props,
            open: false,
            input_focused: false,
            query: String::new(),
            epoch: 0,
            results: ResultList::new(),
            fetch: FetchState::default(),
            committer,
        }
    }

    pub fn ticket(&self) -> QueryTicket {
        QueryTicket {
            epoch: self.epoch,
            query: self.query.clone(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &ResultList<T> {
        &self.results
    }

    pub fn fetch_state(&self) -> &FetchState {
        &self.fetch
    }

    fn query_is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }

    pub fn state(&self) -> DropdownState {
        if !self.open {
            DropdownState::Closed
        } else if !self.results.is_empty() {
            if self.fetch.loading_more {
                DropdownState::OpenLoadingMore
            } else {
                DropdownState::OpenResults
            }
        } else if self.fetch.loading_first {
            DropdownState::OpenLoading
        } else if self.fetch.searched {
            DropdownState::OpenNoMatches
        } else if !self.query_is_blank() {
            // запрос набран, ждём тишины
            DropdownState::OpenLoading
        } else {
            DropdownState::OpenEmpty
        }
    }

    pub fn view(&self) -> View<T> {
        let label = if self.props.display_label.is_empty() {
            self.config.placeholder.clone()
        } else {
            self.props.display_label.clone()
        };
        View {
            state: self.state(),
            query: self.query.clone(),
            items: self.results.items().to_vec(),
            cursor: self.results.cursor(),
            total: self.results.total(),
            has_more: self.results.has_more(),
            error: self.fetch.failed,
            input_focused: self.input_focused,
            label,
            value: self.props.value.clone(),
            disabled: self.props.disabled,
        }
    }

    pub fn handle(&mut self, msg: Msg<T>) -> Vec<Effect> {
        match msg {
            Msg::Activate => {
                if !self.props.disabled && !self.open {
                    self.open = true;
                    self.input_focused = true;
                }
                Vec::new()
            }
            Msg::Toggle => {
                if self.open {
                    self.close()
                } else {
                    self.handle(Msg::Activate)
                }
            }
            Msg::OutsideClick => {
                if self.open {
                    self.close()
                } else {
                    Vec::new()
                }
            }
            Msg::Input(text) => self.on_input(text),
            Msg::DebounceElapsed { epoch } => {
                if !self.open || epoch != self.epoch || self.query_is_blank() {
                    return Vec::new();
                }
                let ticket = self.ticket();
                self.fetch
                    .begin_first(ticket, self.config.page_size)
                    .map(Effect::Fetch)
                    .into_iter()
                    .collect()
            }
            Msg::Scrolled(metrics) => self.on_scroll(metrics),
            Msg::PageLoaded(outcome) => {
                self.on_page(outcome);
                Vec::new()
            }
            Msg::Select(index) => {
                if !self.open {
                    return Vec::new();
                }
                let Some(item) = self.results.get(index).cloned() else {
                    return Vec::new();
                };
                self.committer.select(&item);
                self.close()
            }
            Msg::Clear => {
                if self.props.disabled {
                    return Vec::new();
                }
                self.committer.clear();
                if self.open {
                    self.close()
                } else {
                    Vec::new()
                }
            }
            Msg::SetProps(props) => {
                let disable = props.disabled;
                self.props = props;
                if disable && self.open {
                    self.close()
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn on_input(&mut self, text: String) -> Vec<Effect> {
        if self.props.disabled || !self.open || text == self.query {
            return Vec::new();
        }
        self.query = text;
        self.reset_search();
        if self.query_is_blank() {
            vec![Effect::CancelDebounce]
        } else {
            vec![Effect::Debounce(self.ticket())]
        }
    }

    fn on_scroll(&mut self, metrics: ScrollMetrics) -> Vec<Effect> {
        if self.state() != DropdownState::OpenResults
            || self.query_is_blank()
            || !metrics.near_bottom(self.config.scroll_threshold_px)
        {
            return Vec::new();
        }
        let ticket = self.ticket();
        self.fetch
            .begin_more(
                ticket,
                self.results.cursor(),
                self.config.page_size,
                self.results.has_more(),
            )
            .map(Effect::Fetch)
            .into_iter()
            .collect()
    }

    fn on_page(&mut self, outcome: PageOutcome<T>) {
        let PageOutcome { request, result } = outcome;
        if request.ticket.epoch != self.epoch {
            debug!(
                query = %request.ticket.query,
                offset = request.offset,
                "dropping response for superseded query"
            );
            return;
        }
        match result {
            Ok(page) => {
                self.fetch.finish(&request, true);
                if self.results.apply(page, request.append) == Applied::Stale {
                    debug!(offset = request.offset, "dropping page behind cursor");
                }
            }
            Err(_) => {
                self.fetch.finish(&request, false);
                self.results.fail(request.append);
            }
        }
    }

    /// Query, results, cursor and flags back to a fresh query lifetime.
    fn reset_search(&mut self) {
        self.epoch += 1;
        self.results.reset();
        self.fetch.reset();
    }

    fn close(&mut self) -> Vec<Effect> {
        self.open = false;
        self.input_focused = false;
        self.query.clear();
        self.reset_search();
        vec![Effect::CancelDebounce]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::select::types::ResultPage;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    struct Item(String);

    impl ResultItem for Item {
        fn identity(&self) -> &str {
            &self.0
        }
        fn title(&self) -> &str {
            &self.0
        }
        fn subtitle(&self) -> Vec<String> {
            Vec::new()
        }
    }

    type Commits = Arc<Mutex<Vec<String>>>;

    fn controller() -> (Controller<Item, String>, Commits) {
        let commits: Commits = Arc::default();
        let sink = commits.clone();
        let committer = SelectionCommitter::new(
            |i: &Item| i.0.clone(),
            move |s: String| sink.lock().unwrap().push(s),
        );
        (
            Controller::new(SelectorConfig::default(), Props::default(), committer),
            commits,
        )
    }

    fn items(range: std::ops::Range<usize>) -> Vec<Item> {
        range.map(|i| Item(format!("c{i}"))).collect()
    }

    fn fetch_of(effects: Vec<Effect>) -> PageRequest {
        match effects.as_slice() {
            [Effect::Fetch(req)] => req.clone(),
            other => panic!("expected one fetch, got {other:?}"),
        }
    }

    /// Open, type, let the debounce fire; returns the first-page request.
    fn type_and_settle(c: &mut Controller<Item, String>, q: &str) -> PageRequest {
        c.handle(Msg::Activate);
        let effects = c.handle(Msg::Input(q.into()));
        let Effect::Debounce(ticket) = &effects[0] else {
            panic!("expected debounce, got {effects:?}");
        };
        fetch_of(c.handle(Msg::DebounceElapsed { epoch: ticket.epoch }))
    }

    fn ok(req: &PageRequest, items: Vec<Item>, total: usize) -> Msg<Item> {
        Msg::PageLoaded(PageOutcome {
            request: req.clone(),
            result: Ok(ResultPage::new(items, total, req.offset)),
        })
    }

    fn failed(req: &PageRequest) -> Msg<Item> {
        Msg::PageLoaded(PageOutcome {
            request: req.clone(),
            result: Err("connection refused".into()),
        })
    }

    #[test]
    fn activate_opens_empty_and_focuses() {
        let (mut c, _) = controller();
        assert_eq!(c.state(), DropdownState::Closed);
        c.handle(Msg::Activate);
        let v = c.view();
        assert_eq!(v.state, DropdownState::OpenEmpty);
        assert!(v.input_focused);
    }

    #[test]
    fn blank_query_resets_without_fetch() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..10), 23));
        assert_eq!(c.state(), DropdownState::OpenResults);

        let effects = c.handle(Msg::Input("   ".into()));
        assert_eq!(effects, vec![Effect::CancelDebounce]);
        let v = c.view();
        assert_eq!(v.state, DropdownState::OpenEmpty);
        assert!(v.items.is_empty());
        assert_eq!(v.cursor, 0);
        assert!(v.has_more);
    }

    #[test]
    fn calc_scenario_paginates_to_the_end() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "calc");
        assert_eq!((first.offset, first.limit, first.append), (0, 10, false));
        assert_eq!(c.state(), DropdownState::OpenLoading);

        c.handle(ok(&first, items(0..10), 23));
        assert_eq!((c.view().cursor, c.view().has_more), (10, true));

        let second = fetch_of(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())));
        assert_eq!(second.offset, 10);
        assert_eq!(c.state(), DropdownState::OpenLoadingMore);
        c.handle(ok(&second, items(10..20), 23));
        assert_eq!((c.view().cursor, c.view().has_more), (20, true));

        let third = fetch_of(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())));
        assert_eq!(third.offset, 20);
        c.handle(ok(&third, items(20..23), 23));
        let v = c.view();
        assert_eq!((v.cursor, v.has_more, v.items.len()), (23, false, 23));

        assert!(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())).is_empty());
    }

    #[test]
    fn scroll_far_from_bottom_does_nothing() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..10), 23));
        let far = ScrollMetrics {
            scroll_top: 0.0,
            scroll_height: 1000.0,
            client_height: 256.0,
        };
        assert!(c.handle(Msg::Scrolled(far)).is_empty());
    }

    #[test]
    fn no_second_page_request_while_one_is_in_flight() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "calc");
        // пока первая страница летит, скролл ничего не делает
        assert!(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())).is_empty());
        c.handle(ok(&first, items(0..10), 23));

        let _second = fetch_of(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())));
        assert!(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())).is_empty());
        assert!(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())).is_empty());
    }

    #[test]
    fn out_of_order_pages_are_applied_in_offset_order() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "calc");
        let second = PageRequest {
            ticket: first.ticket.clone(),
            offset: 10,
            limit: 10,
            append: true,
        };
        c.handle(ok(&second, items(10..20), 23));
        assert!(c.view().items.is_empty());

        c.handle(ok(&first, items(0..10), 23));
        let v = c.view();
        assert_eq!(v.items, items(0..20));
        assert_eq!(v.cursor, 20);
    }

    #[test]
    fn zero_matches_is_not_an_error() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "xyz-no-match");
        c.handle(ok(&first, vec![], 0));
        let v = c.view();
        assert_eq!(v.state, DropdownState::OpenNoMatches);
        assert!(!v.error);
        assert!(!v.has_more);
    }

    #[test]
    fn first_page_error_is_no_matches_with_error_flag() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "abc");
        c.handle(failed(&first));
        let v = c.view();
        assert_eq!(v.state, DropdownState::OpenNoMatches);
        assert!(v.error);
        assert!(!v.has_more);
        assert!(v.items.is_empty());
    }

    #[test]
    fn later_page_error_keeps_results_and_stops() {
        let (mut c, _) = controller();
        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..10), 23));
        let second = fetch_of(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())));
        c.handle(failed(&second));

        let v = c.view();
        assert_eq!(v.state, DropdownState::OpenResults);
        assert_eq!(v.items.len(), 10);
        assert!(v.error && !v.has_more);
        assert!(c.handle(Msg::Scrolled(ScrollMetrics::at_bottom())).is_empty());
    }

    #[test]
    fn superseded_response_is_ignored() {
        let (mut c, _) = controller();
        let old = type_and_settle(&mut c, "calc");
        let effects = c.handle(Msg::Input("physics".into()));
        assert!(matches!(effects.as_slice(), [Effect::Debounce(_)]));

        c.handle(ok(&old, items(0..10), 23));
        let v = c.view();
        assert!(v.items.is_empty());
        assert_eq!(v.state, DropdownState::OpenLoading);
    }

    #[test]
    fn stale_debounce_tick_is_ignored() {
        let (mut c, _) = controller();
        c.handle(Msg::Activate);
        let Effect::Debounce(old) = c.handle(Msg::Input("ca".into())).remove(0) else {
            panic!()
        };
        c.handle(Msg::Input("calc".into()));
        assert!(c.handle(Msg::DebounceElapsed { epoch: old.epoch }).is_empty());
    }

    #[test]
    fn select_commits_and_resets_everything() {
        let (mut c, commits) = controller();
        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..10), 23));

        let effects = c.handle(Msg::Select(3));
        assert_eq!(effects, vec![Effect::CancelDebounce]);
        assert_eq!(*commits.lock().unwrap(), vec!["c3".to_string()]);

        let v = c.view();
        assert_eq!(v.state, DropdownState::Closed);
        assert_eq!(v.query, "");
        assert!(v.items.is_empty());
        assert_eq!(v.cursor, 0);
        assert!(v.has_more);
    }

    #[test]
    fn select_out_of_range_is_noop() {
        let (mut c, commits) = controller();
        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..2), 2));
        assert!(c.handle(Msg::Select(5)).is_empty());
        assert!(commits.lock().unwrap().is_empty());
        assert_eq!(c.state(), DropdownState::OpenResults);
    }

    #[test]
    fn clear_commits_sentinel_without_opening() {
        let (mut c, commits) = controller();
        c.handle(Msg::Clear);
        assert_eq!(*commits.lock().unwrap(), vec![String::new()]);
        assert_eq!(c.state(), DropdownState::Closed);
    }

    #[test]
    fn outside_click_closes_and_discards_results() {
        let (mut c, commits) = controller();
        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..10), 23));
        c.handle(Msg::OutsideClick);
        assert_eq!(c.state(), DropdownState::Closed);
        assert!(c.results().is_empty());
        assert!(commits.lock().unwrap().is_empty());

        c.handle(Msg::Activate);
        assert_eq!(c.state(), DropdownState::OpenEmpty);
    }

    #[test]
    fn disabled_control_ignores_interaction() {
        let (mut c, commits) = controller();
        c.handle(Msg::SetProps(Props {
            disabled: true,
            ..Props::default()
        }));
        c.handle(Msg::Activate);
        assert_eq!(c.state(), DropdownState::Closed);
        assert!(c.handle(Msg::Input("calc".into())).is_empty());
        c.handle(Msg::Clear);
        assert!(commits.lock().unwrap().is_empty());
    }

    #[test]
    fn toggle_opens_then_closes_and_discards_query() {
        let (mut c, _) = controller();
        c.handle(Msg::Toggle);
        assert_eq!(c.state(), DropdownState::OpenEmpty);

        let first = type_and_settle(&mut c, "calc");
        c.handle(ok(&first, items(0..10), 23));
        let effects = c.handle(Msg::Toggle);
        assert_eq!(effects, vec![Effect::CancelDebounce]);
        assert_eq!(c.state(), DropdownState::Closed);
        assert!(c.query().is_empty());
        assert!(c.results().is_empty());

        c.handle(Msg::SetProps(Props {
            disabled: true,
            ..Props::default()
        }));
        c.handle(Msg::Toggle);
        assert_eq!(c.state(), DropdownState::Closed);
    }

    #[test]
    fn disabling_an_open_control_closes_it() {
        let (mut c, _) = controller();
        c.handle(Msg::Activate);
        c.handle(Msg::SetProps(Props {
            disabled: true,
            ..Props::default()
        }));
        assert_eq!(c.state(), DropdownState::Closed);
    }

    #[test]
    fn label_falls_back_to_placeholder_and_marks_selection() {
        let (mut c, _) = controller();
        assert_eq!(c.view().label, SelectorConfig::default().placeholder);
        c.handle(Msg::SetProps(Props {
            value: Some("c1".into()),
            display_label: "Calculus I".into(),
            disabled: false,
        }));
        let v = c.view();
        assert_eq!(v.label, "Calculus I");
        assert!(v.is_selected(&Item("c1".into())));
        assert!(!v.is_selected(&Item("c2".into())));
    }
}
