use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pastexam::select::{
    self, DropdownState, Props, ResultItem, ResultPage, ScrollMetrics, SearchSource,
    SelectHandle, SelectionCommitter,
};
use pastexam::SelectorConfig;

#[derive(Debug, Clone, PartialEq)]
struct Hit(String);

impl ResultItem for Hit {
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

type Calls = Arc<Mutex<Vec<(String, usize, usize)>>>;

/// "calc*" -> 23 hits, "abc" -> error, queries starting with "slow" answer after a second,
/// everything else matches nothing.
#[derive(Default)]
struct FakeSource {
    calls: Calls,
}

#[async_trait]
impl SearchSource for FakeSource {
    type Item = Hit;

    async fn search(&self, query: &str, offset: usize, limit: usize) -> anyhow::Result<ResultPage<Hit>> {
        self.calls.lock().unwrap().push((query.to_string(), offset, limit));
        if query.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        let total = match query {
            "abc" => anyhow::bail!("backend unavailable"),
            q if q.starts_with("calc") || q.starts_with("slow") => 23,
            _ => 0,
        };
        let end = (offset + limit).min(total);
        let items = (offset.min(end)..end).map(|i| Hit(format!("{query} {i}"))).collect();
        Ok(ResultPage::new(items, total, offset))
    }
}

type Commits = Arc<Mutex<Vec<String>>>;

fn start() -> (SelectHandle<Hit>, Calls, Commits) {
    let source = FakeSource::default();
    let calls = source.calls.clone();
    let commits: Commits = Arc::default();
    let sink = commits.clone();
    let committer = SelectionCommitter::new(
        |h: &Hit| h.0.clone(),
        move |s: String| sink.lock().unwrap().push(s),
    );
    let handle = select::spawn(Arc::new(source), committer, SelectorConfig::default(), Props::default());
    (handle, calls, commits)
}

fn type_text(handle: &SelectHandle<Hit>, text: &str) {
    for end in 1..=text.len() {
        handle.input(&text[..end]);
    }
}

#[tokio::test(start_paused = true)]
async fn keystrokes_collapse_into_one_search() {
    let (mut handle, calls, _) = start();
    handle.activate();
    type_text(&handle, "calc");

    let v = handle.wait_until(|v| v.state == DropdownState::OpenResults).await;
    assert_eq!(v.query, "calc");
    assert_eq!(v.items.len(), 10);
    assert_eq!(*calls.lock().unwrap(), vec![("calc".to_string(), 0, 10)]);
}

#[tokio::test(start_paused = true)]
async fn pending_debounce_reads_as_loading() {
    let (mut handle, calls, _) = start();
    handle.activate();
    handle.input("calc");
    let v = handle.wait_until(|v| v.query == "calc").await;
    assert_eq!(v.state, DropdownState::OpenLoading);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn blank_query_never_searches() {
    let (mut handle, calls, _) = start();
    handle.activate();
    handle.input("   ");
    tokio::time::sleep(Duration::from_secs(1)).await;

    let v = handle.wait_until(|v| v.query == "   ").await;
    assert_eq!(v.state, DropdownState::OpenEmpty);
    assert!(calls.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn scrolling_pages_through_all_results() {
    let (mut handle, calls, _) = start();
    handle.activate();
    handle.input("calc");
    handle.wait_until(|v| v.state == DropdownState::OpenResults).await;

    handle.scroll(ScrollMetrics::at_bottom());
    // second scroll lands while the first page-load is in flight
    handle.scroll(ScrollMetrics::at_bottom());
    let v = handle.wait_until(|v| v.cursor == 20 && v.state == DropdownState::OpenResults).await;
    assert!(v.has_more);

    handle.scroll(ScrollMetrics::at_bottom());
    let v = handle.wait_until(|v| v.cursor == 23).await;
    assert!(!v.has_more);
    assert_eq!(v.items.last().unwrap().0, "calc 22");

    handle.scroll(ScrollMetrics::at_bottom());
    tokio::time::sleep(Duration::from_secs(1)).await;

    let offsets: Vec<usize> = calls.lock().unwrap().iter().map(|c| c.1).collect();
    assert_eq!(offsets, vec![0, 10, 20]);
}

#[tokio::test(start_paused = true)]
async fn superseded_response_is_discarded() {
    let (mut handle, calls, _) = start();
    handle.activate();
    handle.input("slow");
    // debounce fired, the slow request is in flight
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(calls.lock().unwrap().len(), 1);

    handle.input("calc");
    let v = handle.wait_until(|v| v.state == DropdownState::OpenResults).await;
    assert_eq!(v.items[0].0, "calc 0");

    tokio::time::sleep(Duration::from_secs(2)).await;
    let v = handle.view();
    assert_eq!(v.query, "calc");
    assert!(v.items.iter().all(|h| h.0.starts_with("calc")));
    assert_eq!(v.items.len(), 10);
}

#[tokio::test(start_paused = true)]
async fn selecting_commits_once_and_resets() {
    let (mut handle, _, commits) = start();
    handle.activate();
    handle.input("calc");
    handle.wait_until(|v| v.state == DropdownState::OpenResults).await;

    handle.select(2);
    let v = handle.wait_until(|v| v.state == DropdownState::Closed).await;
    assert_eq!(*commits.lock().unwrap(), vec!["calc 2".to_string()]);
    assert!(v.query.is_empty());
    assert!(v.items.is_empty());

    handle.activate();
    let v = handle.wait_until(|v| v.state.is_open()).await;
    assert_eq!(v.state, DropdownState::OpenEmpty);
}

#[tokio::test(start_paused = true)]
async fn failed_search_is_flagged() {
    let (mut handle, _, _) = start();
    handle.activate();
    handle.input("abc");
    let v = handle.wait_until(|v| v.state == DropdownState::OpenNoMatches).await;
    assert!(v.error);
    assert!(v.items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn no_matches_is_not_an_error() {
    let (mut handle, _, _) = start();
    handle.activate();
    handle.input("xyz");
    let v = handle.wait_until(|v| v.state == DropdownState::OpenNoMatches).await;
    assert!(!v.error);
}

#[tokio::test(start_paused = true)]
async fn clear_sends_the_empty_selection() {
    let (mut handle, _, commits) = start();
    handle.set_props(Props {
        value: Some("calc 2".into()),
        display_label: "calc 2".into(),
        disabled: false,
    });
    handle.clear();
    let v = handle.wait_until(|v| v.label == "calc 2").await;
    assert_eq!(v.state, DropdownState::Closed);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(*commits.lock().unwrap(), vec![String::new()]);
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_pending_debounce() {
    let (handle, calls, _) = start();
    handle.activate();
    handle.input("calc");
    handle.shutdown().await;

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(calls.lock().unwrap().is_empty());
}
