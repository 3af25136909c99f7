//! Incremental search-select control.
//!
//! One tokio task per control instance owns the [`Controller`], the [`Debouncer`] and the
//! [`PagedFetcher`]. UI events and async completions share one mailbox, so every state
//! change is applied by a single writer in arrival order. The embedding side talks to the
//! task through a [`SelectHandle`] and observes it through `watch` snapshots.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::SelectorConfig;

pub mod accumulator;
pub mod committer;
pub mod debounce;
pub mod dropdown;
pub mod fetcher;
pub mod types;

pub use accumulator::{Applied, ResultList};
pub use committer::SelectionCommitter;
pub use debounce::Debouncer;
pub use dropdown::{Controller, Effect, Msg};
pub use fetcher::{FetchState, PagedFetcher};
pub use types::{
    DropdownState, PageOutcome, PageRequest, Props, QueryTicket, ResultItem, ResultPage,
    ScrollMetrics, SearchSource, View,
};

/// Starts a control bound to `source`. Commits are delivered through `committer`.
pub fn spawn<Src, S>(
    source: Arc<Src>,
    committer: SelectionCommitter<Src::Item, S>,
    config: SelectorConfig,
    props: Props,
) -> SelectHandle<Src::Item>
where
    Src: SearchSource,
    S: Default + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let controller = Controller::new(config.clone(), props, committer);
    let (view_tx, view_rx) = watch::channel(controller.view());
    let shutdown = CancellationToken::new();

    let driver = Driver {
        controller,
        fetcher: PagedFetcher::new(source),
        debouncer: Debouncer::new(config.debounce()),
        mailbox: tx.clone(),
        view_tx,
        shutdown: shutdown.clone(),
    };
    let task = tokio::spawn(driver.run(rx));

    SelectHandle {
        events: tx,
        view: view_rx,
        shutdown,
        task: Some(task),
    }
}

struct Driver<Src: SearchSource, S> {
    controller: Controller<Src::Item, S>,
    fetcher: PagedFetcher<Src>,
    debouncer: Debouncer,
    mailbox: mpsc::UnboundedSender<Msg<Src::Item>>,
    view_tx: watch::Sender<View<Src::Item>>,
    shutdown: CancellationToken,
}

impl<Src, S> Driver<Src, S>
where
    Src: SearchSource,
    S: Default + Send + 'static,
{
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Msg<Src::Item>>) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                msg = rx.recv() => match msg {
                    Some(msg) => self.dispatch(msg),
                    None => break,
                },
            }
        }
        // висящий таймер и летящие запросы не должны пережить контрол
        self.debouncer.cancel();
        self.shutdown.cancel();
        debug!("search-select stopped");
    }

    fn dispatch(&mut self, msg: Msg<Src::Item>) {
        for effect in self.controller.handle(msg) {
            match effect {
                Effect::Debounce(ticket) => {
                    let tx = self.mailbox.clone();
                    let epoch = ticket.epoch;
                    self.debouncer.schedule(move || {
                        let _ = tx.send(Msg::DebounceElapsed { epoch });
                    });
                }
                Effect::CancelDebounce => self.debouncer.cancel(),
                Effect::Fetch(request) => self.start_fetch(request),
            }
        }
        self.view_tx.send_replace(self.controller.view());
    }

    fn start_fetch(&self, request: PageRequest) {
        let fetcher = self.fetcher.clone();
        let tx = self.mailbox.clone();
        let ct = self.shutdown.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = ct.cancelled() => {}
                outcome = fetcher.fetch(request) => {
                    let _ = tx.send(Msg::PageLoaded(outcome));
                }
            }
        });
    }
}

/// Embedding side of a running control. Dropping it tears the control down.
pub struct SelectHandle<T> {
    events: mpsc::UnboundedSender<Msg<T>>,
    view: watch::Receiver<View<T>>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<T: ResultItem> SelectHandle<T> {
    fn send(&self, msg: Msg<T>) {
        let _ = self.events.send(msg);
    }

    pub fn activate(&self) {
        self.send(Msg::Activate);
    }

    pub fn toggle(&self) {
        self.send(Msg::Toggle);
    }

    pub fn outside_click(&self) {
        self.send(Msg::OutsideClick);
    }

    pub fn input(&self, text: impl Into<String>) {
        self.send(Msg::Input(text.into()));
    }

    pub fn scroll(&self, metrics: ScrollMetrics) {
        self.send(Msg::Scrolled(metrics));
    }

    pub fn select(&self, index: usize) {
        self.send(Msg::Select(index));
    }

    pub fn clear(&self) {
        self.send(Msg::Clear);
    }

    pub fn set_props(&self, props: Props) {
        self.send(Msg::SetProps(props));
    }

    /// Latest published snapshot.
    pub fn view(&self) -> View<T> {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<View<T>> {
        self.view.clone()
    }

    /// Waits until a snapshot satisfies `pred` (or the control stops) and returns it.
    pub async fn wait_until<F>(&mut self, mut pred: F) -> View<T>
    where
        F: FnMut(&View<T>) -> bool,
    {
        loop {
            {
                let v = self.view.borrow_and_update();
                if pred(&v) {
                    return v.clone();
                }
            }
            if self.view.changed().await.is_err() {
                return self.view.borrow().clone();
            }
        }
    }

    /// Cancels the debounce timer and in-flight fetches and waits for the task to finish.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<T> Drop for SelectHandle<T> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
