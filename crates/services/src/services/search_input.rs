//! Search box behaviour for list pages.
//!
//! Keystrokes are debounced; a settled term rewrites the page's query string
//! (search set or cleared, page reset to 1, other parameters kept) and the
//! resulting navigation always replaces the current history entry.

use std::time::Duration;

use tokio::{
    sync::mpsc::{self, UnboundedReceiver, UnboundedSender},
    task::JoinHandle,
    time::sleep,
};
use tracing::debug;
use url::form_urlencoded;
use utils::pagination::MIN_SEARCH_CHARS;

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(150);

/// How a navigation touches browser history. Search navigations never add
/// entries, so replacing the current one is the only mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Replace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub path: String,
    pub query: String,
    pub mode: HistoryMode,
}

impl Navigation {
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }
}

fn current_search(query: &str) -> String {
    form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "search")
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_default()
}

/// The navigation a settled search term should trigger, if any.
///
/// One-character terms and terms equal to the current search do nothing.
pub fn navigation_for_term(path: &str, current_query: &str, term: &str) -> Option<Navigation> {
    let term = term.trim();
    let chars = term.chars().count();
    if chars != 0 && chars < MIN_SEARCH_CHARS {
        return None;
    }
    if term == current_search(current_query) {
        return None;
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(current_query.as_bytes()) {
        if key != "search" && key != "page" {
            serializer.append_pair(&key, &value);
        }
    }
    if !term.is_empty() {
        serializer.append_pair("search", term);
    }
    serializer.append_pair("page", "1");

    Some(Navigation {
        path: path.to_string(),
        query: serializer.finish(),
        mode: HistoryMode::Replace,
    })
}

/// Debounced search input bound to one list page.
pub struct SearchDebouncer {
    input: UnboundedSender<String>,
    handle: JoinHandle<()>,
}

impl SearchDebouncer {
    /// Start debouncing for the page at `path` whose query string is
    /// currently `query`. Navigations are delivered on the returned receiver.
    pub fn spawn(
        path: impl Into<String>,
        query: impl Into<String>,
        delay: Duration,
    ) -> (Self, UnboundedReceiver<Navigation>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output, output_rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(input_rx, output, path.into(), query.into(), delay));
        (Self { input, handle }, output_rx)
    }

    /// Record the search box's current contents.
    pub fn input(&self, term: impl Into<String>) {
        // the task only stops once this sender is dropped
        let _ = self.input.send(term.into());
    }

    /// Flush any pending term and wait for the task to finish.
    pub async fn close(self) {
        drop(self.input);
        let _ = self.handle.await;
    }
}

async fn run(
    mut input: UnboundedReceiver<String>,
    output: UnboundedSender<Navigation>,
    path: String,
    mut query: String,
    delay: Duration,
) {
    while let Some(mut term) = input.recv().await {
        loop {
            tokio::select! {
                next = input.recv() => match next {
                    Some(next) => term = next,
                    None => break,
                },
                _ = sleep(delay) => break,
            }
        }

        if let Some(navigation) = navigation_for_term(&path, &query, &term) {
            debug!(url = %navigation.url(), "Search navigation");
            query = navigation.query.clone();
            if output.send(navigation).is_err() {
                return;
            }
        }
    }
}
