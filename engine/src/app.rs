//! Session orchestration.
//!
//! [`App`] owns the [`Session`] and is driven from a single control loop.
//! Each accepted query spawns one collaborator call on a tokio task; the
//! outcome comes back over a channel and is applied by
//! [`App::process_completions`] (non-blocking, once per frame) or
//! [`App::next_completion`] (awaiting, for one-shot mode).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;

use mapscout_providers::{SearchCollaborator, SearchError, SearchRequest};
use mapscout_types::SearchResponse;

use crate::export::{self, ExportError};
use crate::geolocation::LocationSlot;
use crate::session::{Completion, RequestId, Session};

#[derive(Debug)]
struct SearchCompletion {
    request: RequestId,
    outcome: Result<SearchResponse, SearchError>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient status-bar message that does not belong to the session itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

const SCROLL_LINE: u16 = 1;
const SCROLL_PAGE: u16 = 10;

/// Results-pane position, counted in rendered rows from the top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ResultsScroll {
    offset: u16,
    max: u16,
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// Free-text area added to every request.
    pub area_hint: Option<String>,
    /// Directory for the export artifact. `None` means the current directory.
    pub export_dir: Option<PathBuf>,
    pub ascii_only: bool,
}

pub struct App<C> {
    session: Session,
    collaborator: Arc<C>,
    location: LocationSlot,
    options: AppOptions,
    completions_tx: mpsc::UnboundedSender<SearchCompletion>,
    completions_rx: mpsc::UnboundedReceiver<SearchCompletion>,
    notice: Option<Notice>,
    scroll: ResultsScroll,
    tick: usize,
}

impl<C> App<C>
where
    C: SearchCollaborator + 'static,
{
    pub fn new(collaborator: C, options: AppOptions) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(),
            collaborator: Arc::new(collaborator),
            location: LocationSlot::new(),
            options,
            completions_tx,
            completions_rx,
            notice: None,
            scroll: ResultsScroll::default(),
            tick: 0,
        }
    }

    /// Handle for the geolocation task to publish into.
    #[must_use]
    pub fn location_slot(&self) -> LocationSlot {
        self.location.clone()
    }

    /// Submit a query. Blank input is ignored and returns `None`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_query(&mut self, raw: &str) -> Option<RequestId> {
        let dispatch = self.session.submit(raw)?;
        self.notice = None;

        let request = SearchRequest::new(dispatch.query)
            .with_location(self.location.get())
            .with_area_hint(self.options.area_hint.clone());
        tracing::debug!(
            request = %dispatch.request,
            query = %request.query,
            has_location = request.location.is_some(),
            "Dispatching search"
        );

        let collaborator = Arc::clone(&self.collaborator);
        let tx = self.completions_tx.clone();
        let id = dispatch.request;
        tokio::spawn(async move {
            let outcome = collaborator.search(request).await;
            // Receiver lives as long as the App; a send error means shutdown.
            let _ = tx.send(SearchCompletion {
                request: id,
                outcome,
            });
        });

        Some(id)
    }

    /// Apply every completion that has already arrived. Returns how many were applied.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            self.apply(completion);
            applied += 1;
        }
        applied
    }

    /// Wait for the next completion and apply it.
    pub async fn next_completion(&mut self) -> Option<(RequestId, Completion)> {
        let completion = self.completions_rx.recv().await?;
        let request = completion.request;
        Some((request, self.apply(completion)))
    }

    fn apply(&mut self, completion: SearchCompletion) -> Completion {
        let SearchCompletion { request, outcome } = completion;
        if let Err(e) = &outcome {
            tracing::warn!(request = %request, "Search failed: {e}");
        }
        let result = self.session.complete(request, outcome);
        match result {
            Completion::Succeeded => {
                self.scroll.offset = 0;
                tracing::info!(
                    request = %request,
                    places = self.session.results().len(),
                    "Search complete"
                );
            }
            Completion::Stale => {
                tracing::debug!(request = %request, "Discarded superseded search response");
            }
            Completion::Failed => {}
        }
        result
    }

    /// Write the current results to the export file.
    pub fn export(&mut self) -> Result<PathBuf, ExportError> {
        let result = export::write_export(self.export_dir(), self.session.results());
        self.set_export_notice(&result);
        result
    }

    /// Write the current results as a CSV named after the current query.
    pub fn export_csv(&mut self) -> Result<PathBuf, ExportError> {
        let result = export::write_csv(
            self.export_dir(),
            self.session.query(),
            self.session.results(),
        );
        self.set_export_notice(&result);
        result
    }

    fn set_export_notice(&mut self, result: &Result<PathBuf, ExportError>) {
        self.notice = Some(match result {
            Ok(path) => Notice {
                kind: NoticeKind::Info,
                text: format!(
                    "Exported {} places to {}",
                    self.session.results().len(),
                    path.display()
                ),
            },
            Err(e) => Notice {
                kind: NoticeKind::Error,
                text: e.to_string(),
            },
        });
    }

    /// Advance animation state by one frame.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }
}

impl<C> App<C> {
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    #[must_use]
    pub fn tick_count(&self) -> usize {
        self.tick
    }

    #[must_use]
    pub fn ascii_only(&self) -> bool {
        self.options.ascii_only
    }

    #[must_use]
    pub fn area_hint(&self) -> Option<&str> {
        self.options.area_hint.as_deref()
    }

    /// Replace the area sent with later searches. Blank clears it.
    pub fn set_area_hint(&mut self, hint: Option<String>) {
        let hint = hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());
        if hint != self.options.area_hint {
            tracing::debug!(area = ?hint, "Area hint changed");
            self.options.area_hint = hint;
        }
    }

    /// Called by the renderer with the scrollable range of the results pane.
    pub fn update_scroll_max(&mut self, max: u16) {
        self.scroll.max = max;
        self.scroll.offset = self.scroll.offset.min(max);
    }

    #[must_use]
    pub fn scroll_offset(&self) -> u16 {
        self.scroll.offset.min(self.scroll.max)
    }

    pub fn scroll_up(&mut self) {
        self.scroll.offset = self.scroll.offset.saturating_sub(SCROLL_LINE);
    }

    pub fn scroll_down(&mut self) {
        self.scroll.offset = self.scroll.offset.saturating_add(SCROLL_LINE).min(self.scroll.max);
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll.offset = self.scroll.offset.saturating_sub(SCROLL_PAGE);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll.offset = self.scroll.offset.saturating_add(SCROLL_PAGE).min(self.scroll.max);
    }

    #[must_use]
    pub fn export_dir(&self) -> &Path {
        self.options
            .export_dir
            .as_deref()
            .unwrap_or_else(|| Path::new("."))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use tokio::sync::oneshot;

    use mapscout_types::{GeoLocation, Place};

    use super::*;
    use crate::session::SessionStatus;

    fn response(title: &str) -> SearchResponse {
        SearchResponse {
            places: vec![Place::new(title, format!("https://m/{title}"))],
            analysis: format!("{title} analysis"),
        }
    }

    /// Answers immediately and records every request it sees.
    #[derive(Default)]
    struct Recording {
        requests: Mutex<Vec<SearchRequest>>,
    }

    impl SearchCollaborator for Recording {
        async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
            let title = request.query.to_string();
            self.requests.lock().unwrap().push(request);
            Ok(response(&title))
        }
    }

    /// Holds each response until the test releases it.
    #[derive(Default)]
    struct Gated {
        gates: Mutex<HashMap<String, oneshot::Receiver<Result<SearchResponse, SearchError>>>>,
    }

    impl Gated {
        fn gate(&self, query: &str) -> oneshot::Sender<Result<SearchResponse, SearchError>> {
            let (tx, rx) = oneshot::channel();
            self.gates.lock().unwrap().insert(query.to_string(), rx);
            tx
        }
    }

    impl SearchCollaborator for Gated {
        async fn search(&self, request: SearchRequest) -> Result<SearchResponse, SearchError> {
            let rx = self.gates.lock().unwrap().remove(request.query.as_str());
            match rx {
                Some(rx) => rx.await.unwrap_or(Err(SearchError::Unspecified)),
                None => Err(SearchError::Unspecified),
            }
        }
    }

    #[tokio::test]
    async fn blank_query_dispatches_nothing() {
        let recorder = Arc::new(Recording::default());
        let mut app = App::new(Arc::clone(&recorder), AppOptions::default());

        assert_eq!(app.submit_query("   "), None);
        assert_eq!(app.session().status(), &SessionStatus::Idle);
        tokio::task::yield_now().await;
        assert!(recorder.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_is_loading_until_completion_applied() {
        let recorder = Arc::new(Recording::default());
        let mut app = App::new(Arc::clone(&recorder), AppOptions::default());

        app.submit_query("coffee").unwrap();
        assert!(app.session().is_loading());
        assert_eq!(app.session().error(), None);

        let (_, completion) = app.next_completion().await.unwrap();
        assert_eq!(completion, Completion::Succeeded);
        assert!(!app.session().is_loading());
        assert_eq!(app.session().results()[0].title, "coffee");
    }

    #[tokio::test]
    async fn location_is_read_at_dispatch_time() {
        let recorder = Arc::new(Recording::default());
        let mut app = App::new(Arc::clone(&recorder), AppOptions::default());
        let location = GeoLocation::new(30.0, -97.0).unwrap();

        app.submit_query("first").unwrap();
        app.location_slot().publish(location);
        app.next_completion().await.unwrap();

        app.submit_query("second").unwrap();
        app.next_completion().await.unwrap();

        let seen: Vec<_> = recorder
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.query.to_string(), r.location))
            .collect();
        assert_eq!(
            seen,
            [
                ("first".to_string(), None),
                ("second".to_string(), Some(location))
            ]
        );
    }

    #[tokio::test]
    async fn area_hint_is_forwarded() {
        let recorder = Arc::new(Recording::default());
        let options = AppOptions {
            area_hint: Some("Austin, TX".into()),
            ..AppOptions::default()
        };
        let mut app = App::new(Arc::clone(&recorder), options);

        app.submit_query("roofers").unwrap();
        app.next_completion().await.unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests[0].area_hint.as_deref(), Some("Austin, TX"));
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let gated = Arc::new(Gated::default());
        let release_old = gated.gate("old");
        let release_new = gated.gate("new");
        let mut app = App::new(Arc::clone(&gated), AppOptions::default());

        let old = app.submit_query("old").unwrap();
        let new = app.submit_query("new").unwrap();

        release_new.send(Ok(response("new"))).unwrap();
        assert_eq!(
            app.next_completion().await,
            Some((new, Completion::Succeeded))
        );

        release_old.send(Ok(response("old"))).unwrap();
        assert_eq!(app.next_completion().await, Some((old, Completion::Stale)));
        assert_eq!(app.session().results()[0].title, "new");
        assert_eq!(app.session().query(), "new");
    }

    #[tokio::test]
    async fn failure_surfaces_message_and_keeps_results() {
        let gated = Arc::new(Gated::default());
        let first = gated.gate("pizza");
        let second = gated.gate("sushi");
        let mut app = App::new(Arc::clone(&gated), AppOptions::default());

        app.submit_query("pizza").unwrap();
        first.send(Ok(response("pizza"))).unwrap();
        app.next_completion().await.unwrap();

        app.submit_query("sushi").unwrap();
        second
            .send(Err(SearchError::Api {
                status: Some(429),
                message: "rate limited".into(),
            }))
            .unwrap();
        app.next_completion().await.unwrap();

        assert_eq!(app.session().error(), Some("rate limited"));
        assert_eq!(app.session().results()[0].title, "pizza");
    }

    #[tokio::test]
    async fn process_completions_drains_without_blocking() {
        let gated = Arc::new(Gated::default());
        let release = gated.gate("tea");
        let mut app = App::new(Arc::clone(&gated), AppOptions::default());

        app.submit_query("tea").unwrap();
        assert_eq!(app.process_completions(), 0);
        assert!(app.session().is_loading());

        release.send(Ok(response("tea"))).unwrap();
        let mut applied = 0;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            applied += app.process_completions();
            if applied > 0 {
                break;
            }
        }
        assert_eq!(applied, 1);
        assert!(!app.session().is_loading());
    }

    #[tokio::test]
    async fn export_writes_file_and_sets_notice() {
        let dir = tempfile::tempdir().unwrap();
        let recorder = Arc::new(Recording::default());
        let options = AppOptions {
            export_dir: Some(dir.path().to_path_buf()),
            ..AppOptions::default()
        };
        let mut app = App::new(Arc::clone(&recorder), options);

        app.submit_query("bagels").unwrap();
        app.next_completion().await.unwrap();
        let before = app.session().clone();

        let path = app.export().unwrap();
        assert!(path.ends_with("map_data_export.json"));
        assert_eq!(app.session(), &before);
        let notice = app.notice().unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert!(notice.text.starts_with("Exported 1 places"));
    }

    #[tokio::test]
    async fn export_failure_sets_error_notice() {
        let dir = tempfile::tempdir().unwrap();
        let options = AppOptions {
            export_dir: Some(dir.path().join("missing")),
            ..AppOptions::default()
        };
        let mut app = App::new(Arc::new(Recording::default()), options);

        assert!(app.export().is_err());
        assert_eq!(app.notice().unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn export_csv_names_file_after_query() {
        let dir = tempfile::tempdir().unwrap();
        let options = AppOptions {
            export_dir: Some(dir.path().to_path_buf()),
            ..AppOptions::default()
        };
        let mut app = App::new(Arc::new(Recording::default()), options);

        app.submit_query("Roof Repair").unwrap();
        app.next_completion().await.unwrap();

        let path = app.export_csv().unwrap();
        assert_eq!(path, dir.path().join("google_maps_leads_roof_repair.csv"));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Roof Repair,https://m/Roof Repair"));
        assert_eq!(app.notice().unwrap().kind, NoticeKind::Info);
    }

    #[tokio::test]
    async fn area_hint_can_change_between_searches() {
        let recorder = Arc::new(Recording::default());
        let mut app = App::new(Arc::clone(&recorder), AppOptions::default());

        app.set_area_hint(Some("  Boise, ID ".into()));
        app.submit_query("first").unwrap();
        app.next_completion().await.unwrap();

        app.set_area_hint(Some("   ".into()));
        app.submit_query("second").unwrap();
        app.next_completion().await.unwrap();

        let hints: Vec<_> = recorder
            .requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.area_hint.clone())
            .collect();
        assert_eq!(hints, [Some("Boise, ID".to_string()), None]);
        assert_eq!(app.area_hint(), None);
    }

    #[tokio::test]
    async fn scroll_is_clamped_and_resets_on_new_results() {
        let recorder = Arc::new(Recording::default());
        let mut app = App::new(Arc::clone(&recorder), AppOptions::default());

        app.update_scroll_max(12);
        app.scroll_page_down();
        app.scroll_page_down();
        assert_eq!(app.scroll_offset(), 12);
        app.scroll_up();
        assert_eq!(app.scroll_offset(), 11);

        app.update_scroll_max(5);
        assert_eq!(app.scroll_offset(), 5);

        app.submit_query("tacos").unwrap();
        app.next_completion().await.unwrap();
        assert_eq!(app.scroll_offset(), 0);
    }
}
