//! Search session state machine.
//!
//! ```text
//! Idle --submit--> Loading --ok--> Ready
//!                     |    \--err--> Failed
//!  Ready/Failed --submit--> Loading
//! ```
//!
//! Transitions are pure functions on [`Session`]; the caller performs the
//! collaborator call described by the returned [`Dispatch`]. Every dispatch
//! gets a fresh [`RequestId`] and only the newest one may complete the
//! session, so an older response arriving late is discarded instead of
//! overwriting newer results.

use mapscout_providers::SearchError;
use mapscout_types::{Place, SearchQuery, SearchResponse};

/// Shown when a failure carries no message of its own.
pub const GENERIC_FAILURE_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Monotonic id assigned to each dispatched search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

impl RequestId {
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Last successful search output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Findings {
    pub places: Vec<Place>,
    pub analysis: String,
}

impl Findings {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty() && self.analysis.trim().is_empty()
    }

    /// Analysis split into non-empty paragraphs.
    pub fn paragraphs(&self) -> impl Iterator<Item = &str> {
        self.analysis
            .split('\n')
            .map(str::trim)
            .filter(|p| !p.is_empty())
    }
}

impl From<SearchResponse> for Findings {
    fn from(response: SearchResponse) -> Self {
        Self {
            places: response.places,
            analysis: response.analysis,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading { request: RequestId },
    Ready,
    Failed { message: String },
}

/// Work order for the caller after a successful [`Session::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub request: RequestId,
    pub query: SearchQuery,
}

/// What [`Session::complete`] did with a collaborator outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Succeeded,
    Failed,
    /// A newer request superseded this one; the outcome was discarded.
    Stale,
}

/// The branch the presentation layer should render. Exactly one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionView<'a> {
    /// Nothing searched yet.
    Landing,
    /// A search is in flight; `stale` holds the previous findings, if any.
    Loading {
        query: &'a str,
        stale: Option<&'a Findings>,
    },
    Results {
        query: &'a str,
        findings: &'a Findings,
    },
    Failure {
        query: &'a str,
        message: &'a str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    query: String,
    findings: Findings,
    status: SessionStatus,
    next_request: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self {
            query: String::new(),
            findings: Findings::default(),
            status: SessionStatus::Idle,
            next_request: 1,
        }
    }

    /// Start a search. Blank input is a no-op and returns `None`.
    ///
    /// Prior findings stay visible while the new search runs.
    pub fn submit(&mut self, raw: &str) -> Option<Dispatch> {
        let query = SearchQuery::new(raw).ok()?;
        let request = RequestId(self.next_request);
        self.next_request += 1;

        self.query = query.as_str().to_string();
        self.status = SessionStatus::Loading { request };
        Some(Dispatch { request, query })
    }

    /// Apply a collaborator outcome for `request`.
    pub fn complete(
        &mut self,
        request: RequestId,
        outcome: Result<SearchResponse, SearchError>,
    ) -> Completion {
        if !self.is_current(request) {
            return Completion::Stale;
        }

        match outcome {
            Ok(response) => {
                self.findings = response.into();
                self.status = SessionStatus::Ready;
                Completion::Succeeded
            }
            Err(error) => {
                let message = error
                    .message()
                    .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string());
                self.status = SessionStatus::Failed { message };
                Completion::Failed
            }
        }
    }

    fn is_current(&self, request: RequestId) -> bool {
        matches!(self.status, SessionStatus::Loading { request: pending } if pending == request)
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    #[must_use]
    pub fn results(&self) -> &[Place] {
        &self.findings.places
    }

    #[must_use]
    pub fn analysis(&self) -> &str {
        &self.findings.analysis
    }

    #[must_use]
    pub fn findings(&self) -> &Findings {
        &self.findings
    }

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.status, SessionStatus::Loading { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            SessionStatus::Failed { message } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn pending_request(&self) -> Option<RequestId> {
        match self.status {
            SessionStatus::Loading { request } => Some(request),
            _ => None,
        }
    }

    #[must_use]
    pub fn view(&self) -> SessionView<'_> {
        match &self.status {
            SessionStatus::Idle => SessionView::Landing,
            SessionStatus::Loading { .. } => SessionView::Loading {
                query: &self.query,
                stale: (!self.findings.is_empty()).then_some(&self.findings),
            },
            SessionStatus::Ready => SessionView::Results {
                query: &self.query,
                findings: &self.findings,
            },
            SessionStatus::Failed { message } => SessionView::Failure {
                query: &self.query,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(title: &str) -> Place {
        Place::new(title, format!("https://maps.example/{title}"))
    }

    fn response(titles: &[&str], analysis: &str) -> SearchResponse {
        SearchResponse {
            places: titles.iter().map(|t| place(t)).collect(),
            analysis: analysis.to_string(),
        }
    }

    fn rate_limited() -> SearchError {
        SearchError::Api {
            status: Some(429),
            message: "rate limited".to_string(),
        }
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = Session::new();
        assert_eq!(session.status(), &SessionStatus::Idle);
        assert_eq!(session.query(), "");
        assert!(session.results().is_empty());
        assert_eq!(session.analysis(), "");
        assert!(!session.is_loading());
        assert_eq!(session.error(), None);
        assert_eq!(session.view(), SessionView::Landing);
    }

    #[test]
    fn blank_submit_leaves_state_untouched() {
        let mut session = Session::new();
        let dispatch = session.submit("coffee").unwrap();
        session.complete(dispatch.request, Ok(response(&["A"], "x")));
        let before = session.clone();

        for blank in ["", "   ", "\t\n"] {
            assert_eq!(session.submit(blank), None);
            assert_eq!(session, before);
        }
    }

    #[test]
    fn submit_sets_loading_and_clears_error() {
        let mut session = Session::new();
        let first = session.submit("gyms").unwrap();
        session.complete(first.request, Err(rate_limited()));
        assert_eq!(session.error(), Some("rate limited"));

        let second = session.submit("  climbing gyms  ").unwrap();
        assert!(session.is_loading());
        assert_eq!(session.error(), None);
        assert_eq!(session.query(), "climbing gyms");
        assert_eq!(second.query.as_str(), "climbing gyms");
        assert!(second.request > first.request);
    }

    #[test]
    fn success_replaces_results_in_order() {
        let mut session = Session::new();
        let dispatch = session.submit("bakeries").unwrap();
        let completion = session.complete(dispatch.request, Ok(response(&["P1", "P2"], "A")));

        assert_eq!(completion, Completion::Succeeded);
        let titles: Vec<_> = session.results().iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["P1", "P2"]);
        assert_eq!(session.analysis(), "A");
        assert!(!session.is_loading());
        assert_eq!(session.error(), None);
    }

    #[test]
    fn failure_keeps_previous_findings() {
        let mut session = Session::new();
        let first = session.submit("pizza").unwrap();
        session.complete(first.request, Ok(response(&["Slice"], "Pizza is popular")));

        let second = session.submit("sushi").unwrap();
        let completion = session.complete(second.request, Err(rate_limited()));

        assert_eq!(completion, Completion::Failed);
        assert_eq!(session.error(), Some("rate limited"));
        assert!(!session.is_loading());
        assert_eq!(session.results()[0].title, "Slice");
        assert_eq!(session.analysis(), "Pizza is popular");
    }

    #[test]
    fn failure_without_message_uses_generic_fallback() {
        let mut session = Session::new();
        let dispatch = session.submit("florists").unwrap();
        session.complete(dispatch.request, Err(SearchError::Unspecified));
        assert_eq!(session.error(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[test]
    fn loading_view_shows_stale_findings() {
        let mut session = Session::new();
        let first = session.submit("pizza").unwrap();
        session.complete(first.request, Ok(response(&["Slice"], "")));
        session.submit("sushi").unwrap();

        match session.view() {
            SessionView::Loading { query, stale } => {
                assert_eq!(query, "sushi");
                assert_eq!(stale.unwrap().places[0].title, "Slice");
            }
            other => panic!("expected loading view, got {other:?}"),
        }
    }

    #[test]
    fn first_loading_view_has_no_stale_findings() {
        let mut session = Session::new();
        session.submit("sushi").unwrap();
        assert_eq!(
            session.view(),
            SessionView::Loading {
                query: "sushi",
                stale: None
            }
        );
    }

    #[test]
    fn stale_response_is_discarded() {
        let mut session = Session::new();
        let older = session.submit("bars").unwrap();
        let newer = session.submit("wine bars").unwrap();

        let completion = session.complete(older.request, Ok(response(&["Old"], "old")));
        assert_eq!(completion, Completion::Stale);
        assert!(session.is_loading());
        assert_eq!(session.pending_request(), Some(newer.request));
        assert!(session.results().is_empty());

        session.complete(newer.request, Ok(response(&["New"], "new")));
        assert_eq!(session.results()[0].title, "New");

        let late = session.complete(older.request, Err(rate_limited()));
        assert_eq!(late, Completion::Stale);
        assert_eq!(session.error(), None);
    }

    #[test]
    fn completion_after_settling_is_stale() {
        let mut session = Session::new();
        let dispatch = session.submit("vets").unwrap();
        session.complete(dispatch.request, Ok(response(&["A"], "a")));
        assert_eq!(
            session.complete(dispatch.request, Ok(response(&["B"], "b"))),
            Completion::Stale
        );
        assert_eq!(session.results()[0].title, "A");
    }

    #[test]
    fn paragraphs_skip_blank_lines() {
        let findings = Findings {
            places: Vec::new(),
            analysis: "First.\n\n  Second.  \n".to_string(),
        };
        assert_eq!(findings.paragraphs().collect::<Vec<_>>(), ["First.", "Second."]);
    }

    #[test]
    fn failure_view_carries_message() {
        let mut session = Session::new();
        let dispatch = session.submit("movers").unwrap();
        session.complete(dispatch.request, Err(rate_limited()));
        assert_eq!(
            session.view(),
            SessionView::Failure {
                query: "movers",
                message: "rate limited"
            }
        );
    }
}
