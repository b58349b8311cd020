//! Search session engine for mapscout.
//!
//! - [`session`] - the search-session state machine (pure transitions)
//! - [`geolocation`] - best-effort background coordinate acquisition
//! - [`export`] - JSON and CSV export of the current results
//! - [`app`] - orchestration: dispatches collaborator calls and applies their outcomes

pub mod app;
pub mod export;
pub mod geolocation;
pub mod session;

pub use app::{App, AppOptions, Notice, NoticeKind};
pub use export::{
    EXPORT_FILE_NAME, ExportError, csv_file_name, query_slug, render_csv, render_export, write_csv,
    write_export,
};
pub use geolocation::{LocationSlot, spawn_acquisition};
pub use session::{
    Completion, Dispatch, Findings, GENERIC_FAILURE_MESSAGE, RequestId, Session, SessionStatus,
    SessionView,
};

pub use mapscout_providers::{
    LocationError, LocationSource, SearchCollaborator, SearchError, SearchRequest,
};
pub use mapscout_types::{GeoLocation, Place, SearchQuery, SearchResponse};
