//! Client-side session for a remote text analysis service.
//!
//! [`session::AnalysisSession`] owns the analysis collection, the search
//! view and the loading/error state; the service traits in [`service`]
//! describe the remote contracts it drives.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod query;
pub mod service;
pub mod session;
pub mod store;

pub use analytics::AnalyticsSnapshot;
pub use config::{Config, StaleResponsePolicy};
pub use error::{DistillError, FailureCategory, Result};
pub use model::{AnalysisRecord, Entities, Sentiment, TextMetrics};
pub use pipeline::SubmissionPhase;
pub use query::{AnalysisQuery, SearchParams, SortOrder};
pub use session::{AnalysisSession, SearchStatus, SessionView};
pub use store::RecordStore;
