//! Request-facing layer for patent insights: input validation, summary
//! caching and the success/failure envelopes handed back to a transport.

mod cache;
mod envelope;
mod service;
mod state;

pub use cache::{MemoryCacheBackend, SummaryCache, SUMMARY_CACHE_KEY, SUMMARY_CACHE_REGION};
pub use envelope::{
    CorrelationEnvelope, FailureEnvelope, QueryEnvelope, ServiceError, ServiceResponse,
    SummaryEnvelope,
};
pub use service::{parse_filter, QueryService, INTERNAL_ERROR_MESSAGE, INVALID_YEAR_MESSAGE};
pub use state::InsightsState;
