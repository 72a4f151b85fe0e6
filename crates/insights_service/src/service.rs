use std::sync::Arc;

use log::{debug, error, info, warn};

use patent_insights_core::{
    build, CorrelationApi, FilterSpec, InsightsError, InsightsResult, PatentAnalytics,
    PatentLookupApi, SummaryStatsApi,
};

use crate::cache::SummaryCache;
use crate::envelope::{CorrelationEnvelope, QueryEnvelope, ServiceError, SummaryEnvelope};

pub const INVALID_YEAR_MESSAGE: &str = "Invalid or missing year parameter";
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

/// Facade over the analytics store. Store failures are logged here and
/// replaced with a generic internal error before reaching the caller.
#[derive(Clone)]
pub struct QueryService {
    store: Arc<dyn PatentAnalytics>,
    cache: SummaryCache,
}

impl QueryService {
    pub fn new(store: Arc<dyn PatentAnalytics>, cache: SummaryCache) -> Self {
        Self { store, cache }
    }

    pub async fn summary(&self) -> Result<SummaryEnvelope, ServiceError> {
        info!("insights: summary requested");
        let store = Arc::clone(&self.store);
        let result = self
            .cache
            .get_or_compute(|| async move { store.compute_summary().await })
            .await
            .map_err(|err| service_error("summary", err))?;
        Ok(SummaryEnvelope::ok(result))
    }

    pub async fn query_patents(
        &self,
        raw_year: Option<&str>,
        raw_assignee: Option<&str>,
    ) -> Result<QueryEnvelope, ServiceError> {
        info!("insights: query_patents requested");
        let filter = parse_filter(raw_year, raw_assignee)
            .map_err(|err| service_error("query_patents", err))?;
        debug!(
            "insights: query_patents year={:?} assignee={:?}",
            filter.year, filter.assignee
        );
        let query = build(&filter);
        let records = self
            .store
            .find_patents(&query)
            .await
            .map_err(|err| service_error("query_patents", err))?;
        Ok(QueryEnvelope::ok(records))
    }

    pub async fn correlation(&self) -> Result<CorrelationEnvelope, ServiceError> {
        info!("insights: correlation requested");
        let value = self
            .store
            .compute_correlation()
            .await
            .map_err(|err| service_error("correlation", err))?;
        Ok(CorrelationEnvelope::ok(value))
    }
}

/// Turn raw transport parameters into a [`FilterSpec`].
///
/// A supplied year must be a base-10 integer once surrounding whitespace is
/// trimmed; an empty year is rejected as a validation error. An empty
/// assignee means no assignee filter at all, so rows whose assignee is null
/// are returned too. A `'%%'` pattern match would drop those rows instead.
pub fn parse_filter(
    raw_year: Option<&str>,
    raw_assignee: Option<&str>,
) -> InsightsResult<FilterSpec> {
    let year = match raw_year {
        None => None,
        Some(raw) => match raw.trim().parse::<i32>() {
            Ok(year) => Some(year),
            Err(err) => {
                debug!("insights: year parameter {raw:?} rejected: {err}");
                return Err(InsightsError::validation(INVALID_YEAR_MESSAGE));
            }
        },
    };
    let assignee = raw_assignee
        .filter(|assignee| !assignee.is_empty())
        .map(str::to_string);
    Ok(FilterSpec { year, assignee })
}

/// Validation failures keep their message and become 400s; anything else is
/// logged and replaced with the generic internal error.
fn service_error(operation: &str, err: InsightsError) -> ServiceError {
    match err {
        InsightsError::Validation { message } => {
            warn!("insights: {operation} rejected input: {message}");
            ServiceError::invalid_input(message)
        }
        other => {
            error!("insights: {operation} failed detail={other}");
            ServiceError::internal(INTERNAL_ERROR_MESSAGE)
        }
    }
}
