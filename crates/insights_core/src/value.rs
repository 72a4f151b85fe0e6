use serde::{Deserialize, Serialize};
use time::Date;

/// A patent row as stored. Only the fields the analytics read are typed; the
/// rest are passed through as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatentRecord {
    pub id: i64,
    pub patent_number: Option<String>,
    pub title: Option<String>,
    pub publication_year: Option<i32>,
    pub assignee: Option<String>,
    pub filing_creation_date: Option<Date>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearCount {
    pub year: i32,
    pub count: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssigneeCount {
    pub assignee: String,
    pub count: u64,
}

/// Publication-year statistics over rows with a non-null year.
///
/// Every optional field is `None` when no row qualifies; a missing statistic is
/// never reported as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub total_patents: u64,
    pub mean_year: Option<f64>,
    pub min_year: Option<i32>,
    pub max_year: Option<i32>,
    pub stddev_year: Option<f64>,
    pub median_year: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    pub summary: SummaryStats,
    /// Newest years first, at most [`YEAR_DISTRIBUTION_LIMIT`] entries.
    pub year_distribution: Vec<YearCount>,
    /// Largest counts first, at most [`TOP_ASSIGNEES_LIMIT`] entries.
    pub top_assignees: Vec<AssigneeCount>,
}

/// Pearson coefficient between filing year and publication year, absent when
/// the store has nothing to correlate.
pub type CorrelationResult = Option<f64>;

pub const YEAR_DISTRIBUTION_LIMIT: u64 = 10;
pub const TOP_ASSIGNEES_LIMIT: u64 = 5;
