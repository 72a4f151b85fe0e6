use patent_insights_service::{InsightsState, INVALID_YEAR_MESSAGE};
use sea_orm::ConnectionTrait;
use tempfile::tempdir;

#[tokio::test]
async fn end_to_end_over_sqlite() {
    let dir = tempdir().expect("tempdir");
    let state = InsightsState::open(dir.path()).await.expect("open state");
    assert!(dir.path().join("insights.json").exists());

    let empty = state.service().correlation().await.expect("correlation");
    assert_eq!(empty.correlation_between_filing_and_publication_year, None);

    state
        .store()
        .connection()
        .execute_unprepared(
            "INSERT INTO patents (patent_number, title, publication_year, assignee, filing_creation_date) VALUES \
             ('US1', 'Rotor', 2019, 'Acme Corp', '2017-02-01'), \
             ('US2', 'Stator', 2020, 'ACME corp', '2018-05-20'), \
             ('US3', 'Brush', 2021, 'Globex', '2019-11-11')",
        )
        .await
        .expect("seed");

    let summary = state.service().summary().await.expect("summary");
    assert_eq!(summary.result.summary.total_patents, 3);
    assert_eq!(summary.result.summary.median_year, Some(2020.0));

    let hits = state
        .service()
        .query_patents(Some("2020"), Some("acme"))
        .await
        .expect("query");
    assert_eq!(hits.count, 1);
    assert_eq!(hits.data[0].patent_number.as_deref(), Some("US2"));

    let err = state
        .service()
        .query_patents(Some("abc"), None)
        .await
        .expect_err("invalid");
    assert_eq!(err.message, INVALID_YEAR_MESSAGE);

    let correlation = state.service().correlation().await.expect("correlation");
    let value = correlation
        .correlation_between_filing_and_publication_year
        .expect("value");
    assert!((value - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn empty_assignee_keeps_rows_without_assignee() {
    let dir = tempdir().expect("tempdir");
    let state = InsightsState::open(dir.path()).await.expect("open state");
    state
        .store()
        .connection()
        .execute_unprepared(
            "INSERT INTO patents (patent_number, publication_year, assignee) VALUES \
             ('US1', 2020, 'Acme Corp'), ('US2', 2020, NULL)",
        )
        .await
        .expect("seed");

    let all = state
        .service()
        .query_patents(Some("2020"), Some(""))
        .await
        .expect("query");
    assert_eq!(all.count, 2);
    assert!(all.data.iter().any(|record| record.assignee.is_none()));
}
