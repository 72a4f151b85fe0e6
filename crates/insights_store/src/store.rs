use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{
    Alias, Expr, Func, Iden, LikeExpr, MysqlQueryBuilder, Order, PostgresQueryBuilder, Query,
    QueryStatementWriter, SelectStatement, SimpleExpr, SqliteQueryBuilder,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, QueryResult,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use time::Date;

use crate::db::Patents;
use crate::migration::Migrator;
use crate::stats::{self, Moments};
use crate::InsightsConfig;
use patent_insights_core::{
    AssigneeCount, CorrelationApi, CorrelationResult, InsightsError, InsightsResult,
    PatentLookupApi, PatentQuery, PatentRecord, Predicate, SummaryResult, SummaryStats,
    SummaryStatsApi, YearCount, LIKE_ESCAPE, TOP_ASSIGNEES_LIMIT, YEAR_DISTRIBUTION_LIMIT,
};

/// How the statistics that not every backend implements are produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggregateStrategy {
    /// `STDDEV_POP`, `PERCENTILE_CONT` and `CORR` run inside the database.
    Native,
    /// The database returns counts, sums and middle rows; the final numbers
    /// are derived in process.
    Portable,
}

impl AggregateStrategy {
    pub fn for_backend(backend: DatabaseBackend) -> Self {
        match backend {
            DatabaseBackend::Postgres => AggregateStrategy::Native,
            _ => AggregateStrategy::Portable,
        }
    }
}

#[derive(Clone)]
pub struct PatentStore {
    conn: DatabaseConnection,
    backend: DatabaseBackend,
    strategy: AggregateStrategy,
}

impl PatentStore {
    pub async fn connect(config: &InsightsConfig, base_dir: &Path) -> InsightsResult<Self> {
        let url = config.connection_url(base_dir)?;
        let mut options = ConnectOptions::new(url);
        options.sqlx_logging(false);
        if let Some(pool) = &config.pool {
            if let Some(max) = pool.max_connections {
                options.max_connections(max);
            }
            if let Some(min) = pool.min_connections {
                options.min_connections(min);
            }
            if let Some(timeout_ms) = pool.connect_timeout_ms {
                options.connect_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.acquire_timeout_ms {
                options.acquire_timeout(Duration::from_millis(timeout_ms));
            }
            if let Some(timeout_ms) = pool.idle_timeout_ms {
                options.idle_timeout(Duration::from_millis(timeout_ms));
            }
        }
        let conn = Database::connect(options).await.map_err(InsightsError::from)?;
        if config.manages_schema() {
            Migrator::up(&conn, None).await.map_err(InsightsError::from)?;
        }
        let store = Self::from_connection(conn);
        info!(
            "insights: store connected backend={} strategy={:?}",
            config.backend_name(),
            store.strategy
        );
        Ok(store)
    }

    /// Wrap a connection whose pool is owned by the caller.
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        let backend = conn.get_database_backend();
        Self {
            conn,
            backend,
            strategy: AggregateStrategy::for_backend(backend),
        }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    async fn year_statistics(&self) -> InsightsResult<SummaryStats> {
        match self.strategy {
            AggregateStrategy::Native => self.native_year_statistics().await,
            AggregateStrategy::Portable => self.portable_year_statistics().await,
        }
    }

    async fn native_year_statistics(&self) -> InsightsResult<SummaryStats> {
        let select = Query::select()
            .from(Patents::Table)
            .expr_as(
                Func::count(Expr::col(Patents::Id)),
                Alias::new("total_patents"),
            )
            .expr_as(
                as_double(self.backend, "AVG(publication_year)"),
                Alias::new("mean_year"),
            )
            .expr_as(
                Func::min(Expr::col(Patents::PublicationYear)),
                Alias::new("min_year"),
            )
            .expr_as(
                Func::max(Expr::col(Patents::PublicationYear)),
                Alias::new("max_year"),
            )
            .expr_as(
                as_double(self.backend, "STDDEV_POP(publication_year)"),
                Alias::new("stddev_year"),
            )
            .expr_as(
                as_double(
                    self.backend,
                    "PERCENTILE_CONT(0.5) WITHIN GROUP (ORDER BY publication_year)",
                ),
                Alias::new("median_year"),
            )
            .and_where(Expr::col(Patents::PublicationYear).is_not_null())
            .to_owned();
        let row = query_one(&self.conn, &select)
            .await?
            .ok_or_else(|| InsightsError::processing("aggregate query returned no row"))?;
        Ok(SummaryStats {
            total_patents: read_count(&row, "total_patents")?,
            mean_year: stats::finite_or_none(row.try_get("", "mean_year")?),
            min_year: row.try_get("", "min_year")?,
            max_year: row.try_get("", "max_year")?,
            stddev_year: stats::finite_or_none(row.try_get("", "stddev_year")?),
            median_year: stats::finite_or_none(row.try_get("", "median_year")?),
        })
    }

    async fn portable_year_statistics(&self) -> InsightsResult<SummaryStats> {
        let select = Query::select()
            .from(Patents::Table)
            .expr_as(
                Func::count(Expr::col(Patents::Id)),
                Alias::new("total_patents"),
            )
            .expr_as(
                as_double(self.backend, "AVG(publication_year)"),
                Alias::new("mean_year"),
            )
            .expr_as(
                Func::min(Expr::col(Patents::PublicationYear)),
                Alias::new("min_year"),
            )
            .expr_as(
                Func::max(Expr::col(Patents::PublicationYear)),
                Alias::new("max_year"),
            )
            .expr_as(
                as_double(self.backend, "AVG(publication_year * publication_year)"),
                Alias::new("mean_square_year"),
            )
            .and_where(Expr::col(Patents::PublicationYear).is_not_null())
            .to_owned();
        let row = query_one(&self.conn, &select)
            .await?
            .ok_or_else(|| InsightsError::processing("aggregate query returned no row"))?;
        let total_patents = read_count(&row, "total_patents")?;
        let mean_year: Option<f64> = row.try_get("", "mean_year")?;
        let mean_square_year: Option<f64> = row.try_get("", "mean_square_year")?;
        Ok(SummaryStats {
            total_patents,
            mean_year: stats::finite_or_none(mean_year),
            min_year: row.try_get("", "min_year")?,
            max_year: row.try_get("", "max_year")?,
            stddev_year: stats::finite_or_none(stats::population_stddev(
                mean_year,
                mean_square_year,
            )),
            median_year: self.portable_median(total_patents).await?,
        })
    }

    async fn portable_median(&self, count: u64) -> InsightsResult<Option<f64>> {
        let Some((offset, take)) = stats::median_window(count) else {
            return Ok(None);
        };
        let select = Query::select()
            .from(Patents::Table)
            .column(Patents::PublicationYear)
            .and_where(Expr::col(Patents::PublicationYear).is_not_null())
            .order_by(Patents::PublicationYear, Order::Asc)
            .limit(take)
            .offset(offset)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut middle = Vec::with_capacity(rows.len());
        for row in rows {
            let year: i32 = row.try_get("", &col_name(Patents::PublicationYear))?;
            middle.push(year);
        }
        Ok(stats::interpolate_median(&middle))
    }

    async fn year_distribution(&self) -> InsightsResult<Vec<YearCount>> {
        let select = Query::select()
            .from(Patents::Table)
            .column(Patents::PublicationYear)
            .expr_as(Func::count(Expr::col(Patents::Id)), Alias::new("total"))
            .and_where(Expr::col(Patents::PublicationYear).is_not_null())
            .group_by_col(Patents::PublicationYear)
            .order_by(Patents::PublicationYear, Order::Desc)
            .limit(YEAR_DISTRIBUTION_LIMIT)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut distribution = Vec::with_capacity(rows.len());
        for row in rows {
            distribution.push(YearCount {
                year: row.try_get("", &col_name(Patents::PublicationYear))?,
                count: read_count(&row, "total")?,
            });
        }
        Ok(distribution)
    }

    async fn top_assignees(&self) -> InsightsResult<Vec<AssigneeCount>> {
        let select = Query::select()
            .from(Patents::Table)
            .column(Patents::Assignee)
            .expr_as(Func::count(Expr::col(Patents::Id)), Alias::new("total"))
            .and_where(Expr::col(Patents::Assignee).is_not_null())
            .group_by_col(Patents::Assignee)
            .order_by(Alias::new("total"), Order::Desc)
            .order_by(Patents::Assignee, Order::Asc)
            .limit(TOP_ASSIGNEES_LIMIT)
            .to_owned();
        let rows = query_all(&self.conn, &select).await?;
        let mut assignees = Vec::with_capacity(rows.len());
        for row in rows {
            assignees.push(AssigneeCount {
                assignee: row.try_get("", &col_name(Patents::Assignee))?,
                count: read_count(&row, "total")?,
            });
        }
        Ok(assignees)
    }

    async fn native_correlation(&self) -> InsightsResult<CorrelationResult> {
        let filing_year = filing_year_sql(self.backend);
        let select = Query::select()
            .from(Patents::Table)
            .expr_as(
                Expr::cust(format!(
                    "CORR(CAST({filing_year} AS DOUBLE PRECISION), \
                     CAST(publication_year AS DOUBLE PRECISION))"
                )),
                Alias::new("correlation_value"),
            )
            .and_where(Expr::col(Patents::FilingCreationDate).is_not_null())
            .and_where(Expr::col(Patents::PublicationYear).is_not_null())
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        let value: Option<f64> = row.try_get("", "correlation_value")?;
        Ok(stats::finite_or_none(value))
    }

    async fn portable_correlation(&self) -> InsightsResult<CorrelationResult> {
        let x = filing_year_sql(self.backend);
        let y = "publication_year";
        let select = Query::select()
            .from(Patents::Table)
            .expr_as(Func::count(Expr::col(Patents::Id)), Alias::new("n"))
            .expr_as(
                as_double(self.backend, &format!("SUM({x})")),
                Alias::new("sum_x"),
            )
            .expr_as(
                as_double(self.backend, &format!("SUM({y})")),
                Alias::new("sum_y"),
            )
            .expr_as(
                as_double(self.backend, &format!("SUM({x} * {x})")),
                Alias::new("sum_xx"),
            )
            .expr_as(
                as_double(self.backend, &format!("SUM({y} * {y})")),
                Alias::new("sum_yy"),
            )
            .expr_as(
                as_double(self.backend, &format!("SUM({x} * {y})")),
                Alias::new("sum_xy"),
            )
            .and_where(Expr::col(Patents::FilingCreationDate).is_not_null())
            .and_where(Expr::col(Patents::PublicationYear).is_not_null())
            .to_owned();
        let Some(row) = query_one(&self.conn, &select).await? else {
            return Ok(None);
        };
        let sum = |column: &str| -> InsightsResult<f64> {
            let value: Option<f64> = row.try_get("", column)?;
            Ok(value.unwrap_or(0.0))
        };
        let moments = Moments {
            n: row.try_get("", "n")?,
            sum_x: sum("sum_x")?,
            sum_y: sum("sum_y")?,
            sum_xx: sum("sum_xx")?,
            sum_yy: sum("sum_yy")?,
            sum_xy: sum("sum_xy")?,
        };
        Ok(stats::pearson(&moments))
    }
}

#[async_trait]
impl SummaryStatsApi for PatentStore {
    async fn compute_summary(&self) -> InsightsResult<SummaryResult> {
        let summary = self.year_statistics().await?;
        let year_distribution = self.year_distribution().await?;
        let top_assignees = self.top_assignees().await?;
        debug!(
            "insights: summary computed total={} years={} assignees={}",
            summary.total_patents,
            year_distribution.len(),
            top_assignees.len()
        );
        Ok(SummaryResult {
            summary,
            year_distribution,
            top_assignees,
        })
    }
}

#[async_trait]
impl CorrelationApi for PatentStore {
    async fn compute_correlation(&self) -> InsightsResult<CorrelationResult> {
        let correlation = match self.strategy {
            AggregateStrategy::Native => self.native_correlation().await?,
            AggregateStrategy::Portable => self.portable_correlation().await?,
        };
        debug!("insights: correlation computed value={correlation:?}");
        Ok(correlation)
    }
}

#[async_trait]
impl PatentLookupApi for PatentStore {
    async fn find_patents(&self, query: &PatentQuery) -> InsightsResult<Vec<PatentRecord>> {
        let select = lookup_statement(self.backend, query);
        let rows = query_all(&self.conn, &select).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            records.push(read_patent(&row)?);
        }
        debug!(
            "insights: lookup predicates={} rows={}",
            query.predicates().len(),
            records.len()
        );
        Ok(records)
    }
}

/// Render a composed lookup as a select over `patents`. Pattern values stay
/// bound parameters; only the escape character is inlined.
///
/// Assignee matching uses `ILIKE` on Postgres. SQLite `LIKE` only folds ASCII
/// letters, so non-ASCII letters (`É` against `é`) must match in case there;
/// MySQL follows the column collation.
pub fn lookup_statement(backend: DatabaseBackend, query: &PatentQuery) -> SelectStatement {
    let mut select = Query::select()
        .from(Patents::Table)
        .columns([
            Patents::Id,
            Patents::PatentNumber,
            Patents::Title,
            Patents::PublicationYear,
            Patents::Assignee,
            Patents::FilingCreationDate,
        ])
        .to_owned();
    for predicate in query.predicates() {
        match predicate {
            Predicate::YearEquals(year) => {
                select.and_where(Expr::col(Patents::PublicationYear).eq(*year));
            }
            Predicate::AssigneeContains { pattern } => {
                let like = LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE);
                let condition = match backend {
                    DatabaseBackend::Postgres => Expr::col(Patents::Assignee).ilike(like),
                    _ => Expr::col(Patents::Assignee).like(like),
                };
                select.and_where(condition);
            }
        }
    }
    select
        .order_by(Patents::Id, Order::Asc)
        .limit(query.limit());
    select
}

fn read_patent(row: &QueryResult) -> InsightsResult<PatentRecord> {
    let filing_creation_date: Option<Date> =
        row.try_get("", &col_name(Patents::FilingCreationDate))?;
    Ok(PatentRecord {
        id: row.try_get("", &col_name(Patents::Id))?,
        patent_number: row.try_get("", &col_name(Patents::PatentNumber))?,
        title: row.try_get("", &col_name(Patents::Title))?,
        publication_year: row.try_get("", &col_name(Patents::PublicationYear))?,
        assignee: row.try_get("", &col_name(Patents::Assignee))?,
        filing_creation_date,
    })
}

fn read_count(row: &QueryResult, column: &str) -> InsightsResult<u64> {
    let value: i64 = row.try_get("", column)?;
    u64::try_from(value)
        .map_err(|_| InsightsError::processing(format!("negative count in {column}: {value}")))
}

fn as_double(backend: DatabaseBackend, sql: &str) -> SimpleExpr {
    let double = match backend {
        DatabaseBackend::Postgres => "DOUBLE PRECISION",
        DatabaseBackend::MySql => "DOUBLE",
        _ => "REAL",
    };
    Expr::cust(format!("CAST({sql} AS {double})"))
}

fn filing_year_sql(backend: DatabaseBackend) -> &'static str {
    match backend {
        DatabaseBackend::Postgres => "EXTRACT(YEAR FROM filing_creation_date)",
        DatabaseBackend::MySql => "YEAR(filing_creation_date)",
        _ => "CAST(strftime('%Y', filing_creation_date) AS INTEGER)",
    }
}

fn col_name(column: impl Iden) -> String {
    column.to_string()
}

fn build_stmt<S: QueryStatementWriter>(
    backend: DatabaseBackend,
    stmt: &S,
) -> (String, sea_orm::sea_query::Values) {
    match backend {
        DatabaseBackend::Sqlite => stmt.build(SqliteQueryBuilder),
        DatabaseBackend::Postgres => stmt.build(PostgresQueryBuilder),
        DatabaseBackend::MySql => stmt.build(MysqlQueryBuilder),
    }
}

async fn query_all<C, S>(conn: &C, stmt: &S) -> InsightsResult<Vec<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let rows = conn
        .query_all(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(rows)
}

async fn query_one<C, S>(conn: &C, stmt: &S) -> InsightsResult<Option<QueryResult>>
where
    C: ConnectionTrait,
    S: QueryStatementWriter,
{
    let backend = conn.get_database_backend();
    let (sql, values) = build_stmt(backend, stmt);
    let row = conn
        .query_one(Statement::from_sql_and_values(backend, sql, values))
        .await?;
    Ok(row)
}
