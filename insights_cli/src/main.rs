use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use patent_insights_service::{InsightsState, ServiceResponse};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging();
    let cli = Cli::parse();
    let response = match cli.command {
        Command::Summary(args) => summary(args).await?,
        Command::Query(args) => query(args).await?,
        Command::Correlation(args) => correlation(args).await?,
    };
    let rendered =
        serde_json::to_string_pretty(&response.body).context("render response envelope")?;
    println!("{rendered}");
    if response.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        eprintln!("error: request failed with status {}", response.status);
        Ok(ExitCode::FAILURE)
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Summary statistics and lookups over a patent datastore"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the cached summary: year statistics, histogram and top assignees.
    Summary(DatastoreArgs),
    /// List up to 50 patents filtered by publication year and/or assignee.
    Query(QueryArgs),
    /// Print the filing-year/publication-year correlation.
    Correlation(DatastoreArgs),
}

#[derive(Parser)]
struct DatastoreArgs {
    /// Directory holding `insights.json` (and the sqlite file by default).
    #[arg(long, default_value = ".insights")]
    datastore: PathBuf,
}

#[derive(Parser)]
struct QueryArgs {
    #[command(flatten)]
    store: DatastoreArgs,
    /// Publication year; passed through unparsed so validation matches other transports.
    #[arg(long)]
    year: Option<String>,
    /// Case-insensitive substring of the assignee name.
    #[arg(long)]
    assignee: Option<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

async fn open_state(args: &DatastoreArgs) -> Result<InsightsState> {
    info!("insights: opening datastore {}", args.datastore.display());
    InsightsState::open(&args.datastore)
        .await
        .with_context(|| format!("open datastore under {}", args.datastore.display()))
}

async fn summary(args: DatastoreArgs) -> Result<ServiceResponse> {
    let state = open_state(&args).await?;
    Ok(ServiceResponse::from_result(state.service().summary().await))
}

async fn query(args: QueryArgs) -> Result<ServiceResponse> {
    let state = open_state(&args.store).await?;
    let result = state
        .service()
        .query_patents(args.year.as_deref(), args.assignee.as_deref())
        .await;
    Ok(ServiceResponse::from_result(result))
}

async fn correlation(args: DatastoreArgs) -> Result<ServiceResponse> {
    let state = open_state(&args).await?;
    Ok(ServiceResponse::from_result(
        state.service().correlation().await,
    ))
}
