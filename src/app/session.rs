//! One complete run: fetch, classify, report, deactivate
//!
//! The session owns no configuration of its own. It borrows the
//! [`RunConfig`] and the resolved credentials, pages through the directory,
//! sorts every user into its buckets as pages arrive, logs the summary and
//! hands the never-authenticated users to the batch updater.

use chrono::{DateTime, Local, Utc};

use crate::app::classifier::{BucketSet, InactivityBucket};
use crate::app::client::ApiClient;
use crate::app::fetcher::{FetchStats, PageFetcher};
use crate::app::updater::{BatchReport, BatchUpdater};
use crate::auth::CredentialSet;
use crate::cli::progress;
use crate::config::RunConfig;
use crate::errors::Result;

const SEPARATOR: &str = "##############################";

/// What a run fetched, classified and deactivated
#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub fetch: FetchStats,
    pub buckets: BucketSet,
    pub report: BatchReport,
    /// Final position of the batch progress bar
    pub progress_position: u64,
}

/// Run the whole pipeline against the configured hosts
///
/// # Errors
///
/// Fails on an unbuildable HTTP client and on fatal fetch errors (too many
/// failed requests, undecodable page). Deactivation failures are reported
/// in the summary instead.
pub async fn run_session(
    config: &RunConfig,
    credentials: &CredentialSet,
    now: DateTime<Utc>,
) -> Result<SessionSummary> {
    tracing::info!(
        "-------- START {} --------",
        Local::now().format("%Y-%m-%d_%H:%M")
    );

    let http = config.client.build_http_client()?;
    let directory_client = ApiClient::new(
        http.clone(),
        &config.directory_host,
        credentials.directory().clone(),
    );
    let management_client = ApiClient::new(
        http,
        &config.management_host,
        credentials.management().clone(),
    );

    let (fetch, buckets) = collect_users(config, directory_client, now).await?;
    log_summary(&fetch, &buckets, config.verbose);

    println!("Deactivating users in Crowd");
    tracing::info!("Deactivating users in Crowd");

    let updater = BatchUpdater::new(management_client, config.mode, config.simulation)
        .with_group(config.management_group.as_str())
        .with_path(config.management_path.as_str());
    let targets = buckets.get(InactivityBucket::NeverAuthenticated);

    let bar = progress::batch_progress_bar(targets.len() as u64, &config.progress);
    let report = updater.deactivate(targets, &bar).await;
    progress::finish(&bar);

    if report.failed() > 0 {
        tracing::warn!(
            "{} of {} deactivations failed: {}",
            report.failed(),
            report.processed(),
            report.failed_users().join(", ")
        );
    }

    println!("Done!");
    tracing::info!("Done");
    tracing::info!(
        "-------- FINISHED {} --------",
        Local::now().format("%Y-%m-%d")
    );

    Ok(SessionSummary {
        fetch,
        buckets,
        report,
        progress_position: bar.position(),
    })
}

/// Page through the directory, classifying users as pages arrive
async fn collect_users(
    config: &RunConfig,
    client: ApiClient,
    now: DateTime<Utc>,
) -> Result<(FetchStats, BucketSet)> {
    let mut fetcher = PageFetcher::new(client, config.page_size)
        .with_resource(config.members_path.as_str(), config.group.as_str())
        .with_max_errors(config.max_errors);
    let mut buckets = BucketSet::new();

    tracing::trace!("Retrieving stash users");
    println!("Retrieving stash users");

    while !fetcher.is_finished() {
        println!("--> Requesting {} users...", config.page_size);
        if let Some(page) = fetcher.next_page().await? {
            for user in &page.values {
                buckets.insert_user(user, now);
            }
        }
    }
    println!("Done");

    Ok((fetcher.stats(), buckets))
}

fn log_summary(fetch: &FetchStats, buckets: &BucketSet, verbose: bool) {
    tracing::info!("Fetched a total of {} users", fetch.users);
    tracing::info!("{}", SEPARATOR);

    // Counts reach the console through the verbose log mirror; only the
    // name lists are printed here.
    for bucket in InactivityBucket::ALL {
        let names = buckets.get(bucket);
        tracing::info!("--> {}: {}", bucket.label(), names.len());
        if verbose {
            println!("--> {} [{}]: {}", bucket.label(), names.len(), names.join(", "));
        }
    }
}
