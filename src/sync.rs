//! Sync engine
//!
//! Walks the selected streams in catalog order and, for each, every day of
//! the sync window in ascending order. Each day is one report request, or
//! one per goal for goal reports. Rows are flattened, normalized, coerced and
//! emitted as they arrive. Any failure aborts the run; nothing is retried and
//! no progress is persisted.

use crate::catalog::{Catalog, GOAL_ID_PROPERTY, Stream, get_selected_streams};
use crate::client::{ManagementApi, ReportingApi};
use crate::config::{SyncWindow, TapConfig};
use crate::error::TapError;
use crate::etl::{Loader, Transformer};
use crate::report::{Goal, ReportRequest, ReportResponse, build_request};
use crate::storage::Message;
use crate::transform::{DateNormalizer, FlatRecord, Record, SchemaCoercer, flatten};
use chrono::NaiveDate;
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::time::Duration;

/// Account and property that own the view, needed to list goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalScope {
    pub account_id: String,
    pub web_property_id: String,
}

/// Fixed pause between days
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub async fn pause(&self) {
        if !self.delay.is_zero() {
            log::trace!("Pausing {:?} before the next day", self.delay);
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Everything a sync run needs, passed explicitly to the engine
pub struct SyncContext<R, M> {
    reporting: R,
    management: M,
    window: SyncWindow,
    view_id: String,
    goal_scope: Option<GoalScope>,
    throttle: Throttle,
}

impl<R, M> SyncContext<R, M>
where
    R: ReportingApi,
    M: ManagementApi,
{
    /// Build a context, validating the sync window against `today`
    pub fn new(config: &TapConfig, reporting: R, management: M, today: NaiveDate) -> Result<Self> {
        let window = config.window(today)?;
        let goal_scope = match (&config.account_id, &config.web_property_id) {
            (Some(account_id), Some(web_property_id)) => Some(GoalScope {
                account_id: account_id.clone(),
                web_property_id: web_property_id.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            reporting,
            management,
            window,
            view_id: config.view_id.clone(),
            goal_scope,
            throttle: Throttle::new(config.request_delay()),
        })
    }

    pub fn window(&self) -> SyncWindow {
        self.window
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }
}

/// Totals for a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub streams: usize,
    pub requests: usize,
    pub records: usize,
}

/// Sync every selected stream in the catalog
pub async fn sync<R, M, L>(
    ctx: &SyncContext<R, M>,
    catalog: &Catalog,
    loader: &mut L,
) -> Result<SyncSummary>
where
    R: ReportingApi,
    M: ManagementApi,
    L: Loader<Item = Message>,
{
    let selected = get_selected_streams(catalog);
    log::info!(
        "Syncing {} of {} stream(s) from {} to {}",
        selected.len(),
        catalog.count(),
        ctx.window.start().cyan(),
        ctx.window.end().cyan()
    );

    let streams = catalog
        .streams
        .iter()
        .filter(|entry| {
            let keep = selected.contains(&entry.tap_stream_id);
            if !keep {
                log::debug!("Skipping stream {}, not selected", entry.tap_stream_id);
            }
            keep
        })
        .map(Stream::from_entry)
        .collect::<Result<Vec<_>>>()?;

    if ctx.goal_scope.is_none() {
        if let Some(stream) = streams.iter().find(|s| s.kind.is_goals()) {
            return Err(TapError::Config(format!(
                "stream '{}' requires account_id and web_property_id",
                stream.tap_stream_id
            ))
            .into());
        }
    }

    let mut summary = SyncSummary::default();
    for stream in &streams {
        log::info!("Syncing stream: {}", stream.tap_stream_id.bright_white());
        let (requests, records) = sync_stream(ctx, stream, loader).await?;
        log::info!(
            "Finished stream {}: {} request(s), {} record(s)",
            stream.tap_stream_id,
            requests,
            records
        );
        summary.streams += 1;
        summary.requests += requests;
        summary.records += records;
    }

    log::info!(
        "Sync complete: {} stream(s), {} request(s), {} record(s)",
        summary.streams,
        summary.requests,
        summary.records
    );
    Ok(summary)
}

async fn sync_stream<R, M, L>(
    ctx: &SyncContext<R, M>,
    stream: &Stream,
    loader: &mut L,
) -> Result<(usize, usize)>
where
    R: ReportingApi,
    M: ManagementApi,
    L: Loader<Item = Message>,
{
    loader.load(Message::schema(stream))?;

    let dimensions = stream.schema.dimensions();
    let metrics = stream.schema.metrics();
    log::debug!(
        "Stream {} dimensions: {:?}, metrics: {:?}",
        stream.tap_stream_id,
        dimensions,
        metrics
    );

    // One lookup per stream; goal definitions are assumed stable for a run.
    let goals = match (&ctx.goal_scope, stream.kind.is_goals()) {
        (Some(scope), true) => Some(fetch_goals(ctx, scope, stream).await?),
        _ => None,
    };

    let transformer = DateNormalizer::new().then(SchemaCoercer::new(&stream.schema));
    let mut requests = 0;
    let mut records = 0;

    for day in ctx.window.days() {
        log::info!("Syncing {} for {}", stream.tap_stream_id, day);
        match &goals {
            Some(goals) => {
                for goal in goals {
                    let goal_id = Some(goal.id.as_str());
                    let request = build_request(&ctx.view_id, day, &metrics, &dimensions, goal_id);
                    let response = execute(ctx, &request, stream, day, goal_id).await?;
                    requests += 1;
                    let rows = RowContext { stream, day, goal: goal_id };
                    records += emit(response, &rows, &dimensions, &metrics, &transformer, loader)?;
                }
            }
            None => {
                let request = build_request(&ctx.view_id, day, &metrics, &dimensions, None);
                let response = execute(ctx, &request, stream, day, None).await?;
                requests += 1;
                let rows = RowContext { stream, day, goal: None };
                records += emit(response, &rows, &dimensions, &metrics, &transformer, loader)?;
            }
        }
        ctx.throttle.pause().await;
    }

    Ok((requests, records))
}

async fn fetch_goals<R, M>(
    ctx: &SyncContext<R, M>,
    scope: &GoalScope,
    stream: &Stream,
) -> Result<Vec<Goal>>
where
    R: ReportingApi,
    M: ManagementApi,
{
    let goals = ctx
        .management
        .list_goals(&scope.account_id, &scope.web_property_id, &ctx.view_id)
        .await
        .wrap_err_with(|| TapError::RemoteCall {
            stream: stream.tap_stream_id.clone(),
            day: ctx.window.start(),
            goal: None,
        })?;

    if goals.is_empty() {
        log::warn!(
            "No goals configured for view {}, stream {} will be empty",
            ctx.view_id,
            stream.tap_stream_id
        );
    } else {
        log::info!("Found {} goal(s) for view {}", goals.len(), ctx.view_id);
    }
    Ok(goals)
}

async fn execute<R, M>(
    ctx: &SyncContext<R, M>,
    request: &ReportRequest,
    stream: &Stream,
    day: NaiveDate,
    goal: Option<&str>,
) -> Result<ReportResponse>
where
    R: ReportingApi,
    M: ManagementApi,
{
    log::debug!(
        "Requesting {} metric(s), {} dimension(s) for {}{}",
        request.metrics.len(),
        request.dimensions.len(),
        day,
        goal.map(|g| format!(" goal {}", g)).unwrap_or_default()
    );

    ctx.reporting
        .batch_get(request)
        .await
        .wrap_err_with(|| TapError::RemoteCall {
            stream: stream.tap_stream_id.clone(),
            day,
            goal: goal.map(String::from),
        })
}

/// Where a batch of rows came from
#[derive(Clone, Copy)]
struct RowContext<'a> {
    stream: &'a Stream,
    day: NaiveDate,
    goal: Option<&'a str>,
}

/// Flatten a response and emit each record as soon as it is ready
///
/// Goal-report rows are tagged with their goal id before coercion.
fn emit<T, L>(
    response: ReportResponse,
    rows: &RowContext<'_>,
    dimensions: &[&str],
    metrics: &[&str],
    transformer: &T,
    loader: &mut L,
) -> Result<usize>
where
    T: Transformer<Input = FlatRecord, Output = Record>,
    L: Loader<Item = Message>,
{
    let RowContext { stream, day, goal } = *rows;
    let row_count = response.row_count();
    if row_count == 0 {
        log::debug!("No rows for {} on {}", stream.tap_stream_id, day);
        return Ok(0);
    }
    log::debug!("Received {} row(s) for {} on {}", row_count, stream.tap_stream_id, day);

    let mut count = 0;
    for row in flatten(response, dimensions, metrics) {
        let record = row
            .map(|mut row| {
                if let Some(goal) = goal {
                    row.insert(GOAL_ID_PROPERTY.to_string(), Value::String(goal.to_string()));
                }
                row
            })
            .and_then(|row| transformer.transform(row))
            .wrap_err_with(|| {
                format!("Failed to process row for stream '{}' on {}", stream.tap_stream_id, day)
            })?;
        loader.load(Message::record(&stream.tap_stream_id, record))?;
        count += 1;
    }
    Ok(count)
}
