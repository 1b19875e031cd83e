use std::{borrow::Cow, net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeSet;

use crate::{
    AnalyzerConfig, AnalyzerError, Analysis, BusinessCalendar, BusinessCalendarConfig, ColumnNames,
    DatasetCache, DatasetKey, DatePreset, DateRange, HolidayTable, Jurisdiction,
    ProductivityMethod, ProductivityReport, RecordFilter, ResolutionReport, TaskRecord, capacity,
    count_working_days, parse_timestamp, read_tasks_csv, resolve_interval,
};

/// Mutable state behind the API: active calendar, holiday table, ingest
/// settings and the dataset cache.
#[derive(Debug)]
pub struct Workspace {
    calendar: BusinessCalendar,
    holidays: Option<HolidayTable>,
    jurisdiction: Jurisdiction,
    columns: ColumnNames,
    exclude_category: Option<String>,
    cache: DatasetCache,
    active: Option<DatasetKey>,
}

impl Workspace {
    pub fn new(config: &AnalyzerConfig, calendar: BusinessCalendar) -> Self {
        Self {
            calendar,
            holidays: None,
            jurisdiction: config.jurisdiction,
            columns: config.columns.clone(),
            exclude_category: config.exclude_category.clone(),
            cache: DatasetCache::new(),
            active: None,
        }
    }

    /// Holidays from `table` are excluded per request, only inside the
    /// requested range.
    pub fn with_holidays(mut self, table: HolidayTable) -> Self {
        self.holidays = Some(table);
        self
    }

    fn calendar_for(&self, range: DateRange) -> Cow<'_, BusinessCalendar> {
        match &self.holidays {
            Some(table) => Cow::Owned(table.apply(&self.calendar, range, &self.jurisdiction)),
            None => Cow::Borrowed(&self.calendar),
        }
    }

    fn active_records(&self) -> Result<Arc<Vec<TaskRecord>>, ApiError> {
        self.active
            .as_ref()
            .and_then(|key| self.cache.get(key))
            .ok_or_else(|| ApiError::from(AnalyzerError::NotFound))
    }
}

impl Default for Workspace {
    fn default() -> Self {
        let config = AnalyzerConfig::default();
        let calendar = BusinessCalendar::from_config(&config.calendar);
        Self::new(&config, calendar)
    }
}

#[derive(Clone)]
pub struct AppState {
    workspace: Arc<RwLock<Workspace>>,
}

impl AppState {
    pub fn new(workspace: Workspace) -> Self {
        Self {
            workspace: Arc::new(RwLock::new(workspace)),
        }
    }

    pub fn with_shared(workspace: Arc<RwLock<Workspace>>) -> Self {
        Self { workspace }
    }

    fn workspace(&self) -> Arc<RwLock<Workspace>> {
        self.workspace.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<AnalyzerError> for ApiError {
    fn from(value: AnalyzerError) -> Self {
        match value {
            AnalyzerError::NotFound => ApiError::NotFound(value.to_string()),
            AnalyzerError::Csv(_)
            | AnalyzerError::InvalidData(_)
            | AnalyzerError::MissingColumns(_)
            | AnalyzerError::Serialization(_) => ApiError::Invalid(value.to_string()),
            AnalyzerError::DataFrame(_) | AnalyzerError::Io(_) => {
                ApiError::Internal(value.to_string())
            }
        }
    }
}

impl From<polars::prelude::PolarsError> for ApiError {
    fn from(value: polars::prelude::PolarsError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct ResolvePayload {
    created_at: String,
    completed_at: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ResolveResponse {
    pub working_days: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CapacityPayload {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CapacityResponse {
    pub working_days: i64,
    pub hours: f64,
}

#[derive(Debug, Deserialize)]
struct DatasetQuery {
    sheet: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatasetResponse {
    pub key: DatasetKey,
    pub rows: usize,
    pub cached: bool,
}

/// Range selection plus filters shared by both report endpoints. An explicit
/// `range` wins over `preset`; `today` anchors the preset.
#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    #[serde(default)]
    pub range: Option<DateRange>,
    #[serde(default)]
    pub preset: Option<DatePreset>,
    #[serde(default)]
    pub today: Option<NaiveDate>,
    #[serde(default)]
    pub persons: Option<BTreeSet<String>>,
    #[serde(default)]
    pub categories: Option<BTreeSet<String>>,
    #[serde(default)]
    pub exclude_category: Option<String>,
}

impl ReportRequest {
    fn date_range(&self) -> Result<DateRange, ApiError> {
        if let Some(range) = self.range {
            return Ok(range);
        }
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let preset = self.preset.unwrap_or(DatePreset::ThisMonth);
        preset.range(today).ok_or_else(|| {
            ApiError::invalid(format!("preset {} has no range on {}", preset.key(), today))
        })
    }

    fn filter(&self, default_exclude: Option<&String>) -> Result<RecordFilter, ApiError> {
        Ok(RecordFilter {
            range: self.date_range()?,
            persons: self.persons.clone(),
            categories: self.categories.clone(),
            exclude_category: self
                .exclude_category
                .clone()
                .or_else(|| default_exclude.cloned()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ProductivityPayload {
    #[serde(flatten)]
    request: ReportRequest,
    #[serde(default)]
    method: ProductivityMethod,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/calendar", get(get_calendar).put(update_calendar))
        .route("/resolve", post(resolve_timestamps))
        .route("/capacity", post(compute_capacity))
        .route("/datasets", post(upload_dataset).delete(invalidate_datasets))
        .route("/reports/resolution", post(resolution_report))
        .route("/reports/productivity", post(productivity_report))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, workspace: Workspace) -> std::io::Result<()> {
    let state = AppState::new(workspace);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_calendar(State(state): State<AppState>) -> Json<BusinessCalendarConfig> {
    let workspace = state.workspace();
    let config = {
        let guard = workspace.read();
        guard.calendar.to_config()
    };
    Json(config)
}

async fn update_calendar(
    State(state): State<AppState>,
    Json(config): Json<BusinessCalendarConfig>,
) -> Json<BusinessCalendarConfig> {
    let workspace = state.workspace();
    let current = {
        let mut guard = workspace.write();
        guard.calendar = BusinessCalendar::from_config(&config);
        guard.calendar.to_config()
    };
    tracing::info!(
        work_start = %current.work_start,
        work_end = %current.work_end,
        excluded = current.excluded_dates.len(),
        "calendar updated"
    );
    Json(current)
}

async fn resolve_timestamps(
    State(state): State<AppState>,
    Json(payload): Json<ResolvePayload>,
) -> Json<ResolveResponse> {
    let workspace = state.workspace();
    let created = parse_timestamp(&payload.created_at);
    let completed = parse_timestamp(&payload.completed_at);
    let working_days = created.zip(completed).and_then(|(created, completed)| {
        let guard = workspace.read();
        let calendar =
            guard.calendar_for(DateRange::spanning(created.date(), completed.date()));
        resolve_interval(created, completed, &calendar)
    });
    Json(ResolveResponse { working_days })
}

async fn compute_capacity(
    State(state): State<AppState>,
    Json(payload): Json<CapacityPayload>,
) -> Json<CapacityResponse> {
    let workspace = state.workspace();
    let response = {
        let guard = workspace.read();
        let calendar = guard.calendar_for(DateRange::new(payload.start, payload.end));
        CapacityResponse {
            working_days: count_working_days(payload.start, payload.end, &calendar),
            hours: capacity(payload.start, payload.end, &calendar),
        }
    };
    Json(response)
}

async fn upload_dataset(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
    body: String,
) -> Result<(StatusCode, Json<DatasetResponse>), ApiError> {
    let sheet = query.sheet.unwrap_or_else(|| "default".to_string());
    let key = DatasetKey::for_content(body.as_bytes(), sheet);
    let workspace = state.workspace();
    let (rows, cached) = {
        let mut guard = workspace.write();
        let columns = guard.columns.clone();
        let (records, cached) = guard
            .cache
            .get_or_insert_with(key.clone(), || read_tasks_csv(body.as_bytes(), &columns))?;
        guard.active = Some(key.clone());
        (records.len(), cached)
    };
    tracing::info!(sheet = %key.sheet, rows, cached, "dataset uploaded");
    let status = if cached {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(DatasetResponse { key, rows, cached })))
}

async fn invalidate_datasets(State(state): State<AppState>) -> StatusCode {
    let workspace = state.workspace();
    {
        let mut guard = workspace.write();
        guard.cache.invalidate();
        guard.active = None;
    }
    tracing::info!("dataset cache invalidated");
    StatusCode::NO_CONTENT
}

fn run_analysis(state: &AppState, request: &ReportRequest) -> Result<Analysis, ApiError> {
    let workspace = state.workspace();
    let guard = workspace.read();
    let records = guard.active_records()?;
    let filter = request.filter(guard.exclude_category.as_ref())?;
    if filter.range.is_empty() {
        return Err(ApiError::invalid(format!(
            "range end precedes start ({})",
            filter.range
        )));
    }
    let calendar = guard.calendar_for(filter.range);
    Ok(Analysis::run(&records, &filter, &calendar))
}

async fn resolution_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ResolutionReport>, ApiError> {
    let analysis = run_analysis(&state, &request)?;
    let report = analysis.resolution_report()?;
    tracing::info!(
        total_rows = report.total_rows,
        valid_rows = report.valid_rows,
        "resolution report built"
    );
    Ok(Json(report))
}

async fn productivity_report(
    State(state): State<AppState>,
    Json(payload): Json<ProductivityPayload>,
) -> Result<Json<ProductivityReport>, ApiError> {
    let analysis = run_analysis(&state, &payload.request)?;
    let report = analysis.productivity_report(&payload.method)?;
    tracing::info!(
        people = report.people.len(),
        overall = report.overall_productivity_pct,
        "productivity report built"
    );
    Ok(Json(report))
}
