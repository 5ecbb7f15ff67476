use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use chrono::{Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use fitplan_core::diet::{self, DailySummary, EntryQuery, FoodEntryInput};
use fitplan_core::nutrition::{
    FoodCatalog, FoodDetail, NutrientProfile, NutritionError, SearchQuery, SearchResult,
    ServingInfo, UsdaClient, extract_nutrients, serving_info,
};
use fitplan_core::plan::{
    PlanToml, create_plan_from_toml, delete_plan, export_plan_toml, get_plan_with_slots,
    replace_plan_slots, validate_plan,
};
use fitplan_core::schedule::{self, GenerationSummary};
use fitplan_core::token::{TokenConfig, validate_token};
use fitplan_core::workout::{WorkoutToml, create_workout, delete_workout, update_workout};
use fitplan_core::workout_log::{self, ScheduledUpdate};
use fitplan_core::ServiceError;
use fitplan_db::models::{
    CompletionState, FoodEntry, NutritionGoal, Plan, PlanSlot, ScheduledWorkout, Subscription,
    SubscriptionStatus, User, UserRecentFood, Workout, WorkoutData,
};
use fitplan_db::queries::nutrition_goals::GoalTargets;
use fitplan_db::queries::plan_slots::NewPlanSlot;
use fitplan_db::queries::scheduled_workouts::{ScheduledFilter, WorkoutStats};
use fitplan_db::queries::{plans as plan_db, users, workouts as workout_db};

use crate::config::FitplanConfig;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        error!("request failed: {err:#}");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => Self::not_found(err.to_string()),
            ServiceError::Forbidden(_) => Self::new(StatusCode::FORBIDDEN, err.to_string()),
            ServiceError::Invalid(_) => Self::bad_request(err.to_string()),
            ServiceError::Persistence(e) => Self::internal(e),
        }
    }
}

impl From<NutritionError> for AppError {
    fn from(err: NutritionError) -> Self {
        match err {
            NutritionError::NotFound(_) => Self::not_found(err.to_string()),
            NutritionError::MissingApiKey => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.to_string())
            }
            NutritionError::Upstream { .. } | NutritionError::Transport(_) => {
                warn!("nutrition provider error: {err}");
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, AppError>;
type Created<T> = Result<(StatusCode, Json<T>), AppError>;

// ---------------------------------------------------------------------------
// State and authentication
// ---------------------------------------------------------------------------

/// Shared by every handler. The food catalog, and with it the food cache,
/// lives here; `None` means no provider key is configured.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub tokens: Arc<TokenConfig>,
    pub foods: Option<Arc<FoodCatalog>>,
}

impl AppState {
    pub fn from_config(pool: PgPool, config: &FitplanConfig) -> Self {
        let foods = match UsdaClient::new(&config.nutrition.usda) {
            Ok(client) => Some(Arc::new(FoodCatalog::new(
                Arc::new(client),
                config.nutrition.build_cache(),
            ))),
            Err(e) => {
                warn!("food lookups disabled: {e}");
                None
            }
        };
        Self {
            pool,
            tokens: Arc::new(config.token_config.clone()),
            foods,
        }
    }

    fn foods(&self) -> Result<&FoodCatalog, AppError> {
        self.foods
            .as_deref()
            .ok_or_else(|| AppError::from(NutritionError::MissingApiKey))
    }
}

/// The user named by a valid `Authorization: Bearer` token.
pub struct AuthUser(pub Uuid);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::unauthorized("missing bearer token"))?;

        let claims = validate_token(&state.tokens, token.trim())
            .map_err(|e| AppError::unauthorized(e.to_string()))?;

        // Tokens outlive deleted accounts.
        users::get_user(&state.pool, claims.user_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| AppError::unauthorized("unknown user"))?;

        Ok(AuthUser(claims.user_id))
    }
}

// ---------------------------------------------------------------------------
// Request and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PlanDetailResponse {
    #[serde(flatten)]
    pub plan: Plan,
    pub slots: Vec<PlanSlot>,
}

#[derive(Debug, Deserialize)]
pub struct SlotInput {
    pub workout_id: Uuid,
    pub week_offset: i32,
    pub week_day: i32,
    #[serde(default)]
    pub slot_order: i32,
    #[serde(default)]
    pub data_override: Option<WorkoutData>,
}

impl From<SlotInput> for NewPlanSlot {
    fn from(s: SlotInput) -> Self {
        Self {
            workout_id: s.workout_id,
            week_offset: s.week_offset,
            week_day: s.week_day,
            slot_order: s.slot_order,
            data_override: s.data_override,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct StartDateBody {
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: SubscriptionStatus,
}

#[derive(Debug, Deserialize)]
pub struct StatusParams {
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryParams {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledParams {
    pub subscription_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub workout_id: Option<Uuid>,
    pub completion_state: Option<CompletionState>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct LogWorkoutBody {
    pub workout_id: Uuid,
    pub performed_at: NaiveDate,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SinceParams {
    /// Defaults to 30 days ago.
    pub since: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub query: String,
    pub page_size: Option<u32>,
    pub page_number: Option<u32>,
    /// Comma-separated FDC data types, e.g. `Foundation,Branded`.
    pub data_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FoodResponse {
    #[serde(flatten)]
    pub food: FoodDetail,
    pub nutrients: NutrientProfile,
    pub serving: ServingInfo,
}

#[derive(Debug, Deserialize)]
pub struct DateParams {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct GoalBody {
    #[serde(flatten)]
    pub targets: GoalTargets,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<i64>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(me))
        .route("/api/workouts", get(list_workouts).post(create_workout_handler))
        .route(
            "/api/workouts/{id}",
            get(get_workout)
                .put(update_workout_handler)
                .delete(delete_workout_handler),
        )
        .route("/api/plans", get(list_plans).post(create_plan))
        .route("/api/plans/{id}", get(get_plan).delete(delete_plan_handler))
        .route("/api/plans/{id}/slots", put(replace_slots))
        .route("/api/plans/{id}/export", get(export_plan))
        .route("/api/plans/{id}/subscribe", post(subscribe))
        .route("/api/subscriptions", get(list_subscriptions))
        .route(
            "/api/subscriptions/{id}",
            get(get_subscription).delete(unsubscribe),
        )
        .route("/api/subscriptions/{id}/regenerate", post(regenerate))
        .route("/api/subscriptions/{id}/reschedule", post(reschedule))
        .route("/api/subscriptions/{id}/status", put(update_status))
        .route(
            "/api/scheduled-workouts",
            get(list_scheduled).post(log_workout),
        )
        .route("/api/scheduled-workouts/stats", get(workout_stats))
        .route(
            "/api/scheduled-workouts/{id}",
            get(get_scheduled)
                .patch(update_scheduled)
                .delete(delete_scheduled),
        )
        .route("/api/foods/search", get(search_foods))
        .route("/api/foods/{fdc_id}", get(get_food))
        .route("/api/diet/entries", get(list_entries).post(create_entry))
        .route(
            "/api/diet/entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/diet/summary", get(daily_summary))
        .route("/api/diet/goals", get(list_goals).post(create_goal))
        .route("/api/diet/goals/active", get(active_goal))
        .route("/api/diet/goals/{id}/activate", post(activate_goal))
        .route("/api/diet/recent-foods", get(recent_foods))
        .route("/api/diet/frequent-foods", get(frequent_foods))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    info!("fitplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("fitplan serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

// ---------------------------------------------------------------------------
// Handlers: account, workouts, plans
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn me(State(state): State<AppState>, AuthUser(user_id): AuthUser) -> ApiResult<User> {
    let user = users::get_user(&state.pool, user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("user {user_id} not found")))?;
    Ok(Json(user))
}

async fn list_workouts(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<CategoryParams>,
) -> ApiResult<Vec<Workout>> {
    let rows = workout_db::list_workouts(&state.pool, Some(user_id), params.category.as_deref())
        .await
        .map_err(AppError::internal)?;
    Ok(Json(rows))
}

async fn get_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Workout> {
    let workout = workout_db::get_workout(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .filter(|w| w.visible_to(user_id))
        .ok_or_else(|| AppError::not_found(format!("workout {id} not found")))?;
    Ok(Json(workout))
}

async fn create_workout_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<WorkoutToml>,
) -> Created<Workout> {
    let workout = create_workout(&state.pool, &body, Some(user_id)).await?;
    Ok((StatusCode::CREATED, Json(workout)))
}

async fn update_workout_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<WorkoutToml>,
) -> ApiResult<Workout> {
    Ok(Json(update_workout(&state.pool, id, Some(user_id), &body).await?))
}

async fn delete_workout_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_workout(&state.pool, id, Some(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<Plan>> {
    let plans = plan_db::list_plans(&state.pool, Some(user_id))
        .await
        .map_err(AppError::internal)?;
    Ok(Json(plans))
}

async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<PlanDetailResponse> {
    let (plan, slots) = get_plan_with_slots(&state.pool, id).await?;
    if !plan.visible_to(user_id) {
        return Err(AppError::not_found(format!("plan {id} not found")));
    }
    Ok(Json(PlanDetailResponse { plan, slots }))
}

async fn create_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<PlanToml>,
) -> Created<PlanDetailResponse> {
    validate_plan(&body).map_err(|e| AppError::bad_request(e.to_string()))?;
    let (plan, slots) = create_plan_from_toml(&state.pool, &body, Some(user_id)).await?;
    Ok((StatusCode::CREATED, Json(PlanDetailResponse { plan, slots })))
}

async fn replace_slots(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<Vec<SlotInput>>,
) -> ApiResult<Vec<PlanSlot>> {
    let slots: Vec<NewPlanSlot> = body.into_iter().map(NewPlanSlot::from).collect();
    let inserted = replace_plan_slots(&state.pool, id, Some(user_id), &slots).await?;
    Ok(Json(inserted))
}

async fn delete_plan_handler(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    delete_plan(&state.pool, id, Some(user_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn export_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Response, AppError> {
    let plan = plan_db::get_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .filter(|p| p.visible_to(user_id))
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;
    let body = export_plan_toml(&state.pool, plan.id).await?;
    Ok(([(header::CONTENT_TYPE, "application/toml")], body).into_response())
}

// ---------------------------------------------------------------------------
// Handlers: subscriptions
// ---------------------------------------------------------------------------

async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(plan_id): Path<Uuid>,
    Json(body): Json<StartDateBody>,
) -> Created<Subscription> {
    let start = body.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let sub = schedule::subscribe(&state.pool, user_id, plan_id, start).await?;
    Ok((StatusCode::CREATED, Json(sub)))
}

async fn list_subscriptions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<StatusParams>,
) -> ApiResult<Vec<Subscription>> {
    let subs = schedule::list_subscriptions(&state.pool, user_id, params.status).await?;
    Ok(Json(subs))
}

async fn get_subscription(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Subscription> {
    Ok(Json(schedule::get_subscription(&state.pool, id, user_id).await?))
}

async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    schedule::unsubscribe(&state.pool, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn regenerate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<GenerationSummary> {
    Ok(Json(schedule::regenerate(&state.pool, id, user_id).await?))
}

async fn reschedule(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StartDateBody>,
) -> ApiResult<Subscription> {
    let start = body
        .start_date
        .ok_or_else(|| AppError::bad_request("start_date is required"))?;
    Ok(Json(schedule::reschedule(&state.pool, id, user_id, start).await?))
}

async fn update_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<StatusBody>,
) -> ApiResult<Subscription> {
    Ok(Json(
        schedule::update_status(&state.pool, id, user_id, body.status).await?,
    ))
}

// ---------------------------------------------------------------------------
// Handlers: scheduled workouts
// ---------------------------------------------------------------------------

async fn list_scheduled(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<ScheduledParams>,
) -> ApiResult<Vec<ScheduledWorkout>> {
    let defaults = ScheduledFilter::for_user(user_id);
    let filter = ScheduledFilter {
        subscription_id: p.subscription_id,
        plan_id: p.plan_id,
        workout_id: p.workout_id,
        completion_state: p.completion_state,
        from: p.from,
        to: p.to,
        limit: p.limit.unwrap_or(defaults.limit),
        offset: p.offset.unwrap_or(defaults.offset),
        ..defaults
    };
    Ok(Json(workout_log::list_scheduled(&state.pool, &filter).await?))
}

async fn log_workout(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<LogWorkoutBody>,
) -> Created<ScheduledWorkout> {
    let record = workout_log::log_workout(
        &state.pool,
        user_id,
        body.workout_id,
        body.performed_at,
        body.notes,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn workout_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<SinceParams>,
) -> ApiResult<WorkoutStats> {
    let since = match params.since {
        Some(d) => d,
        None => Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(30))
            .ok_or_else(|| AppError::bad_request("date out of range"))?,
    };
    Ok(Json(workout_log::workout_stats(&state.pool, user_id, since).await?))
}

async fn get_scheduled(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<ScheduledWorkout> {
    Ok(Json(workout_log::get_scheduled(&state.pool, id, user_id).await?))
}

async fn update_scheduled(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<ScheduledUpdate>,
) -> ApiResult<ScheduledWorkout> {
    Ok(Json(
        workout_log::update_scheduled(&state.pool, id, user_id, &body).await?,
    ))
}

async fn delete_scheduled(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    workout_log::delete_scheduled(&state.pool, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Handlers: foods
// ---------------------------------------------------------------------------

async fn search_foods(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Query(params): Query<SearchParams>,
) -> ApiResult<SearchResult> {
    if params.query.trim().is_empty() {
        return Err(AppError::bad_request("query must not be blank"));
    }
    let mut query = SearchQuery::new(params.query.trim());
    if let Some(size) = params.page_size {
        query.page_size = size.clamp(1, 200);
    }
    if let Some(page) = params.page_number {
        query.page_number = page.max(1);
    }
    if let Some(types) = params.data_type {
        query.data_type = types
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();
    }
    Ok(Json(state.foods()?.search(&query).await?))
}

async fn get_food(
    State(state): State<AppState>,
    AuthUser(_): AuthUser,
    Path(fdc_id): Path<i64>,
) -> ApiResult<FoodResponse> {
    let food = state.foods()?.food(fdc_id).await?;
    Ok(Json(FoodResponse {
        nutrients: extract_nutrients(&food.food_nutrients),
        serving: serving_info(&food),
        food,
    }))
}

// ---------------------------------------------------------------------------
// Handlers: diet diary
// ---------------------------------------------------------------------------

async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<EntryQuery>,
) -> ApiResult<Vec<FoodEntry>> {
    Ok(Json(diet::list_entries(&state.pool, user_id, &query).await?))
}

async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<FoodEntryInput>,
) -> Created<FoodEntry> {
    let entry = diet::create_entry(&state.pool, user_id, &body).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<FoodEntry> {
    Ok(Json(diet::get_entry(&state.pool, id, user_id).await?))
}

async fn update_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<FoodEntryInput>,
) -> ApiResult<FoodEntry> {
    Ok(Json(diet::update_entry(&state.pool, id, user_id, &body).await?))
}

async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    diet::delete_entry(&state.pool, id, user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn daily_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<DateParams>,
) -> ApiResult<DailySummary> {
    let date = params.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(diet::daily_summary(&state.pool, user_id, date).await?))
}

async fn list_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<Vec<NutritionGoal>> {
    Ok(Json(diet::list_goals(&state.pool, user_id).await?))
}

async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<GoalBody>,
) -> Created<NutritionGoal> {
    let goal = diet::create_goal(&state.pool, user_id, &body.targets, body.is_active).await?;
    Ok((StatusCode::CREATED, Json(goal)))
}

async fn active_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> ApiResult<NutritionGoal> {
    diet::active_goal(&state.pool, user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("no active nutrition goal"))
}

async fn activate_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<NutritionGoal> {
    Ok(Json(diet::activate_goal(&state.pool, id, user_id).await?))
}

async fn recent_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<UserRecentFood>> {
    let limit = params.limit.unwrap_or(20);
    Ok(Json(diet::recent_foods(&state.pool, user_id, limit).await?))
}

async fn frequent_foods(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<UserRecentFood>> {
    let limit = params.limit.unwrap_or(20);
    Ok(Json(diet::frequent_foods(&state.pool, user_id, limit).await?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
