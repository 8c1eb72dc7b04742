//! Material (paper, board, ink, film) API

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    middleware,
    routing::{get, post, put},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ApiResponse, ErrorCode};
use shared::models::{Material, MaterialCreate, MaterialUpdate};
use shared::{PaginatedResponse, SearchQuery};

use super::{ApiResult, internal};
use crate::auth::require_permission;
use crate::db;
use crate::error::write_error;
use crate::state::AppState;
use crate::util::non_blank;

pub fn router() -> Router<AppState> {
    let read_routes = Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id));

    let manage_routes = Router::new()
        .route("/", post(create))
        .route("/{id}", put(update).delete(deactivate))
        .layer(middleware::from_fn(require_permission("master:manage")));

    read_routes.merge(manage_routes)
}

#[derive(Debug, Default, Deserialize)]
pub struct MaterialListFilter {
    pub material_type: Option<String>,
}

/// GET /api/materials
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(filter): Query<MaterialListFilter>,
) -> ApiResult<PaginatedResponse<Material>> {
    let page = query.pagination();
    let pattern = query.pattern();
    let material_type = filter.material_type.as_deref().and_then(non_blank);

    let items = db::materials::list(
        &state.pool,
        query.active(),
        pattern.as_deref(),
        material_type,
        page.limit(),
        page.offset(),
    )
    .await
    .map_err(internal)?;
    let total = db::materials::count(&state.pool, query.active(), pattern.as_deref(), material_type)
        .await
        .map_err(internal)?;

    Ok(Json(PaginatedResponse::from_query(items, &page, total)))
}

/// GET /api/materials/{id}
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Material> {
    let material = db::materials::find_by_id(&state.pool, id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::MaterialNotFound))?;
    Ok(Json(material))
}

fn check_gsm(gsm: Option<Decimal>) -> Result<(), AppError> {
    match gsm {
        Some(g) if g <= Decimal::ZERO => Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "GSM must be positive",
        )
        .with_detail("field", "gsm")),
        _ => Ok(()),
    }
}

/// POST /api/materials
pub async fn create(
    State(state): State<AppState>,
    Json(data): Json<MaterialCreate>,
) -> ApiResult<Material> {
    non_blank(&data.code).ok_or_else(|| AppError::required("code"))?;
    non_blank(&data.name).ok_or_else(|| AppError::required("name"))?;
    non_blank(&data.material_type).ok_or_else(|| AppError::required("material_type"))?;
    non_blank(&data.unit).ok_or_else(|| AppError::required("unit"))?;
    check_gsm(data.gsm)?;

    let material = db::materials::create(&state.pool, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::MaterialCodeExists))?;

    tracing::info!(material_id = material.id, code = %material.code, "Material created");
    Ok(Json(material))
}

/// PUT /api/materials/{id}
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<MaterialUpdate>,
) -> ApiResult<Material> {
    for (field, value) in [
        ("code", &data.code),
        ("name", &data.name),
        ("material_type", &data.material_type),
        ("unit", &data.unit),
    ] {
        if value.as_deref().is_some_and(|v| non_blank(v).is_none()) {
            return Err(AppError::required(field));
        }
    }
    check_gsm(data.gsm)?;

    let material = db::materials::update(&state.pool, id, &data)
        .await
        .map_err(|e| write_error(e, ErrorCode::MaterialCodeExists))?
        .ok_or_else(|| AppError::new(ErrorCode::MaterialNotFound))?;
    Ok(Json(material))
}

/// DELETE /api/materials/{id}
pub async fn deactivate(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<ApiResponse<()>, AppError> {
    if !db::materials::deactivate(&state.pool, id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::MaterialNotFound));
    }
    Ok(ApiResponse::ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gsm_must_be_positive() {
        assert!(check_gsm(None).is_ok());
        assert!(check_gsm(Some(Decimal::new(300, 0))).is_ok());
        let err = check_gsm(Some(Decimal::ZERO)).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    }
}
