//! 患者记录的 HTTP 处理器

use crate::{
    error::AppError,
    handlers::{IdPath, ValidatedJson, ValidatedQuery},
    middleware::AppState,
    models::patient::{PatientListQuery, PatientPage, PatientRequest, PatientSearchQuery},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// 创建患者（前台）
pub async fn create_patient(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<PatientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patient = state.patient_service.create(req).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Patient created successfully",
            "patient": patient
        })),
    ))
}

/// 分页列出患者
pub async fn list_patients(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PatientListQuery>,
) -> Result<Json<PatientPage>, AppError> {
    let page = state.patient_service.list(&query).await?;
    Ok(Json(page))
}

/// 获取患者详情
pub async fn get_patient(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    let patient = state.patient_service.get(id).await?;
    Ok(Json(json!({ "patient": patient })))
}

/// 按姓名查找患者（不区分大小写）
pub async fn search_patient(
    State(state): State<Arc<AppState>>,
    ValidatedQuery(query): ValidatedQuery<PatientSearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let name = query.name.unwrap_or_default();
    let patient = state.patient_service.find_by_name(&name).await?;
    Ok(Json(json!({ "patient": patient })))
}

/// 更新患者（医生）
pub async fn update_patient(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
    ValidatedJson(req): ValidatedJson<PatientRequest>,
) -> Result<impl IntoResponse, AppError> {
    let patient = state.patient_service.update(id, req).await?;

    Ok(Json(json!({
        "message": "Patient updated successfully",
        "patient": patient
    })))
}

/// 删除患者（前台，软删除）
pub async fn delete_patient(
    State(state): State<Arc<AppState>>,
    IdPath(id): IdPath,
) -> Result<impl IntoResponse, AppError> {
    state.patient_service.delete(id).await?;

    Ok(Json(json!({
        "message": "Patient deleted successfully"
    })))
}
