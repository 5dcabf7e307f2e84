use auth_identity::{Role, Specialization};
use axum::{extract::State, http::StatusCode, Json};
use hospital_directory::{Hospital, HospitalQuery, HospitalType, NewHospital, UpdateHospital};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthContext};
use crate::server::CareHubServer;
use crate::types::PaginationParams;

const MANAGERS: &[Role] = &[Role::HealthcareManager];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListHospitalsParams {
    #[serde(rename = "type")]
    pub hospital_type: Option<HospitalType>,
    pub specialization: Option<Specialization>,
    pub emergency_services: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Active hospitals only
pub async fn list_hospitals(
    State(server): State<CareHubServer>,
    _auth: AuthContext,
    ApiQuery(params): ApiQuery<ListHospitalsParams>,
) -> ApiResult<Json<ApiResponse<Vec<Hospital>>>> {
    let pagination = PaginationParams::new(params.page, params.limit);
    let query = HospitalQuery {
        hospital_type: params.hospital_type,
        specialization: params.specialization,
        emergency_services: params.emergency_services,
    };
    let (hospitals, total) = server
        .hospitals
        .list(&query, pagination.page(), pagination.limit())
        .await?;
    Ok(Json(pagination.wrap_response(hospitals, total)))
}

pub async fn get_hospital(
    State(server): State<CareHubServer>,
    _auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Hospital>>> {
    let hospital = server.hospitals.get(id).await?;
    Ok(Json(api_success(hospital)))
}

pub async fn create_hospital(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewHospital>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Hospital>>)> {
    auth.require_role(MANAGERS)?;
    let hospital = server.hospitals.create(request).await?;
    Ok((StatusCode::CREATED, Json(api_success(hospital))))
}

pub async fn update_hospital(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdateHospital>,
) -> ApiResult<Json<ApiResponse<Hospital>>> {
    auth.require_role(MANAGERS)?;
    let hospital = server.hospitals.update(id, update).await?;
    Ok(Json(api_success(hospital)))
}

/// Soft delete; existing bookings keep their reference
pub async fn delete_hospital(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Hospital>>> {
    auth.require_role(MANAGERS)?;
    let hospital = server.hospitals.deactivate(id).await?;
    Ok(Json(api_success(hospital)))
}
