//! Medical record endpoints
//!
//! Every single-record read or write appends to the record's access log;
//! listing does not.

use axum::{extract::State, http::StatusCode, Json};
use records_service::{
    MedicalRecord, NewAttachment, NewMedicalRecord, NewProgressNote, RecordQuery,
    UpdateMedicalRecord,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthContext};
use crate::server::CareHubServer;
use crate::types::PaginationParams;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRecordsParams {
    pub patient_id: Option<Uuid>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub async fn create_record(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewMedicalRecord>,
) -> ApiResult<(StatusCode, Json<ApiResponse<MedicalRecord>>)> {
    let record = server.records.create(&auth.user, request).await?;
    Ok((StatusCode::CREATED, Json(api_success(record))))
}

pub async fn list_records(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiQuery(params): ApiQuery<ListRecordsParams>,
) -> ApiResult<Json<ApiResponse<Vec<MedicalRecord>>>> {
    let pagination = PaginationParams::new(params.page, params.limit);
    let query = RecordQuery {
        patient_id: params.patient_id,
    };
    let (records, total) = server
        .records
        .list(&auth.user, &query, pagination.page(), pagination.limit())
        .await?;
    Ok(Json(pagination.wrap_response(records, total)))
}

pub async fn get_record(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<MedicalRecord>>> {
    let record = server.records.get(&auth.user, id).await?;
    Ok(Json(api_success(record)))
}

pub async fn update_record(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdateMedicalRecord>,
) -> ApiResult<Json<ApiResponse<MedicalRecord>>> {
    let record = server.records.update(&auth.user, id, update).await?;
    Ok(Json(api_success(record)))
}

pub async fn add_progress_note(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<NewProgressNote>,
) -> ApiResult<Json<ApiResponse<MedicalRecord>>> {
    let record = server.records.add_note(&auth.user, id, request).await?;
    Ok(Json(api_success(record)))
}

pub async fn add_attachment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<NewAttachment>,
) -> ApiResult<Json<ApiResponse<MedicalRecord>>> {
    let record = server.records.add_attachment(&auth.user, id, request).await?;
    Ok(Json(api_success(record)))
}

pub async fn delete_record(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<MedicalRecord>>> {
    let record = server.records.delete(&auth.user, id).await?;
    Ok(Json(api_success(record)))
}
