use appointment_service::{
    Appointment, AppointmentQuery, AppointmentStatus, CancelAppointment, NewAppointment,
    UpdateAppointment,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthContext};
use crate::notifications;
use crate::server::CareHubServer;
use crate::types::PaginationParams;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsParams {
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Book an appointment and send the confirmation email
///
/// The booking stands even if the email fails; the outcome is reported
/// in the response's `notification` field.
pub async fn create_appointment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewAppointment>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Appointment>>)> {
    let appointment = server.appointments.create(&auth.user, request).await?;
    let outcome = notifications::appointment_confirmation(&server, &appointment).await;
    Ok((
        StatusCode::CREATED,
        Json(api_success(appointment).with_notification(Some(outcome))),
    ))
}

pub async fn list_appointments(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiQuery(params): ApiQuery<ListAppointmentsParams>,
) -> ApiResult<Json<ApiResponse<Vec<Appointment>>>> {
    let pagination = PaginationParams::new(params.page, params.limit);
    let query = AppointmentQuery {
        status: params.status,
        date_from: params.date_from,
        date_to: params.date_to,
    };
    let (appointments, total) = server
        .appointments
        .list(&auth.user, &query, pagination.page(), pagination.limit())
        .await?;
    Ok(Json(pagination.wrap_response(appointments, total)))
}

pub async fn get_appointment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let appointment = server.appointments.get(&auth.user, id).await?;
    Ok(Json(api_success(appointment)))
}

pub async fn update_appointment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdateAppointment>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let appointment = server.appointments.update(&auth.user, id, update).await?;
    Ok(Json(api_success(appointment)))
}

pub async fn cancel_appointment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<CancelAppointment>,
) -> ApiResult<Json<ApiResponse<Appointment>>> {
    let appointment = server.appointments.cancel(&auth.user, id, request).await?;
    let outcome = notifications::appointment_cancellation(&server, &appointment).await;
    Ok(Json(api_success(appointment).with_notification(Some(outcome))))
}
