use axum::{extract::State, http::StatusCode, Json};
use billing_service::{
    NewPayment, Payment, PaymentMethod, PaymentQuery, PaymentStatus, RefundRequest,
    UpdatePaymentStatus,
};
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
pub struct ListPaymentsParams {
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Record a payment; card and wallet payments go through the gateway
///
/// A payment that completes immediately triggers the confirmation email.
pub async fn create_payment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewPayment>,
) -> ApiResult<(StatusCode, Json<ApiResponse<Payment>>)> {
    let payment = server.payments.create(&auth.user, request).await?;
    let outcome = if payment.status == PaymentStatus::Completed {
        Some(notifications::payment_confirmation(&server, &payment).await)
    } else {
        None
    };
    Ok((
        StatusCode::CREATED,
        Json(api_success(payment).with_notification(outcome)),
    ))
}

pub async fn list_payments(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiQuery(params): ApiQuery<ListPaymentsParams>,
) -> ApiResult<Json<ApiResponse<Vec<Payment>>>> {
    let pagination = PaginationParams::new(params.page, params.limit);
    let query = PaymentQuery {
        status: params.status,
        method: params.method,
        date_from: params.date_from,
        date_to: params.date_to,
    };
    let (payments, total) = server
        .payments
        .list(&auth.user, &query, pagination.page(), pagination.limit())
        .await?;
    Ok(Json(pagination.wrap_response(payments, total)))
}

pub async fn get_payment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    let payment = server.payments.get(&auth.user, id).await?;
    Ok(Json(api_success(payment)))
}

pub async fn update_payment_status(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdatePaymentStatus>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    let transition = server.payments.update_status(&auth.user, id, update).await?;
    let outcome = if transition.completed {
        Some(notifications::payment_confirmation(&server, &transition.payment).await)
    } else {
        None
    };
    Ok(Json(api_success(transition.payment).with_notification(outcome)))
}

pub async fn generate_receipt(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    let payment = server.payments.receipt(&auth.user, id).await?;
    Ok(Json(api_success(payment)))
}

pub async fn refund_payment(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RefundRequest>,
) -> ApiResult<Json<ApiResponse<Payment>>> {
    let payment = server.payments.refund(&auth.user, id, request).await?;
    Ok(Json(api_success(payment)))
}
