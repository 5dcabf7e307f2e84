use auth_identity::{
    ChangePasswordRequest, NewUser, PublicUser, Role, Specialization, UpdateUser, UserQuery,
};
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::middleware::{ApiJson, ApiPath, ApiQuery, AuthContext};
use crate::server::CareHubServer;
use crate::types::PaginationParams;

const MANAGERS: &[Role] = &[Role::HealthcareManager];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersParams {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub specialization: Option<Specialization>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorParams {
    pub specialization: Option<Specialization>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub is_active: bool,
}

pub async fn get_me(auth: AuthContext) -> Json<ApiResponse<PublicUser>> {
    Json(api_success(PublicUser::from(auth.user)))
}

pub async fn update_me(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(update): ApiJson<UpdateUser>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    let user = server.identity.update_user(auth.user_id(), update).await?;
    Ok(Json(api_success(user.into())))
}

pub async fn change_password(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<String>>> {
    server
        .identity
        .change_password(auth.user_id(), &request.current_password, &request.new_password)
        .await?;
    Ok(Json(api_success("Password updated".to_string())))
}

/// Bookable doctors, open to every signed-in user
pub async fn list_doctors(
    State(server): State<CareHubServer>,
    _auth: AuthContext,
    ApiQuery(params): ApiQuery<DoctorParams>,
) -> ApiResult<Json<ApiResponse<Vec<PublicUser>>>> {
    let doctors = server.identity.list_doctors(params.specialization).await?;
    Ok(Json(api_success(
        doctors.into_iter().map(PublicUser::from).collect(),
    )))
}

pub async fn list_users(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiQuery(params): ApiQuery<ListUsersParams>,
) -> ApiResult<Json<ApiResponse<Vec<PublicUser>>>> {
    auth.require_role(MANAGERS)?;
    let pagination = PaginationParams::new(params.page, params.limit);
    let query = UserQuery {
        role: params.role,
        is_active: params.is_active,
        specialization: params.specialization,
    };

    let (users, total) = server
        .identity
        .list_users(&query, pagination.page(), pagination.limit())
        .await?;
    let users: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();
    Ok(Json(pagination.wrap_response(users, total)))
}

/// Manager-created account of any role
pub async fn create_user(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiJson(request): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PublicUser>>)> {
    auth.require_role(MANAGERS)?;
    let user = server.identity.create_user(request).await?;
    Ok((StatusCode::CREATED, Json(api_success(user.into()))))
}

pub async fn get_user(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    auth.require_role(MANAGERS)?;
    let user = server.identity.get_user(id).await?;
    Ok(Json(api_success(user.into())))
}

pub async fn update_user(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<UpdateUser>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    auth.require_role(MANAGERS)?;
    let user = server.identity.update_user(id, update).await?;
    Ok(Json(api_success(user.into())))
}

pub async fn update_user_status(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<ApiResponse<PublicUser>>> {
    auth.require_role(MANAGERS)?;
    let user = server.identity.set_active(id, request.is_active).await?;
    Ok(Json(api_success(user.into())))
}

pub async fn delete_user(
    State(server): State<CareHubServer>,
    auth: AuthContext,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<ApiResponse<String>>> {
    auth.require_role(MANAGERS)?;
    server.identity.delete_user(auth.user_id(), id).await?;
    Ok(Json(api_success("User deleted".to_string())))
}
