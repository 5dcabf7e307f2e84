//! Session endpoints
//!
//! Login and registration return the token in the body and also set it as
//! an httpOnly cookie, so both API clients and browsers can authenticate.

use auth_identity::{LoginRequest, LoginResponse, NewUser, PublicUser};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use logger_redacted::redact;
use tracing::info;

use crate::error::{api_success, ApiResponse, ApiResult};
use crate::middleware::{ApiJson, AuthContext, TOKEN_COOKIE};
use crate::server::CareHubServer;

fn session_cookie(server: &CareHubServer, token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(server.config.auth.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::hours(server.config.auth.token_ttl_hours))
        .build()
}

/// Patient self-registration, signed in on success
pub async fn register(
    State(server): State<CareHubServer>,
    jar: CookieJar,
    ApiJson(request): ApiJson<NewUser>,
) -> ApiResult<(StatusCode, CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let user = server.identity.register(request).await?;
    let issued = server.identity.tokens().issue(&user)?;
    info!(user_id = %user.id, "Patient registered");

    let jar = jar.add(session_cookie(&server, issued.token.clone()));
    let session = LoginResponse {
        user: PublicUser::from(user),
        token: issued.token,
        expires_at: issued.expires_at,
    };
    Ok((StatusCode::CREATED, jar, Json(api_success(session))))
}

pub async fn login(
    State(server): State<CareHubServer>,
    jar: CookieJar,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<ApiResponse<LoginResponse>>)> {
    let session = match server.identity.login(&request.email, &request.password).await {
        Ok(session) => session,
        Err(e) => {
            info!(email = %redact(&request.email), "Login rejected");
            return Err(e.into());
        }
    };

    let jar = jar.add(session_cookie(&server, session.token.clone()));
    Ok((jar, Json(api_success(session))))
}

/// Clears the session cookie; bearer tokens simply expire
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<ApiResponse<String>>) {
    let jar = jar.remove(Cookie::build(TOKEN_COOKIE).path("/"));
    (jar, Json(api_success("Logged out".to_string())))
}

pub async fn verify(auth: AuthContext) -> Json<ApiResponse<PublicUser>> {
    Json(api_success(PublicUser::from(auth.user)))
}
