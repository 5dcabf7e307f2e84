pub mod paths;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::handlers::{appointments, auth, health, hospitals, payments, records, users};
use crate::server::CareHubServer;

/// Unauthenticated probes, mounted at the root
pub fn health_routes() -> Router<CareHubServer> {
    Router::new().route(paths::health::HEALTH, get(health::health_check))
}

pub fn auth_routes() -> Router<CareHubServer> {
    Router::new()
        .route(paths::auth::REGISTER, post(auth::register))
        .route(paths::auth::LOGIN, post(auth::login))
        .route(paths::auth::LOGOUT, post(auth::logout))
        .route(paths::auth::VERIFY, get(auth::verify))
}

pub fn user_routes() -> Router<CareHubServer> {
    Router::new()
        .route(paths::users::USERS, get(users::list_users).post(users::create_user))
        .route(paths::users::ME, get(users::get_me).put(users::update_me))
        .route(paths::users::ME_PASSWORD, put(users::change_password))
        .route(paths::users::DOCTORS, get(users::list_doctors))
        .route(
            paths::users::USER_BY_ID,
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route(paths::users::USER_STATUS, patch(users::update_user_status))
}

pub fn hospital_routes() -> Router<CareHubServer> {
    Router::new()
        .route(
            paths::hospitals::HOSPITALS,
            get(hospitals::list_hospitals).post(hospitals::create_hospital),
        )
        .route(
            paths::hospitals::HOSPITAL_BY_ID,
            get(hospitals::get_hospital)
                .put(hospitals::update_hospital)
                .delete(hospitals::delete_hospital),
        )
}

pub fn appointment_routes() -> Router<CareHubServer> {
    Router::new()
        .route(
            paths::appointments::APPOINTMENTS,
            get(appointments::list_appointments).post(appointments::create_appointment),
        )
        .route(
            paths::appointments::APPOINTMENT_BY_ID,
            get(appointments::get_appointment).put(appointments::update_appointment),
        )
        .route(paths::appointments::CANCEL, post(appointments::cancel_appointment))
}

pub fn payment_routes() -> Router<CareHubServer> {
    Router::new()
        .route(
            paths::payments::PAYMENTS,
            get(payments::list_payments).post(payments::create_payment),
        )
        .route(
            paths::payments::PAYMENT_BY_ID,
            get(payments::get_payment).put(payments::update_payment_status),
        )
        .route(paths::payments::RECEIPT, post(payments::generate_receipt))
        .route(paths::payments::REFUND, post(payments::refund_payment))
}

pub fn record_routes() -> Router<CareHubServer> {
    Router::new()
        .route(
            paths::records::RECORDS,
            get(records::list_records).post(records::create_record),
        )
        .route(
            paths::records::RECORD_BY_ID,
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        )
        .route(paths::records::NOTES, post(records::add_progress_note))
        .route(paths::records::ATTACHMENTS, post(records::add_attachment))
}

/// Everything under `/api`
pub fn api_routes() -> Router<CareHubServer> {
    Router::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(hospital_routes())
        .merge(appointment_routes())
        .merge(payment_routes())
        .merge(record_routes())
}

/// The full route table: `/health` at the root, everything else under `/api`
pub fn create_routes() -> Router<CareHubServer> {
    Router::new()
        .merge(health_routes())
        .nest("/api", api_routes())
}
