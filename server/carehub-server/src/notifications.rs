//! Turns domain objects into notifications and hands them to the notifier
//!
//! Every function here returns an outcome and never an error: a missing
//! patient or an SMTP failure is reported to the caller, the triggering
//! state change stands.

use appointment_service::Appointment;
use billing_service::Payment;
use email_service::{AppointmentNotice, Notification, NotificationOutcome, PaymentNotice};
use tracing::warn;

use crate::error::ApiResult;
use crate::server::CareHubServer;

pub async fn appointment_confirmation(
    server: &CareHubServer,
    appointment: &Appointment,
) -> NotificationOutcome {
    let notification = appointment_notice(server, appointment)
        .await
        .map(Notification::AppointmentConfirmation);
    dispatch(server, notification).await
}

pub async fn appointment_reminder(
    server: &CareHubServer,
    appointment: &Appointment,
) -> NotificationOutcome {
    let notification = appointment_notice(server, appointment)
        .await
        .map(Notification::AppointmentReminder);
    dispatch(server, notification).await
}

pub async fn appointment_cancellation(
    server: &CareHubServer,
    appointment: &Appointment,
) -> NotificationOutcome {
    let reason = appointment
        .cancellation
        .as_ref()
        .map(|c| c.reason.clone())
        .unwrap_or_default();
    let notification = appointment_notice(server, appointment)
        .await
        .map(|notice| Notification::AppointmentCancellation { notice, reason });
    dispatch(server, notification).await
}

pub async fn payment_confirmation(server: &CareHubServer, payment: &Payment) -> NotificationOutcome {
    let notification = payment_notice(server, payment)
        .await
        .map(Notification::PaymentConfirmation);
    dispatch(server, notification).await
}

async fn dispatch(
    server: &CareHubServer,
    notification: ApiResult<Notification>,
) -> NotificationOutcome {
    match notification {
        Ok(notification) => server.notifier.notify(notification).await,
        Err(e) => {
            warn!(error = %e, "Could not prepare notification");
            NotificationOutcome::failed(e.to_string())
        }
    }
}

async fn appointment_notice(
    server: &CareHubServer,
    appointment: &Appointment,
) -> ApiResult<AppointmentNotice> {
    let patient = server.identity.get_user(appointment.patient_id).await?;
    let doctor = server.identity.get_user(appointment.doctor_id).await?;
    let hospital = server.hospitals.get(appointment.hospital_id).await?;

    Ok(AppointmentNotice {
        recipient_email: patient.email,
        patient_name: patient.name,
        doctor_name: doctor.name,
        hospital_name: hospital.name,
        appointment_id: appointment.appointment_id.clone(),
        date: appointment.date,
        time: appointment.time.clone(),
    })
}

async fn payment_notice(server: &CareHubServer, payment: &Payment) -> ApiResult<PaymentNotice> {
    let patient = server.identity.get_user(payment.patient_id).await?;

    Ok(PaymentNotice {
        recipient_email: patient.email,
        patient_name: patient.name,
        payment_id: payment.id,
        amount: payment.amount,
        method: payment.method.as_str().to_string(),
        transaction_id: payment
            .gateway_response
            .as_ref()
            .and_then(|g| g.transaction_id.clone()),
        paid_at: payment.updated_at,
    })
}
