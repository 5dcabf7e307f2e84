use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Details shared by every appointment email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentNotice {
    pub recipient_email: String,
    pub patient_name: String,
    pub doctor_name: String,
    pub hospital_name: String,
    pub appointment_id: String,
    pub date: NaiveDate,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentNotice {
    pub recipient_email: String,
    pub patient_name: String,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub transaction_id: Option<String>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    AppointmentConfirmation(AppointmentNotice),
    AppointmentReminder(AppointmentNotice),
    AppointmentCancellation { notice: AppointmentNotice, reason: String },
    PaymentConfirmation(PaymentNotice),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    AppointmentConfirmation,
    AppointmentReminder,
    AppointmentCancellation,
    PaymentConfirmation,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationKind::AppointmentConfirmation => "appointment_confirmation",
            NotificationKind::AppointmentReminder => "appointment_reminder",
            NotificationKind::AppointmentCancellation => "appointment_cancellation",
            NotificationKind::PaymentConfirmation => "payment_confirmation",
        })
    }
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::AppointmentConfirmation(_) => NotificationKind::AppointmentConfirmation,
            Notification::AppointmentReminder(_) => NotificationKind::AppointmentReminder,
            Notification::AppointmentCancellation { .. } => NotificationKind::AppointmentCancellation,
            Notification::PaymentConfirmation(_) => NotificationKind::PaymentConfirmation,
        }
    }

    pub fn recipient(&self) -> &str {
        match self {
            Notification::AppointmentConfirmation(n) | Notification::AppointmentReminder(n) => {
                &n.recipient_email
            }
            Notification::AppointmentCancellation { notice, .. } => &notice.recipient_email,
            Notification::PaymentConfirmation(p) => &p.recipient_email,
        }
    }

    /// Subject line and HTML body
    pub fn render(&self) -> (String, String) {
        match self {
            Notification::AppointmentConfirmation(n) => (
                format!("Appointment confirmed - {}", n.appointment_id),
                layout(
                    &n.patient_name,
                    "Your appointment has been scheduled.",
                    &appointment_rows(n),
                ),
            ),
            Notification::AppointmentReminder(n) => (
                format!("Reminder: appointment tomorrow at {}", n.time),
                layout(
                    &n.patient_name,
                    "This is a reminder of your appointment tomorrow.",
                    &appointment_rows(n),
                ),
            ),
            Notification::AppointmentCancellation { notice, reason } => {
                let mut rows = appointment_rows(notice);
                rows.push(("Reason", reason.clone()));
                (
                    format!("Appointment cancelled - {}", notice.appointment_id),
                    layout(&notice.patient_name, "Your appointment has been cancelled.", &rows),
                )
            }
            Notification::PaymentConfirmation(p) => {
                let mut rows = vec![
                    ("Payment", p.payment_id.to_string()),
                    ("Amount", format!("{:.2}", p.amount)),
                    ("Method", p.method.replace('_', " ")),
                    ("Date", p.paid_at.format("%Y-%m-%d %H:%M UTC").to_string()),
                ];
                if let Some(ref txn) = p.transaction_id {
                    rows.push(("Transaction", txn.clone()));
                }
                (
                    format!("Payment received - {:.2}", p.amount),
                    layout(&p.patient_name, "We have received your payment.", &rows),
                )
            }
        }
    }
}

fn appointment_rows(n: &AppointmentNotice) -> Vec<(&'static str, String)> {
    vec![
        ("Appointment", n.appointment_id.clone()),
        ("Date", n.date.format("%A, %B %-d, %Y").to_string()),
        ("Time", n.time.clone()),
        ("Doctor", n.doctor_name.clone()),
        ("Hospital", n.hospital_name.clone()),
    ]
}

fn layout(name: &str, lead: &str, rows: &[(&str, String)]) -> String {
    let rows: String = rows
        .iter()
        .map(|(label, value)| {
            format!(
                "<tr><td><strong>{}</strong></td><td>{}</td></tr>",
                label,
                escape_html(value)
            )
        })
        .collect();
    format!(
        "<!DOCTYPE html><html><body style=\"font-family: Arial, sans-serif\">\
         <p>Dear {},</p><p>{}</p><table>{}</table>\
         <p>CareHub</p></body></html>",
        escape_html(name),
        lead,
        rows
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// What happened to a notification; reported back to API callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotificationOutcome {
    pub fn sent(message_id: String) -> Self {
        Self {
            success: true,
            email_sent: Some(true),
            message_id: Some(message_id),
            error: None,
        }
    }

    /// Email is switched off; nothing was attempted
    pub fn disabled() -> Self {
        Self {
            success: true,
            email_sent: Some(false),
            message_id: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            email_sent: None,
            message_id: None,
            error: Some(error.into()),
        }
    }
}
