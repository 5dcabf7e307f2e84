use chrono::{DateTime, NaiveDate, Utc};
use database_layer::Document;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// No further status changes once reached
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Completed | AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentType {
    #[default]
    Regular,
    Urgent,
    FollowUp,
    Consultation,
    Procedure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Emergency,
}

/// Which of the two fee sub-records a payment settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeKind {
    Reservation,
    Consultation,
}

impl FeeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeeKind::Reservation => "reservation",
            FeeKind::Consultation => "consultation",
        }
    }
}

impl fmt::Display for FeeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub paid: bool,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
}

impl FeeRecord {
    pub fn unpaid(amount: Option<Decimal>) -> Self {
        Self {
            amount,
            ..Self::default()
        }
    }

    /// Amount already collected on this fee, zero when unpaid
    pub fn paid_amount(&self) -> Decimal {
        if self.paid {
            self.amount.unwrap_or_default()
        } else {
            Decimal::ZERO
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    NotApplicable,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    pub cancelled_by: Uuid,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
    pub refund_amount: Option<Decimal>,
    pub refund_status: RefundStatus,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUp {
    #[serde(default)]
    pub required: bool,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: Uuid,
    #[serde(rename = "appointmentID")]
    pub appointment_id: String,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub duration: u32,
    pub status: AppointmentStatus,
    #[serde(rename = "type")]
    pub appointment_type: AppointmentType,
    pub priority: Priority,
    pub notes: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
    pub reservation_fee: FeeRecord,
    pub consultation_fee: FeeRecord,
    #[serde(default)]
    pub reminder_sent: bool,
    pub reminder_sent_at: Option<DateTime<Utc>>,
    pub cancellation: Option<Cancellation>,
    pub follow_up: Option<FollowUp>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Appointment {
    const COLLECTION: &'static str = "appointments";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl Appointment {
    pub fn fee(&self, kind: FeeKind) -> &FeeRecord {
        match kind {
            FeeKind::Reservation => &self.reservation_fee,
            FeeKind::Consultation => &self.consultation_fee,
        }
    }

    pub fn fee_mut(&mut self, kind: FeeKind) -> &mut FeeRecord {
        match kind {
            FeeKind::Reservation => &mut self.reservation_fee,
            FeeKind::Consultation => &mut self.consultation_fee,
        }
    }
}

/// Booking request
///
/// `patientId` is ignored when a patient books for themself and required
/// when staff book on a patient's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub date: NaiveDate,
    pub time: String,
    pub duration: Option<u32>,
    #[serde(rename = "type", default)]
    pub appointment_type: AppointmentType,
    #[serde(default)]
    pub priority: Priority,
    pub notes: Option<String>,
    #[serde(default)]
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointment {
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub follow_up: Option<FollowUp>,
    pub symptoms: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub duration: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelAppointment {
    pub cancellation_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentQuery {
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_terminal_states() {
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::NoShow.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let parsed: Result<UpdateAppointment, _> =
            serde_json::from_value(json!({"status": "teleported"}));
        assert!(parsed.is_err());

        let parsed: UpdateAppointment =
            serde_json::from_value(json!({"status": "in_progress"})).unwrap();
        assert_eq!(parsed.status, Some(AppointmentStatus::InProgress));
    }

    #[test]
    fn test_paid_amount_counts_only_paid_fees() {
        let mut fee = FeeRecord::unpaid(Some(Decimal::new(5000, 2)));
        assert_eq!(fee.paid_amount(), Decimal::ZERO);
        fee.paid = true;
        assert_eq!(fee.paid_amount(), Decimal::new(5000, 2));
        assert_eq!(FeeRecord { paid: true, ..FeeRecord::default() }.paid_amount(), Decimal::ZERO);
    }
}
