use auth_identity::{IdentityService, Role, User};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use database_layer::{Collection, Document, DocumentStore, Filter, FindOptions};
use hospital_directory::HospitalService;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppointmentError, AppointmentResult};
use crate::models::*;

pub const MIN_DURATION_MINUTES: u32 = 15;
pub const MAX_DURATION_MINUTES: u32 = 120;
pub const DEFAULT_DURATION_MINUTES: u32 = 30;
const MAX_APPOINTMENT_SEQUENCE: u64 = 999_999;

/// Booking, scoping and lifecycle rules for appointments
pub struct AppointmentService {
    appointments: Collection<Appointment>,
    identity: Arc<IdentityService>,
    hospitals: HospitalService,
    reservation_fee: Decimal,
}

impl AppointmentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<IdentityService>,
        hospitals: HospitalService,
        reservation_fee: Decimal,
    ) -> Self {
        Self {
            appointments: Collection::new(store),
            identity,
            hospitals,
            reservation_fee,
        }
    }

    /// Book an appointment for a patient
    ///
    /// Patients always book for themselves. Staff must name an existing
    /// patient. The doctor and hospital must both be active.
    pub async fn create(&self, actor: &User, request: NewAppointment) -> AppointmentResult<Appointment> {
        let patient_id = match actor.role() {
            Role::Patient => actor.id,
            Role::HospitalStaff => {
                let patient_id = request
                    .patient_id
                    .ok_or_else(|| AppointmentError::validation("patientId", "patient is required"))?;
                self.identity
                    .find_active_with_role(patient_id, Role::Patient)
                    .await?
                    .ok_or(AppointmentError::PatientNotFound)?;
                patient_id
            }
            _ => return Err(AppointmentError::AccessDenied),
        };

        let doctor = self
            .identity
            .find_active_with_role(request.doctor_id, Role::HealthcareProfessional)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;
        self.hospitals
            .find_active(request.hospital_id)
            .await?
            .ok_or(AppointmentError::HospitalNotFound)?;

        let time = normalize_time(&request.time)?;
        let duration = validate_duration(request.duration.unwrap_or(DEFAULT_DURATION_MINUTES))?;
        let consultation_fee = doctor.professional().map(|p| p.consultation_fee);

        let sequence = self.appointments.next_sequence(Appointment::COLLECTION).await?;
        let appointment_id = appointment_number(sequence)?;
        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            appointment_id,
            patient_id,
            doctor_id: doctor.id,
            hospital_id: request.hospital_id,
            date: request.date,
            time,
            duration,
            status: AppointmentStatus::Scheduled,
            appointment_type: request.appointment_type,
            priority: request.priority,
            notes: request.notes,
            symptoms: request.symptoms,
            reservation_fee: FeeRecord::unpaid(Some(self.reservation_fee)),
            consultation_fee: FeeRecord::unpaid(consultation_fee),
            reminder_sent: false,
            reminder_sent_at: None,
            cancellation: None,
            follow_up: None,
            created_at: now,
            updated_at: now,
        };

        self.appointments.insert(&appointment).await?;
        info!(
            appointment_id = %appointment.appointment_id,
            booked_by = %actor.id,
            "Appointment scheduled"
        );
        Ok(appointment)
    }

    /// Role-scoped listing sorted by date then time
    pub async fn list(
        &self,
        actor: &User,
        query: &AppointmentQuery,
        page: u32,
        page_size: u32,
    ) -> AppointmentResult<(Vec<Appointment>, u64)> {
        let filter = scope_filter(actor)
            .eq_opt("status", query.status)
            .gte_opt("date", query.date_from)
            .lte_opt("date", query.date_to);

        let total = self.appointments.count(&filter).await?;
        let appointments = self
            .appointments
            .find(
                &filter,
                &FindOptions::new()
                    .sort_asc("date")
                    .sort_asc("time")
                    .page(page, page_size),
            )
            .await?;
        Ok((appointments, total))
    }

    /// Fetch without any caller scoping
    pub async fn find(&self, id: Uuid) -> AppointmentResult<Option<Appointment>> {
        Ok(self.appointments.get(&id.to_string()).await?)
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> AppointmentResult<Appointment> {
        let appointment = self.load(id).await?;
        if !can_view(actor, &appointment) {
            return Err(AppointmentError::AccessDenied);
        }
        Ok(appointment)
    }

    /// Clinical and scheduling updates by the assigned doctor or staff
    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        update: UpdateAppointment,
    ) -> AppointmentResult<Appointment> {
        let mut appointment = self.load(id).await?;
        match actor.role() {
            Role::HealthcareProfessional if appointment.doctor_id == actor.id => {}
            Role::HospitalStaff => {}
            _ => return Err(AppointmentError::AccessDenied),
        }

        if let Some(status) = update.status {
            if status == AppointmentStatus::Cancelled {
                return Err(AppointmentError::CancelThroughUpdate);
            }
            if status != appointment.status {
                if appointment.status.is_terminal() {
                    return Err(AppointmentError::TerminalStatus(appointment.status));
                }
                appointment.status = status;
            }
        }
        if let Some(notes) = update.notes {
            appointment.notes = Some(notes);
        }
        if let Some(follow_up) = update.follow_up {
            appointment.follow_up = Some(follow_up);
        }
        if let Some(symptoms) = update.symptoms {
            appointment.symptoms = symptoms;
        }
        if let Some(date) = update.date {
            appointment.date = date;
        }
        if let Some(time) = update.time {
            appointment.time = normalize_time(&time)?;
        }
        if let Some(duration) = update.duration {
            appointment.duration = validate_duration(duration)?;
        }

        appointment.updated_at = Utc::now();
        self.appointments.replace(&appointment).await?;
        info!(
            appointment_id = %appointment.appointment_id,
            status = %appointment.status,
            "Appointment updated"
        );
        Ok(appointment)
    }

    /// Cancel with a reason, recording any collected fees as pending refund
    pub async fn cancel(
        &self,
        actor: &User,
        id: Uuid,
        request: CancelAppointment,
    ) -> AppointmentResult<Appointment> {
        let reason = request
            .cancellation_reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                AppointmentError::validation("cancellationReason", "cancellation reason is required")
            })?;

        let mut appointment = self.load(id).await?;
        match actor.role() {
            Role::Patient if appointment.patient_id == actor.id => {}
            Role::HospitalStaff => {}
            _ => return Err(AppointmentError::AccessDenied),
        }

        match appointment.status {
            AppointmentStatus::Completed => return Err(AppointmentError::AlreadyCompleted),
            AppointmentStatus::Cancelled => return Err(AppointmentError::AlreadyCancelled),
            _ => {}
        }

        let refund_amount =
            appointment.reservation_fee.paid_amount() + appointment.consultation_fee.paid_amount();
        let now = Utc::now();
        appointment.status = AppointmentStatus::Cancelled;
        appointment.cancellation = Some(Cancellation {
            cancelled_by: actor.id,
            reason,
            cancelled_at: now,
            refund_amount: Some(refund_amount),
            refund_status: if refund_amount > Decimal::ZERO {
                RefundStatus::Pending
            } else {
                RefundStatus::NotApplicable
            },
        });
        appointment.updated_at = now;

        self.appointments.replace(&appointment).await?;
        info!(
            appointment_id = %appointment.appointment_id,
            cancelled_by = %actor.id,
            %refund_amount,
            "Appointment cancelled"
        );
        Ok(appointment)
    }

    /// Mark one fee as paid. Only the billing side calls this.
    pub async fn apply_fee_payment(
        &self,
        id: Uuid,
        kind: FeeKind,
        payment_method: &str,
        paid_at: DateTime<Utc>,
    ) -> AppointmentResult<Appointment> {
        let mut appointment = self.load(id).await?;
        let fee = appointment.fee_mut(kind);
        fee.paid = true;
        fee.payment_date = Some(paid_at);
        fee.payment_method = Some(payment_method.to_string());
        appointment.updated_at = Utc::now();

        self.appointments.replace(&appointment).await?;
        info!(
            appointment_id = %appointment.appointment_id,
            fee = ?kind,
            "Appointment fee marked paid"
        );
        Ok(appointment)
    }

    /// Open appointments on `day` that have not been reminded yet
    pub async fn due_for_reminder(&self, day: NaiveDate) -> AppointmentResult<Vec<Appointment>> {
        let filter = Filter::new()
            .eq("date", day)
            .is_in(
                "status",
                [AppointmentStatus::Scheduled, AppointmentStatus::Confirmed],
            )
            .eq("reminderSent", false);

        Ok(self
            .appointments
            .find(&filter, &FindOptions::new().sort_asc("time"))
            .await?)
    }

    pub async fn mark_reminder_sent(&self, id: Uuid, at: DateTime<Utc>) -> AppointmentResult<()> {
        let mut appointment = self.load(id).await?;
        appointment.reminder_sent = true;
        appointment.reminder_sent_at = Some(at);
        appointment.updated_at = at;
        self.appointments.replace(&appointment).await?;
        Ok(())
    }

    async fn load(&self, id: Uuid) -> AppointmentResult<Appointment> {
        self.find(id).await?.ok_or(AppointmentError::AppointmentNotFound)
    }
}

fn scope_filter(actor: &User) -> Filter {
    match actor.role() {
        Role::Patient => Filter::new().eq("patientId", actor.id),
        Role::HealthcareProfessional => Filter::new().eq("doctorId", actor.id),
        Role::HospitalStaff | Role::HealthcareManager => Filter::new(),
    }
}

pub fn can_view(actor: &User, appointment: &Appointment) -> bool {
    match actor.role() {
        Role::Patient => appointment.patient_id == actor.id,
        Role::HealthcareProfessional => appointment.doctor_id == actor.id,
        Role::HospitalStaff | Role::HealthcareManager => true,
    }
}

/// `APT` + six digits; the counter must not outgrow the format
fn appointment_number(sequence: u64) -> AppointmentResult<String> {
    if sequence > MAX_APPOINTMENT_SEQUENCE {
        return Err(AppointmentError::NumbersExhausted(sequence));
    }
    Ok(format!("APT{sequence:06}"))
}

/// Canonical `HH:MM`
fn normalize_time(raw: &str) -> AppointmentResult<String> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map(|t| t.format("%H:%M").to_string())
        .map_err(|_| AppointmentError::validation("time", "time must be in HH:MM format"))
}

fn validate_duration(minutes: u32) -> AppointmentResult<u32> {
    if (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(AppointmentError::validation(
            "duration",
            format!("duration must be between {MIN_DURATION_MINUTES} and {MAX_DURATION_MINUTES} minutes"),
        ))
    }
}
