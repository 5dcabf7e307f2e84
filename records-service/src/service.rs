use appointment_service::AppointmentService;
use auth_identity::{IdentityService, Role, User};
use chrono::Utc;
use database_layer::{Collection, DocumentStore, Filter, FindOptions};
use hospital_directory::HospitalService;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{RecordError, RecordResult};
use crate::models::*;

/// Medical records with a per-document access log
///
/// Every operation that touches a single record appends exactly one
/// [`AccessLogEntry`] to it. Listing does not.
pub struct RecordService {
    records: Collection<MedicalRecord>,
    identity: Arc<IdentityService>,
    hospitals: HospitalService,
    appointments: Arc<AppointmentService>,
}

impl RecordService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<IdentityService>,
        hospitals: HospitalService,
        appointments: Arc<AppointmentService>,
    ) -> Self {
        Self {
            records: Collection::new(store),
            identity,
            hospitals,
            appointments,
        }
    }

    /// Open a record; the calling professional becomes its author
    pub async fn create(&self, actor: &User, request: NewMedicalRecord) -> RecordResult<MedicalRecord> {
        if actor.role() != Role::HealthcareProfessional {
            return Err(RecordError::AccessDenied);
        }

        let chief_complaint = required_text("chiefComplaint", &request.chief_complaint)?;
        validate_diagnoses(&request.diagnosis)?;

        self.identity
            .find_active_with_role(request.patient_id, Role::Patient)
            .await?
            .ok_or(RecordError::PatientNotFound)?;
        self.hospitals
            .find_active(request.hospital_id)
            .await?
            .ok_or(RecordError::HospitalNotFound)?;
        if let Some(appointment_id) = request.appointment_id {
            let appointment = self
                .appointments
                .find(appointment_id)
                .await?
                .ok_or(RecordError::AppointmentNotFound)?;
            if appointment.patient_id != request.patient_id {
                return Err(RecordError::validation(
                    "appointmentId",
                    "appointment belongs to a different patient",
                ));
            }
        }

        let now = Utc::now();
        let mut record = MedicalRecord {
            id: Uuid::new_v4(),
            patient_id: request.patient_id,
            doctor_id: actor.id,
            hospital_id: request.hospital_id,
            appointment_id: request.appointment_id,
            visit_date: request.visit_date.unwrap_or(now),
            chief_complaint,
            history_of_present_illness: request.history_of_present_illness,
            physical_examination: request.physical_examination,
            diagnosis: request.diagnosis,
            treatment_plan: request.treatment_plan,
            lab_results: request.lab_results,
            imaging_reports: request.imaging_reports,
            progress_notes: Vec::new(),
            attachments: Vec::new(),
            access_log: Vec::new(),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        record.log_access(actor.id, AccessAction::Created, now);

        self.records.insert(&record).await?;
        info!(record_id = %record.id, doctor_id = %actor.id, "Medical record created");
        Ok(record)
    }

    /// Active records visible to `actor`, newest visit first
    pub async fn list(
        &self,
        actor: &User,
        query: &RecordQuery,
        page: u32,
        page_size: u32,
    ) -> RecordResult<(Vec<MedicalRecord>, u64)> {
        let scope = match actor.role() {
            Role::Patient => Filter::new().eq("patientId", actor.id),
            Role::HealthcareProfessional => Filter::new().eq("doctorId", actor.id),
            Role::HealthcareManager => Filter::new(),
            Role::HospitalStaff => return Err(RecordError::AccessDenied),
        };
        let filter = scope
            .eq("isActive", true)
            .eq_opt("patientId", query.patient_id);

        let total = self.records.count(&filter).await?;
        let records = self
            .records
            .find(
                &filter,
                &FindOptions::new().sort_desc("visitDate").page(page, page_size),
            )
            .await?;
        Ok((records, total))
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> RecordResult<MedicalRecord> {
        let mut record = self.load(id).await?;
        if !can_view(actor, &record) {
            return Err(RecordError::AccessDenied);
        }
        record.log_access(actor.id, AccessAction::Viewed, Utc::now());
        self.records.replace(&record).await?;
        Ok(record)
    }

    /// Clinical edits by the authoring doctor or the owning patient
    pub async fn update(
        &self,
        actor: &User,
        id: Uuid,
        update: UpdateMedicalRecord,
    ) -> RecordResult<MedicalRecord> {
        let mut record = self.load(id).await?;
        if !is_author(actor, &record) && !is_owner(actor, &record) {
            return Err(RecordError::AccessDenied);
        }

        if let Some(ref complaint) = update.chief_complaint {
            record.chief_complaint = required_text("chiefComplaint", complaint)?;
        }
        if let Some(history) = update.history_of_present_illness {
            record.history_of_present_illness = Some(history);
        }
        if let Some(examination) = update.physical_examination {
            record.physical_examination = examination;
        }
        if let Some(diagnosis) = update.diagnosis {
            validate_diagnoses(&diagnosis)?;
            record.diagnosis = diagnosis;
        }
        if let Some(plan) = update.treatment_plan {
            record.treatment_plan = plan;
        }
        if let Some(labs) = update.lab_results {
            record.lab_results = labs;
        }
        if let Some(imaging) = update.imaging_reports {
            record.imaging_reports = imaging;
        }

        self.save_edit(actor, record, AccessAction::Edited).await
    }

    pub async fn add_note(
        &self,
        actor: &User,
        id: Uuid,
        request: NewProgressNote,
    ) -> RecordResult<MedicalRecord> {
        let mut record = self.load(id).await?;
        if !is_author(actor, &record) {
            return Err(RecordError::AccessDenied);
        }
        let note = required_text("note", &request.note)?;
        record.progress_notes.push(ProgressNote {
            note,
            author: actor.id,
            date: Utc::now(),
        });
        self.save_edit(actor, record, AccessAction::Edited).await
    }

    pub async fn add_attachment(
        &self,
        actor: &User,
        id: Uuid,
        request: NewAttachment,
    ) -> RecordResult<MedicalRecord> {
        let mut record = self.load(id).await?;
        if !is_author(actor, &record) && !is_owner(actor, &record) {
            return Err(RecordError::AccessDenied);
        }
        let file_name = required_text("fileName", &request.file_name)?;
        let url = required_text("url", &request.url)?;
        record.attachments.push(Attachment {
            file_name,
            file_type: request.file_type,
            size: request.size,
            url,
            uploaded_by: actor.id,
            uploaded_at: Utc::now(),
        });
        self.save_edit(actor, record, AccessAction::Edited).await
    }

    /// Soft delete by the authoring doctor or a manager
    pub async fn delete(&self, actor: &User, id: Uuid) -> RecordResult<MedicalRecord> {
        let mut record = self.load(id).await?;
        if !is_author(actor, &record) && actor.role() != Role::HealthcareManager {
            return Err(RecordError::AccessDenied);
        }
        record.is_active = false;
        let record = self.save_edit(actor, record, AccessAction::Deleted).await?;
        info!(record_id = %record.id, deleted_by = %actor.id, "Medical record deactivated");
        Ok(record)
    }

    async fn save_edit(
        &self,
        actor: &User,
        mut record: MedicalRecord,
        action: AccessAction,
    ) -> RecordResult<MedicalRecord> {
        let now = Utc::now();
        record.updated_at = now;
        record.log_access(actor.id, action, now);
        self.records.replace(&record).await?;
        Ok(record)
    }

    /// Inactive records are treated as absent
    async fn load(&self, id: Uuid) -> RecordResult<MedicalRecord> {
        self.records
            .get(&id.to_string())
            .await?
            .filter(|record| record.is_active)
            .ok_or(RecordError::RecordNotFound)
    }
}

fn is_author(actor: &User, record: &MedicalRecord) -> bool {
    actor.role() == Role::HealthcareProfessional && record.doctor_id == actor.id
}

fn is_owner(actor: &User, record: &MedicalRecord) -> bool {
    actor.role() == Role::Patient && record.patient_id == actor.id
}

pub fn can_view(actor: &User, record: &MedicalRecord) -> bool {
    match actor.role() {
        Role::Patient => record.patient_id == actor.id,
        Role::HealthcareProfessional => record.doctor_id == actor.id,
        Role::HealthcareManager => true,
        Role::HospitalStaff => false,
    }
}
