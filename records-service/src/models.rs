use chrono::{DateTime, Utc};
use database_layer::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{RecordError, RecordResult};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u32>,
    pub temperature: Option<f64>,
    pub respiratory_rate: Option<u32>,
    pub oxygen_saturation: Option<f64>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalExamination {
    #[serde(default)]
    pub vitals: Vitals,
    /// Body system to free-text finding
    #[serde(default)]
    pub findings: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisType {
    #[default]
    Primary,
    Secondary,
    Differential,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnosis {
    pub description: String,
    pub code: Option<String>,
    #[serde(rename = "type", default)]
    pub diagnosis_type: DiagnosisType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreatmentPlan {
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub procedures: Vec<String>,
    pub follow_up: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabResult {
    pub test_name: String,
    pub result: String,
    pub normal_range: Option<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagingReport {
    #[serde(rename = "type")]
    pub imaging_type: String,
    pub findings: String,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressNote {
    pub note: String,
    pub author: Uuid,
    pub date: DateTime<Utc>,
}

/// Attachment metadata; file contents are stored elsewhere
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub file_name: String,
    pub file_type: String,
    pub size: u64,
    pub url: String,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessAction {
    Viewed,
    Edited,
    Created,
    Deleted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessLogEntry {
    pub accessed_by: Uuid,
    pub action: AccessAction,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    #[serde(rename = "recordID")]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    pub hospital_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub visit_date: DateTime<Utc>,
    pub chief_complaint: String,
    pub history_of_present_illness: Option<String>,
    pub physical_examination: PhysicalExamination,
    pub diagnosis: Vec<Diagnosis>,
    pub treatment_plan: TreatmentPlan,
    pub lab_results: Vec<LabResult>,
    pub imaging_reports: Vec<ImagingReport>,
    pub progress_notes: Vec<ProgressNote>,
    pub attachments: Vec<Attachment>,
    pub access_log: Vec<AccessLogEntry>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for MedicalRecord {
    const COLLECTION: &'static str = "medical_records";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl MedicalRecord {
    pub fn log_access(&mut self, accessed_by: Uuid, action: AccessAction, at: DateTime<Utc>) {
        self.access_log.push(AccessLogEntry {
            accessed_by,
            action,
            timestamp: at,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedicalRecord {
    pub patient_id: Uuid,
    pub hospital_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub visit_date: Option<DateTime<Utc>>,
    pub chief_complaint: String,
    pub history_of_present_illness: Option<String>,
    #[serde(default)]
    pub physical_examination: PhysicalExamination,
    #[serde(default)]
    pub diagnosis: Vec<Diagnosis>,
    #[serde(default)]
    pub treatment_plan: TreatmentPlan,
    #[serde(default)]
    pub lab_results: Vec<LabResult>,
    #[serde(default)]
    pub imaging_reports: Vec<ImagingReport>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMedicalRecord {
    pub chief_complaint: Option<String>,
    pub history_of_present_illness: Option<String>,
    pub physical_examination: Option<PhysicalExamination>,
    pub diagnosis: Option<Vec<Diagnosis>>,
    pub treatment_plan: Option<TreatmentPlan>,
    pub lab_results: Option<Vec<LabResult>>,
    pub imaging_reports: Option<Vec<ImagingReport>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgressNote {
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAttachment {
    pub file_name: String,
    pub file_type: String,
    pub size: u64,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordQuery {
    pub patient_id: Option<Uuid>,
}

pub(crate) fn required_text(field: &str, value: &str) -> RecordResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordError::validation(field, format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_diagnoses(diagnoses: &[Diagnosis]) -> RecordResult<()> {
    if diagnoses.iter().any(|d| d.description.trim().is_empty()) {
        return Err(RecordError::validation(
            "diagnosis",
            "every diagnosis needs a description",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_record_defaults() {
        let record: NewMedicalRecord = serde_json::from_value(json!({
            "patientId": Uuid::new_v4(),
            "hospitalId": Uuid::new_v4(),
            "chiefComplaint": "Chest pain",
            "diagnosis": [{"description": "Angina", "code": "I20.9"}],
            "physicalExamination": {
                "vitals": {"bloodPressure": "140/90", "heartRate": 88},
                "findings": {"cardiovascular": "regular rhythm"}
            }
        }))
        .unwrap();

        assert_eq!(record.diagnosis[0].diagnosis_type, DiagnosisType::Primary);
        assert_eq!(record.physical_examination.vitals.heart_rate, Some(88));
        assert!(record.treatment_plan.medications.is_empty());
        assert!(record.visit_date.is_none());
    }

    #[test]
    fn test_blank_diagnosis_is_rejected() {
        let diagnoses = vec![Diagnosis {
            description: "  ".to_string(),
            code: None,
            diagnosis_type: DiagnosisType::Differential,
        }];
        assert!(validate_diagnoses(&diagnoses).is_err());
        assert!(required_text("chiefComplaint", "\t").is_err());
        assert_eq!(required_text("chiefComplaint", " cough ").unwrap(), "cough");
    }

    #[test]
    fn test_access_action_wire_names() {
        assert_eq!(serde_json::to_value(AccessAction::Viewed).unwrap(), json!("viewed"));
        let entry: AccessLogEntry = serde_json::from_value(json!({
            "accessedBy": Uuid::nil(),
            "action": "deleted",
            "timestamp": "2026-10-16T08:00:00Z"
        }))
        .unwrap();
        assert_eq!(entry.action, AccessAction::Deleted);
    }
}
