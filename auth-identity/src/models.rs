use chrono::{DateTime, NaiveDate, Utc};
use database_layer::Document;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{IdentityError, Result};

/// Role tag carried by every user document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    HealthcareProfessional,
    HospitalStaff,
    HealthcareManager,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::Patient,
        Role::HealthcareProfessional,
        Role::HospitalStaff,
        Role::HealthcareManager,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::HealthcareProfessional => "healthcare_professional",
            Role::HospitalStaff => "hospital_staff",
            Role::HealthcareManager => "healthcare_manager",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    /// Exact, case-sensitive match on the wire name
    fn from_str(s: &str) -> Result<Self> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| IdentityError::validation("role", format!("unknown role '{s}'")))
    }
}

/// Deny-by-default role allowlist check
pub fn is_role_allowed(role: Option<Role>, allowed: &[Role]) -> bool {
    role.is_some_and(|role| allowed.contains(&role))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingHours {
    pub start: String,
    pub end: String,
    #[serde(default = "default_true")]
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Specialization {
    GeneralPractice,
    Cardiology,
    Dermatology,
    Neurology,
    Orthopedics,
    Pediatrics,
    Psychiatry,
    Radiology,
    Surgery,
    Oncology,
    Gynecology,
    Ophthalmology,
    Ent,
    EmergencyMedicine,
    InternalMedicine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Receptionist,
    Nurse,
    Pharmacist,
    LabTechnician,
    RadiologistTechnician,
    Administrator,
    Accountant,
    ItSupport,
    Security,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shift {
    Morning,
    Afternoon,
    Night,
    Rotating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffPermission {
    ManageAppointments,
    ManagePayments,
    ViewRecords,
    ManageInventory,
    ManageStaff,
    ViewReports,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    Department,
    #[default]
    Hospital,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyContact {
    pub name: String,
    pub relationship: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInsurance {
    pub provider: String,
    pub policy_number: String,
    pub group_number: Option<String>,
    pub valid_until: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientProfile {
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    pub emergency_contact: EmergencyContact,
    pub blood_type: BloodType,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub insurance: Option<PatientInsurance>,
    pub preferred_language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfessionalProfile {
    pub specialization: Specialization,
    pub license_number: String,
    pub department: Option<String>,
    #[serde(default)]
    pub years_of_experience: u8,
    #[serde(default)]
    pub consultation_fee: Decimal,
    #[serde(default)]
    pub working_hours: BTreeMap<Weekday, WorkingHours>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    pub bio: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffProfile {
    pub staff_role: StaffRole,
    pub department: Option<String>,
    pub employee_id: String,
    pub hire_date: Option<NaiveDate>,
    pub salary: Option<Decimal>,
    pub shift: Option<Shift>,
    #[serde(default)]
    pub permissions: Vec<StaffPermission>,
    #[serde(default)]
    pub working_hours: BTreeMap<Weekday, WorkingHours>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerProfile {
    pub department: Option<String>,
    #[serde(default)]
    pub managed_departments: Vec<String>,
    #[serde(default)]
    pub access_level: AccessLevel,
}

/// Role-specific payload, selected by the `role` tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum RoleProfile {
    Patient(PatientProfile),
    HealthcareProfessional(ProfessionalProfile),
    HospitalStaff(StaffProfile),
    HealthcareManager(ManagerProfile),
}

impl RoleProfile {
    pub fn role(&self) -> Role {
        match self {
            RoleProfile::Patient(_) => Role::Patient,
            RoleProfile::HealthcareProfessional(_) => Role::HealthcareProfessional,
            RoleProfile::HospitalStaff(_) => Role::HospitalStaff,
            RoleProfile::HealthcareManager(_) => Role::HealthcareManager,
        }
    }

    /// Role-specific field rules
    pub fn validate(&self) -> Result<()> {
        match self {
            RoleProfile::Patient(p) => {
                if p.emergency_contact.name.trim().is_empty()
                    || p.emergency_contact.phone.trim().is_empty()
                {
                    return Err(IdentityError::validation(
                        "emergencyContact",
                        "emergency contact name and phone are required",
                    ));
                }
                if let Some(h) = p.height_cm {
                    if !(50.0..=250.0).contains(&h) {
                        return Err(IdentityError::validation("heightCm", "must be between 50 and 250"));
                    }
                }
                if let Some(w) = p.weight_kg {
                    if !(2.0..=500.0).contains(&w) {
                        return Err(IdentityError::validation("weightKg", "must be between 2 and 500"));
                    }
                }
            }
            RoleProfile::HealthcareProfessional(p) => {
                if p.license_number.trim().is_empty() {
                    return Err(IdentityError::validation("licenseNumber", "license number is required"));
                }
                if p.years_of_experience > 50 {
                    return Err(IdentityError::validation(
                        "yearsOfExperience",
                        "must be between 0 and 50",
                    ));
                }
                if p.consultation_fee < Decimal::ZERO {
                    return Err(IdentityError::validation("consultationFee", "must not be negative"));
                }
            }
            RoleProfile::HospitalStaff(s) => {
                if s.employee_id.trim().is_empty() {
                    return Err(IdentityError::validation("employeeId", "employee ID is required"));
                }
                if s.salary.is_some_and(|salary| salary < Decimal::ZERO) {
                    return Err(IdentityError::validation("salary", "must not be negative"));
                }
            }
            RoleProfile::HealthcareManager(_) => {}
        }
        Ok(())
    }
}

/// Stored user document. Never serialize this to clients, use [`PublicUser`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password_hash: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }

    pub fn professional(&self) -> Option<&ProfessionalProfile> {
        match &self.profile {
            RoleProfile::HealthcareProfessional(p) => Some(p),
            _ => None,
        }
    }
}

/// Client-facing view of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            phone: user.phone,
            date_of_birth: user.date_of_birth,
            address: user.address,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
            last_login: user.last_login,
            profile: user.profile,
        }
    }
}

/// Payload for self-registration and manager-created accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub username: Option<String>,
    pub password: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
    #[serde(flatten)]
    pub profile: RoleProfile,
}

/// Partial update of a user
///
/// `profile` is merged key by key into the existing role payload, so
/// `{"profile": {"isAvailable": false}}` only flips availability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<Address>,
    pub role: Option<Role>,
    pub profile: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// Listing filters for the user directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub specialization: Option<Specialization>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_parse_is_case_sensitive() {
        assert_eq!("patient".parse::<Role>().unwrap(), Role::Patient);
        assert_eq!(
            "healthcare_manager".parse::<Role>().unwrap(),
            Role::HealthcareManager
        );
        assert!("Patient".parse::<Role>().is_err());
        assert!("PATIENT".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_allowlist_denies_by_default() {
        assert!(is_role_allowed(Some(Role::HospitalStaff), &[Role::Patient, Role::HospitalStaff]));
        assert!(!is_role_allowed(Some(Role::Patient), &[Role::HospitalStaff]));
        assert!(!is_role_allowed(None, &Role::ALL));
        assert!(!is_role_allowed(Some(Role::Patient), &[]));
    }

    #[test]
    fn test_new_user_deserializes_tagged_profile() {
        let payload = json!({
            "name": "Dr. Grey",
            "email": "grey@hospital.test",
            "password": "Secret123",
            "role": "healthcare_professional",
            "specialization": "cardiology",
            "licenseNumber": "LIC-001",
            "consultationFee": 120.5,
            "workingHours": {"monday": {"start": "09:00", "end": "17:00"}}
        });

        let user: NewUser = serde_json::from_value(payload).unwrap();
        assert_eq!(user.profile.role(), Role::HealthcareProfessional);
        match user.profile {
            RoleProfile::HealthcareProfessional(p) => {
                assert_eq!(p.license_number, "LIC-001");
                assert!(p.is_available);
                assert_eq!(p.consultation_fee, Decimal::new(1205, 1));
                assert!(p.working_hours.contains_key(&Weekday::Monday));
            }
            other => panic!("unexpected profile {other:?}"),
        }
    }

    #[test]
    fn test_patient_requires_blood_type_and_contact() {
        let payload = json!({
            "name": "Pat",
            "email": "pat@example.com",
            "password": "Secret123",
            "role": "patient"
        });
        assert!(serde_json::from_value::<NewUser>(payload).is_err());
    }

    #[test]
    fn test_profile_validation_bounds() {
        let profile = RoleProfile::HealthcareProfessional(ProfessionalProfile {
            specialization: Specialization::Cardiology,
            license_number: "L1".into(),
            department: None,
            years_of_experience: 51,
            consultation_fee: Decimal::ZERO,
            working_hours: BTreeMap::new(),
            is_available: true,
            bio: None,
            languages: vec![],
        });
        assert!(matches!(
            profile.validate(),
            Err(IdentityError::Validation { ref field, .. }) if field == "yearsOfExperience"
        ));
    }

    #[test]
    fn test_blood_type_wire_names() {
        let bt: BloodType = serde_json::from_value(json!("AB-")).unwrap();
        assert_eq!(bt, BloodType::AbNegative);
        assert_eq!(serde_json::to_value(BloodType::OPositive).unwrap(), json!("O+"));
    }
}
