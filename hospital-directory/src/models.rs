use auth_identity::{Address, Specialization, Weekday};
use chrono::{DateTime, Utc};
use database_layer::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{DirectoryError, DirectoryResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HospitalType {
    Public,
    Private,
    Teaching,
    Specialty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facility {
    EmergencyRoom,
    Icu,
    OperatingTheater,
    Laboratory,
    Radiology,
    Pharmacy,
    BloodBank,
    Dialysis,
    Physiotherapy,
    Maternity,
    PediatricWard,
    Cafeteria,
    Parking,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedCapacity {
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub occupied: i64,
    #[serde(default)]
    pub icu: i64,
    #[serde(default)]
    pub emergency: i64,
}

impl BedCapacity {
    pub fn validate(&self) -> DirectoryResult<()> {
        for (field, value) in [
            ("bedCapacity.total", self.total),
            ("bedCapacity.occupied", self.occupied),
            ("bedCapacity.icu", self.icu),
            ("bedCapacity.emergency", self.emergency),
        ] {
            if value < 0 {
                return Err(DirectoryError::validation(field, "must not be negative"));
            }
        }
        if self.occupied > self.total {
            return Err(DirectoryError::validation(
                "bedCapacity.occupied",
                "occupied beds cannot exceed total beds",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalContact {
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatingHours {
    pub open: String,
    pub close: String,
    #[serde(default)]
    pub is24_hours: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hospital {
    pub id: Uuid,
    pub hospital_id: String,
    pub name: String,
    pub address: Address,
    #[serde(rename = "type")]
    pub hospital_type: HospitalType,
    pub bed_capacity: BedCapacity,
    pub contact: HospitalContact,
    pub facilities: Vec<Facility>,
    pub specializations: Vec<Specialization>,
    pub operating_hours: BTreeMap<Weekday, OperatingHours>,
    pub emergency_services: bool,
    pub accreditations: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Hospital {
    const COLLECTION: &'static str = "hospitals";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHospital {
    pub name: String,
    #[serde(default)]
    pub address: Address,
    #[serde(rename = "type")]
    pub hospital_type: HospitalType,
    #[serde(default)]
    pub bed_capacity: BedCapacity,
    #[serde(default)]
    pub contact: HospitalContact,
    #[serde(default)]
    pub facilities: Vec<Facility>,
    #[serde(default)]
    pub specializations: Vec<Specialization>,
    #[serde(default)]
    pub operating_hours: BTreeMap<Weekday, OperatingHours>,
    #[serde(default)]
    pub emergency_services: bool,
    #[serde(default)]
    pub accreditations: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHospital {
    pub name: Option<String>,
    pub address: Option<Address>,
    #[serde(rename = "type")]
    pub hospital_type: Option<HospitalType>,
    pub bed_capacity: Option<BedCapacity>,
    pub contact: Option<HospitalContact>,
    pub facilities: Option<Vec<Facility>>,
    pub specializations: Option<Vec<Specialization>>,
    pub operating_hours: Option<BTreeMap<Weekday, OperatingHours>>,
    pub emergency_services: Option<bool>,
    pub accreditations: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HospitalQuery {
    #[serde(rename = "type")]
    pub hospital_type: Option<HospitalType>,
    pub specialization: Option<Specialization>,
    pub emergency_services: Option<bool>,
}
