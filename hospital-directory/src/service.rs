use chrono::Utc;
use database_layer::{Collection, Document, DocumentStore, Filter, FindOptions};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{DirectoryError, DirectoryResult};
use crate::models::*;

#[derive(Clone)]
pub struct HospitalService {
    hospitals: Collection<Hospital>,
}

impl HospitalService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            hospitals: Collection::new(store),
        }
    }

    pub async fn create(&self, request: NewHospital) -> DirectoryResult<Hospital> {
        if request.name.trim().is_empty() {
            return Err(DirectoryError::validation("name", "hospital name is required"));
        }
        request.bed_capacity.validate()?;

        let sequence = self.hospitals.next_sequence(Hospital::COLLECTION).await?;
        let now = Utc::now();
        let hospital = Hospital {
            id: Uuid::new_v4(),
            hospital_id: format!("HSP{sequence:06}"),
            name: request.name.trim().to_string(),
            address: request.address,
            hospital_type: request.hospital_type,
            bed_capacity: request.bed_capacity,
            contact: request.contact,
            facilities: request.facilities,
            specializations: request.specializations,
            operating_hours: request.operating_hours,
            emergency_services: request.emergency_services,
            accreditations: request.accreditations,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        self.hospitals.insert(&hospital).await?;
        info!(hospital_id = %hospital.hospital_id, "Hospital created");
        Ok(hospital)
    }

    pub async fn get(&self, id: Uuid) -> DirectoryResult<Hospital> {
        self.hospitals
            .get(&id.to_string())
            .await?
            .ok_or(DirectoryError::HospitalNotFound)
    }

    /// The hospital if it exists and has not been deactivated
    pub async fn find_active(&self, id: Uuid) -> DirectoryResult<Option<Hospital>> {
        Ok(self
            .hospitals
            .get(&id.to_string())
            .await?
            .filter(|h| h.is_active))
    }

    pub async fn list(
        &self,
        query: &HospitalQuery,
        page: u32,
        page_size: u32,
    ) -> DirectoryResult<(Vec<Hospital>, u64)> {
        let filter = Filter::new()
            .eq("isActive", true)
            .eq_opt("type", query.hospital_type)
            .eq_opt("emergencyServices", query.emergency_services)
            .contains_opt("specializations", query.specialization);

        let total = self.hospitals.count(&filter).await?;
        let hospitals = self
            .hospitals
            .find(&filter, &FindOptions::new().sort_asc("name").page(page, page_size))
            .await?;
        Ok((hospitals, total))
    }

    pub async fn update(&self, id: Uuid, update: UpdateHospital) -> DirectoryResult<Hospital> {
        let mut hospital = self.get(id).await?;

        if let Some(name) = update.name {
            if name.trim().is_empty() {
                return Err(DirectoryError::validation("name", "hospital name is required"));
            }
            hospital.name = name.trim().to_string();
        }
        if let Some(capacity) = update.bed_capacity {
            capacity.validate()?;
            hospital.bed_capacity = capacity;
        }
        if let Some(address) = update.address {
            hospital.address = address;
        }
        if let Some(hospital_type) = update.hospital_type {
            hospital.hospital_type = hospital_type;
        }
        if let Some(contact) = update.contact {
            hospital.contact = contact;
        }
        if let Some(facilities) = update.facilities {
            hospital.facilities = facilities;
        }
        if let Some(specializations) = update.specializations {
            hospital.specializations = specializations;
        }
        if let Some(hours) = update.operating_hours {
            hospital.operating_hours = hours;
        }
        if let Some(emergency) = update.emergency_services {
            hospital.emergency_services = emergency;
        }
        if let Some(accreditations) = update.accreditations {
            hospital.accreditations = accreditations;
        }

        hospital.updated_at = Utc::now();
        self.hospitals.replace(&hospital).await?;
        info!(hospital_id = %hospital.hospital_id, "Hospital updated");
        Ok(hospital)
    }

    /// Soft delete
    pub async fn deactivate(&self, id: Uuid) -> DirectoryResult<Hospital> {
        let mut hospital = self.get(id).await?;
        hospital.is_active = false;
        hospital.updated_at = Utc::now();
        self.hospitals.replace(&hospital).await?;
        info!(hospital_id = %hospital.hospital_id, "Hospital deactivated");
        Ok(hospital)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_identity::Specialization;
    use database_layer::MemoryStore;

    fn request(name: &str, hospital_type: HospitalType) -> NewHospital {
        NewHospital {
            name: name.to_string(),
            address: Default::default(),
            hospital_type,
            bed_capacity: BedCapacity {
                total: 100,
                occupied: 40,
                icu: 10,
                emergency: 5,
            },
            contact: Default::default(),
            facilities: vec![Facility::Icu, Facility::Pharmacy],
            specializations: vec![Specialization::Cardiology],
            operating_hours: Default::default(),
            emergency_services: true,
            accreditations: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_hospital_ids() {
        let service = HospitalService::new(Arc::new(MemoryStore::new()));
        let first = service.create(request("General", HospitalType::Public)).await.unwrap();
        let second = service.create(request("St. Mary", HospitalType::Private)).await.unwrap();
        assert_eq!(first.hospital_id, "HSP000001");
        assert_eq!(second.hospital_id, "HSP000002");
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_occupied_beds_cannot_exceed_total() {
        let service = HospitalService::new(Arc::new(MemoryStore::new()));
        let mut bad = request("Overfull", HospitalType::Public);
        bad.bed_capacity.occupied = 101;
        assert!(matches!(
            service.create(bad).await,
            Err(DirectoryError::Validation { .. })
        ));

        let hospital = service.create(request("Ok", HospitalType::Public)).await.unwrap();
        let err = service
            .update(
                hospital.id,
                UpdateHospital {
                    bed_capacity: Some(BedCapacity {
                        total: 10,
                        occupied: -1,
                        icu: 0,
                        emergency: 0,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_list_hides_deactivated_and_filters() {
        let service = HospitalService::new(Arc::new(MemoryStore::new()));
        let public = service.create(request("Alpha", HospitalType::Public)).await.unwrap();
        service.create(request("Beta", HospitalType::Private)).await.unwrap();
        let closed = service.create(request("Gamma", HospitalType::Public)).await.unwrap();
        service.deactivate(closed.id).await.unwrap();

        let (all, total) = service.list(&HospitalQuery::default(), 1, 20).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all.len(), 2);

        let query = HospitalQuery {
            hospital_type: Some(HospitalType::Public),
            specialization: Some(Specialization::Cardiology),
            ..Default::default()
        };
        let (public_only, _) = service.list(&query, 1, 20).await.unwrap();
        assert_eq!(public_only.len(), 1);
        assert_eq!(public_only[0].id, public.id);

        assert!(service.find_active(closed.id).await.unwrap().is_none());
        assert!(service.get(closed.id).await.is_ok());
    }
}
