use appointment_service::{Appointment, AppointmentService, AppointmentStatus, FeeKind};
use auth_identity::{IdentityService, Role, User};
use chrono::Utc;
use database_layer::{Collection, DocumentStore, Filter, FindOptions};
use hospital_directory::HospitalService;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::gateway::{GatewayOutcome, PaymentGateway};
use crate::models::*;

const RECEIPT_SEQUENCE: &str = "receipts";

/// A status change and whether it just settled the payment
#[derive(Debug, Clone)]
pub struct StatusTransition {
    pub payment: Payment,
    pub completed: bool,
}

pub struct PaymentService {
    payments: Collection<Payment>,
    appointments: Arc<AppointmentService>,
    identity: Arc<IdentityService>,
    hospitals: HospitalService,
    gateway: Arc<dyn PaymentGateway>,
}

impl PaymentService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        appointments: Arc<AppointmentService>,
        identity: Arc<IdentityService>,
        hospitals: HospitalService,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            payments: Collection::new(store),
            appointments,
            identity,
            hospitals,
            gateway,
        }
    }

    /// Checkout
    ///
    /// The method decides the initial status: cash and government payments
    /// complete at once, insurance stays pending, and every other method is
    /// settled through the gateway before the payment is stored.
    ///
    /// A payment for an appointment must match the named fee exactly, and
    /// that fee must still be unpaid.
    pub async fn create(&self, actor: &User, request: NewPayment) -> BillingResult<Payment> {
        let patient_id = match actor.role() {
            Role::Patient => actor.id,
            Role::HospitalStaff | Role::HealthcareManager => {
                let patient_id = request
                    .patient_id
                    .ok_or_else(|| BillingError::validation("patientId", "patient is required"))?;
                self.identity
                    .find_active_with_role(patient_id, Role::Patient)
                    .await?
                    .ok_or(BillingError::PatientNotFound)?;
                patient_id
            }
            Role::HealthcareProfessional => return Err(BillingError::AccessDenied),
        };

        if request.amount < Decimal::ZERO {
            return Err(BillingError::validation("amount", "amount must not be negative"));
        }
        self.hospitals
            .find_active(request.hospital_id)
            .await?
            .ok_or(BillingError::HospitalNotFound)?;
        self.check_appointment_link(&request, patient_id).await?;

        let billing_details = match request.billing_details {
            Some(mut details) => {
                details.recompute()?;
                Some(details)
            }
            None => None,
        };

        let mut insurance_info = request.insurance_info;
        let (status, processed_by) = match request.method {
            PaymentMethod::Cash => (PaymentStatus::Completed, Some(actor.id)),
            PaymentMethod::Government => (PaymentStatus::Completed, None),
            PaymentMethod::Insurance => {
                let info = insurance_info.as_mut().ok_or_else(|| {
                    BillingError::validation("insuranceInfo", "insurance details are required")
                })?;
                info.status = InsuranceStatus::Pending;
                (PaymentStatus::Pending, None)
            }
            _ => (PaymentStatus::Processing, None),
        };

        let now = Utc::now();
        let mut payment = Payment {
            id: Uuid::new_v4(),
            patient_id,
            appointment_id: request.appointment_id,
            hospital_id: request.hospital_id,
            fee_type: request.fee_type,
            amount: request.amount,
            method: request.method,
            status,
            description: request.description,
            billing_details,
            insurance_info,
            gateway_response: None,
            receipt: None,
            refund: None,
            processed_by,
            created_at: now,
            updated_at: now,
        };
        if payment.status == PaymentStatus::Processing {
            self.settle_through_gateway(&mut payment).await;
        }
        self.payments.insert(&payment).await?;

        info!(
            payment_id = %payment.id,
            method = payment.method.as_str(),
            status = %payment.status,
            "Payment recorded"
        );

        if payment.status == PaymentStatus::Completed {
            self.reconcile_fee(&payment).await;
        }
        Ok(payment)
    }

    /// Role-scoped listing, newest first
    pub async fn list(
        &self,
        actor: &User,
        query: &PaymentQuery,
        page: u32,
        page_size: u32,
    ) -> BillingResult<(Vec<Payment>, u64)> {
        let scope = match actor.role() {
            Role::Patient => Filter::new().eq("patientId", actor.id),
            Role::HospitalStaff | Role::HealthcareManager => Filter::new(),
            Role::HealthcareProfessional => return Err(BillingError::AccessDenied),
        };
        // createdAt holds full timestamps, so the upper bound is the next day
        let filter = scope
            .eq_opt("status", query.status)
            .eq_opt("method", query.method)
            .gte_opt("createdAt", query.date_from)
            .lte_opt("createdAt", query.date_to.and_then(|d| d.succ_opt()));

        let total = self.payments.count(&filter).await?;
        let payments = self
            .payments
            .find(&filter, &FindOptions::new().sort_desc("createdAt").page(page, page_size))
            .await?;
        Ok((payments, total))
    }

    pub async fn get(&self, actor: &User, id: Uuid) -> BillingResult<Payment> {
        let payment = self.load(id).await?;
        let allowed = match actor.role() {
            Role::Patient => payment.patient_id == actor.id,
            Role::HospitalStaff | Role::HealthcareManager => true,
            Role::HealthcareProfessional => false,
        };
        if !allowed {
            return Err(BillingError::AccessDenied);
        }
        Ok(payment)
    }

    /// Staff-driven status change; completing a payment reconciles its fee
    pub async fn update_status(
        &self,
        actor: &User,
        id: Uuid,
        update: UpdatePaymentStatus,
    ) -> BillingResult<StatusTransition> {
        require_back_office(actor)?;
        let mut payment = self.load(id).await?;

        if update.status.is_refunded() {
            return Err(BillingError::RefundThroughUpdate);
        }
        if payment.status.is_refunded() {
            return Err(BillingError::StatusLocked(payment.status));
        }

        let completed =
            update.status == PaymentStatus::Completed && payment.status != PaymentStatus::Completed;
        if completed {
            self.ensure_fee_unpaid(&payment).await?;
        }
        payment.status = update.status;
        if let (Some(status), Some(info)) = (update.insurance_status, payment.insurance_info.as_mut()) {
            info.status = status;
        }
        if completed {
            payment.processed_by = Some(actor.id);
        }
        payment.updated_at = Utc::now();
        self.payments.replace(&payment).await?;

        info!(payment_id = %payment.id, status = %payment.status, "Payment status updated");
        if completed {
            self.reconcile_fee(&payment).await;
        }
        Ok(StatusTransition { payment, completed })
    }

    /// Receipt for a completed payment, numbered on first request
    pub async fn receipt(&self, actor: &User, id: Uuid) -> BillingResult<Payment> {
        let mut payment = self.get(actor, id).await?;
        if payment.status != PaymentStatus::Completed {
            return Err(BillingError::ReceiptRequiresCompleted);
        }
        if payment.receipt.is_some() {
            return Ok(payment);
        }

        let sequence = self.payments.next_sequence(RECEIPT_SEQUENCE).await?;
        let now = Utc::now();
        payment.receipt = Some(Receipt {
            receipt_number: format!("RCP{sequence:06}"),
            generated: true,
            generated_at: now,
        });
        payment.updated_at = now;
        self.payments.replace(&payment).await?;
        info!(payment_id = %payment.id, "Receipt generated");
        Ok(payment)
    }

    /// Full or partial refund of a completed payment
    ///
    /// The linked appointment's fee stays marked paid.
    pub async fn refund(&self, actor: &User, id: Uuid, request: RefundRequest) -> BillingResult<Payment> {
        require_back_office(actor)?;
        let reason = request
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .ok_or_else(|| BillingError::validation("reason", "refund reason is required"))?;
        if request.refund_amount <= Decimal::ZERO {
            return Err(BillingError::validation("refundAmount", "refund amount must be positive"));
        }

        let mut payment = self.load(id).await?;
        if request.refund_amount > payment.amount {
            return Err(BillingError::RefundExceedsAmount);
        }
        if payment.status != PaymentStatus::Completed {
            return Err(BillingError::RefundRequiresCompleted);
        }

        let now = Utc::now();
        payment.status = if request.refund_amount == payment.amount {
            PaymentStatus::Refunded
        } else {
            PaymentStatus::PartiallyRefunded
        };
        payment.refund = Some(Refund {
            refund_amount: request.refund_amount,
            reason,
            refunded_at: now,
            refund_method: payment.method,
            refund_reference: refund_reference(),
        });
        payment.updated_at = now;
        self.payments.replace(&payment).await?;

        info!(
            payment_id = %payment.id,
            refund_amount = %request.refund_amount,
            status = %payment.status,
            "Payment refunded"
        );
        Ok(payment)
    }

    async fn check_appointment_link(&self, request: &NewPayment, patient_id: Uuid) -> BillingResult<()> {
        let Some(appointment_id) = request.appointment_id else {
            if request.fee_type.is_some() {
                return Err(BillingError::validation(
                    "appointmentId",
                    "feeType requires an appointment",
                ));
            }
            return Ok(());
        };
        let Some(kind) = request.fee_type else {
            return Err(BillingError::validation(
                "feeType",
                "feeType is required when paying for an appointment",
            ));
        };

        let appointment = self
            .appointments
            .find(appointment_id)
            .await?
            .ok_or(BillingError::AppointmentNotFound)?;
        if appointment.patient_id != patient_id {
            return Err(BillingError::validation(
                "appointmentId",
                "appointment belongs to a different patient",
            ));
        }
        if appointment.hospital_id != request.hospital_id {
            return Err(BillingError::validation(
                "hospitalId",
                "appointment belongs to a different hospital",
            ));
        }
        if appointment.status == AppointmentStatus::Cancelled {
            return Err(BillingError::AppointmentCancelled);
        }

        let fee = appointment.fee(kind);
        if fee.paid {
            return Err(BillingError::FeeAlreadyPaid(kind));
        }
        match fee.amount {
            Some(due) if due == request.amount => Ok(()),
            Some(due) => Err(BillingError::validation(
                "amount",
                format!("amount must equal the {kind} fee of {due}"),
            )),
            None => Err(BillingError::validation(
                "feeType",
                format!("appointment has no {kind} fee to pay"),
            )),
        }
    }

    /// A pending payment cannot settle a fee another payment already covered
    async fn ensure_fee_unpaid(&self, payment: &Payment) -> BillingResult<()> {
        let Some((appointment, kind)) = self.linked_fee(payment).await? else {
            return Ok(());
        };
        if appointment.fee(kind).paid {
            return Err(BillingError::FeeAlreadyPaid(kind));
        }
        Ok(())
    }

    async fn linked_fee(&self, payment: &Payment) -> BillingResult<Option<(Appointment, FeeKind)>> {
        let (Some(appointment_id), Some(kind)) = (payment.appointment_id, payment.fee_type) else {
            return Ok(None);
        };
        let appointment = self
            .appointments
            .find(appointment_id)
            .await?
            .ok_or(BillingError::AppointmentNotFound)?;
        Ok(Some((appointment, kind)))
    }

    async fn settle_through_gateway(&self, payment: &mut Payment) {
        let outcome = self.gateway.authorize(payment).await;
        let now = Utc::now();
        let response = match outcome {
            GatewayOutcome::Approved {
                transaction_id,
                message,
            } => {
                payment.status = PaymentStatus::Completed;
                GatewayResponse {
                    gateway_name: self.gateway.name().to_string(),
                    transaction_id: Some(transaction_id),
                    gateway_status: "success".to_string(),
                    message,
                    timestamp: now,
                }
            }
            GatewayOutcome::Declined { message } => {
                warn!(payment_id = %payment.id, %message, "Gateway declined payment");
                payment.status = PaymentStatus::Failed;
                GatewayResponse {
                    gateway_name: self.gateway.name().to_string(),
                    transaction_id: None,
                    gateway_status: "failed".to_string(),
                    message,
                    timestamp: now,
                }
            }
        };
        payment.gateway_response = Some(response);
        payment.updated_at = now;
    }

    /// Mark the linked fee paid. The payment itself is already stored, so a
    /// failure here is logged for an operator instead of failing the request.
    async fn reconcile_fee(&self, payment: &Payment) {
        let (Some(appointment_id), Some(kind)) = (payment.appointment_id, payment.fee_type) else {
            return;
        };
        if let Err(e) = self
            .appointments
            .apply_fee_payment(appointment_id, kind, payment.method.as_str(), payment.updated_at)
            .await
        {
            warn!(
                payment_id = %payment.id,
                %appointment_id,
                fee = %kind,
                error = %e,
                "Payment stored but appointment fee not marked paid"
            );
        }
    }

    async fn load(&self, id: Uuid) -> BillingResult<Payment> {
        self.payments
            .get(&id.to_string())
            .await?
            .ok_or(BillingError::PaymentNotFound)
    }
}

fn require_back_office(actor: &User) -> BillingResult<()> {
    match actor.role() {
        Role::HospitalStaff | Role::HealthcareManager => Ok(()),
        _ => Err(BillingError::AccessDenied),
    }
}

/// `REF-` + 12 uppercase hex digits
fn refund_reference() -> String {
    let hex = Uuid::new_v4().simple().to_string().to_uppercase();
    format!("REF-{}", hex.get(..12).unwrap_or(hex.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{MockPaymentGateway, StaticGateway};
    use appointment_service::{CancelAppointment, NewAppointment};
    use auth_identity::IdentityConfig;
    use chrono::NaiveDate;
    use database_layer::{Document, MemoryStore};
    use hospital_directory::models::NewHospital;
    use serde_json::{json, Value};
    use tokio_test::{assert_err, assert_ok};

    struct Fixture {
        store: Arc<dyn DocumentStore>,
        service: PaymentService,
        appointments: Arc<AppointmentService>,
        hospitals: HospitalService,
        patient: User,
        staff: User,
        doctor: User,
        appointment: Appointment,
    }

    async fn seed_user(store: &Arc<dyn DocumentStore>, profile: Value) -> User {
        let mut document = json!({
            "id": Uuid::new_v4(),
            "name": "Billing Test",
            "email": format!("{}@example.com", Uuid::new_v4()),
            "passwordHash": "unused",
            "isActive": true,
            "createdAt": Utc::now(),
            "updatedAt": Utc::now(),
        });
        if let (Some(base), Value::Object(extra)) = (document.as_object_mut(), profile) {
            base.extend(extra);
        }
        let user: User = serde_json::from_value(document).unwrap();
        Collection::<User>::new(Arc::clone(store)).insert(&user).await.unwrap();
        user
    }

    async fn fixture(gateway: Arc<dyn PaymentGateway>) -> Fixture {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let identity = Arc::new(IdentityService::new(Arc::clone(&store), IdentityConfig::default()));
        let hospitals = HospitalService::new(Arc::clone(&store));

        let patient = seed_user(
            &store,
            json!({
                "role": "patient",
                "bloodType": "B-",
                "emergencyContact": {"name": "Ana", "relationship": "parent", "phone": "555-0111"}
            }),
        )
        .await;
        let doctor = seed_user(
            &store,
            json!({
                "role": "healthcare_professional",
                "specialization": "dermatology",
                "licenseNumber": "LIC-200",
                "consultationFee": 80
            }),
        )
        .await;
        let staff = seed_user(
            &store,
            json!({"role": "hospital_staff", "staffRole": "accountant", "employeeId": "EMP-9"}),
        )
        .await;

        let hospital: NewHospital =
            serde_json::from_value(json!({"name": "Riverside", "type": "private"})).unwrap();
        let hospital = hospitals.create(hospital).await.unwrap();

        let appointments = Arc::new(AppointmentService::new(
            Arc::clone(&store),
            Arc::clone(&identity),
            hospitals.clone(),
            Decimal::new(50, 0),
        ));
        let booking: NewAppointment = serde_json::from_value(json!({
            "doctorId": doctor.id,
            "hospitalId": hospital.id,
            "date": NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
            "time": "14:00"
        }))
        .unwrap();
        let appointment = appointments.create(&patient, booking).await.unwrap();

        let service = PaymentService::new(
            Arc::clone(&store),
            Arc::clone(&appointments),
            identity,
            hospitals.clone(),
            gateway,
        );
        Fixture {
            store,
            service,
            appointments,
            hospitals,
            patient,
            staff,
            doctor,
            appointment,
        }
    }

    fn checkout(f: &Fixture, method: PaymentMethod, fee: Option<FeeKind>) -> NewPayment {
        NewPayment {
            patient_id: None,
            appointment_id: fee.map(|_| f.appointment.id),
            hospital_id: f.appointment.hospital_id,
            fee_type: fee,
            // Reservation fee 50, doctor's consultation fee 80
            amount: match fee {
                Some(FeeKind::Consultation) => Decimal::new(80, 0),
                _ => Decimal::new(50, 0),
            },
            method,
            description: None,
            billing_details: None,
            insurance_info: None,
        }
    }

    fn refund(amount: i64, reason: Option<&str>) -> RefundRequest {
        RefundRequest {
            refund_amount: Decimal::new(amount, 0),
            reason: reason.map(str::to_string),
        }
    }

    fn untouched_gateway() -> Arc<dyn PaymentGateway> {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_authorize().never();
        gateway.expect_name().return_const("mock");
        Arc::new(gateway)
    }

    #[tokio::test]
    async fn test_cash_completes_without_gateway_and_marks_fee_paid() {
        let f = fixture(untouched_gateway()).await;
        let payment = f
            .service
            .create(&f.patient, checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation)))
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.processed_by, Some(f.patient.id));
        assert!(payment.gateway_response.is_none());

        let appointment = f.appointments.find(f.appointment.id).await.unwrap().unwrap();
        assert!(appointment.reservation_fee.paid);
        assert_eq!(appointment.reservation_fee.payment_method.as_deref(), Some("cash"));
        assert!(!appointment.consultation_fee.paid);
    }

    #[tokio::test]
    async fn test_government_completes_without_gateway() {
        let f = fixture(untouched_gateway()).await;
        let payment = f
            .service
            .create(&f.patient, checkout(&f, PaymentMethod::Government, None))
            .await
            .unwrap();
        assert_eq!(payment.status, PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn test_declined_card_fails_without_transaction() {
        let mut gateway = MockPaymentGateway::new();
        gateway.expect_authorize().times(1).returning(|_| GatewayOutcome::Declined {
            message: "insufficient funds".to_string(),
        });
        gateway.expect_name().return_const("mock");
        let f = fixture(Arc::new(gateway)).await;

        let payment = f
            .service
            .create(
                &f.patient,
                checkout(&f, PaymentMethod::CreditCard, Some(FeeKind::Consultation)),
            )
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Failed);
        let response = payment.gateway_response.unwrap();
        assert!(response.transaction_id.is_none());
        assert_eq!(response.message, "insufficient funds");

        let appointment = f.appointments.find(f.appointment.id).await.unwrap().unwrap();
        assert!(!appointment.consultation_fee.paid);
    }

    #[tokio::test]
    async fn test_approved_card_completes_and_reconciles_consultation_fee() {
        let f = fixture(Arc::new(StaticGateway::approving())).await;
        let payment = f
            .service
            .create(
                &f.patient,
                checkout(&f, PaymentMethod::DebitCard, Some(FeeKind::Consultation)),
            )
            .await
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        let response = payment.gateway_response.unwrap();
        assert!(response.transaction_id.unwrap().starts_with("TXN"));
        assert_eq!(response.gateway_name, "static");

        let appointment = f.appointments.find(f.appointment.id).await.unwrap().unwrap();
        assert!(appointment.consultation_fee.paid);
        assert!(!appointment.reservation_fee.paid);
    }

    #[tokio::test]
    async fn test_insurance_stays_pending_until_staff_completes_it() {
        let f = fixture(untouched_gateway()).await;
        let mut request = checkout(&f, PaymentMethod::Insurance, Some(FeeKind::Reservation));
        assert!(matches!(
            f.service.create(&f.patient, request.clone()).await,
            Err(BillingError::Validation { .. })
        ));

        request.insurance_info = Some(InsuranceInfo {
            provider: "Acme Health".to_string(),
            policy_number: "POL-1".to_string(),
            claim_number: None,
            coverage_amount: None,
            status: InsuranceStatus::Approved,
        });
        let payment = f.service.create(&f.patient, request).await.unwrap();
        assert_eq!(payment.status, PaymentStatus::Pending);
        assert_eq!(payment.insurance_info.as_ref().unwrap().status, InsuranceStatus::Pending);

        assert!(matches!(
            f.service.receipt(&f.patient, payment.id).await,
            Err(BillingError::ReceiptRequiresCompleted)
        ));

        let update = UpdatePaymentStatus {
            status: PaymentStatus::Completed,
            insurance_status: Some(InsuranceStatus::Approved),
        };
        assert!(matches!(
            f.service.update_status(&f.patient, payment.id, update.clone()).await,
            Err(BillingError::AccessDenied)
        ));
        let transition = f.service.update_status(&f.staff, payment.id, update).await.unwrap();
        assert!(transition.completed);
        assert_eq!(transition.payment.processed_by, Some(f.staff.id));

        let appointment = f.appointments.find(f.appointment.id).await.unwrap().unwrap();
        assert!(appointment.reservation_fee.paid);
    }

    #[tokio::test]
    async fn test_fee_type_is_required_for_appointment_payments() {
        let f = fixture(untouched_gateway()).await;
        let mut request = checkout(&f, PaymentMethod::Cash, None);
        request.appointment_id = Some(f.appointment.id);
        assert!(matches!(
            f.service.create(&f.patient, request).await,
            Err(BillingError::Validation { .. })
        ));

        let mut request = checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation));
        request.appointment_id = Some(Uuid::new_v4());
        assert!(matches!(
            f.service.create(&f.patient, request).await,
            Err(BillingError::AppointmentNotFound)
        ));
    }

    #[tokio::test]
    async fn test_receipt_is_generated_once() {
        let f = fixture(untouched_gateway()).await;
        let payment = f
            .service
            .create(&f.patient, checkout(&f, PaymentMethod::Cash, None))
            .await
            .unwrap();

        let first = f.service.receipt(&f.patient, payment.id).await.unwrap();
        let again = f.service.receipt(&f.staff, payment.id).await.unwrap();
        let receipt = first.receipt.unwrap();
        assert_eq!(receipt.receipt_number, "RCP000001");
        assert_eq!(again.receipt.unwrap(), receipt);

        assert!(matches!(
            f.service.receipt(&f.doctor, payment.id).await,
            Err(BillingError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_refund_rules() {
        let f = fixture(untouched_gateway()).await;
        let payment = f
            .service
            .create(&f.patient, checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation)))
            .await
            .unwrap();

        assert!(matches!(
            f.service.refund(&f.staff, payment.id, refund(51, Some("overcharge"))).await,
            Err(BillingError::RefundExceedsAmount)
        ));
        assert!(matches!(
            f.service.refund(&f.staff, payment.id, refund(10, None)).await,
            Err(BillingError::Validation { .. })
        ));
        assert!(matches!(
            f.service.refund(&f.patient, payment.id, refund(10, Some("mine"))).await,
            Err(BillingError::AccessDenied)
        ));

        let refunded = f
            .service
            .refund(&f.staff, payment.id, refund(20, Some("partial cancellation")))
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::PartiallyRefunded);
        let record = refunded.refund.unwrap();
        assert!(record.refund_amount <= refunded.amount);
        assert_eq!(record.refund_method, PaymentMethod::Cash);
        assert!(record.refund_reference.starts_with("REF-"));
        assert_eq!(record.refund_reference.len(), 16);

        // Fee flags are not reversed
        let appointment = f.appointments.find(f.appointment.id).await.unwrap().unwrap();
        assert!(appointment.reservation_fee.paid);

        assert!(matches!(
            f.service.refund(&f.staff, payment.id, refund(5, Some("again"))).await,
            Err(BillingError::RefundRequiresCompleted)
        ));
    }

    #[tokio::test]
    async fn test_full_refund() {
        let f = fixture(untouched_gateway()).await;
        let payment = f
            .service
            .create(&f.staff, {
                let mut request = checkout(&f, PaymentMethod::Cash, None);
                request.patient_id = Some(f.patient.id);
                request
            })
            .await
            .unwrap();
        let refunded = f
            .service
            .refund(&f.staff, payment.id, refund(50, Some("duplicate charge")))
            .await
            .unwrap();
        assert_eq!(refunded.status, PaymentStatus::Refunded);

        let update = UpdatePaymentStatus {
            status: PaymentStatus::Completed,
            insurance_status: None,
        };
        assert!(matches!(
            f.service.update_status(&f.staff, payment.id, update).await,
            Err(BillingError::StatusLocked(PaymentStatus::Refunded))
        ));
    }

    #[tokio::test]
    async fn test_listing_scope() {
        let f = fixture(untouched_gateway()).await;
        f.service
            .create(&f.patient, checkout(&f, PaymentMethod::Cash, None))
            .await
            .unwrap();

        let (mine, total) = f
            .service
            .list(&f.patient, &PaymentQuery::default(), 1, 20)
            .await
            .unwrap();
        assert_eq!((mine.len(), total), (1, 1));

        let today = Utc::now().date_naive();
        let query = PaymentQuery {
            date_from: Some(today),
            date_to: Some(today),
            method: Some(PaymentMethod::Cash),
            ..Default::default()
        };
        let (all, _) = f.service.list(&f.staff, &query, 1, 20).await.unwrap();
        assert_eq!(all.len(), 1);

        assert!(matches!(
            f.service.list(&f.doctor, &PaymentQuery::default(), 1, 20).await,
            Err(BillingError::AccessDenied)
        ));
    }

    #[tokio::test]
    async fn test_payment_must_match_the_unpaid_fee() {
        let f = fixture(untouched_gateway()).await;

        let mut underpaid = checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation));
        underpaid.amount = Decimal::ZERO;
        assert_err!(f.service.create(&f.patient, underpaid).await);

        let mut wrong_fee = checkout(&f, PaymentMethod::Cash, Some(FeeKind::Consultation));
        wrong_fee.amount = Decimal::new(50, 0);
        assert_err!(f.service.create(&f.patient, wrong_fee).await);

        let appointment = f.appointments.find(f.appointment.id).await.unwrap().unwrap();
        assert!(!appointment.reservation_fee.paid);
        assert!(!appointment.consultation_fee.paid);

        assert_ok!(
            f.service
                .create(&f.patient, checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation)))
                .await
        );
        assert!(matches!(
            f.service
                .create(&f.patient, checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation)))
                .await,
            Err(BillingError::FeeAlreadyPaid(FeeKind::Reservation))
        ));

        let cancelled = f
            .appointments
            .cancel(
                &f.patient,
                f.appointment.id,
                CancelAppointment {
                    cancellation_reason: Some("travel".to_string()),
                },
            )
            .await
            .unwrap();
        let cancellation = cancelled.cancellation.unwrap();
        assert_eq!(cancellation.refund_amount, Some(Decimal::new(50, 0)));
    }

    #[tokio::test]
    async fn test_pending_payment_cannot_settle_a_paid_fee() {
        let f = fixture(untouched_gateway()).await;
        let mut insured = checkout(&f, PaymentMethod::Insurance, Some(FeeKind::Reservation));
        insured.insurance_info = Some(InsuranceInfo {
            provider: "Acme Health".to_string(),
            policy_number: "POL-2".to_string(),
            claim_number: None,
            coverage_amount: None,
            status: InsuranceStatus::Pending,
        });
        let pending = assert_ok!(f.service.create(&f.patient, insured).await);

        assert_ok!(
            f.service
                .create(&f.patient, checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation)))
                .await
        );

        let update = UpdatePaymentStatus {
            status: PaymentStatus::Completed,
            insurance_status: Some(InsuranceStatus::Approved),
        };
        assert!(matches!(
            f.service.update_status(&f.staff, pending.id, update).await,
            Err(BillingError::FeeAlreadyPaid(FeeKind::Reservation))
        ));
        let stored = f.service.get(&f.staff, pending.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Pending);
    }

    #[tokio::test]
    async fn test_hospital_must_exist_and_match_the_appointment() {
        let f = fixture(untouched_gateway()).await;

        let mut unknown = checkout(&f, PaymentMethod::Cash, None);
        unknown.hospital_id = Uuid::new_v4();
        assert!(matches!(
            f.service.create(&f.patient, unknown).await,
            Err(BillingError::HospitalNotFound)
        ));

        let other: NewHospital =
            serde_json::from_value(json!({"name": "Lakeside", "type": "public"})).unwrap();
        let other = f.hospitals.create(other).await.unwrap();
        let mut elsewhere = checkout(&f, PaymentMethod::Cash, Some(FeeKind::Reservation));
        elsewhere.hospital_id = other.id;
        assert!(matches!(
            f.service.create(&f.patient, elsewhere).await,
            Err(BillingError::Validation { ref field, .. }) if field == "hospitalId"
        ));

        let mut unlinked = checkout(&f, PaymentMethod::Cash, None);
        unlinked.hospital_id = other.id;
        assert_ok!(f.service.create(&f.patient, unlinked).await);
    }

    /// Approves, but removes the appointment first so fee bookkeeping fails
    struct RemovesAppointment {
        store: Arc<dyn DocumentStore>,
        appointment_id: Uuid,
    }

    #[async_trait::async_trait]
    impl PaymentGateway for RemovesAppointment {
        fn name(&self) -> &'static str {
            "removes-appointment"
        }

        async fn authorize(&self, _payment: &Payment) -> GatewayOutcome {
            let _ = self
                .store
                .delete(Appointment::COLLECTION, &self.appointment_id.to_string())
                .await;
            GatewayOutcome::Approved {
                transaction_id: "TXN-TEST".to_string(),
                message: "approved".to_string(),
            }
        }
    }

    #[tokio::test]
    async fn test_stored_payment_matches_response_when_fee_bookkeeping_fails() {
        let f = fixture(untouched_gateway()).await;
        let service = PaymentService::new(
            Arc::clone(&f.store),
            Arc::clone(&f.appointments),
            Arc::new(IdentityService::new(Arc::clone(&f.store), IdentityConfig::default())),
            f.hospitals.clone(),
            Arc::new(RemovesAppointment {
                store: Arc::clone(&f.store),
                appointment_id: f.appointment.id,
            }),
        );

        let payment = assert_ok!(
            service
                .create(
                    &f.patient,
                    checkout(&f, PaymentMethod::CreditCard, Some(FeeKind::Reservation)),
                )
                .await
        );
        assert_eq!(payment.status, PaymentStatus::Completed);

        let stored = service.get(&f.staff, payment.id).await.unwrap();
        assert_eq!(stored.status, PaymentStatus::Completed);
        assert_eq!(
            stored.gateway_response.and_then(|g| g.transaction_id).as_deref(),
            Some("TXN-TEST")
        );
        assert!(f.appointments.find(f.appointment.id).await.unwrap().is_none());
    }
}
