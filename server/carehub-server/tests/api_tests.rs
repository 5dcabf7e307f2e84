use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auth_identity::User;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use billing_service::StaticGateway;
use chrono::{Days, NaiveDate, TimeZone, Utc};
use database_layer::{Collection, DocumentStore, MemoryStore};
use email_service::{Notification, NotificationKind, NotificationOutcome, Notifier};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use carehub_server::{
    create_app,
    scheduler::{run_reminder_sweep, Clock, FixedClock, SystemClock},
    AppConfig, CareHubServer,
};

/// Records every notification and reports it as delivered
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    fn kinds(&self) -> Vec<NotificationKind> {
        self.sent.lock().unwrap().iter().map(Notification::kind).collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> NotificationOutcome {
        let mut sent = self.sent.lock().unwrap();
        sent.push(notification);
        NotificationOutcome::sent(format!("test-{}", sent.len()))
    }
}

struct TestApp {
    server: CareHubServer,
    app: Router,
    store: Arc<dyn DocumentStore>,
    notifier: Arc<RecordingNotifier>,
}

impl TestApp {
    fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    fn with_clock(clock: Arc<dyn Clock>) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::default());
        let server = CareHubServer::new(
            AppConfig::default(),
            Arc::clone(&store),
            Arc::new(StaticGateway::approving()),
            notifier.clone(),
            clock,
        );
        let app = create_app(server.clone());
        Self {
            server,
            app,
            store,
            notifier,
        }
    }

    /// Insert a user directly and sign a token for it
    async fn seed_user(&self, profile: Value) -> (User, String) {
        let mut document = json!({
            "id": Uuid::new_v4(),
            "name": "Test User",
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
        Collection::<User>::new(Arc::clone(&self.store))
            .insert(&user)
            .await
            .unwrap();
        let token = self.server.identity.tokens().issue(&user).unwrap().token;
        (user, token)
    }

    async fn seed_patient(&self) -> (User, String) {
        self.seed_user(json!({
            "role": "patient",
            "bloodType": "O+",
            "emergencyContact": {"name": "Sam", "relationship": "spouse", "phone": "555-0100"}
        }))
        .await
    }

    async fn seed_doctor(&self) -> (User, String) {
        self.seed_user(json!({
            "role": "healthcare_professional",
            "specialization": "cardiology",
            "licenseNumber": format!("LIC-{}", Uuid::new_v4()),
            "consultationFee": 120.0
        }))
        .await
    }

    async fn seed_staff(&self) -> (User, String) {
        self.seed_user(json!({
            "role": "hospital_staff",
            "staffRole": "receptionist",
            "employeeId": format!("EMP-{}", Uuid::new_v4())
        }))
        .await
    }

    async fn seed_manager(&self) -> (User, String) {
        self.seed_user(json!({"role": "healthcare_manager"})).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn call(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn create_hospital(&self, manager_token: &str) -> String {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/hospitals",
                Some(manager_token),
                Some(json!({
                    "name": "City General",
                    "type": "public",
                    "bedCapacity": {"total": 200, "occupied": 120},
                    "specializations": ["cardiology"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["id"].as_str().unwrap().to_string()
    }

    async fn book(
        &self,
        patient_token: &str,
        doctor: &User,
        hospital_id: &str,
        date: NaiveDate,
    ) -> Value {
        let (status, body) = self
            .call(
                Method::POST,
                "/api/appointments",
                Some(patient_token),
                Some(json!({
                    "doctorId": doctor.id,
                    "hospitalId": hospital_id,
                    "date": date,
                    "time": "10:30",
                    "symptoms": ["chest pain"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

fn next_week() -> NaiveDate {
    Utc::now().date_naive().checked_add_days(Days::new(7)).unwrap()
}

fn is_appointment_number(value: &str) -> bool {
    value
        .strip_prefix("APT")
        .is_some_and(|digits| digits.len() == 6 && digits.chars().all(|c| c.is_ascii_digit()))
}

#[tokio::test]
async fn test_health_check_is_public() {
    let app = TestApp::new();
    let (status, body) = app.call(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["checks"]["database"], "healthy");
}

#[tokio::test]
async fn test_patient_booking_payment_and_cancellation_flow() {
    let app = TestApp::new();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "name": "Jordan Lee",
                "email": "Jordan.Lee@Example.com",
                "password": "Secure123",
                "role": "patient",
                "bloodType": "B+",
                "emergencyContact": {"name": "Alex", "relationship": "parent", "phone": "555-0199"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["user"]["email"], "jordan.lee@example.com");
    assert!(body["data"]["user"].get("passwordHash").is_none());
    let patient_token = body["data"]["token"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "jordan.lee@example.com", "password": "Secure123"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["user"]["lastLogin"].is_string());

    let (_, manager_token) = app.seed_manager().await;
    let (doctor, _) = app.seed_doctor().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let body = app.book(&patient_token, &doctor, &hospital_id, next_week()).await;
    let appointment = &body["data"];
    assert!(is_appointment_number(appointment["appointmentID"].as_str().unwrap()));
    assert_eq!(appointment["status"], "scheduled");
    assert_eq!(appointment["time"], "10:30");
    assert_eq!(appointment["reservationFee"]["amount"].as_f64(), Some(50.0));
    assert_eq!(appointment["reservationFee"]["paid"], false);
    assert_eq!(appointment["consultationFee"]["amount"].as_f64(), Some(120.0));
    assert_eq!(body["notification"]["success"], true);
    assert_eq!(body["notification"]["emailSent"], true);
    let appointment_id = appointment["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            "/api/payments",
            Some(&patient_token),
            Some(json!({
                "appointmentId": appointment_id,
                "hospitalId": hospital_id,
                "feeType": "reservation",
                "amount": 50.0,
                "method": "cash"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["notification"]["success"], true);

    let (status, body) = app
        .call(
            Method::GET,
            &format!("/api/appointments/{appointment_id}"),
            Some(&patient_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["reservationFee"]["paid"], true);
    assert_eq!(body["data"]["reservationFee"]["paymentMethod"], "cash");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/appointments/{appointment_id}/cancel"),
            Some(&patient_token),
            Some(json!({"cancellationReason": "patient request"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["cancellation"]["reason"], "patient request");
    assert_eq!(body["data"]["cancellation"]["refundAmount"].as_f64(), Some(50.0));
    assert_eq!(body["data"]["cancellation"]["refundStatus"], "pending");

    assert_eq!(
        app.notifier.kinds(),
        vec![
            NotificationKind::AppointmentConfirmation,
            NotificationKind::PaymentConfirmation,
            NotificationKind::AppointmentCancellation,
        ]
    );
}

#[tokio::test]
async fn test_concurrent_bookings_get_distinct_numbers() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (doctor, _) = app.seed_doctor().await;
    let (_, patient_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let bookings = (0..5).map(|_| app.book(&patient_token, &doctor, &hospital_id, next_week()));
    let results = futures::future::join_all(bookings).await;

    let mut numbers: Vec<String> = results
        .iter()
        .map(|body| body["data"]["appointmentID"].as_str().unwrap().to_string())
        .collect();
    assert!(numbers.iter().all(|n| is_appointment_number(n)));
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 5);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
    let app = TestApp::new();
    let (patient, token) = app.seed_patient().await;

    let request = Request::builder()
        .uri("/api/auth/verify")
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], patient.id.to_string());
    assert_eq!(body["data"]["role"], "patient");
}

#[tokio::test]
async fn test_login_sets_http_only_cookie() {
    let app = TestApp::new();
    let new_user = json!({
        "name": "Robin Park",
        "email": "robin@example.com",
        "password": "Secure123",
        "role": "healthcare_manager"
    });
    app.server
        .identity
        .create_user(serde_json::from_value(new_user).unwrap())
        .await
        .unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({"email": "robin@example.com", "password": "Secure123"}).to_string(),
        ))
        .unwrap();
    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));

    let (status, body) = app
        .call(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({"email": "robin@example.com", "password": "Wrong1234"})),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["errorType"], "authentication_error");
}

#[tokio::test]
async fn test_authentication_and_role_checks() {
    let app = TestApp::new();
    let (_, patient_token) = app.seed_patient().await;

    let (status, body) = app.call(Method::GET, "/api/appointments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["errorType"], "authentication_error");
    assert!(body["errorId"].is_string());

    let (status, _) = app
        .call(Method::GET, "/api/appointments", Some("not-a-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.call(Method::GET, "/api/users", Some(&patient_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["errorType"], "authorization_error");

    let (status, _) = app
        .call(
            Method::POST,
            "/api/hospitals",
            Some(&patient_token),
            Some(json!({"name": "Rogue Clinic", "type": "private"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_disabled_account_token_is_rejected() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (patient, patient_token) = app.seed_patient().await;

    let (status, body) = app
        .call(
            Method::PATCH,
            &format!("/api/users/{}/status", patient.id),
            Some(&manager_token),
            Some(json!({"isActive": false})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["isActive"], false);

    let (status, _) = app
        .call(Method::GET, "/api/users/me", Some(&patient_token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_receipt_requires_completed_payment() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (_, staff_token) = app.seed_staff().await;
    let (patient, _) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/payments",
            Some(&staff_token),
            Some(json!({
                "patientId": patient.id,
                "hospitalId": hospital_id,
                "amount": 300.0,
                "method": "insurance",
                "insuranceInfo": {"provider": "Acme Health", "policyNumber": "POL-1"}
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["status"], "pending");
    assert!(body.get("notification").is_none());
    let payment_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/payments/{payment_id}/receipt"),
            Some(&staff_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("completed"));

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/api/payments/{payment_id}"),
            Some(&staff_token),
            Some(json!({"status": "completed", "insuranceStatus": "approved"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["notification"]["success"], true);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("/api/payments/{payment_id}/receipt"),
            Some(&staff_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let number = body["data"]["receipt"]["receiptNumber"].as_str().unwrap();
    assert!(number.starts_with("RCP"));
}

#[tokio::test]
async fn test_refund_rules() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (_, staff_token) = app.seed_staff().await;
    let (patient, patient_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/payments",
            Some(&staff_token),
            Some(json!({
                "patientId": patient.id,
                "hospitalId": hospital_id,
                "amount": 100.0,
                "method": "cash"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let refund_uri = format!("/api/payments/{}/refund", body["data"]["id"].as_str().unwrap());

    let (status, _) = app
        .call(
            Method::POST,
            &refund_uri,
            Some(&staff_token),
            Some(json!({"refundAmount": 150.0, "reason": "overcharged"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            &refund_uri,
            Some(&staff_token),
            Some(json!({"refundAmount": 40.0})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["reason"].is_array());

    let (status, _) = app
        .call(
            Method::POST,
            &refund_uri,
            Some(&patient_token),
            Some(json!({"refundAmount": 40.0, "reason": "overcharged"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::POST,
            &refund_uri,
            Some(&staff_token),
            Some(json!({"refundAmount": 40.0, "reason": "overcharged"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "partially_refunded");
    assert_eq!(body["data"]["refund"]["refundAmount"].as_f64(), Some(40.0));
}

#[tokio::test]
async fn test_appointment_payment_must_match_fee_and_hospital() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (doctor, _) = app.seed_doctor().await;
    let (_, patient_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;
    let body = app.book(&patient_token, &doctor, &hospital_id, next_week()).await;
    let appointment_id = body["data"]["id"].as_str().unwrap().to_string();

    let pay = |hospital: String, amount: f64| {
        json!({
            "appointmentId": appointment_id,
            "hospitalId": hospital,
            "feeType": "reservation",
            "amount": amount,
            "method": "cash"
        })
    };

    let (status, body) = app
        .call(Method::POST, "/api/payments", Some(&patient_token), Some(pay(hospital_id.clone(), 0.0)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["errors"]["amount"].is_array());

    let (status, _) = app
        .call(
            Method::POST,
            "/api/payments",
            Some(&patient_token),
            Some(pay(Uuid::new_v4().to_string(), 50.0)),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(Method::POST, "/api/payments", Some(&patient_token), Some(pay(hospital_id.clone(), 50.0)))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");

    let (status, body) = app
        .call(Method::POST, "/api/payments", Some(&patient_token), Some(pay(hospital_id.clone(), 50.0)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(body["message"].as_str().unwrap().contains("already paid"));
}

#[tokio::test]
async fn test_cancellation_rules() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (_, staff_token) = app.seed_staff().await;
    let (doctor, doctor_token) = app.seed_doctor().await;
    let (_, patient_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let body = app.book(&patient_token, &doctor, &hospital_id, next_week()).await;
    let uri = format!("/api/appointments/{}", body["data"]["id"].as_str().unwrap());

    let (status, body) = app
        .call(
            Method::POST,
            &format!("{uri}/cancel"),
            Some(&patient_token),
            Some(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["cancellationReason"].is_array());

    let (status, _) = app
        .call(
            Method::PUT,
            &uri,
            Some(&staff_token),
            Some(json!({"status": "teleported"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::PUT,
            &uri,
            Some(&doctor_token),
            Some(json!({"status": "cancelled"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::PUT,
            &uri,
            Some(&doctor_token),
            Some(json!({"status": "completed", "notes": "Stable"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["status"], "completed");

    let (status, body) = app
        .call(
            Method::POST,
            &format!("{uri}/cancel"),
            Some(&patient_token),
            Some(json!({"cancellationReason": "patient request"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errorType"], "business_rule_violation");
}

#[tokio::test]
async fn test_appointment_listing_is_scoped_and_paginated() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (doctor, doctor_token) = app.seed_doctor().await;
    let (_, first_token) = app.seed_patient().await;
    let (_, second_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    for _ in 0..3 {
        app.book(&first_token, &doctor, &hospital_id, next_week()).await;
    }
    app.book(&second_token, &doctor, &hospital_id, next_week()).await;

    let (status, body) = app
        .call(Method::GET, "/api/appointments?page=1&limit=2", Some(&first_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["metadata"]["totalCount"], 3);
    assert_eq!(body["metadata"]["pagination"]["totalPages"], 2);
    assert_eq!(body["metadata"]["pagination"]["hasNext"], true);

    let (_, body) = app
        .call(Method::GET, "/api/appointments?status=scheduled", Some(&doctor_token), None)
        .await;
    assert_eq!(body["metadata"]["totalCount"], 4);

    let (status, _) = app
        .call(Method::GET, "/api/appointments?status=bogus", Some(&doctor_token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_medical_record_access() {
    let app = TestApp::new();
    let (_, manager_token) = app.seed_manager().await;
    let (_, staff_token) = app.seed_staff().await;
    let (_, doctor_token) = app.seed_doctor().await;
    let (patient, patient_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let (status, body) = app
        .call(
            Method::POST,
            "/api/medical-records",
            Some(&doctor_token),
            Some(json!({
                "patientId": patient.id,
                "hospitalId": hospital_id,
                "chiefComplaint": "Shortness of breath",
                "diagnosis": [{"description": "Asthma", "type": "primary"}]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let uri = format!("/api/medical-records/{}", body["data"]["recordID"].as_str().unwrap());

    let (status, body) = app.call(Method::GET, &uri, Some(&patient_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = body["data"]["accessLog"]
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["created", "viewed"]);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("{uri}/notes"),
            Some(&patient_token),
            Some(json!({"note": "Feeling better"})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .call(
            Method::POST,
            &format!("{uri}/notes"),
            Some(&doctor_token),
            Some(json!({"note": "Responding to inhaler"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["progressNotes"].as_array().unwrap().len(), 1);

    let (status, _) = app
        .call(Method::GET, "/api/medical-records", Some(&staff_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call(Method::DELETE, &uri, Some(&manager_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.call(Method::GET, &uri, Some(&patient_token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reminder_sweep_reminds_tomorrow_once() {
    let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
    let app = TestApp::with_clock(Arc::new(FixedClock(now)));
    let (_, manager_token) = app.seed_manager().await;
    let (doctor, _) = app.seed_doctor().await;
    let (_, patient_token) = app.seed_patient().await;
    let hospital_id = app.create_hospital(&manager_token).await;

    let tomorrow = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
    let later = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
    app.book(&patient_token, &doctor, &hospital_id, tomorrow).await;
    app.book(&patient_token, &doctor, &hospital_id, later).await;

    let summary = run_reminder_sweep(&app.server).await.unwrap();
    assert_eq!(summary.examined, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 0);

    let again = run_reminder_sweep(&app.server).await.unwrap();
    assert_eq!(again.examined, 0);

    let reminders = app
        .notifier
        .kinds()
        .into_iter()
        .filter(|kind| *kind == NotificationKind::AppointmentReminder)
        .count();
    assert_eq!(reminders, 1);
}
