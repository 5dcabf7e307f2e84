use appointment_service::AppointmentService;
use auth_identity::{IdentityConfig, IdentityService};
use billing_service::{PaymentGateway, PaymentService, SimulatedGateway, StaticGateway};
use database_layer::{DocumentStore, MemoryStore, PgDocumentStore};
use email_service::{EmailNotifier, Notifier};
use error_common::{CareHubError, Result};
use hospital_directory::HospitalService;
use records_service::RecordService;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::{AppConfig, GatewayKind};
use crate::scheduler::{Clock, SystemClock};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct CareHubServer {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<IdentityService>,
    pub hospitals: HospitalService,
    pub appointments: Arc<AppointmentService>,
    pub payments: Arc<PaymentService>,
    pub records: Arc<RecordService>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub started_at: Instant,
}

impl CareHubServer {
    /// Wire the services over an already chosen store, gateway and notifier
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let identity = Arc::new(IdentityService::new(
            Arc::clone(&store),
            IdentityConfig {
                jwt_secret: config.auth.jwt_secret.clone(),
                token_ttl_hours: config.auth.token_ttl_hours,
                ..IdentityConfig::default()
            },
        ));
        let hospitals = HospitalService::new(Arc::clone(&store));
        let appointments = Arc::new(AppointmentService::new(
            Arc::clone(&store),
            Arc::clone(&identity),
            hospitals.clone(),
            config.payments.default_reservation_fee,
        ));
        let payments = Arc::new(PaymentService::new(
            Arc::clone(&store),
            Arc::clone(&appointments),
            Arc::clone(&identity),
            hospitals.clone(),
            gateway,
        ));
        let records = Arc::new(RecordService::new(
            Arc::clone(&store),
            Arc::clone(&identity),
            hospitals.clone(),
            Arc::clone(&appointments),
        ));

        Self {
            config: Arc::new(config),
            store,
            identity,
            hospitals,
            appointments,
            payments,
            records,
            notifier,
            clock,
            started_at: Instant::now(),
        }
    }

    /// Build everything from configuration: storage, gateway and SMTP notifier
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.database.url {
            Some(ref url) => {
                let store = PgDocumentStore::connect(url, config.database.max_connections)
                    .await
                    .map_err(|e| CareHubError::DatabaseError(e.to_string()))?;
                info!("Using PostgreSQL document store");
                Arc::new(store)
            }
            None => {
                warn!("No database URL configured, data will not survive a restart");
                Arc::new(MemoryStore::new())
            }
        };

        let gateway: Arc<dyn PaymentGateway> = match config.payments.gateway {
            GatewayKind::Simulated => Arc::new(SimulatedGateway::new(
                config.payments.success_rate,
                Duration::from_millis(config.payments.delay_ms),
            )),
            GatewayKind::Approve => Arc::new(StaticGateway::approving()),
            GatewayKind::Decline => Arc::new(StaticGateway::declining()),
        };
        info!(gateway = gateway.name(), "Payment gateway configured");

        if !config.email.enabled {
            info!("Email delivery disabled, notifications will be skipped");
        }
        let notifier = Arc::new(EmailNotifier::smtp(config.email.clone()));

        Ok(Self::new(config, store, gateway, notifier, Arc::new(SystemClock)))
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
