use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

use crate::models::Payment;

/// Result of asking a processor to settle a payment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayOutcome {
    Approved { transaction_id: String, message: String },
    Declined { message: String },
}

/// External card/wallet processor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn name(&self) -> &'static str;

    async fn authorize(&self, payment: &Payment) -> GatewayOutcome;
}

/// Approves with a fixed probability after an artificial delay
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    success_rate: f64,
    delay: Duration,
}

impl SimulatedGateway {
    pub const DEFAULT_SUCCESS_RATE: f64 = 0.95;

    pub fn new(success_rate: f64, delay: Duration) -> Self {
        Self {
            success_rate: success_rate.clamp(0.0, 1.0),
            delay,
        }
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUCCESS_RATE, Duration::from_millis(1000))
    }
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
    fn name(&self) -> &'static str {
        "simulated"
    }

    async fn authorize(&self, payment: &Payment) -> GatewayOutcome {
        tokio::time::sleep(self.delay).await;

        let approved = rand::thread_rng().gen_bool(self.success_rate);
        debug!(payment_id = %payment.id, approved, "Simulated gateway decision");
        if approved {
            GatewayOutcome::Approved {
                transaction_id: transaction_id(),
                message: "Payment processed successfully".to_string(),
            }
        } else {
            GatewayOutcome::Declined {
                message: "Payment declined by gateway".to_string(),
            }
        }
    }
}

/// Always gives the same answer
#[derive(Debug, Clone, Copy)]
pub struct StaticGateway {
    approve: bool,
}

impl StaticGateway {
    pub fn approving() -> Self {
        Self { approve: true }
    }

    pub fn declining() -> Self {
        Self { approve: false }
    }
}

#[async_trait]
impl PaymentGateway for StaticGateway {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn authorize(&self, _payment: &Payment) -> GatewayOutcome {
        if self.approve {
            GatewayOutcome::Approved {
                transaction_id: transaction_id(),
                message: "Payment approved".to_string(),
            }
        } else {
            GatewayOutcome::Declined {
                message: "Payment declined".to_string(),
            }
        }
    }
}

/// `TXN` + millisecond timestamp + 6 random alphanumerics
pub fn transaction_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    format!("TXN{}{}", Utc::now().timestamp_millis(), suffix.to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use appointment_service::FeeKind;
    use crate::models::{PaymentMethod, PaymentStatus};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn payment() -> Payment {
        Payment {
            id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            appointment_id: None,
            hospital_id: Uuid::new_v4(),
            fee_type: Some(FeeKind::Consultation),
            amount: Decimal::new(100, 0),
            method: PaymentMethod::CreditCard,
            status: PaymentStatus::Processing,
            description: None,
            billing_details: None,
            insurance_info: None,
            gateway_response: None,
            receipt: None,
            refund: None,
            processed_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_simulated_gateway_extremes() {
        let always = SimulatedGateway::new(1.0, Duration::ZERO);
        let never = SimulatedGateway::new(0.0, Duration::ZERO);
        let payment = payment();

        for _ in 0..10 {
            assert!(matches!(
                always.authorize(&payment).await,
                GatewayOutcome::Approved { .. }
            ));
            assert!(matches!(
                never.authorize(&payment).await,
                GatewayOutcome::Declined { .. }
            ));
        }
    }

    #[tokio::test]
    async fn test_out_of_range_rate_is_clamped() {
        let gateway = SimulatedGateway::new(7.5, Duration::ZERO);
        assert!(matches!(
            gateway.authorize(&payment()).await,
            GatewayOutcome::Approved { .. }
        ));
    }

    #[test]
    fn test_transaction_id_shape() {
        let id = transaction_id();
        assert!(id.starts_with("TXN"));
        assert!(id.len() > 9);
        assert!(id.chars().skip(3).all(|c| c.is_ascii_alphanumeric()));
    }
}
