use appointment_service::FeeKind;
use chrono::{DateTime, NaiveDate, Utc};
use database_layer::Document;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    Cash,
    Insurance,
    Government,
    BankTransfer,
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "credit_card",
            PaymentMethod::DebitCard => "debit_card",
            PaymentMethod::Cash => "cash",
            PaymentMethod::Insurance => "insurance",
            PaymentMethod::Government => "government",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::DigitalWallet => "digital_wallet",
        }
    }

    /// Methods settled through the payment gateway
    pub fn uses_gateway(&self) -> bool {
        matches!(
            self,
            PaymentMethod::CreditCard
                | PaymentMethod::DebitCard
                | PaymentMethod::BankTransfer
                | PaymentMethod::DigitalWallet
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Cancelled,
    Refunded,
    PartiallyRefunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::PartiallyRefunded => "partially_refunded",
        }
    }

    pub fn is_refunded(&self) -> bool {
        matches!(self, PaymentStatus::Refunded | PaymentStatus::PartiallyRefunded)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub total: Decimal,
}

/// Itemised bill; totals are always recomputed from the lines
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDetails {
    #[serde(default)]
    pub services: Vec<ServiceLine>,
    #[serde(default)]
    pub subtotal: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub discount: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

impl BillingDetails {
    pub fn recompute(&mut self) -> BillingResult<()> {
        if self.tax < Decimal::ZERO || self.discount < Decimal::ZERO {
            return Err(BillingError::validation(
                "billingDetails",
                "tax and discount must not be negative",
            ));
        }
        for line in &mut self.services {
            if line.unit_price < Decimal::ZERO {
                return Err(BillingError::validation(
                    "billingDetails.services",
                    "unit price must not be negative",
                ));
            }
            line.total = line.unit_price * Decimal::from(line.quantity);
        }
        self.subtotal = self.services.iter().map(|line| line.total).sum();
        self.total = self.subtotal + self.tax - self.discount;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsuranceStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsuranceInfo {
    pub provider: String,
    pub policy_number: String,
    pub claim_number: Option<String>,
    pub coverage_amount: Option<Decimal>,
    #[serde(default)]
    pub status: InsuranceStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub gateway_name: String,
    pub transaction_id: Option<String>,
    pub gateway_status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub receipt_number: String,
    pub generated: bool,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    pub refund_amount: Decimal,
    pub reason: String,
    pub refunded_at: DateTime<Utc>,
    pub refund_method: PaymentMethod,
    pub refund_reference: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "paymentID")]
    pub id: Uuid,
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub hospital_id: Uuid,
    pub fee_type: Option<FeeKind>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub description: Option<String>,
    pub billing_details: Option<BillingDetails>,
    pub insurance_info: Option<InsuranceInfo>,
    pub gateway_response: Option<GatewayResponse>,
    pub receipt: Option<Receipt>,
    pub refund: Option<Refund>,
    pub processed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document for Payment {
    const COLLECTION: &'static str = "payments";

    fn document_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub patient_id: Option<Uuid>,
    pub appointment_id: Option<Uuid>,
    pub hospital_id: Uuid,
    pub fee_type: Option<FeeKind>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub description: Option<String>,
    pub billing_details: Option<BillingDetails>,
    pub insurance_info: Option<InsuranceInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePaymentStatus {
    pub status: PaymentStatus,
    pub insurance_status: Option<InsuranceStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub refund_amount: Decimal,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQuery {
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn default_quantity() -> u32 {
    1
}
