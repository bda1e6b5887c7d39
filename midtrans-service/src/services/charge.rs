//! Core API charge payloads.
//!
//! Each supported payment type adds its own sub-object next to the shared
//! `payment_type` and `transaction_details` fields.

use crate::config::MidtransConfig;
use crate::services::midtrans::TransactionDetails;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Bank used for virtual-account transfers when the caller names none.
pub const DEFAULT_BANK: &str = "bca";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    BankTransfer,
    Gopay,
    Qris,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::BankTransfer => "bank_transfer",
            PaymentType::Gopay => "gopay",
            PaymentType::Qris => "qris",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unsupported payment type: {0}")]
pub struct UnsupportedPaymentType(pub String);

impl FromStr for PaymentType {
    type Err = UnsupportedPaymentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bank_transfer" => Ok(PaymentType::BankTransfer),
            "gopay" => Ok(PaymentType::Gopay),
            "qris" => Ok(PaymentType::Qris),
            other => Err(UnsupportedPaymentType(other.to_string())),
        }
    }
}

/// Method-specific part of a charge, serialized under the method's own key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MethodPayload {
    #[serde(rename = "bank_transfer")]
    BankTransfer { bank: String },
    #[serde(rename = "gopay")]
    Gopay {
        enable_callback: bool,
        callback_url: String,
    },
    #[serde(rename = "qris")]
    Qris {},
}

/// Body of `POST /v2/charge`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    pub payment_type: PaymentType,
    pub transaction_details: TransactionDetails,
    #[serde(flatten)]
    pub method: MethodPayload,
}

impl ChargeRequest {
    /// Shape a charge for `payment_type`.
    ///
    /// `bank_name` only applies to bank transfers; GoPay callback settings come
    /// from the Midtrans configuration.
    pub fn new(
        order_id: impl Into<String>,
        gross_amount: i64,
        payment_type: PaymentType,
        bank_name: Option<&str>,
        midtrans: &MidtransConfig,
    ) -> Self {
        let method = match payment_type {
            PaymentType::BankTransfer => MethodPayload::BankTransfer {
                bank: bank_name
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .unwrap_or(DEFAULT_BANK)
                    .to_string(),
            },
            PaymentType::Gopay => {
                let (enable_callback, callback_url) = midtrans.gopay_callback();
                MethodPayload::Gopay {
                    enable_callback,
                    callback_url,
                }
            }
            PaymentType::Qris => MethodPayload::Qris {},
        };

        Self {
            payment_type,
            transaction_details: TransactionDetails {
                order_id: order_id.into(),
                gross_amount,
            },
            method,
        }
    }
}
