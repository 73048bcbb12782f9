mod plaid;
mod simplefin;

use chrono::NaiveDate;
use serde_json::Value;

use crate::CoreResult;
use crate::model::{Account, Institution, Snapshot, Transaction};

/// The set of supported banking data providers. The set is closed on
/// purpose: adapters share one output contract but differ entirely in input
/// shape and amount-sign convention, and new providers are a code change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    SimpleFin,
    Plaid,
}

impl Provider {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SimpleFin => "simplefin",
            Self::Plaid => "plaid",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "simplefin" => Some(Self::SimpleFin),
            "plaid" => Some(Self::Plaid),
            _ => None,
        }
    }

    /// Transforms a raw institution payload (or, for SimpleFIN, an account
    /// record carrying an embedded `org`) into a canonical institution.
    pub fn parse_institution(self, raw: &Value) -> CoreResult<Institution> {
        match self {
            Self::SimpleFin => simplefin::parse_institution(raw),
            Self::Plaid => plaid::parse_institution(raw),
        }
    }

    pub fn parse_account(
        self,
        raw: &Value,
        institution_external_id: &str,
        user_id: &str,
    ) -> CoreResult<Account> {
        match self {
            Self::SimpleFin => simplefin::parse_account(raw, institution_external_id, user_id),
            Self::Plaid => plaid::parse_account(raw, institution_external_id, user_id),
        }
    }

    /// Returns `Ok(None)` when the provider marks the record pending; pending
    /// transactions are excluded from the canonical store entirely.
    ///
    /// The produced transaction carries the canonical sign convention
    /// (negative = money out) regardless of the provider's own convention.
    pub fn parse_transaction(self, raw: &Value, user_id: &str) -> CoreResult<Option<Transaction>> {
        match self {
            Self::SimpleFin => simplefin::parse_transaction(raw, user_id),
            Self::Plaid => plaid::parse_transaction(raw, user_id),
        }
    }

    /// Extracts a provider-reported balance snapshot from an account record.
    /// Returns `Ok(None)` when the provider reports no balance.
    pub fn parse_snapshot(self, raw: &Value, fallback_date: NaiveDate) -> CoreResult<Option<Snapshot>> {
        match self {
            Self::SimpleFin => simplefin::parse_snapshot(raw, fallback_date),
            Self::Plaid => plaid::parse_snapshot(raw, fallback_date),
        }
    }
}
