use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Institution,
    Account,
    Category,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Institution => "institution",
            Self::Account => "account",
            Self::Category => "category",
        }
    }
}

/// Lookup-by-natural-key reference. Cross-entity links are expressed by a
/// unique business key and resolved by the entity store at commit time, so a
/// new parent and its children can travel in the same batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub key: String,
}

impl EntityRef {
    pub fn institution(key: &str) -> Self {
        Self {
            kind: EntityKind::Institution,
            key: key.to_string(),
        }
    }

    pub fn account(key: &str) -> Self {
        Self {
            kind: EntityKind::Account,
            key: key.to_string(),
        }
    }

    pub fn category(key: &str) -> Self {
        Self {
            kind: EntityKind::Category,
            key: key.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub external_id: String,
    pub name: String,
    pub domain: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Chequing,
    Credit,
    Savings,
    Depository,
    Loan,
    Investment,
    Other,
}

impl AccountKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chequing => "chequing",
            Self::Credit => "credit",
            Self::Savings => "savings",
            Self::Depository => "depository",
            Self::Loan => "loan",
            Self::Investment => "investment",
            Self::Other => "other",
        }
    }

    /// Unknown provider labels fall back to `Other` rather than failing the
    /// account transform.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "chequing" | "checking" => Self::Chequing,
            "credit" | "credit card" => Self::Credit,
            "savings" => Self::Savings,
            "depository" => Self::Depository,
            "loan" => Self::Loan,
            "investment" | "brokerage" => Self::Investment,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub external_id: String,
    pub external_name: String,
    pub institution: EntityRef,
    pub currency: String,
    pub kind: AccountKind,
    pub user_id: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    Reviewed,
    Transfer,
    DuplicateCandidate,
}

impl Tag {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reviewed => "reviewed",
            Self::Transfer => "transfer",
            Self::DuplicateCandidate => "duplicate_candidate",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "reviewed" => Some(Self::Reviewed),
            "transfer" => Some(Self::Transfer),
            "duplicate_candidate" => Some(Self::DuplicateCandidate),
            _ => None,
        }
    }
}

/// Canonical transaction. `external_id` is the upsert idempotency key;
/// provider-sourced fields are write-once, while `category` and `tags` remain
/// user-mutable after creation. Sign convention: negative = money out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub external_id: String,
    pub account: EntityRef,
    pub transaction_date: NaiveDate,
    pub posted_date: NaiveDate,
    pub amount: Decimal,
    pub payee: String,
    pub description: String,
    pub memo: Option<String>,
    pub category: Option<EntityRef>,
    pub tags: BTreeSet<Tag>,
    pub transfer_pair: Option<String>,
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    Expense,
    Income,
    Transfer,
}

impl CategoryKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
            Self::Transfer => "transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "expense" => Some(Self::Expense),
            "income" => Some(Self::Income),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

/// `user_id` of `None` marks a system-wide category available to every user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub ident: String,
    pub name: String,
    pub parent: Option<String>,
    pub kind: CategoryKind,
    pub sort_order: i64,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Provider,
    Manual,
    Calculated,
}

impl SnapshotSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Provider => "provider",
            Self::Manual => "manual",
            Self::Calculated => "calculated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "provider" => Some(Self::Provider),
            "manual" => Some(Self::Manual),
            "calculated" => Some(Self::Calculated),
            _ => None,
        }
    }
}

/// Point-in-time account balance used to reconcile computed running balances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub account: EntityRef,
    pub date: NaiveDate,
    pub balance: Decimal,
    pub source: SnapshotSource,
}

#[cfg(test)]
mod tests {
    use super::{AccountKind, CategoryKind, SnapshotSource, Tag};

    #[test]
    fn account_kind_parse_normalizes_provider_labels() {
        assert_eq!(AccountKind::parse("checking"), AccountKind::Chequing);
        assert_eq!(AccountKind::parse("Credit Card"), AccountKind::Credit);
        assert_eq!(AccountKind::parse("mystery"), AccountKind::Other);
    }

    #[test]
    fn tag_round_trips_through_as_str() {
        for tag in [Tag::Reviewed, Tag::Transfer, Tag::DuplicateCandidate] {
            assert_eq!(Tag::parse(tag.as_str()), Some(tag));
        }
        assert_eq!(Tag::parse("nope"), None);
    }

    #[test]
    fn category_and_snapshot_kinds_round_trip() {
        for kind in [
            CategoryKind::Expense,
            CategoryKind::Income,
            CategoryKind::Transfer,
        ] {
            assert_eq!(CategoryKind::parse(kind.as_str()), Some(kind));
        }
        for source in [
            SnapshotSource::Provider,
            SnapshotSource::Manual,
            SnapshotSource::Calculated,
        ] {
            assert_eq!(SnapshotSource::parse(source.as_str()), Some(source));
        }
    }
}
