use std::collections::BTreeMap;

use serde::Serialize;

use crate::sync::SyncIssue;

#[derive(Debug, Clone, Serialize)]
pub struct WindowData {
    pub start: String,
    pub end: String,
    pub months_back: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncData {
    pub provider: String,
    pub user_id: String,
    pub phase: String,
    pub success: BTreeMap<String, i64>,
    pub failed: BTreeMap<String, i64>,
    pub errors: Vec<SyncIssue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<WindowData>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicateRow {
    pub external_id: String,
    pub account: String,
    pub posted_date: String,
    pub amount: String,
    pub description: String,
    pub payee: String,
    pub memo: Option<String>,
    pub group_size: i64,
    pub same_account: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DuplicatesData {
    pub user_id: String,
    pub transaction_count: i64,
    pub candidate_count: i64,
    pub rows: Vec<DuplicateRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountsSummary {
    pub institution_count: i64,
    pub account_count: i64,
    pub transaction_count: i64,
    pub earliest_posted_date: Option<String>,
    pub latest_posted_date: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountRow {
    pub external_id: String,
    pub name: String,
    pub institution: String,
    pub currency: String,
    pub kind: String,
    pub txn_count: i64,
    pub latest_balance: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountsData {
    pub summary: AccountsSummary,
    pub rows: Vec<AccountRow>,
}
