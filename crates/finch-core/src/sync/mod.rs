pub mod window;

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Value, json};

use crate::model::Institution;
use crate::providers::Provider;
use crate::store::{BatchOutcome, Store, SyncBatch};
use crate::sync::window::{DateRange, calculate_date_range, today_utc};
use crate::{CoreError, CoreResult};

/// Source of raw provider payloads for one sync run. Implementations fetch
/// over HTTP in production and replay fixture files in tests and offline
/// imports; the orchestrator only sees raw JSON either way.
pub trait ProviderClient {
    fn fetch_accounts(&self) -> CoreResult<AccountsPayload>;

    fn fetch_transactions(
        &self,
        account_external_id: &str,
        range: &DateRange,
    ) -> CoreResult<Vec<Value>>;
}

/// Raw accounts response. `institution` is the provider's top-level
/// institution record when it sends one (Plaid); SimpleFIN embeds the org in
/// each account record instead, so the orchestrator falls back to the account
/// payload itself.
#[derive(Debug, Clone, Default)]
pub struct AccountsPayload {
    pub institution: Option<Value>,
    pub accounts: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Pending,
    Fetching,
    Transforming,
    Persisting,
    Completed,
    Failed,
}

impl SyncPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Transforming => "transforming",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Legal transitions form a straight line through the run, with `Failed`
    /// reachable from any non-terminal phase. Terminal phases never advance.
    pub fn can_advance_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed {
            return true;
        }
        matches!(
            (self, next),
            (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Transforming)
                | (Self::Transforming, Self::Persisting)
                | (Self::Persisting, Self::Completed)
        )
    }
}

/// Lifecycle of one sync run. Starts `Pending`; `advance` refuses illegal
/// transitions so a completed or failed run can never be revived.
#[derive(Debug, Clone)]
pub struct SyncRun {
    phase: SyncPhase,
}

impl SyncRun {
    pub fn new() -> Self {
        Self {
            phase: SyncPhase::Pending,
        }
    }

    pub fn phase(&self) -> SyncPhase {
        self.phase
    }

    pub fn advance(&mut self, next: SyncPhase) -> bool {
        if self.phase.can_advance_to(next) {
            self.phase = next;
            return true;
        }
        false
    }
}

impl Default for SyncRun {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncIssue {
    pub message: String,
    pub context: Option<Value>,
}

/// Partial-failure report: per-entity-kind success and failure counts plus
/// one issue per failed record. A report with failures still commits every
/// record that transformed cleanly.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub success: BTreeMap<String, i64>,
    pub failed: BTreeMap<String, i64>,
    pub errors: Vec<SyncIssue>,
    pub phase: SyncPhase,
}

impl SyncReport {
    fn new() -> Self {
        Self {
            success: BTreeMap::new(),
            failed: BTreeMap::new(),
            errors: Vec::new(),
            phase: SyncPhase::Pending,
        }
    }

    pub fn record_failure(&mut self, kind: &str, error: &CoreError) {
        *self.failed.entry(kind.to_string()).or_insert(0) += 1;
        let mut context = error.context.clone().unwrap_or_else(|| json!({}));
        if let Value::Object(fields) = &mut context {
            fields.insert("code".to_string(), Value::String(error.code.clone()));
        }
        self.errors.push(SyncIssue {
            message: error.message.clone(),
            context: Some(context),
        });
    }

    /// Folds a batch outcome into the report. When `only` is set, success
    /// counts are restricted to that entity kind (a transaction sync upserts
    /// institutions and accounts as prerequisites but reports transactions);
    /// failures always land under their own kind.
    pub fn merge_outcome(&mut self, outcome: &BatchOutcome, only: Option<&str>) {
        for (kind, count) in &outcome.upserted {
            if only.is_none_or(|wanted| wanted == kind) {
                *self.success.entry(kind.clone()).or_insert(0) += count;
            }
        }
        for (kind, error) in &outcome.failures {
            self.record_failure(kind, error);
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed.values().any(|count| *count > 0)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncTransactionsResult {
    pub report: SyncReport,
    pub window: DateRange,
}

/// Syncs institutions, accounts, and balance snapshots for one user. Each
/// account record transforms independently; a malformed record (including a
/// malformed balance) fails that account and the run carries on.
pub fn sync_accounts(
    client: &dyn ProviderClient,
    provider: Provider,
    store: &mut Store,
    user_id: &str,
) -> CoreResult<SyncReport> {
    let mut run = SyncRun::new();
    let mut report = SyncReport::new();

    run.advance(SyncPhase::Fetching);
    let payload = match client.fetch_accounts() {
        Ok(payload) => payload,
        Err(error) => {
            run.advance(SyncPhase::Failed);
            report.phase = run.phase();
            return Err(error);
        }
    };

    run.advance(SyncPhase::Transforming);
    let snapshot_date = today_utc();
    let mut batch = SyncBatch::default();
    let mut seen_institutions: BTreeSet<String> = BTreeSet::new();

    for raw_account in &payload.accounts {
        let transformed = transform_account_record(
            provider,
            raw_account,
            payload.institution.as_ref(),
            user_id,
        )
        .and_then(|record| {
            // A malformed balance fails the whole account record.
            let snapshot = provider.parse_snapshot(raw_account, snapshot_date)?;
            Ok((record, snapshot))
        });

        match transformed {
            Ok((record, snapshot)) => {
                if seen_institutions.insert(record.institution.external_id.clone()) {
                    batch.institutions.push(record.institution);
                }
                batch.accounts.push(record.account);
                if let Some(snapshot) = snapshot {
                    batch.snapshots.push(snapshot);
                }
            }
            Err(error) => report.record_failure("accounts", &error),
        }
    }

    run.advance(SyncPhase::Persisting);
    match store.upsert_batch(&batch) {
        Ok(outcome) => report.merge_outcome(&outcome, None),
        Err(error) => {
            run.advance(SyncPhase::Failed);
            report.phase = run.phase();
            return Err(error);
        }
    }

    run.advance(SyncPhase::Completed);
    report.phase = run.phase();
    Ok(report)
}

/// Syncs transactions for every account the provider reports, over the
/// window `calculate_date_range(months_back, end_date)`. Each account's
/// records persist in their own batch, so one bad account cannot hold back
/// the rest. The report's success counts cover transactions only.
pub fn sync_transactions(
    client: &dyn ProviderClient,
    provider: Provider,
    store: &mut Store,
    user_id: &str,
    months_back: u32,
    end_date: Option<NaiveDate>,
) -> CoreResult<SyncTransactionsResult> {
    let window = calculate_date_range(months_back, end_date);
    let mut run = SyncRun::new();
    let mut report = SyncReport::new();

    run.advance(SyncPhase::Fetching);
    let payload = match client.fetch_accounts() {
        Ok(payload) => payload,
        Err(error) => {
            run.advance(SyncPhase::Failed);
            report.phase = run.phase();
            return Err(error);
        }
    };

    run.advance(SyncPhase::Transforming);
    run.advance(SyncPhase::Persisting);

    for raw_account in &payload.accounts {
        let record = match transform_account_record(
            provider,
            raw_account,
            payload.institution.as_ref(),
            user_id,
        ) {
            Ok(record) => record,
            Err(error) => {
                report.record_failure("accounts", &error);
                continue;
            }
        };

        let raw_transactions =
            match client.fetch_transactions(&record.account.external_id, &window) {
                Ok(rows) => rows,
                Err(error) => {
                    report.record_failure("transactions", &error);
                    continue;
                }
            };

        let mut batch = SyncBatch::default();
        batch.institutions.push(record.institution);
        batch.accounts.push(record.account);

        for raw_transaction in &raw_transactions {
            match provider.parse_transaction(raw_transaction, user_id) {
                Ok(Some(transaction)) => batch.transactions.push(transaction),
                // Pending records are dropped without counting either way.
                Ok(None) => {}
                Err(error) => report.record_failure("transactions", &error),
            }
        }

        match store.upsert_batch(&batch) {
            Ok(outcome) => report.merge_outcome(&outcome, Some("transactions")),
            Err(error) => {
                run.advance(SyncPhase::Failed);
                report.phase = run.phase();
                return Err(error);
            }
        }
    }

    run.advance(SyncPhase::Completed);
    report.phase = run.phase();
    Ok(SyncTransactionsResult { report, window })
}

struct AccountRecord {
    institution: Institution,
    account: crate::model::Account,
}

fn transform_account_record(
    provider: Provider,
    raw_account: &Value,
    raw_institution: Option<&Value>,
    user_id: &str,
) -> CoreResult<AccountRecord> {
    let institution_source = raw_institution.unwrap_or(raw_account);
    let institution = provider.parse_institution(institution_source)?;
    let account = provider.parse_account(raw_account, &institution.external_id, user_id)?;
    Ok(AccountRecord {
        institution,
        account,
    })
}
