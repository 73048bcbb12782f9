use std::path::Path;

use chrono::NaiveDate;

use crate::CoreResult;
use crate::contracts::envelope::{SuccessEnvelope, success};
use crate::contracts::types::{SyncData, WindowData};
use crate::providers::Provider;
use crate::store::Store;
use crate::sync::{ProviderClient, SyncReport, sync_accounts, sync_transactions};

pub fn run_accounts(
    client: &dyn ProviderClient,
    provider: Provider,
    user_id: &str,
) -> CoreResult<SuccessEnvelope> {
    run_accounts_with_home_override(None, client, provider, user_id)
}

#[doc(hidden)]
pub fn run_accounts_with_home_override(
    home_override: Option<&Path>,
    client: &dyn ProviderClient,
    provider: Provider,
    user_id: &str,
) -> CoreResult<SuccessEnvelope> {
    let mut store = open_store(home_override)?;
    let report = sync_accounts(client, provider, &mut store, user_id)?;
    success(
        "sync accounts",
        sync_data(provider, user_id, &report, None),
    )
}

pub fn run_transactions(
    client: &dyn ProviderClient,
    provider: Provider,
    user_id: &str,
    months_back: u32,
    end_date: Option<NaiveDate>,
) -> CoreResult<SuccessEnvelope> {
    run_transactions_with_home_override(None, client, provider, user_id, months_back, end_date)
}

#[doc(hidden)]
pub fn run_transactions_with_home_override(
    home_override: Option<&Path>,
    client: &dyn ProviderClient,
    provider: Provider,
    user_id: &str,
    months_back: u32,
    end_date: Option<NaiveDate>,
) -> CoreResult<SuccessEnvelope> {
    let mut store = open_store(home_override)?;
    let result = sync_transactions(client, provider, &mut store, user_id, months_back, end_date)?;
    let window = WindowData {
        start: result.window.start.to_string(),
        end: result.window.end.to_string(),
        months_back,
    };
    success(
        "sync transactions",
        sync_data(provider, user_id, &result.report, Some(window)),
    )
}

fn open_store(home_override: Option<&Path>) -> CoreResult<Store> {
    match home_override {
        Some(home) => Store::open_at(home),
        None => Store::open_default(),
    }
}

fn sync_data(
    provider: Provider,
    user_id: &str,
    report: &SyncReport,
    window: Option<WindowData>,
) -> SyncData {
    SyncData {
        provider: provider.as_str().to_string(),
        user_id: user_id.to_string(),
        phase: report.phase.as_str().to_string(),
        success: report.success.clone(),
        failed: report.failed.clone(),
        errors: report.errors.clone(),
        window,
    }
}
