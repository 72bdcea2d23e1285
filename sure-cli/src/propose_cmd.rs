use chrono::{DateTime, Months, NaiveDate, Utc};
use serde_json::json;
use sure_api::{SureClient, fetch_transactions_window};
use sure_core::{CliError, Envelope, ErrorCode, Meta, ProposeResult, propose_rules};
use tracing::{debug, info};

pub const DEFAULT_MONTHS: u32 = 3;
/// Upper bound for `--months` (100 years)
pub const MAX_MONTHS: u32 = 1200;
/// Page size hint passed to the transactions endpoint
pub const PAGE_SIZE_HINT: u32 = 500;

/// Non-positive values fall back to the default window.
pub fn normalize_months(months: i64) -> u32 {
    if months <= 0 {
        return DEFAULT_MONTHS;
    }
    months.min(MAX_MONTHS as i64) as u32
}

/// `[end - months, end]` as calendar dates (UTC).
pub fn lookback_window(end: DateTime<Utc>, months: u32) -> (NaiveDate, NaiveDate) {
    let start = end
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    (start.date_naive(), end.date_naive())
}

/// `sure propose rules`: fetch the lookback window and rank rule proposals.
pub async fn run(client: &SureClient, months: i64) -> Result<Envelope<ProposeResult>, CliError> {
    let months = normalize_months(months);
    let (start, end) = lookback_window(Utc::now(), months);
    info!(months, %start, %end, "proposing rules");

    let txns = fetch_transactions_window(client, start, end, PAGE_SIZE_HINT)
        .await
        .map_err(request_failed)?;

    let result = propose_rules(&txns);
    debug!(
        proposals = result.proposals.len(),
        total = result.total_tx,
        uncategorized = result.uncategorized,
        "analysis done"
    );

    Ok(Envelope::data(result).with_meta(Meta::propose_rules()))
}

/// Fetch failures surface as `request_failed`; the classified cause stays in details.
fn request_failed(err: CliError) -> CliError {
    let mut details = json!({
        "cause_code": err.code(),
        "retryable": err.is_retryable(),
    });
    if let Some(cause_details) = err.details() {
        details["cause_details"] = cause_details.clone();
    }
    CliError::new(ErrorCode::RequestFailed, err.full_message()).with_details(details)
}
