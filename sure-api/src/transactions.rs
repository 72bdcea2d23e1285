//! Transaction listing: paginated fetch over a date window, mapped into
//! `sure_core::Transaction` and normalized (deduped, newest first).

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use sure_core::{Classification, CliError, ErrorCode, Transaction};
use tracing::{debug, info, warn};

use crate::client::SureClient;

const TRANSACTIONS_PATH: &str = "/api/v1/transactions";
/// Upper bound for the requested page size. The server may still return
/// fewer rows per page; paging follows its `pagination` block.
pub const MAX_PER_PAGE: u32 = 500;
/// Stop paging after this many pages even if the server reports more
pub const MAX_PAGES: u32 = 1000;

#[derive(Debug, Default, Deserialize)]
struct TransactionsPage {
    #[serde(default)]
    transactions: Vec<WireTransaction>,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    /// Page size the server actually applied
    #[serde(default)]
    per_page: Option<u32>,
    #[serde(default)]
    total_pages: Option<u32>,
    #[serde(default)]
    total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct WireTransaction {
    id: String,
    date: NaiveDate,
    #[serde(default)]
    name: String,
    #[serde(default)]
    classification: String,
    #[serde(default)]
    amount: String,
    #[serde(default)]
    currency: String,
    #[serde(default)]
    account: Option<Named>,
    #[serde(default)]
    merchant: Option<Named>,
    #[serde(default)]
    category: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

impl WireTransaction {
    fn into_transaction(self) -> Transaction {
        let classification = Classification::parse(&self.classification).unwrap_or_else(|| {
            warn!(id = %self.id, classification = %self.classification, "unknown classification, treating as expense");
            Classification::Expense
        });

        let name_of = |n: &Option<Named>| n.as_ref().and_then(|n| n.name.clone()).unwrap_or_default();
        let account_name = name_of(&self.account);
        let merchant_name = name_of(&self.merchant);
        let category_name = name_of(&self.category);
        let category_id = self
            .category
            .as_ref()
            .and_then(|c| c.id.clone())
            .unwrap_or_default();

        Transaction::new(
            self.id,
            self.name,
            classification,
            self.amount,
            self.currency,
            self.date,
        )
        .with_account(account_name)
        .with_merchant(merchant_name)
        .with_category(category_name, category_id)
    }
}

/// Fetch every transaction dated within `[start, end]`.
///
/// `per_page` is a hint, clamped to `1..=MAX_PER_PAGE`. The result is
/// deduplicated by id and ordered newest first.
pub async fn fetch_transactions_window(
    client: &SureClient,
    start: NaiveDate,
    end: NaiveDate,
    per_page: u32,
) -> Result<Vec<Transaction>, CliError> {
    if start > end {
        return Err(CliError::new(
            ErrorCode::Validation,
            format!("start date {start} is after end date {end}"),
        ));
    }

    let per_page = per_page.clamp(1, MAX_PER_PAGE);
    let start_date = start.format("%Y-%m-%d").to_string();
    let end_date = end.format("%Y-%m-%d").to_string();

    let txns = collect_pages(per_page, MAX_PAGES, |page| {
        let query = [
            ("start_date", start_date.clone()),
            ("end_date", end_date.clone()),
            ("page", page.to_string()),
            ("per_page", per_page.to_string()),
        ];
        async move { client.get_json::<TransactionsPage>(TRANSACTIONS_PATH, &query).await }
    })
    .await?;

    info!(count = txns.len(), %start, %end, "fetched transactions");
    Ok(txns)
}

/// Drive `fetch_page` from page 1 until the server reports no more pages,
/// then normalize everything collected.
async fn collect_pages<F, Fut>(
    requested_per_page: u32,
    max_pages: u32,
    mut fetch_page: F,
) -> Result<Vec<Transaction>, CliError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<TransactionsPage, CliError>>,
{
    let mut all = Vec::new();
    let mut page = 1;

    loop {
        let body = fetch_page(page).await?;

        let received = body.transactions.len();
        let pagination = body.pagination.as_ref();
        debug!(
            page,
            received,
            per_page = pagination.and_then(|p| p.per_page),
            total_pages = pagination.and_then(|p| p.total_pages),
            total_count = pagination.and_then(|p| p.total_count),
            "fetched transactions page"
        );
        let more = has_more(page, received, requested_per_page, pagination);

        all.extend(body.transactions.into_iter().map(WireTransaction::into_transaction));

        if !more {
            break;
        }
        if page >= max_pages {
            warn!(pages = page, "page limit reached, result may be incomplete");
            break;
        }
        page += 1;
    }

    Ok(normalize_transactions(all))
}

/// `total_pages` is authoritative when present. Without it, a page shorter
/// than the server's page size (or the requested one, if not echoed) is the last.
fn has_more(
    page: u32,
    received: usize,
    requested_per_page: u32,
    pagination: Option<&Pagination>,
) -> bool {
    if received == 0 {
        return false;
    }
    if let Some(total) = pagination.and_then(|p| p.total_pages) {
        return page < total;
    }
    let page_size = pagination
        .and_then(|p| p.per_page)
        .unwrap_or(requested_per_page);
    received >= page_size as usize
}

/// Drop repeated ids (first wins) and order newest first; same-day order is kept.
pub fn normalize_transactions(txns: Vec<Transaction>) -> Vec<Transaction> {
    let mut seen = HashSet::new();
    let mut out: Vec<Transaction> = txns
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_page(json: &str) -> Vec<Transaction> {
        let page: TransactionsPage = serde_json::from_str(json).unwrap();
        page.transactions
            .into_iter()
            .map(WireTransaction::into_transaction)
            .collect()
    }

    #[test]
    fn test_maps_wire_transaction() {
        let txns = parse_page(
            r#"{
                "transactions": [{
                    "id": "t-1",
                    "date": "2026-02-10",
                    "name": "Coffee Shop",
                    "classification": "expense",
                    "amount": "-€3.50",
                    "currency": "EUR",
                    "account": {"id": "a-1", "name": "Checking"},
                    "merchant": {"id": "m-1", "name": "Blue Bottle"},
                    "category": {"id": "c-1", "name": "Food"}
                }],
                "pagination": {"page": 1, "per_page": 25, "total_pages": 1, "total_count": 1}
            }"#,
        );

        assert_eq!(txns.len(), 1);
        let t = &txns[0];
        assert_eq!(t.id, "t-1");
        assert_eq!(t.date, NaiveDate::from_ymd_opt(2026, 2, 10).unwrap());
        assert_eq!(t.classification, Classification::Expense);
        assert_eq!(t.amount_text, "-€3.50");
        assert_eq!(t.account_name, "Checking");
        assert_eq!(t.merchant_name, "Blue Bottle");
        assert_eq!(t.category_name, "Food");
        assert_eq!(t.category_id, "c-1");
    }

    #[test]
    fn test_missing_nested_objects_map_to_empty() {
        let txns = parse_page(
            r#"{"transactions": [{
                "id": "t-2", "date": "2026-02-11", "name": "Payroll",
                "classification": "income", "amount": "€2,000.00", "currency": "EUR",
                "category": null, "merchant": null
            }]}"#,
        );
        let t = &txns[0];
        assert_eq!(t.classification, Classification::Income);
        assert!(!t.is_categorized());
        assert_eq!(t.category_id, "");
        assert_eq!(t.account_name, "");
    }

    #[test]
    fn test_unknown_classification_falls_back_to_expense() {
        let txns = parse_page(
            r#"{"transactions": [{"id": "t-3", "date": "2026-02-12", "classification": "transfer"}]}"#,
        );
        assert_eq!(txns[0].classification, Classification::Expense);
    }

    #[test]
    fn test_normalize_dedupes_and_sorts_newest_first() {
        let d = |day| NaiveDate::from_ymd_opt(2026, 1, day).unwrap();
        let mk = |id: &str, day| Transaction::new(id, "x", Classification::Expense, "1", "EUR", d(day));

        let out = normalize_transactions(vec![
            mk("a", 3),
            mk("b", 5),
            mk("a", 9),
            mk("c", 5),
            mk("d", 1),
        ]);

        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a", "d"]);
        assert_eq!(out[2].date, d(3));
    }

    fn wire(id: String, day: u32) -> WireTransaction {
        WireTransaction {
            id,
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            name: "Coffee Shop".to_string(),
            classification: "expense".to_string(),
            amount: "-€3.00".to_string(),
            currency: "EUR".to_string(),
            account: None,
            merchant: None,
            category: None,
        }
    }

    /// Page `page` of a server holding `total` rows, serving `page_size` per page.
    fn server_page(page: u32, page_size: u32, total: u32, paginate: bool) -> TransactionsPage {
        let first = (page - 1) * page_size;
        let last = (first + page_size).min(total);
        let transactions = (first..last)
            .map(|i| wire(format!("t-{i}"), 1 + i % 28))
            .collect();
        let pagination = paginate.then(|| Pagination {
            per_page: Some(page_size),
            total_pages: Some(total.div_ceil(page_size)),
            total_count: Some(total as u64),
        });
        TransactionsPage {
            transactions,
            pagination,
        }
    }

    fn pagination(per_page: Option<u32>, total_pages: Option<u32>) -> Pagination {
        Pagination {
            per_page,
            total_pages,
            total_count: None,
        }
    }

    #[test]
    fn test_has_more() {
        assert!(has_more(1, 500, 500, Some(&pagination(Some(500), Some(3)))));
        assert!(!has_more(3, 500, 500, Some(&pagination(Some(500), Some(3)))));
        assert!(!has_more(1, 0, 500, None));
        assert!(has_more(1, 500, 500, None));
        assert!(!has_more(1, 120, 500, None));
    }

    #[test]
    fn test_has_more_trusts_total_pages_over_short_pages() {
        // Server caps pages at 100 while 500 were requested
        assert!(has_more(1, 100, 500, Some(&pagination(Some(100), Some(5)))));
        assert!(has_more(4, 100, 500, Some(&pagination(None, Some(5)))));
        assert!(!has_more(5, 100, 500, Some(&pagination(Some(100), Some(5)))));
    }

    #[test]
    fn test_has_more_uses_echoed_page_size_without_total() {
        assert!(has_more(1, 100, 500, Some(&pagination(Some(100), None))));
        assert!(!has_more(1, 99, 500, Some(&pagination(Some(100), None))));
    }

    #[tokio::test]
    async fn test_collect_pages_stops_at_total_pages() {
        let mut requested = Vec::new();
        let txns = collect_pages(100, MAX_PAGES, |page| {
            requested.push(page);
            async move { Ok(server_page(page, 100, 250, true)) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(txns.len(), 250);
        for w in txns.windows(2) {
            assert!(w[0].date >= w[1].date, "not newest first");
        }
    }

    #[tokio::test]
    async fn test_collect_pages_follows_server_capped_page_size() {
        // 500 requested, server serves 100 per page and reports 5 pages
        let mut requested = Vec::new();
        let txns = collect_pages(500, MAX_PAGES, |page| {
            requested.push(page);
            async move { Ok(server_page(page, 100, 500, true)) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2, 3, 4, 5]);
        assert_eq!(txns.len(), 500);
    }

    #[tokio::test]
    async fn test_collect_pages_empty_first_page() {
        let mut calls = 0;
        let txns = collect_pages(500, MAX_PAGES, |page| {
            calls += 1;
            async move { Ok(server_page(page, 100, 0, true)) }
        })
        .await
        .unwrap();

        assert!(txns.is_empty());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_collect_pages_without_pagination_stops_on_short_page() {
        let mut requested = Vec::new();
        let txns = collect_pages(100, MAX_PAGES, |page| {
            requested.push(page);
            async move { Ok(server_page(page, 100, 230, false)) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(txns.len(), 230);
    }

    #[tokio::test]
    async fn test_collect_pages_respects_page_cap() {
        let mut requested = Vec::new();
        let txns = collect_pages(10, 3, |page| {
            requested.push(page);
            async move { Ok(server_page(page, 10, 1000, true)) }
        })
        .await
        .unwrap();

        assert_eq!(requested, vec![1, 2, 3]);
        assert_eq!(txns.len(), 30);
    }

    #[tokio::test]
    async fn test_collect_pages_dedupes_across_page_boundaries() {
        // Rows shifting between requests show up on two consecutive pages
        let txns = collect_pages(2, MAX_PAGES, |page| async move {
            let ids: &[&str] = match page {
                1 => &["a", "b"],
                2 => &["b", "c"],
                _ => &["d"],
            };
            Ok(TransactionsPage {
                transactions: ids
                    .iter()
                    .enumerate()
                    .map(|(i, id)| wire(id.to_string(), page * 3 + i as u32))
                    .collect(),
                pagination: None,
            })
        })
        .await
        .unwrap();

        let ids: Vec<&str> = txns.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c", "b", "a"]);
    }

    #[tokio::test]
    async fn test_collect_pages_propagates_errors() {
        let err = collect_pages(100, MAX_PAGES, |page| async move {
            if page == 1 {
                Ok(server_page(page, 100, 300, true))
            } else {
                Err(sure_core::classify_http_status(503, ""))
            }
        })
        .await
        .unwrap_err();

        assert_eq!(err.code(), ErrorCode::ServerError);
    }
}
