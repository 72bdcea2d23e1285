//! Rule proposals: scan a transaction history for display names that are
//! (almost) always filed under the same category, and suggest a
//! `set_category` rule for each of them.
//!
//! Heuristic:
//! - Group by trimmed display name (first-seen order)
//! - Groups need at least 2 members
//! - The dominant category must cover >= 70% of the group
//! - Only groups where the rule would actually change something are proposed
//!
//! Deterministic: ties on the dominant category go to the category seen first
//! in the group, and equal-ranked proposals keep first-seen group order.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;

/// Groups smaller than this are ignored entirely (not even counted as uncategorized)
pub const MIN_GROUP_SIZE: usize = 2;
/// Share of the group that must already carry the dominant category
pub const MIN_CONSISTENCY: f64 = 0.7;
/// Transaction ids kept per proposal for illustration
pub const MAX_SAMPLES: usize = 3;
/// Proposals kept after ranking
pub const MAX_PROPOSALS: usize = 20;

const BASE_CONFIDENCE: f64 = 0.6;
const CONSISTENCY_WEIGHT: f64 = 0.3;
const SIZE_BONUS: f64 = 0.1;
const SIZE_BONUS_MIN_GROUP: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Category,
    Tag,
    Merchant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    SetCategory,
    AddTag,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProposalReason {
    ConsistentCategorization,
}

/// A suggested automation rule
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleProposal {
    #[serde(rename = "type")]
    pub kind: RuleKind,
    /// Exact display name the rule would match
    pub pattern: String,
    pub action: RuleAction,
    /// Target category name
    pub value: String,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub reason: ProposalReason,
    /// Transactions in the group whose category would change
    pub affected_count: usize,
    pub sample_tx_ids: Vec<String>,
    pub suggested_action: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProposeResult {
    pub proposals: Vec<RuleProposal>,
    #[serde(rename = "total_transactions")]
    pub total_tx: usize,
    #[serde(rename = "uncategorized_count")]
    pub uncategorized: usize,
}

/// Analyze a transaction history and propose categorization rules.
///
/// Never fails: empty or degenerate input yields an empty proposal list.
/// `uncategorized` only counts members of groups with at least
/// [`MIN_GROUP_SIZE`] transactions.
pub fn propose_rules(txns: &[Transaction]) -> ProposeResult {
    let mut by_name: IndexMap<&str, Vec<&Transaction>> = IndexMap::new();
    for tx in txns {
        let name = tx.trimmed_name();
        if name.is_empty() {
            continue;
        }
        by_name.entry(name).or_default().push(tx);
    }

    let mut proposals = Vec::new();
    let mut uncategorized = 0;

    for (name, group) in &by_name {
        if group.len() < MIN_GROUP_SIZE {
            continue;
        }

        uncategorized += group.iter().filter(|tx| !tx.is_categorized()).count();

        if let Some(proposal) = propose_for_group(name, group) {
            proposals.push(proposal);
        }
    }

    // Stable: equal keys keep first-seen group order
    proposals.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| b.affected_count.cmp(&a.affected_count))
    });
    proposals.truncate(MAX_PROPOSALS);

    ProposeResult {
        proposals,
        total_tx: txns.len(),
        uncategorized,
    }
}

/// Confidence for a group with the given consistency ratio and size.
pub fn confidence(consistency: f64, group_size: usize) -> f64 {
    let mut conf = BASE_CONFIDENCE + consistency * CONSISTENCY_WEIGHT;
    if group_size >= SIZE_BONUS_MIN_GROUP {
        conf += SIZE_BONUS;
    }
    conf.min(1.0)
}

fn propose_for_group(name: &str, group: &[&Transaction]) -> Option<RuleProposal> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for tx in group.iter().filter(|tx| tx.is_categorized()) {
        *counts.entry(tx.category_name.as_str()).or_insert(0) += 1;
    }

    // All uncategorized: nothing to infer from. Strictly-greater keeps the
    // first-seen category on ties.
    let mut dominant: Option<(&str, usize)> = None;
    for (&cat, &count) in &counts {
        if dominant.is_none_or(|(_, best)| count > best) {
            dominant = Some((cat, count));
        }
    }
    let (dominant_cat, dominant_count) = dominant?;

    let consistency = dominant_count as f64 / group.len() as f64;
    if consistency < MIN_CONSISTENCY {
        return None;
    }

    let affected: Vec<&Transaction> = group
        .iter()
        .copied()
        .filter(|tx| tx.category_name != dominant_cat)
        .collect();
    if affected.is_empty() {
        return None;
    }

    let sample_tx_ids = affected
        .iter()
        .take(MAX_SAMPLES)
        .map(|tx| tx.id.clone())
        .collect();

    Some(RuleProposal {
        kind: RuleKind::Category,
        pattern: name.to_string(),
        action: RuleAction::SetCategory,
        value: dominant_cat.to_string(),
        confidence: confidence(consistency, group.len()),
        reason: ProposalReason::ConsistentCategorization,
        affected_count: affected.len(),
        sample_tx_ids,
        suggested_action: format!(
            "Review and apply: would categorize {} transactions as {}",
            affected.len(),
            dominant_cat
        ),
    })
}
