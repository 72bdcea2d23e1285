//! Transaction records as fetched from the Sure API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A minimal, agent-friendly view of a Sure transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Unique identifier for this transaction
    pub id: String,
    /// Display name; rules match on this
    pub name: String,
    pub classification: Classification,
    /// Amount as returned by the API (e.g. "€1.00" or "-€2.00").
    /// Sign formatting upstream is inconsistent, so it is never parsed here.
    pub amount_text: String,
    pub currency: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub account_name: String,
    #[serde(default)]
    pub merchant_name: String,
    /// Empty = uncategorized
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub category_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Income,
    Expense,
}

impl Classification {
    /// Parse the API's classification string. Returns None for anything unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Some(Classification::Income),
            "expense" => Some(Classification::Expense),
            _ => None,
        }
    }
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        classification: Classification,
        amount_text: impl Into<String>,
        currency: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            classification,
            amount_text: amount_text.into(),
            currency: currency.into(),
            date,
            account_name: String::new(),
            merchant_name: String::new(),
            category_name: String::new(),
            category_id: String::new(),
        }
    }

    /// Builder: set the category (name + id)
    pub fn with_category(mut self, name: impl Into<String>, id: impl Into<String>) -> Self {
        self.category_name = name.into();
        self.category_id = id.into();
        self
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account_name = account.into();
        self
    }

    pub fn with_merchant(mut self, merchant: impl Into<String>) -> Self {
        self.merchant_name = merchant.into();
        self
    }

    /// Grouping key: the display name with surrounding whitespace removed
    pub fn trimmed_name(&self) -> &str {
        self.name.trim()
    }

    pub fn is_categorized(&self) -> bool {
        !self.category_name.is_empty()
    }
}
