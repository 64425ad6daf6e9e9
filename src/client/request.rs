//! Ledger request descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Collection ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn as_str(&self) -> &'static str {
        match self {
            Order::Asc => "asc",
            Order::Desc => "desc",
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Order::Asc),
            "desc" => Ok(Order::Desc),
            other => Err(format!("invalid order {other:?}, expected asc or desc")),
        }
    }
}

/// Addresses either one ledger or a page of the ledgers collection.
///
/// When `for_sequence` is set the paging fields are ignored. A zero
/// sequence or limit counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerRequest {
    pub for_sequence: Option<u32>,
    pub cursor: Option<String>,
    pub limit: Option<u32>,
    pub order: Option<Order>,
}

impl LedgerRequest {
    pub fn single(sequence: u32) -> Self {
        Self {
            for_sequence: Some(sequence),
            ..Self::default()
        }
    }

    pub fn collection() -> Self {
        Self::default()
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: Order) -> Self {
        self.order = Some(order);
        self
    }

    /// Path and query relative to the gateway base URL.
    pub fn build_url(&self) -> String {
        if let Some(sequence) = self.for_sequence.filter(|&s| s > 0) {
            return format!("ledgers/{sequence}");
        }

        let mut query = url::form_urlencoded::Serializer::new(String::new());
        if let Some(cursor) = &self.cursor {
            query.append_pair("cursor", cursor);
        }
        if let Some(limit) = self.limit.filter(|&l| l > 0) {
            query.append_pair("limit", &limit.to_string());
        }
        if let Some(order) = self.order {
            query.append_pair("order", order.as_str());
        }

        let query = query.finish();
        if query.is_empty() {
            "ledgers".to_string()
        } else {
            format!("ledgers?{query}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_ignores_paging() {
        let request = LedgerRequest::single(100)
            .cursor("now")
            .limit(5)
            .order(Order::Desc);
        assert_eq!(request.build_url(), "ledgers/100");
    }

    #[test]
    fn test_collection_query() {
        assert_eq!(LedgerRequest::collection().build_url(), "ledgers");

        let request = LedgerRequest::collection()
            .cursor("12884901888")
            .limit(200)
            .order(Order::Asc);
        assert_eq!(
            request.build_url(),
            "ledgers?cursor=12884901888&limit=200&order=asc"
        );
    }

    #[test]
    fn test_cursor_is_encoded() {
        let request = LedgerRequest::collection().cursor("a b&c");
        assert_eq!(request.build_url(), "ledgers?cursor=a+b%26c");
    }

    #[test]
    fn test_zero_is_absent() {
        assert_eq!(LedgerRequest::collection().limit(0).build_url(), "ledgers");
        assert_eq!(LedgerRequest::single(0).build_url(), "ledgers");
        assert_eq!(
            LedgerRequest::single(0).cursor("9").limit(0).build_url(),
            "ledgers?cursor=9"
        );
    }

    #[test]
    fn test_order_parse() {
        assert_eq!("asc".parse::<Order>(), Ok(Order::Asc));
        assert!("sideways".parse::<Order>().is_err());
    }
}
