//! Query construction from request filter parameters
//!
//! Translates a raw query string into the store-agnostic predicate the alert
//! repository consumes. Field matching rules:
//!
//! - `id`: anchored prefix match against the store identifier
//! - one value: case-insensitive regex match; the value is used as a regex
//!   fragment as supplied, NOT escaped. This mirrors the historical API
//!   contract: callers may (and do) pass regex syntax, which also means any
//!   caller can inject regex operators.
//! - several values: set membership (any of the supplied values)
//!
//! `callback`, `_`, `sort-by`, `hide-alert-details`, `limit` and `from-date`
//! are control parameters, never filters.

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::alert::iso_millis;

/// Query parameters that never become filter predicates
pub const RESERVED_PARAMS: [&str; 6] = [
    "callback",
    "_",
    "sort-by",
    "hide-alert-details",
    "limit",
    "from-date",
];

/// A per-field matching rule
#[derive(Debug, Clone, PartialEq)]
pub enum MatchRule {
    /// Store identifier must start with the given value
    IdPrefix(String),
    /// Case-insensitive regex match; the fragment is passed through unescaped
    Regex(String),
    /// Field must equal any of the supplied values
    OneOf(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// The request-scoped predicate handed to the repository
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
    pub filters: Vec<(String, MatchRule)>,
    /// Half-open `[from, now)` window on `lastReceiveTime`
    pub last_receive_window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub sort: Vec<(String, SortDirection)>,
    /// 0 means no cap
    pub limit: i64,
}

/// Everything the list operation needs beyond the predicate itself
#[derive(Debug, Clone, Default)]
pub struct ListParams {
    pub query: AlertQuery,
    pub hide_details: bool,
}

/// Fields that sort newest-first
const DESCENDING_SORT_FIELDS: [&str; 3] = ["createTime", "receiveTime", "lastReceiveTime"];

/// Parse a raw query string into ordered key/value pairs, preserving
/// repeated keys.
pub fn parse_query_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (key, value) = part.split_once('=').unwrap_or((part, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(s: &str) -> String {
    let s = s.replace('+', " ");
    match urlencoding::decode(&s) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => s,
    }
}

/// Extract the JSONP callback name, if any
pub fn callback_param(pairs: &[(String, String)]) -> Option<String> {
    pairs
        .iter()
        .find(|(key, _)| key == "callback")
        .map(|(_, value)| value.clone())
}

/// Build the list parameters from parsed query pairs.
///
/// `now` is the upper bound of the `from-date` window, injected by the
/// caller so the predicate is reproducible under test.
pub fn build_list_params(pairs: &[(String, String)], now: DateTime<Utc>) -> ListParams {
    let mut params = ListParams::default();

    // Group repeated keys, preserving first-seen field order
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (key, value) in pairs {
        match grouped.iter_mut().find(|(k, _)| k == key) {
            Some((_, values)) => values.push(value.clone()),
            None => grouped.push((key.clone(), vec![value.clone()])),
        }
    }

    for (field, values) in &grouped {
        if RESERVED_PARAMS.contains(&field.as_str()) {
            continue;
        }
        let rule = if field == "id" {
            MatchRule::IdPrefix(values[0].clone())
        } else if values.len() == 1 {
            MatchRule::Regex(values[0].clone())
        } else {
            MatchRule::OneOf(values.clone())
        };
        params.query.filters.push((field.clone(), rule));
    }

    for (field, values) in &grouped {
        match field.as_str() {
            "hide-alert-details" => {
                params.hide_details = values[0] == "true";
            }
            "limit" => {
                params.query.limit = values[0].parse().unwrap_or(0);
            }
            "from-date" => match iso_millis::parse(&values[0]) {
                Some(from) => {
                    params.query.last_receive_window = Some((from, now));
                }
                None => {
                    warn!("Ignoring unparseable from-date {:?}", values[0]);
                }
            },
            "sort-by" => {
                for sort_field in values {
                    let direction = if DESCENDING_SORT_FIELDS.contains(&sort_field.as_str()) {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    };
                    params.query.sort.push((sort_field.clone(), direction));
                }
            }
            _ => {}
        }
    }

    if params.query.sort.is_empty() {
        params
            .query
            .sort
            .push(("lastReceiveTime".to_string(), SortDirection::Descending));
    }

    params
}
