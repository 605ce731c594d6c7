//! Business logic services

pub mod notifier;
pub mod query;
pub mod stomp;

pub use notifier::{MessageBroker, NotificationMessage, StatusNotifier, StompBroker};
pub use query::{
    build_list_params, callback_param, parse_query_pairs, AlertQuery, ListParams, MatchRule,
    SortDirection,
};
pub use stomp::{StompClient, StompFrame};
