//! Test data factories

use serde_json::{json, Value};

/// A complete alert document in wire format
pub fn alert_doc(id: &str, status: &str, severity: &str, last_receive_time: &str) -> Value {
    json!({
        "id": id,
        "type": "exceptionAlert",
        "status": status,
        "severity": severity,
        "environment": "PROD",
        "service": "network",
        "resource": "router55",
        "event": "NodeDown",
        "createTime": last_receive_time,
        "receiveTime": last_receive_time,
        "lastReceiveTime": last_receive_time,
        "history": [],
    })
}

/// An alert document with an explicit environment
pub fn alert_in_environment(id: &str, environment: &str, last_receive_time: &str) -> Value {
    let mut doc = alert_doc(id, "OPEN", "MAJOR", last_receive_time);
    doc["environment"] = json!(environment);
    doc
}
