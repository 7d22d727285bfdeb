//! Current time and date arithmetic.

use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};

pub fn current_time(_arguments: &Value) -> String {
    Utc::now().to_rfc3339()
}

pub fn date_add_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "date": {"type": "string", "description": "ISO 8601 date, e.g. 2024-01-15"},
            "days": {"type": "integer", "description": "Number of days to add; negative subtracts"}
        },
        "required": ["date", "days"]
    })
}

pub fn date_add(arguments: &Value) -> String {
    let Some(date) = arguments.get("date").and_then(Value::as_str) else {
        return "Error: missing required field 'date'".to_string();
    };
    let Some(days) = arguments.get("days").and_then(Value::as_i64) else {
        return "Error: missing required field 'days'".to_string();
    };
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(parsed) => (parsed + Duration::days(days)).format("%Y-%m-%d").to_string(),
        Err(err) => format!("Error: invalid date '{date}': {err}"),
    }
}

pub fn date_diff_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "start": {"type": "string", "description": "ISO 8601 start date"},
            "end": {"type": "string", "description": "ISO 8601 end date"}
        },
        "required": ["start", "end"]
    })
}

pub fn date_diff(arguments: &Value) -> String {
    let Some(start) = arguments.get("start").and_then(Value::as_str) else {
        return "Error: missing required field 'start'".to_string();
    };
    let Some(end) = arguments.get("end").and_then(Value::as_str) else {
        return "Error: missing required field 'end'".to_string();
    };
    let parsed_start = NaiveDate::parse_from_str(start, "%Y-%m-%d");
    let parsed_end = NaiveDate::parse_from_str(end, "%Y-%m-%d");
    match (parsed_start, parsed_end) {
        (Ok(start), Ok(end)) => format!("{} days", (end - start).num_days()),
        (Err(err), _) => format!("Error: invalid start date: {err}"),
        (_, Err(err)) => format!("Error: invalid end date: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_time_is_rfc3339() {
        let out = current_time(&json!({}));
        assert!(chrono::DateTime::parse_from_rfc3339(&out).is_ok());
    }

    #[test]
    fn date_add_advances_by_days() {
        let out = date_add(&json!({"date": "2024-01-15", "days": 10}));
        assert_eq!(out, "2024-01-25");
    }

    #[test]
    fn date_add_accepts_negative_days() {
        let out = date_add(&json!({"date": "2024-01-15", "days": -15}));
        assert_eq!(out, "2023-12-31");
    }

    #[test]
    fn date_diff_counts_whole_days() {
        let out = date_diff(&json!({"start": "2024-01-01", "end": "2024-01-11"}));
        assert_eq!(out, "10 days");
    }

    #[test]
    fn invalid_date_is_an_error_string() {
        let out = date_add(&json!({"date": "not-a-date", "days": 1}));
        assert!(out.starts_with("Error:"));
    }
}
