//! Temperature and length unit conversion.

use serde_json::{json, Value};

pub fn convert_temperature_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "value": {"type": "number"},
            "from": {"type": "string", "enum": ["celsius", "fahrenheit", "kelvin"]},
            "to": {"type": "string", "enum": ["celsius", "fahrenheit", "kelvin"]}
        },
        "required": ["value", "from", "to"]
    })
}

pub fn convert_temperature(arguments: &Value) -> String {
    let Some(value) = arguments.get("value").and_then(Value::as_f64) else {
        return "Error: missing required field 'value'".to_string();
    };
    let Some(from) = arguments.get("from").and_then(Value::as_str) else {
        return "Error: missing required field 'from'".to_string();
    };
    let Some(to) = arguments.get("to").and_then(Value::as_str) else {
        return "Error: missing required field 'to'".to_string();
    };

    let celsius = match from {
        "celsius" => value,
        "fahrenheit" => (value - 32.0) * 5.0 / 9.0,
        "kelvin" => value - 273.15,
        other => return format!("Error: unknown unit '{other}'"),
    };
    let result = match to {
        "celsius" => celsius,
        "fahrenheit" => celsius * 9.0 / 5.0 + 32.0,
        "kelvin" => celsius + 273.15,
        other => return format!("Error: unknown unit '{other}'"),
    };
    format!("{result:.2} {to}")
}

pub fn convert_length_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "value": {"type": "number"},
            "from": {"type": "string", "enum": ["meters", "feet", "miles", "kilometers", "inches"]},
            "to": {"type": "string", "enum": ["meters", "feet", "miles", "kilometers", "inches"]}
        },
        "required": ["value", "from", "to"]
    })
}

fn to_meters(unit: &str, value: f64) -> Result<f64, String> {
    match unit {
        "meters" => Ok(value),
        "feet" => Ok(value * 0.3048),
        "miles" => Ok(value * 1609.344),
        "kilometers" => Ok(value * 1000.0),
        "inches" => Ok(value * 0.0254),
        other => Err(format!("unknown unit '{other}'")),
    }
}

fn from_meters(unit: &str, meters: f64) -> Result<f64, String> {
    match unit {
        "meters" => Ok(meters),
        "feet" => Ok(meters / 0.3048),
        "miles" => Ok(meters / 1609.344),
        "kilometers" => Ok(meters / 1000.0),
        "inches" => Ok(meters / 0.0254),
        other => Err(format!("unknown unit '{other}'")),
    }
}

pub fn convert_length(arguments: &Value) -> String {
    let Some(value) = arguments.get("value").and_then(Value::as_f64) else {
        return "Error: missing required field 'value'".to_string();
    };
    let Some(from) = arguments.get("from").and_then(Value::as_str) else {
        return "Error: missing required field 'from'".to_string();
    };
    let Some(to) = arguments.get("to").and_then(Value::as_str) else {
        return "Error: missing required field 'to'".to_string();
    };

    match to_meters(from, value).and_then(|meters| from_meters(to, meters)) {
        Ok(result) => format!("{result:.4} {to}"),
        Err(err) => format!("Error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_celsius_to_fahrenheit() {
        let out = convert_temperature(&json!({"value": 100.0, "from": "celsius", "to": "fahrenheit"}));
        assert_eq!(out, "212.00 fahrenheit");
    }

    #[test]
    fn converts_kelvin_to_celsius() {
        let out = convert_temperature(&json!({"value": 0.0, "from": "kelvin", "to": "celsius"}));
        assert_eq!(out, "-273.15 celsius");
    }

    #[test]
    fn converts_miles_to_kilometers() {
        let out = convert_length(&json!({"value": 1.0, "from": "miles", "to": "kilometers"}));
        assert_eq!(out, "1.6093 kilometers");
    }

    #[test]
    fn unknown_unit_is_an_error_string() {
        let out = convert_length(&json!({"value": 1.0, "from": "parsecs", "to": "meters"}));
        assert!(out.starts_with("Error:"));
    }
}
