//! Arithmetic expression evaluation, basic statistics, and percentage.

use serde_json::{json, Value};

pub fn calculate_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "expression": {
                "type": "string",
                "description": "An arithmetic expression using 0-9, +, -, *, /, ., (, ), and whitespace"
            }
        },
        "required": ["expression"]
    })
}

/// Evaluates `expression`, accepting only `0-9+-*/.()` and whitespace (spec
/// §4.2). Any other character, or a malformed expression, is reported with
/// the `"エラー:"` prefix the original calculator tool used — preserved
/// verbatim so model reasoning over the failure string is stable.
pub fn calculate(arguments: &Value) -> String {
    let Some(expression) = arguments.get("expression").and_then(Value::as_str) else {
        return "エラー: missing required field 'expression'".to_string();
    };

    if let Some(bad) = expression.chars().find(|c| !is_allowed_char(*c)) {
        return format!("エラー: disallowed character '{bad}' in expression");
    }

    match Evaluator::new(expression).parse() {
        Ok(value) => format_number(value),
        Err(err) => format!("エラー: {err}"),
    }
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_digit() || "+-*/.()".contains(c) || c.is_whitespace()
}

/// A small recursive-descent evaluator over the restricted grammar:
/// `expr := term (('+' | '-') term)*`, `term := factor (('*' | '/') factor)*`,
/// `factor := number | '(' expr ')' | ('+' | '-') factor`.
struct Evaluator<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Evaluator<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable() }
    }

    fn parse(mut self) -> Result<f64, String> {
        let value = self.expr()?;
        self.skip_whitespace();
        if self.chars.peek().is_some() {
            return Err("unexpected trailing input".to_string());
        }
        Ok(value)
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.chars.peek(), Some(c) if c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some('+') => {
                    self.chars.next();
                    value += self.term()?;
                }
                Some('-') => {
                    self.chars.next();
                    value -= self.term()?;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        loop {
            self.skip_whitespace();
            match self.chars.peek() {
                Some('*') => {
                    self.chars.next();
                    value *= self.factor()?;
                }
                Some('/') => {
                    self.chars.next();
                    let divisor = self.factor()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                _ => break,
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.chars.peek() {
            Some('+') => {
                self.chars.next();
                self.factor()
            }
            Some('-') => {
                self.chars.next();
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.chars.next();
                let value = self.expr()?;
                self.skip_whitespace();
                if self.chars.next() != Some(')') {
                    return Err("missing closing parenthesis".to_string());
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || *c == '.' => self.number(),
            _ => Err("expected a number, '(', or sign".to_string()),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let mut raw = String::new();
        while matches!(self.chars.peek(), Some(c) if c.is_ascii_digit() || *c == '.') {
            raw.push(self.chars.next().expect("peeked"));
        }
        raw.parse::<f64>().map_err(|_| format!("invalid number '{raw}'"))
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let mut text = format!("{value:.10}");
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
        text
    }
}

pub fn statistics_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "values": {"type": "array", "items": {"type": "number"}}
        },
        "required": ["values"]
    })
}

pub fn statistics(arguments: &Value) -> String {
    let Some(values) = arguments.get("values").and_then(Value::as_array) else {
        return "Error: missing required field 'values'".to_string();
    };
    let numbers: Option<Vec<f64>> = values.iter().map(Value::as_f64).collect();
    let Some(numbers) = numbers else {
        return "Error: 'values' must be an array of numbers".to_string();
    };
    if numbers.is_empty() {
        return "Error: 'values' must not be empty".to_string();
    }

    let count = numbers.len() as f64;
    let mean = numbers.iter().sum::<f64>() / count;
    let variance = numbers.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / count;
    let std_dev = variance.sqrt();

    let mut sorted = numbers.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("no NaN in validated input"));
    let median = if sorted.len() % 2 == 0 {
        let mid = sorted.len() / 2;
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[sorted.len() / 2]
    };

    format!(
        "mean: {:.4}, median: {:.4}, min: {:.4}, max: {:.4}, std_dev: {:.4}",
        mean,
        median,
        sorted.first().copied().unwrap_or(0.0),
        sorted.last().copied().unwrap_or(0.0),
        std_dev
    )
}

pub fn percentage_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "part": {"type": "number"},
            "whole": {"type": "number"}
        },
        "required": ["part", "whole"]
    })
}

pub fn percentage(arguments: &Value) -> String {
    let Some(part) = arguments.get("part").and_then(Value::as_f64) else {
        return "Error: missing required field 'part'".to_string();
    };
    let Some(whole) = arguments.get("whole").and_then(Value::as_f64) else {
        return "Error: missing required field 'whole'".to_string();
    };
    if whole == 0.0 {
        return "Error: 'whole' must not be zero".to_string();
    }
    format!("{:.2}%", (part / whole) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_operator_precedence() {
        assert_eq!(calculate(&json!({"expression": "17*23"})), "391");
        assert_eq!(calculate(&json!({"expression": "2 + 3 * 4"})), "14");
        assert_eq!(calculate(&json!({"expression": "(2 + 3) * 4"})), "20");
    }

    #[test]
    fn rejects_disallowed_characters() {
        let out = calculate(&json!({"expression": "import os"}));
        assert!(out.starts_with("エラー:"));
    }

    #[test]
    fn rejects_division_by_zero() {
        let out = calculate(&json!({"expression": "1/0"}));
        assert!(out.starts_with("エラー:"));
    }

    #[test]
    fn statistics_computes_summary() {
        let out = statistics(&json!({"values": [1.0, 2.0, 3.0, 4.0, 5.0]}));
        assert!(out.contains("mean: 3.0000"));
        assert!(out.contains("median: 3.0000"));
    }

    #[test]
    fn percentage_of_whole() {
        assert_eq!(percentage(&json!({"part": 25.0, "whole": 200.0})), "12.50%");
    }
}
