use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Shown in place of an empty salary description.
pub const SALARY_NOT_SPECIFIED: &str = "Зарплата не указана!";

pub const DEFAULT_CURRENCY: &str = "RUR";

/// Salary bounds at or above this are treated as unparsable.
const MAX_AMOUNT: f64 = 1e15;

/// Integers with optional thousands-separator spaces ("80 000", "1 200 000").
static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{1,3}(?:\s?\d{3})*\b").expect("valid amount pattern"));

/// Reduce a salary description to one number for ordering.
/// Ranges give the mean of their amounts; no amounts give 0.
pub fn salary_value(text: &str) -> f64 {
    if text.trim().is_empty() || text.contains(SALARY_NOT_SPECIFIED) {
        return 0.0;
    }

    let cleaned = text.replace('\u{202f}', "");
    let values: Vec<f64> = AMOUNT
        .find_iter(&cleaned)
        .filter_map(|m| {
            let digits: String = m.as_str().chars().filter(|c| !c.is_whitespace()).collect();
            digits.parse::<f64>().ok()
        })
        .collect();

    match values.len() {
        0 => 0.0,
        1 => values[0],
        n => values.iter().sum::<f64>() / n as f64,
    }
}

pub fn normalize_salary_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        SALARY_NOT_SPECIFIED.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Human-readable salary built from structured bounds.
pub fn describe_salary(from: Option<f64>, to: Option<f64>, currency: &str) -> String {
    match (from, to) {
        (Some(from), Some(to)) => format!("{}–{} {currency}", format_amount(from), format_amount(to)),
        (Some(from), None) => format!("от {} {currency}", format_amount(from)),
        (None, Some(to)) => format!("до {} {currency}", format_amount(to)),
        (None, None) => String::new(),
    }
}

/// Integral amounts render without a fractional part, others with two decimals.
pub fn format_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.abs() < MAX_AMOUNT {
        format!("{}", amount as i64)
    } else {
        format!("{amount:.2}")
    }
}

/// Salary bounds of one API vacancy item.
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryBounds {
    pub from: Option<f64>,
    pub to: Option<f64>,
    pub currency: String,
}

impl SalaryBounds {
    /// Read the `salary` object of an API item; absent or null fields become `None`.
    pub fn from_api(salary: Option<&Value>) -> Self {
        let salary = salary.filter(|v| v.is_object());
        let bound = |key: &str| salary.and_then(|s| s.get(key)).and_then(parse_amount);
        let currency = salary
            .and_then(|s| s.get("currency"))
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
            .to_string();

        SalaryBounds {
            from: bound("from"),
            to: bound("to"),
            currency,
        }
    }

    pub fn lower(&self) -> f64 {
        self.from.unwrap_or(0.0)
    }

    pub fn upper(&self) -> f64 {
        self.to.unwrap_or(0.0)
    }

    /// Mean of both positive bounds, the single positive bound, or 0.
    pub fn average(&self) -> f64 {
        let positive = |v: Option<f64>| v.filter(|v| *v > 0.0);
        match (positive(self.from), positive(self.to)) {
            (Some(from), Some(to)) => (from + to) / 2.0,
            (Some(bound), None) | (None, Some(bound)) => bound,
            (None, None) => 0.0,
        }
    }
}

fn parse_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    amount.filter(|v: &f64| v.is_finite() && v.abs() < MAX_AMOUNT)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn texts_without_amounts_are_zero() {
        assert_eq!(salary_value(""), 0.0);
        assert_eq!(salary_value("   "), 0.0);
        assert_eq!(salary_value(SALARY_NOT_SPECIFIED), 0.0);
        assert_eq!(salary_value("по договорённости"), 0.0);
        assert_eq!(salary_value("руб."), 0.0);
    }

    #[test]
    fn single_amount_is_returned() {
        assert_eq!(salary_value("от 45000 руб."), 45000.0);
        assert_eq!(salary_value("до 80 000 RUR"), 80000.0);
        assert_eq!(salary_value("1 200 000"), 1_200_000.0);
    }

    #[test]
    fn ranges_return_the_mean() {
        assert_eq!(salary_value("от 80 000 до 120 000 руб."), 100000.0);
        assert_eq!(salary_value("50000–70000 RUR"), 60000.0);
    }

    #[test]
    fn narrow_no_break_space_is_stripped() {
        assert_eq!(salary_value("от 80\u{202f}000 руб."), 80000.0);
    }

    #[test]
    fn letters_glued_to_digits_are_not_amounts() {
        assert_eq!(salary_value("grade A3 USD"), 0.0);
    }

    #[test]
    fn blank_text_gets_placeholder() {
        assert_eq!(normalize_salary_text("  "), SALARY_NOT_SPECIFIED);
        assert_eq!(normalize_salary_text(" от 1000 "), "от 1000");
    }

    #[test]
    fn describes_structured_salary() {
        assert_eq!(describe_salary(Some(50000.0), Some(70000.0), "RUR"), "50000–70000 RUR");
        assert_eq!(describe_salary(Some(50000.0), None, "RUR"), "от 50000 RUR");
        assert_eq!(describe_salary(None, Some(70000.0), "USD"), "до 70000 USD");
        assert_eq!(describe_salary(None, None, "RUR"), "");
    }

    #[test]
    fn average_of_bounds() {
        let bounds = |from, to| SalaryBounds {
            from,
            to,
            currency: DEFAULT_CURRENCY.into(),
        };
        assert_eq!(bounds(Some(50000.0), Some(70000.0)).average(), 60000.0);
        assert_eq!(bounds(Some(50000.0), Some(0.0)).average(), 50000.0);
        assert_eq!(bounds(None, Some(30000.0)).average(), 30000.0);
        assert_eq!(bounds(Some(0.0), Some(0.0)).average(), 0.0);
        assert_eq!(bounds(None, None).average(), 0.0);
    }

    #[test]
    fn bounds_from_api_defaults() {
        let bounds = SalaryBounds::from_api(None);
        assert_eq!(bounds.from, None);
        assert_eq!(bounds.currency, "RUR");
        assert_eq!(bounds.lower(), 0.0);

        let bounds = SalaryBounds::from_api(Some(&json!({"from": "abc", "to": 9000, "currency": "USD"})));
        assert_eq!(bounds.from, None);
        assert_eq!(bounds.to, Some(9000.0));
        assert_eq!(bounds.currency, "USD");

        let bounds = SalaryBounds::from_api(Some(&json!({"from": "1500", "to": null, "currency": null})));
        assert_eq!(bounds.from, Some(1500.0));
        assert_eq!(bounds.currency, "RUR");
    }

    #[test]
    fn oversized_bounds_are_unparsable() {
        let bounds = SalaryBounds::from_api(Some(&json!({"from": 1e40, "to": "99999999999999999999"})));
        assert_eq!(bounds.from, None);
        assert_eq!(bounds.to, None);
        assert_eq!(bounds.average(), 0.0);

        let bounds = SalaryBounds::from_api(Some(&json!({"from": 999_999_999_999_999u64})));
        assert_eq!(bounds.from, Some(999_999_999_999_999.0));
    }

    #[test]
    fn formatted_amounts_fit_text_columns() {
        assert_eq!(format_amount(50000.0), "50000");
        assert_eq!(format_amount(1234.5), "1234.50");
        assert_eq!(format_amount(999_999_999_999_999.0), "999999999999999");
        assert!(format_amount(1e-300).len() <= 30);
        assert!(format_amount(-999_999_999_999_999.9).len() <= 30);
    }
}
