//! Constraint Expressions
//!
//! A constraint is either a bare operand (`"1"`, implying equality) or a
//! call-like form such as `gte(500 gb)`. Operands go through unit
//! normalization before comparison.

use super::units::{normalize, normalize_numeric};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

// =============================================================================
// Operator
// =============================================================================

/// Comparison operator of a constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equal,
    GreaterThan,
    GreaterOrEqual,
    LessThan,
    LessOrEqual,
}

impl Default for Operator {
    fn default() -> Self {
        Operator::Equal
    }
}

impl Operator {
    /// Resolve a registered operator name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "=" | "equal" => Some(Operator::Equal),
            "gt" => Some(Operator::GreaterThan),
            "gte" => Some(Operator::GreaterOrEqual),
            "lt" => Some(Operator::LessThan),
            "lte" => Some(Operator::LessOrEqual),
            _ => None,
        }
    }

    /// Compare a device value (left) against a constraint operand (right)
    pub fn evaluate(&self, left: &str, right: &str) -> Result<bool> {
        let numeric = |cmp: fn(f64, f64) -> bool| -> Result<bool> {
            Ok(cmp(normalize_numeric(left)?, normalize_numeric(right)?))
        };

        match self {
            Operator::Equal => equal(left, right),
            Operator::GreaterThan => numeric(|l, r| l > r),
            Operator::GreaterOrEqual => numeric(|l, r| l >= r),
            Operator::LessThan => numeric(|l, r| l < r),
            Operator::LessOrEqual => numeric(|l, r| l <= r),
        }
    }
}

fn equal(left: &str, right: &str) -> Result<bool> {
    let left = normalize(left)?;
    let right = normalize(right)?;
    if left == right {
        return Ok(true);
    }
    // "1024.0" and "1024" denote the same magnitude
    Ok(match (left.trim().parse::<f64>(), right.trim().parse::<f64>()) {
        (Ok(l), Ok(r)) => l == r,
        _ => false,
    })
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Equal => write!(f, "equal"),
            Operator::GreaterThan => write!(f, "gt"),
            Operator::GreaterOrEqual => write!(f, "gte"),
            Operator::LessThan => write!(f, "lt"),
            Operator::LessOrEqual => write!(f, "lte"),
        }
    }
}

// =============================================================================
// Constraint
// =============================================================================

/// A parsed attribute constraint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// Attribute the constraint applies to
    pub attribute: String,
    /// Comparison operator
    pub operator: Operator,
    /// Right-hand operand, before unit normalization
    pub operand: String,
}

impl Constraint {
    /// Parse `expression` as the constraint on `attribute`
    pub fn parse(attribute: &str, expression: &str) -> Result<Self> {
        let (operator, operand) = match split_call(expression) {
            Some((name, argument)) => {
                let operator =
                    Operator::from_name(name).ok_or_else(|| Error::UnsupportedOperator {
                        operator: name.to_string(),
                        expression: expression.to_string(),
                    })?;
                (operator, argument.trim().to_string())
            }
            None => (Operator::Equal, expression.to_string()),
        };

        Ok(Self {
            attribute: attribute.to_string(),
            operator,
            operand,
        })
    }

    /// Whether `value` (the device's attribute) satisfies this constraint
    pub fn is_satisfied_by(&self, value: &str) -> Result<bool> {
        self.operator.evaluate(value, &self.operand)
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.operand)
    }
}

/// Split `name(first[, rest...])` into the name and its first argument.
///
/// The whole expression must be the call: a non-empty name without `(`, an
/// opening parenthesis, a non-empty first argument without `,`, optional
/// further non-empty arguments, and a closing parenthesis at the very end.
fn split_call(expression: &str) -> Option<(&str, &str)> {
    let open = expression.find('(')?;
    if open == 0 {
        return None;
    }
    let inner = expression[open + 1..].strip_suffix(')')?;
    let name = &expression[..open];

    let inner = inner.trim_start();
    let (first, rest) = match inner.find(',') {
        Some(comma) => (&inner[..comma], Some(inner[comma + 1..].trim_start())),
        None => (inner, None),
    };

    if first.is_empty() || rest.map_or(false, str::is_empty) {
        return None;
    }
    Some((name, first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_split_call() {
        assert_eq!(split_call("gte(500 gb)"), Some(("gte", "500 gb")));
        assert_eq!(split_call("lt( 3 )"), Some(("lt", "3 ")));
        assert_eq!(split_call("gt(1, 2)"), Some(("gt", "1")));
        assert_eq!(split_call("gt((1))"), Some(("gt", "(1)")));
        assert_eq!(split_call("500 gb"), None);
        assert_eq!(split_call("(500)"), None);
        assert_eq!(split_call("gt()"), None);
        assert_eq!(split_call("gt(1,)"), None);
        assert_eq!(split_call("gt(1) "), None);
    }

    #[test]
    fn test_parse_bare_operand_is_equal() {
        let c = Constraint::parse("rotational", "0").unwrap();
        assert_eq!(c.operator, Operator::Equal);
        assert_eq!(c.operand, "0");
    }

    #[test]
    fn test_parse_call_form() {
        let c = Constraint::parse("size", "gte(500 gb)").unwrap();
        assert_eq!(c.operator, Operator::GreaterOrEqual);
        assert_eq!(c.operand, "500 gb");

        let c = Constraint::parse("model", "=(Samsung)").unwrap();
        assert_eq!(c.operator, Operator::Equal);
        assert_eq!(c.operand, "Samsung");
    }

    #[test]
    fn test_parse_unsupported_operator() {
        let err = Constraint::parse("size", "between(1 tb, 2 tb)").unwrap_err();
        assert_matches!(
            &err,
            Error::UnsupportedOperator { operator, expression }
                if operator == "between" && expression == "between(1 tb, 2 tb)"
        );
        assert_eq!(
            err.to_string(),
            "Unsupported between operator in : between(1 tb, 2 tb)"
        );

        // The name is taken verbatim, spaces included
        assert_matches!(
            Constraint::parse("size", "gte (1 tb)"),
            Err(Error::UnsupportedOperator { .. })
        );
    }

    #[test]
    fn test_evaluate_numeric_with_units() {
        let c = Constraint::parse("size", "gte(500 gb)").unwrap();
        assert!(c.is_satisfied_by("1 tb").unwrap());
        assert!(c.is_satisfied_by("500 GB").unwrap());
        assert!(!c.is_satisfied_by("465.76 GB").unwrap());

        // 500 gib (10^9 based) is below 500 gb (2^30 based)
        assert!(!c.is_satisfied_by("500 gib").unwrap());

        let c = Constraint::parse("size", "lt(1 tb)").unwrap();
        assert!(c.is_satisfied_by("931.51 GB").unwrap());
        assert!(!c.is_satisfied_by("1.82 TB").unwrap());

        let c = Constraint::parse("size", "gt(1 tb)").unwrap();
        assert!(c.is_satisfied_by("1.82 TB").unwrap());
        assert!(!c.is_satisfied_by("1 tb").unwrap());

        let c = Constraint::parse("size", "lte(1 tb)").unwrap();
        assert!(c.is_satisfied_by("1 TB").unwrap());
        assert!(c.is_satisfied_by("931.51 GB").unwrap());
        assert!(!c.is_satisfied_by("1.82 TB").unwrap());
    }

    #[test]
    fn test_evaluate_equal() {
        let c = Constraint::parse("rotational", "1").unwrap();
        assert!(c.is_satisfied_by("1").unwrap());
        assert!(!c.is_satisfied_by("0").unwrap());

        let c = Constraint::parse("size", "1024 gb").unwrap();
        assert!(c.is_satisfied_by("1 tb").unwrap());

        let c = Constraint::parse("model", "Samsung SSD 860").unwrap();
        assert!(c.is_satisfied_by("Samsung SSD 860").unwrap());
        assert!(!c.is_satisfied_by("INTEL SSDSC2BB48").unwrap());

        let c = Constraint::parse("model", "Samsung SSD 860 EVO 1TB").unwrap();
        assert!(c.is_satisfied_by("Samsung SSD 860 EVO 1TB").unwrap());
        assert!(!c.is_satisfied_by("Samsung SSD 860 EVO 500GB").unwrap());
    }

    #[test]
    fn test_evaluate_numeric_rejects_text() {
        let c = Constraint::parse("model", "gt(3)").unwrap();
        assert_matches!(
            c.is_satisfied_by("Samsung"),
            Err(Error::NonNumericOperand { .. })
        );
    }
}
