//! Interval membership.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::compare::compare;

/// Which interval bounds are inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeOptions {
    /// `from < value < to`
    #[default]
    OpenInterval,
    /// `from <= value <= to`
    CloseInterval,
    /// `from < value <= to`
    LeftOpen,
    /// `from <= value < to`
    RightOpen,
}

impl RangeOptions {
    fn contains(self, lower: Ordering, upper: Ordering) -> bool {
        let above = match self {
            Self::OpenInterval | Self::LeftOpen => lower == Ordering::Greater,
            Self::CloseInterval | Self::RightOpen => lower != Ordering::Less,
        };
        let below = match self {
            Self::OpenInterval | Self::RightOpen => upper == Ordering::Less,
            Self::CloseInterval | Self::LeftOpen => upper != Ordering::Greater,
        };
        above && below
    }

    fn notation(self, from: &Value, to: &Value) -> String {
        match self {
            Self::OpenInterval => format!("({from}, {to})"),
            Self::CloseInterval => format!("[{from}, {to}]"),
            Self::LeftOpen => format!("({from}, {to}]"),
            Self::RightOpen => format!("[{from}, {to})"),
        }
    }
}

pub(super) fn check_range(
    value: &Value,
    from: &Value,
    to: &Value,
    options: RangeOptions,
) -> Result<(), String> {
    let (Some(lower), Some(upper)) = (compare(value, from), compare(value, to)) else {
        return Err(format!(
            "The value cannot be compared with the range {}.",
            options.notation(from, to)
        ));
    };
    if options.contains(lower, upper) {
        Ok(())
    } else {
        Err(format!(
            "The value is not within the range {}.",
            options.notation(from, to)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn open_interval_excludes_both_bounds() {
        let (from, to) = (json!(0), json!(10));
        assert!(check_range(&json!(5), &from, &to, RangeOptions::OpenInterval).is_ok());
        assert!(check_range(&json!(0), &from, &to, RangeOptions::OpenInterval).is_err());
        assert!(check_range(&json!(10), &from, &to, RangeOptions::OpenInterval).is_err());
    }

    #[test]
    fn close_interval_includes_both_bounds() {
        let (from, to) = (json!(0), json!(10));
        assert!(check_range(&json!(0), &from, &to, RangeOptions::CloseInterval).is_ok());
        assert!(check_range(&json!(10), &from, &to, RangeOptions::CloseInterval).is_ok());
        assert!(check_range(&json!(11), &from, &to, RangeOptions::CloseInterval).is_err());
    }

    #[test]
    fn half_open_intervals() {
        let (from, to) = (json!(0), json!(10));
        assert!(check_range(&json!(0), &from, &to, RangeOptions::LeftOpen).is_err());
        assert!(check_range(&json!(10), &from, &to, RangeOptions::LeftOpen).is_ok());
        assert!(check_range(&json!(0), &from, &to, RangeOptions::RightOpen).is_ok());
        assert!(check_range(&json!(10), &from, &to, RangeOptions::RightOpen).is_err());
    }

    #[test]
    fn wrong_type_has_its_own_message() {
        let out_of_range = check_range(&json!(20), &json!(0), &json!(10), RangeOptions::OpenInterval)
            .unwrap_err();
        let wrong_type = check_range(&json!("x"), &json!(0), &json!(10), RangeOptions::OpenInterval)
            .unwrap_err();
        assert_ne!(out_of_range, wrong_type);
        assert!(wrong_type.contains("cannot be compared"));
        assert!(out_of_range.contains("(0, 10)"));
    }
}
