//! Folding several regions' values into one.

use std::cmp::Ordering;

use region_types::{Combinator, FlagValue, State};

/// Combines values gathered in precedence order.
///
/// Returns `None` if `values` is empty or holds nothing the combinator can
/// use. Values of the wrong kind for the combinator are skipped. Folding
/// stops at the combinator's absorbing value (deny, `false` for
/// [`Combinator::And`], `true` for [`Combinator::Or`]).
///
/// # Example
///
/// ```
/// use region_resolve::combine::combine;
/// use region_types::{Combinator, FlagValue};
///
/// let values = [FlagValue::Int(3), FlagValue::Int(9), FlagValue::Int(5)];
/// assert_eq!(combine(Combinator::Max, values.iter()), Some(FlagValue::Int(9)));
/// assert_eq!(combine(Combinator::FirstMatch, values.iter()), Some(FlagValue::Int(3)));
/// ```
pub fn combine<'a>(
    combinator: Combinator,
    values: impl IntoIterator<Item = &'a FlagValue>,
) -> Option<FlagValue> {
    let mut values = values.into_iter();
    match combinator {
        Combinator::FirstMatch => values.next().cloned(),
        Combinator::DenyOverrides => {
            State::combine(values.map(FlagValue::as_state)).map(FlagValue::State)
        }
        Combinator::And => {
            let mut result = None;
            for value in values.filter_map(FlagValue::as_bool) {
                if !value {
                    return Some(FlagValue::Bool(false));
                }
                result = Some(FlagValue::Bool(true));
            }
            result
        }
        Combinator::Or => {
            let mut result = None;
            for value in values.filter_map(FlagValue::as_bool) {
                if value {
                    return Some(FlagValue::Bool(true));
                }
                result = Some(FlagValue::Bool(false));
            }
            result
        }
        Combinator::Min => extreme(values, Ordering::Less),
        Combinator::Max => extreme(values, Ordering::Greater),
    }
}

fn extreme<'a>(
    values: impl Iterator<Item = &'a FlagValue>,
    wanted: Ordering,
) -> Option<FlagValue> {
    let mut best: Option<&FlagValue> = None;
    for value in values.filter(|v| v.kind().is_numeric()) {
        best = match best {
            Some(current) if compare_numeric(value, current) != wanted => Some(current),
            _ => Some(value),
        };
    }
    best.cloned()
}

/// Orders two numeric values. Integers compare exactly; anything involving
/// a float compares as floats with a total order.
#[must_use]
pub fn compare_numeric(a: &FlagValue, b: &FlagValue) -> Ordering {
    match (a, b) {
        (FlagValue::Int(x), FlagValue::Int(y)) => x.cmp(y),
        _ => {
            let x = a.as_float().unwrap_or(f64::NAN);
            let y = b.as_float().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deny_overrides() {
        let values = [FlagValue::ALLOW, FlagValue::DENY, FlagValue::ALLOW];
        assert_eq!(combine(Combinator::DenyOverrides, values.iter()), Some(FlagValue::DENY));
        let values = [FlagValue::ALLOW, FlagValue::ALLOW];
        assert_eq!(combine(Combinator::DenyOverrides, values.iter()), Some(FlagValue::ALLOW));
        assert_eq!(combine(Combinator::DenyOverrides, std::iter::empty()), None);
    }

    #[test]
    fn test_and_or() {
        let values = [FlagValue::Bool(true), FlagValue::Bool(false)];
        assert_eq!(combine(Combinator::And, values.iter()), Some(FlagValue::Bool(false)));
        assert_eq!(combine(Combinator::Or, values.iter()), Some(FlagValue::Bool(true)));

        let all_true = [FlagValue::Bool(true), FlagValue::Bool(true)];
        assert_eq!(combine(Combinator::And, all_true.iter()), Some(FlagValue::Bool(true)));
        let all_false = [FlagValue::Bool(false)];
        assert_eq!(combine(Combinator::Or, all_false.iter()), Some(FlagValue::Bool(false)));
    }

    #[test]
    fn test_min_max_mixed_numbers() {
        let values = [FlagValue::Int(4), FlagValue::Float(2.5), FlagValue::Int(7)];
        assert_eq!(combine(Combinator::Min, values.iter()), Some(FlagValue::Float(2.5)));
        assert_eq!(combine(Combinator::Max, values.iter()), Some(FlagValue::Int(7)));
    }

    #[test]
    fn test_ties_keep_first() {
        let values = [FlagValue::Int(5), FlagValue::Float(5.0)];
        assert_eq!(combine(Combinator::Max, values.iter()), Some(FlagValue::Int(5)));
    }

    #[test]
    fn test_wrong_kinds_skipped() {
        let values = [FlagValue::from("text"), FlagValue::Int(1)];
        assert_eq!(combine(Combinator::Max, values.iter()), Some(FlagValue::Int(1)));
        assert_eq!(combine(Combinator::And, values.iter()), None);
    }

    #[test]
    fn test_compare_numeric() {
        assert_eq!(
            compare_numeric(&FlagValue::Int(i64::MAX), &FlagValue::Int(i64::MAX - 1)),
            Ordering::Greater
        );
        assert_eq!(compare_numeric(&FlagValue::Float(1.0), &FlagValue::Int(1)), Ordering::Equal);
    }
}
