//! Branch-free selection.
//!
//! Environment transitions pick between a continued value and a freshly reset
//! value with arithmetic instead of `if`, so the same code runs unchanged over
//! a batch of lanes.

use num_traits::Num;

/// Returns `a * (1 - flag) + b * flag`.
///
/// `flag` must be `0` or `1`; any other value mixes the two inputs.
#[inline]
pub fn blend_by_flag<T: Num + Copy>(a: T, b: T, flag: T) -> T {
    a * (T::one() - flag) + b * flag
}

/// `if cond { if_true } else { if_false }`, written as a blend.
#[inline]
pub fn select<T: Num + Copy>(cond: bool, if_true: T, if_false: T) -> T {
    blend_by_flag(if_false, if_true, flag(cond))
}

/// Lift a boolean into the numeric `{0, 1}` domain.
#[inline]
pub fn flag<T: Num>(cond: bool) -> T {
    if cond { T::one() } else { T::zero() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_picks_by_flag() {
        assert_eq!(blend_by_flag(4i32, 9, 0), 4);
        assert_eq!(blend_by_flag(4i32, 9, 1), 9);
        assert_eq!(blend_by_flag(0.5f32, -2.0, 1.0), -2.0);
    }

    #[test]
    fn select_matches_if() {
        for cond in [false, true] {
            let expected = if cond { 7i64 } else { -3 };
            assert_eq!(select(cond, 7i64, -3), expected);
        }
        assert_eq!(flag::<i32>(true), 1);
        assert_eq!(flag::<f64>(false), 0.0);
    }
}
