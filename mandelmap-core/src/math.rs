//! Floor division and floor modulo.
//!
//! Plane coordinates left of or below the origin are negative, and tile
//! indices into the wraparound grid are derived from them. Truncating
//! division would put `-1` into tile `0`, so every conversion rounds toward
//! negative infinity instead.
//!
//! The `f64` forms exist because tile shifts are first measured in plane
//! units, where a long pan cannot overflow, and only narrowed to a tile
//! coordinate once they are known to be small.

/// Division and remainder rounding toward negative infinity.
///
/// Divisors must be positive. For every `a` and positive `b`:
/// `a.floor_div(b) * b + a.floor_mod(b) == a` and `0 <= a.floor_mod(b) < b`.
pub trait FloorArith: Copy {
    fn floor_div(self, divisor: Self) -> Self;
    fn floor_mod(self, divisor: Self) -> Self;
}

macro_rules! impl_floor_arith_int {
    ($($t:ty),*) => {
        $(
            impl FloorArith for $t {
                #[inline]
                fn floor_div(self, divisor: Self) -> Self {
                    debug_assert!(divisor > 0, "floor_div requires a positive divisor");
                    // Euclidean and floor division agree for positive divisors.
                    self.div_euclid(divisor)
                }

                #[inline]
                fn floor_mod(self, divisor: Self) -> Self {
                    debug_assert!(divisor > 0, "floor_mod requires a positive divisor");
                    self.rem_euclid(divisor)
                }
            }
        )*
    };
}

impl_floor_arith_int!(i16, i32, i64);

/// Quotient and remainder for `f64`, corrected so the remainder lands in
/// `[0, divisor)` even when `dividend / divisor` rounds across an integer.
fn div_mod_f64(dividend: f64, divisor: f64) -> (f64, f64) {
    debug_assert!(divisor > 0.0, "floor division requires a positive divisor");
    let mut quotient = (dividend / divisor).floor();
    let mut remainder = dividend - quotient * divisor;
    if remainder >= divisor {
        quotient += 1.0;
        remainder -= divisor;
    } else if remainder < 0.0 {
        quotient -= 1.0;
        remainder += divisor;
    }
    // A tiny negative dividend can still round up to exactly `divisor`.
    if remainder >= divisor || remainder < 0.0 {
        remainder = 0.0;
    }
    (quotient, remainder)
}

impl FloorArith for f64 {
    /// Whole quotient as an `f64`, rounded toward negative infinity.
    #[inline]
    fn floor_div(self, divisor: Self) -> Self {
        div_mod_f64(self, divisor).0
    }

    #[inline]
    fn floor_mod(self, divisor: Self) -> Self {
        div_mod_f64(self, divisor).1
    }
}

/// Free-function form of [`FloorArith::floor_div`].
#[inline]
pub fn floor_div<T: FloorArith>(dividend: T, divisor: T) -> T {
    dividend.floor_div(divisor)
}

/// Free-function form of [`FloorArith::floor_mod`].
#[inline]
pub fn floor_mod<T: FloorArith>(dividend: T, divisor: T) -> T {
    dividend.floor_mod(divisor)
}
