//! Small integer helpers used throughout the workspace. All of these treat
//! misuse as a logic error and panic; sizes and indices flowing in here are
//! validated at the API boundary.

/// Returns `2^n`. Panics if `n >= 64`.
#[inline]
pub const fn pow2(n: u32) -> u64 {
    assert!(n < 64, "n must be smaller than 64");
    1u64 << n
}

#[inline]
pub const fn is_power_of_two(n: u64) -> bool {
    n != 0 && n & (n - 1) == 0
}

/// Returns `floor(log2(n))`. Panics on zero.
#[inline]
pub const fn log2_floor(n: u64) -> u32 {
    assert!(n != 0, "log2 of 0 is undefined");
    63 - n.leading_zeros()
}

/// Returns `ceil(log2(n))`. Panics on zero.
#[inline]
pub const fn log2_ceil(n: u64) -> u32 {
    log2_floor(n) + if is_power_of_two(n) { 0 } else { 1 }
}

/// Returns `log2(n)` for `n` a power of two; panics otherwise.
#[inline]
pub const fn safe_log2(n: u64) -> u32 {
    assert!(is_power_of_two(n), "n must be a power of 2");
    log2_floor(n)
}

/// Returns `numerator / denominator`, panicking unless the division is exact.
#[inline]
pub const fn safe_div(numerator: u64, denominator: u64) -> u64 {
    assert!(denominator != 0, "denominator cannot be zero");
    assert!(
        numerator % denominator == 0,
        "denominator does not divide numerator"
    );
    numerator / denominator
}

#[inline]
pub const fn div_ceil(numerator: u64, denominator: u64) -> u64 {
    (numerator + denominator - 1) / denominator
}

/// Returns the value in `[0, n)` congruent to `x` modulo `n`. Unlike `%`,
/// this is well defined for negative `x`.
#[inline]
pub const fn modulo(x: i64, n: u64) -> u64 {
    let n_i = n as i64;
    let r = x % n_i;
    if r < 0 {
        (r + n_i) as u64
    } else {
        r as u64
    }
}

/// Rounds `n` up to the next power of two. Panics on zero.
#[inline]
pub const fn next_power_of_two(n: u64) -> u64 {
    pow2(log2_ceil(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pow2_and_log2() {
        assert_eq!(pow2(0), 1);
        assert_eq!(pow2(10), 1024);
        assert_eq!(log2_floor(1), 0);
        assert_eq!(log2_floor(1023), 9);
        assert_eq!(log2_ceil(1023), 10);
        assert_eq!(log2_ceil(1024), 10);
        assert_eq!(safe_log2(4096), 12);
    }

    #[test]
    #[should_panic]
    fn safe_log2_rejects_non_pow2() {
        safe_log2(48);
    }

    #[test]
    fn safe_div_exact() {
        assert_eq!(safe_div(84, 7), 12);
    }

    #[test]
    #[should_panic]
    fn safe_div_inexact() {
        safe_div(85, 7);
    }

    #[test]
    fn modulo_negative() {
        assert_eq!(modulo(-1, 8), 7);
        assert_eq!(modulo(-8, 8), 0);
        assert_eq!(modulo(17, 8), 1);
        assert_eq!(modulo(-17, 8), 7);
    }

    #[test]
    fn next_pow2() {
        assert_eq!(next_power_of_two(1), 1);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(64), 64);
    }
}
