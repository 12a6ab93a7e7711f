//! Helper functions from the Vorbis I specification.

/// Number of bits needed to represent `v`; `ilog(0)` is 0.
///
/// Named after the function in the Vorbis specification.
#[inline]
pub fn ilog(v: u32) -> u8 {
    (32 - v.leading_zeros()) as u8
}

/// Number of quantized values in a type-1 (multiplicative) codebook lookup
/// table: the unique `n` with `n^dimensions <= entries < (n+1)^dimensions`.
pub fn book_map_type1_quantvals(entries: u32, dimensions: u32) -> u32 {
    if dimensions == 0 {
        return 0;
    }

    let pow = |base: u32| -> u64 {
        let mut acc = 1u64;
        for _ in 0..dimensions {
            acc = acc.saturating_mul(base as u64);
        }
        acc
    };

    // Seed near the d-th root, then walk to the fixed point.
    let bits = ilog(entries) as u32;
    let mut vals = entries >> ((bits - 1) * (dimensions - 1) / dimensions);
    loop {
        if pow(vals) > entries as u64 {
            vals -= 1;
        } else if pow(vals + 1) <= entries as u64 {
            vals += 1;
        } else {
            return vals;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ilog_laws() {
        assert_eq!(ilog(0), 0);
        assert_eq!(ilog(1), 1);
        assert_eq!(ilog(2), 2);
        assert_eq!(ilog(3), 2);
        assert_eq!(ilog(4), 3);
        assert_eq!(ilog(7), 3);
        assert_eq!(ilog(255), 8);
        assert_eq!(ilog(256), 9);
        assert_eq!(ilog(u32::MAX), 32);

        // ilog(2^k) = k + 1, and 2^(ilog(v)-1) <= v < 2^ilog(v).
        for k in 0..31 {
            assert_eq!(ilog(1 << k), k as u8 + 1);
        }
        for v in 1u32..2000 {
            let n = ilog(v) as u32;
            assert!(1u64 << (n - 1) <= v as u64);
            assert!((v as u64) < 1u64 << n);
        }
    }

    #[test]
    fn quantvals_known_cases() {
        assert_eq!(book_map_type1_quantvals(8, 2), 2);
        assert_eq!(book_map_type1_quantvals(9, 2), 3);
        assert_eq!(book_map_type1_quantvals(16, 2), 4);
        assert_eq!(book_map_type1_quantvals(27, 3), 3);
        assert_eq!(book_map_type1_quantvals(1, 1), 1);
        assert_eq!(book_map_type1_quantvals(625, 4), 5);
    }

    #[test]
    fn quantvals_is_the_unique_fixed_point() {
        for dims in 1u32..=6 {
            for entries in 1u32..500 {
                let n = book_map_type1_quantvals(entries, dims) as u64;
                let pow = |b: u64| (0..dims).fold(1u64, |a, _| a.saturating_mul(b));
                assert!(pow(n) <= entries as u64, "e={entries} d={dims}");
                assert!(pow(n + 1) > entries as u64, "e={entries} d={dims}");
            }
        }
    }
}
