//! Determinism utilities: stable ordering and first-wins arg-max.
//!
//! Every ranking in the engine walks candidates in a fixed canonical order and
//! keeps the first maximum, so equal amounts always resolve the same way.

use core::cmp::Ordering;

use crate::entities::{GapKind, StreamKind};

/* -------------------------------------------------------------------------- */
/*                               Stable Ordering                              */
/* -------------------------------------------------------------------------- */

/// Provide a **total**, stable order for values that must sort canonically.
pub trait StableOrd {
    fn stable_cmp(&self, other: &Self) -> Ordering;
}

impl StableOrd for StreamKind {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.order_index().cmp(&other.order_index())
    }
}

impl StableOrd for GapKind {
    #[inline]
    fn stable_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

/// Sort **in place** into canonical order.
#[inline]
pub fn sort_canonical<T: StableOrd>(xs: &mut [T]) {
    xs.sort_by(|a, b| a.stable_cmp(b));
}

/* -------------------------------------------------------------------------- */
/*                                   Arg-max                                  */
/* -------------------------------------------------------------------------- */

/// Arg-max over `(key, amount)` pairs in iteration order.
///
/// Ties keep the first candidate. Non-finite amounts are skipped. Returns
/// `None` when the input is empty or the maximum is not strictly positive.
pub fn argmax_first_positive<K, I>(items: I) -> Option<(K, f64)>
where
    I: IntoIterator<Item = (K, f64)>,
{
    let mut best: Option<(K, f64)> = None;
    for (k, v) in items {
        if !v.is_finite() {
            continue;
        }
        match &best {
            Some((_, b)) if v <= *b => {}
            _ => best = Some((k, v)),
        }
    }
    best.filter(|(_, v)| *v > 0.0)
}

/* ---------------------------------- Tests --------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn streams_sort_by_canonical_index() {
        let mut v = vec![
            StreamKind::MixedUserCharge,
            StreamKind::PropertyTax,
            StreamKind::LongTermUserCharge,
            StreamKind::License,
        ];
        sort_canonical(&mut v);
        assert_eq!(
            v,
            vec![
                StreamKind::PropertyTax,
                StreamKind::License,
                StreamKind::LongTermUserCharge,
                StreamKind::MixedUserCharge,
            ]
        );
    }

    #[test]
    fn first_maximum_wins() {
        let got = argmax_first_positive([("a", 5.0), ("b", 9.0), ("c", 9.0)]);
        assert_eq!(got, Some(("b", 9.0)));
    }

    #[test]
    fn non_positive_or_empty_is_none() {
        assert_eq!(argmax_first_positive(Vec::<(u8, f64)>::new()), None);
        assert_eq!(argmax_first_positive([(1u8, 0.0), (2, 0.0)]), None);
        assert_eq!(argmax_first_positive([(1u8, -3.0), (2, -1.0)]), None);
        assert_eq!(argmax_first_positive([(1u8, f64::NAN), (2, 4.0)]), Some((2, 4.0)));
    }
}
