//! Cross-sectional neutralization against category means

use alpha_core::{Context, Error, Result};
use std::collections::HashMap;

/// Subtract, at each time index, the mean of `value` over the groups that
/// share the same `category` at that index.
///
/// A NaN category or value propagates to the output and contributes
/// nothing to its category mean.
pub fn neutralize(ctx: &Context, category: &[f64], value: &[f64]) -> Result<Vec<f64>> {
    if category.len() != value.len() {
        return Err(Error::bad_shape(format!(
            "paired inputs have lengths {} and {}",
            category.len(),
            value.len()
        )));
    }
    let layout = ctx.layout(value.len())?;
    let (g, t) = (layout.groups(), layout.group_len());
    let mut out = vec![f64::NAN; value.len()];
    let mut acc: HashMap<u64, (f64, usize)> = HashMap::with_capacity(g);
    for time in 0..t {
        acc.clear();
        for gi in 0..g {
            let i = gi * t + time;
            let (c, v) = (category[i], value[i]);
            if c.is_nan() || v.is_nan() {
                continue;
            }
            let entry = acc.entry(category_key(c)).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
        for gi in 0..g {
            let i = gi * t + time;
            let (c, v) = (category[i], value[i]);
            if c.is_nan() || v.is_nan() {
                continue;
            }
            if let Some(&(sum, n)) = acc.get(&category_key(c)) {
                out[i] = v - sum / n as f64;
            }
        }
    }
    Ok(out)
}

/// Hash key for a non-NaN category value; folds -0.0 into +0.0.
fn category_key(c: f64) -> u64 {
    if c == 0.0 {
        0.0f64.to_bits()
    } else {
        c.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (i, (&a, &e)) in actual.iter().zip(expected).enumerate() {
            let ok = (a.is_nan() && e.is_nan()) || (a - e).abs() < 1e-9;
            assert!(ok, "index {i}: got {a}, expected {e}");
        }
    }

    #[test]
    fn residual_against_category_mean() {
        // Three groups of four bars, group-major. At t=1 the categories are
        // (1, 2, 3): every group is alone in its category, residual 0.
        let ctx = Context::new(3);
        let category = [
            1.0, 1.0, 1.0, 1.0, //
            1.0, 2.0, 1.0, 2.0, //
            1.0, 3.0, 3.0, 1.0,
        ];
        let value = [
            1.0, 2.0, 3.0, 4.0, //
            5.0, 6.0, 7.0, 8.0, //
            9.0, 10.0, 11.0, f64::NAN,
        ];
        let y = neutralize(&ctx, &category, &value).unwrap();
        // t=0: all three share category 1, mean 5 -> residuals -4, 0, 4
        assert_close(&y[0..1], &[-4.0]);
        assert_close(&y[4..5], &[0.0]);
        assert_close(&y[8..9], &[4.0]);
        // t=1: categories 1/2/3 are singletons
        assert_close(&y[1..2], &[0.0]);
        assert_close(&y[5..6], &[0.0]);
        assert_close(&y[9..10], &[0.0]);
        // t=2: categories (1, 1, 3); mean of category 1 over (3, 7) is 5
        assert_close(&y[2..3], &[-2.0]);
        assert_close(&y[6..7], &[2.0]);
        assert_close(&y[10..11], &[0.0]);
        // t=3: group 2's value is NaN and stays NaN
        assert!(y[11].is_nan());
        // remaining cat-1 members at t=3: values (4, .) with group 1 in cat 2
        assert_close(&y[3..4], &[0.0]);
        assert_close(&y[7..8], &[0.0]);
    }

    #[test]
    fn nan_category_propagates() {
        let ctx = Context::new(2);
        let category = [f64::NAN, 1.0];
        let value = [1.0, 2.0];
        let y = neutralize(&ctx, &category, &value).unwrap();
        assert!(y[0].is_nan());
        assert_close(&y[1..], &[0.0]);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let ctx = Context::new(1);
        assert!(neutralize(&ctx, &[1.0], &[1.0, 2.0])
            .unwrap_err()
            .is_shape());
    }
}
