//! Rolling extremes: highest/lowest values and their offsets
//!
//! A monotonic deque over a pre-allocated ring buffer of (value, index)
//! pairs gives amortized O(1) per step with no per-step heap allocation.
//! Duplicate extremes are popped on entry, so the deque front always holds
//! the *most recent* extremum; the BARS variants report its 0-based offset.

use crate::dispatch;
use crate::sums::require_window;
use crate::window::Policy;
use alpha_core::{Context, Result};

/// Rolling highest value over the last `periods` values.
pub fn hhv(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        extreme_group(policy, periods, xg, og, Extreme::Highest, Report::Value)
    })
}

/// Rolling lowest value over the last `periods` values.
pub fn llv(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        extreme_group(policy, periods, xg, og, Extreme::Lowest, Report::Value)
    })
}

/// 0-based offset back to the most recent rolling maximum.
pub fn hhvbars(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        extreme_group(policy, periods, xg, og, Extreme::Highest, Report::Offset)
    })
}

/// 0-based offset back to the most recent rolling minimum.
pub fn llvbars(ctx: &Context, x: &[f64], periods: usize) -> Result<Vec<f64>> {
    require_window("periods", periods)?;
    let policy = Policy::of(ctx);
    dispatch::unary(ctx, x, move |xg, og| {
        extreme_group(policy, periods, xg, og, Extreme::Lowest, Report::Offset)
    })
}

#[derive(Clone, Copy)]
enum Extreme {
    Highest,
    Lowest,
}

#[derive(Clone, Copy)]
enum Report {
    Value,
    Offset,
}

fn extreme_group(
    policy: Policy,
    periods: usize,
    xg: &[f64],
    og: &mut [f64],
    extreme: Extreme,
    report: Report,
) {
    let mut deque = MonoDeque::new(periods);
    // In skip mode the window slides over valid-value ordinals instead of
    // positions; `admitted` numbers the valid values seen so far.
    let mut admitted = 0usize;
    let mut last_nan: Option<usize> = None;

    for (i, (&v, o)) in xg.iter().zip(og.iter_mut()).enumerate() {
        let mut out = f64::NAN;
        if v.is_nan() {
            if !policy.skip {
                last_nan = Some(i);
            }
        } else {
            let idx = if policy.skip { admitted } else { i };
            admitted += 1;
            match extreme {
                Extreme::Highest => {
                    while deque.back().is_some_and(|(bv, _)| bv <= v) {
                        deque.pop_back();
                    }
                }
                Extreme::Lowest => {
                    while deque.back().is_some_and(|(bv, _)| bv >= v) {
                        deque.pop_back();
                    }
                }
            }
            deque.push_back(v, idx);
            while deque.front().is_some_and(|(_, fi)| fi + periods <= idx) {
                deque.pop_front();
            }
            if let Some((fv, fi)) = deque.front() {
                out = match report {
                    Report::Value => fv,
                    Report::Offset => (idx - fi) as f64,
                };
            }
            if !policy.skip {
                if let Some(nan_at) = last_nan {
                    if i < nan_at + periods {
                        out = f64::NAN;
                    }
                }
            }
        }
        if policy.warming_up(i, periods) {
            out = f64::NAN;
        }
        *o = out;
    }
}

/// Double-ended monotonic queue on a fixed ring buffer of (value, index).
struct MonoDeque {
    buf: Vec<(f64, usize)>,
    head: usize,
    len: usize,
}

impl MonoDeque {
    fn new(periods: usize) -> Self {
        MonoDeque {
            buf: vec![(0.0, 0); periods + 1],
            head: 0,
            len: 0,
        }
    }

    fn push_back(&mut self, value: f64, index: usize) {
        debug_assert!(self.len < self.buf.len());
        let pos = (self.head + self.len) % self.buf.len();
        self.buf[pos] = (value, index);
        self.len += 1;
    }

    fn pop_back(&mut self) {
        debug_assert!(self.len > 0);
        self.len -= 1;
    }

    fn pop_front(&mut self) {
        debug_assert!(self.len > 0);
        self.head = (self.head + 1) % self.buf.len();
        self.len -= 1;
    }

    fn front(&self) -> Option<(f64, usize)> {
        if self.len == 0 {
            None
        } else {
            Some(self.buf[self.head])
        }
    }

    fn back(&self) -> Option<(f64, usize)> {
        if self.len == 0 {
            None
        } else {
            Some(self.buf[(self.head + self.len - 1) % self.buf.len()])
        }
    }
}
