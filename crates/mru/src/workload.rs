//! Synthetic call sequences driven through a memoized function

use std::cell::Cell;

use clap::ValueEnum;
use mrucache::{Arg, CallKey, Memoized, StatsSnapshot};
use serde::Serialize;
use tracing::debug;

/// Order in which key ids are requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// 0, 1, .., k-1, 0, 1, ..
    Cyclic,
    /// Every id twice in a row
    Repeat,
    /// 0 .. k-1 then back down to 0
    Sawtooth,
}

impl Pattern {
    /// Key id for call number `call` over `keys` distinct ids
    pub fn key_id(self, call: u64, keys: u64) -> u64 {
        match self {
            Pattern::Cyclic => call % keys,
            Pattern::Repeat => (call / 2) % keys,
            Pattern::Sawtooth => {
                if keys == 1 {
                    return 0;
                }
                let period = 2 * (keys - 1);
                let step = call % period;
                if step < keys {
                    step
                } else {
                    period - step
                }
            }
        }
    }
}

/// How a key id is turned into call arguments
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// A single integer argument
    Scalar,
    /// Nested list and map arguments plus a keyword
    Nested,
    /// A callable argument; never digestable
    Callable,
}

/// Workload settings
#[derive(Debug, Clone, Serialize)]
pub struct Workload {
    pub capacity: i64,
    pub accelerated: bool,
    pub pattern: Pattern,
    pub shape: Shape,
    pub keys: u64,
    pub calls: u64,
}

/// Outcome of a workload run
#[derive(Debug, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub workload: Workload,
    /// Times the wrapped function actually ran
    pub computed: u64,
    /// `None` when caching was disabled
    pub stats: Option<StatsSnapshot>,
}

/// Number of Collatz steps from `n` down to 1
fn collatz_steps(mut n: u64) -> u64 {
    let mut steps = 0;
    while n > 1 {
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
        steps += 1;
    }
    steps
}

/// Pull the key id back out of call arguments
fn key_id(key: &CallKey) -> u64 {
    match key.args().first() {
        Some(Arg::Int(id)) => *id as u64,
        Some(Arg::List(items)) => match items.first() {
            Some(Arg::Int(id)) => *id as u64,
            _ => 0,
        },
        Some(Arg::Callable(handle)) => handle.downcast_ref::<u64>().copied().unwrap_or(0),
        _ => 0,
    }
}

impl Workload {
    /// Build argument keys for every distinct id up front.
    ///
    /// Callable handles must be reused across calls to compare equal.
    fn keys(&self) -> Vec<CallKey> {
        (0..self.keys)
            .map(|id| match self.shape {
                Shape::Scalar => CallKey::positional([id as i64]),
                Shape::Nested => CallKey::new()
                    .arg(Arg::list([
                        Arg::Int(id as i64),
                        Arg::map([("parity", Arg::Int((id % 2) as i64))]),
                    ]))
                    .kwarg("label", format!("k{}", id)),
                Shape::Callable => CallKey::positional([Arg::callable(id)]),
            })
            .collect()
    }

    /// Run the workload and collect counters
    pub fn run(self) -> Report {
        let computed = Cell::new(0u64);
        let memo = Memoized::new(
            |key: &CallKey| {
                computed.set(computed.get() + 1);
                collatz_steps(key_id(key) + 1)
            },
            self.capacity,
            self.accelerated,
        );

        let keys = self.keys();
        if !keys.is_empty() {
            for call in 0..self.calls {
                let id = self.pattern.key_id(call, self.keys);
                let steps = memo.call(keys[id as usize].clone());
                debug!(call, id, steps, "call finished");
            }
        }

        let stats = memo.stats();
        Report {
            workload: self,
            computed: computed.get(),
            stats,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(capacity: i64, accelerated: bool, pattern: Pattern, shape: Shape) -> Workload {
        Workload {
            capacity,
            accelerated,
            pattern,
            shape,
            keys: 4,
            calls: 40,
        }
    }

    #[test]
    fn test_patterns() {
        let ids: Vec<u64> = (0..8).map(|c| Pattern::Cyclic.key_id(c, 3)).collect();
        assert_eq!(ids, vec![0, 1, 2, 0, 1, 2, 0, 1]);

        let ids: Vec<u64> = (0..6).map(|c| Pattern::Repeat.key_id(c, 3)).collect();
        assert_eq!(ids, vec![0, 0, 1, 1, 2, 2]);

        let ids: Vec<u64> = (0..8).map(|c| Pattern::Sawtooth.key_id(c, 3)).collect();
        assert_eq!(ids, vec![0, 1, 2, 1, 0, 1, 2, 1]);

        assert_eq!(Pattern::Sawtooth.key_id(5, 1), 0);
    }

    #[test]
    fn test_collatz() {
        assert_eq!(collatz_steps(1), 0);
        assert_eq!(collatz_steps(6), 8);
    }

    #[test]
    fn test_everything_fits() {
        for shape in [Shape::Scalar, Shape::Nested, Shape::Callable] {
            let report = workload(4, true, Pattern::Cyclic, shape).run();
            let stats = report.stats.unwrap();

            assert_eq!(report.computed, 4);
            assert_eq!(stats.misses, 4);
            assert_eq!(stats.hits, 36);
            if shape == Shape::Callable {
                assert_eq!(stats.fast_hits, 0);
            } else {
                assert_eq!(stats.fast_hits, 36);
            }
        }
    }

    #[test]
    fn test_disabled_recomputes() {
        let report = workload(0, false, Pattern::Repeat, Shape::Scalar).run();
        assert_eq!(report.computed, 40);
        assert!(report.stats.is_none());
    }

    #[test]
    fn test_repeat_hits_after_each_miss() {
        // Capacity 1: every new id evicts, every repeat hits
        let report = workload(1, false, Pattern::Repeat, Shape::Scalar).run();
        let stats = report.stats.unwrap();
        assert_eq!(stats.hits, 20);
        assert_eq!(stats.misses, 20);
        assert_eq!(stats.fast_hits, 0);
    }

    #[test]
    fn test_report_json() {
        let report = workload(2, true, Pattern::Cyclic, Shape::Scalar).run();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["capacity"], 2);
        assert_eq!(json["pattern"], "cyclic");
        assert!(json["stats"]["fast_hits"].is_u64());
    }
}
