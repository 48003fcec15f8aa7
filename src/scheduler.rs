//! Bounded-concurrency scheduling of harvest units.
//!
//! Units are submitted in date order and drained in completion order. At
//! most `limit` unit futures are polled at any instant; the rest wait for a
//! free slot. Everything runs on the calling task, so no unit needs to be
//! `Send` and the consumer can own all mutable state without locks.

use crate::models::{HarvestResult, HarvestUnit};
use futures::FutureExt;
use futures::stream::{self, Stream, StreamExt};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::error;

pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskScheduler {
    limit: usize,
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl TaskScheduler {
    /// A limit of zero is treated as one.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run `work` over every unit and yield one result per unit as each
    /// completes.
    ///
    /// A unit whose future panics yields an empty result; the panic never
    /// reaches the other units or the consumer.
    pub fn run<'a, W, Fut>(
        self,
        units: Vec<HarvestUnit>,
        work: W,
    ) -> impl Stream<Item = HarvestResult> + 'a
    where
        W: Fn(HarvestUnit) -> Fut + 'a,
        Fut: Future<Output = HarvestResult> + 'a,
    {
        stream::iter(units)
            .map(move |unit| {
                let fallback = unit.clone();
                AssertUnwindSafe(work(unit))
                    .catch_unwind()
                    .map(move |outcome| {
                        outcome.unwrap_or_else(|_| {
                            error!(
                                date = %fallback.date,
                                url = %fallback.index_url,
                                "Harvest unit panicked; recording it as empty"
                            );
                            HarvestResult::empty(fallback)
                        })
                    })
            })
            .buffer_unordered(self.limit)
    }
}
