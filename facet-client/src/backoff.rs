// Copyright (c) 2023 Espresso Systems (espressosys.com)
// This file is part of the Facet L1-inbox tooling.
//
// This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License as published by the Free Software Foundation, either version 3 of the License, or any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Bounded exponential backoff.

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Something that can wait.
///
/// Production code sleeps on the async-std timer. Tests substitute an implementation which only
/// records the requested delays.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct AsyncStdSleeper;

#[async_trait]
impl Sleeper for AsyncStdSleeper {
    async fn sleep(&self, delay: Duration) {
        async_std::task::sleep(delay).await
    }
}

/// A retry schedule: up to `max_attempts` attempts, where the wait after the `n`th failed attempt
/// is `base_delay * 2^(n-1)`. There is no jitter and no cap on a single delay.
///
/// A schedule always makes at least one attempt, even if `max_attempts` is 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl Backoff {
    pub fn new(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// The number of attempts a run of this schedule makes.
    pub fn attempts(&self) -> usize {
        self.max_attempts.max(1)
    }

    /// The delays between consecutive attempts, of which there are `attempts() - 1`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let base = self.base_delay;
        (1..self.attempts()).map(move |n| {
            let factor = u32::try_from(n - 1)
                .map(|exp| 2u32.saturating_pow(exp))
                .unwrap_or(u32::MAX);
            base.saturating_mul(factor)
        })
    }

    /// The longest time a full run of this schedule spends waiting.
    pub fn total_delay(&self) -> Duration {
        self.delays().fold(Duration::ZERO, Duration::saturating_add)
    }

    /// Run `op` until it yields a value or the attempts run out.
    ///
    /// `op` receives the 1-based attempt number. `Ok(None)` means "not yet" and schedules another
    /// attempt; an error ends the run immediately. The result is `Ok(None)` if every attempt came
    /// back empty.
    pub async fn retry<T, E, F, Fut>(
        &self,
        mut op: F,
        sleeper: &impl Sleeper,
    ) -> Result<Option<T>, E>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let mut delays = self.delays();
        let attempts = self.attempts();
        for attempt in 1..=attempts {
            if let Some(value) = op(attempt).await? {
                return Ok(Some(value));
            }
            match delays.next() {
                Some(delay) => {
                    tracing::info!(
                        "attempt {attempt}/{attempts} came back empty, retrying in {delay:?}"
                    );
                    sleeper.sleep(delay).await;
                }
                None => break,
            }
        }
        Ok(None)
    }
}
