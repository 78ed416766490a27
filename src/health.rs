//! Liveness tracking for the Invidious mirror pool.
//!
//! Each instance runs a small state machine: `Healthy` until a
//! transport failure marks it `Suspected`, `Unhealthy` once failures
//! reach the policy threshold. Unhealthy instances sit out an exclusion
//! window and then get a probation pick: one success restores them, one
//! failure re-excludes them. How many failures and how long the window
//! lasts are policy values, not code.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tracing::{debug, warn};

/// Tunables for the per-instance state machine.
#[derive(Debug, Clone, Copy)]
pub struct HealthPolicy {
    /// Consecutive transport failures before an instance is excluded.
    pub failure_threshold: u32,
    /// How long an excluded instance stays out of rotation.
    pub exclusion: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 2,
            exclusion: Duration::from_secs(300),
        }
    }
}

/// Source of mirror candidates and sink for attempt outcomes.
///
/// Only transport-level failures belong in `report_failure`; a mirror
/// that answered with unusable data stays in rotation.
pub trait HealthRegistry: Send + Sync {
    fn healthy_instance(&self) -> Option<String>;
    fn report_success(&self, base_url: &str);
    fn report_failure(&self, base_url: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InstanceState {
    Healthy,
    Suspected,
    Unhealthy,
}

#[derive(Debug)]
struct InstanceRecord {
    state: InstanceState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

impl InstanceRecord {
    fn new() -> Self {
        Self {
            state: InstanceState::Healthy,
            consecutive_failures: 0,
            last_failure: None,
        }
    }

    fn eligible(&self, policy: &HealthPolicy, now: Instant) -> bool {
        match self.state {
            InstanceState::Healthy | InstanceState::Suspected => true,
            InstanceState::Unhealthy => match self.last_failure {
                Some(at) => now.duration_since(at) >= policy.exclusion,
                None => true,
            },
        }
    }
}

struct Inner {
    order: Vec<String>,
    records: HashMap<String, InstanceRecord>,
    cursor: usize,
}

/// The one piece of shared mutable state in the engine. Concurrent
/// resolution calls hit it freely; per-call atomicity is all it
/// guarantees.
pub struct InstanceRegistry {
    policy: HealthPolicy,
    inner: Mutex<Inner>,
}

impl InstanceRegistry {
    pub fn new(instances: Vec<String>, policy: HealthPolicy) -> Self {
        // Normalization can collapse distinct config entries into the
        // same URL; keep the first occurrence of each.
        let mut order: Vec<String> = Vec::with_capacity(instances.len());
        for url in instances {
            let url = url.trim_end_matches('/').to_string();
            if !order.contains(&url) {
                order.push(url);
            }
        }
        order.shuffle(&mut rand::thread_rng());

        let records = order
            .iter()
            .map(|url| (url.clone(), InstanceRecord::new()))
            .collect();

        Self {
            policy,
            inner: Mutex::new(Inner {
                order,
                records,
                cursor: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HealthRegistry for InstanceRegistry {
    /// Round-robin over eligible instances. The cursor advances past
    /// each returned candidate, so a just-failed instance is not handed
    /// out again while another eligible one exists.
    fn healthy_instance(&self) -> Option<String> {
        let mut inner = self.inner.lock();
        if inner.order.is_empty() {
            return None;
        }
        let now = Instant::now();
        let len = inner.order.len();
        for step in 0..len {
            let idx = (inner.cursor + step) % len;
            let url = inner.order[idx].clone();
            let eligible = inner
                .records
                .get(&url)
                .map(|rec| rec.eligible(&self.policy, now))
                .unwrap_or(false);
            if eligible {
                inner.cursor = (idx + 1) % len;
                return Some(url);
            }
        }
        None
    }

    fn report_success(&self, base_url: &str) {
        let mut inner = self.inner.lock();
        if let Some(rec) = inner.records.get_mut(base_url) {
            if rec.state != InstanceState::Healthy {
                debug!("Invidious instance {} recovered", base_url);
            }
            rec.state = InstanceState::Healthy;
            rec.consecutive_failures = 0;
            rec.last_failure = None;
        }
    }

    fn report_failure(&self, base_url: &str) {
        let mut inner = self.inner.lock();
        let threshold = self.policy.failure_threshold;
        if let Some(rec) = inner.records.get_mut(base_url) {
            rec.consecutive_failures += 1;
            rec.last_failure = Some(Instant::now());
            if rec.consecutive_failures >= threshold {
                if rec.state != InstanceState::Unhealthy {
                    warn!(
                        "Invidious instance {} marked unhealthy after {} failures",
                        base_url, rec.consecutive_failures
                    );
                }
                rec.state = InstanceState::Unhealthy;
            } else {
                rec.state = InstanceState::Suspected;
            }
        }
    }
}
