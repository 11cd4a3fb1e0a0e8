//! Arbiter.

use serde::{Deserialize, Serialize};

/// Arbitration policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbPolicy {
    /// Rotating priority: the search for the next grant starts just after the last granted index.
    #[default]
    RoundRobin,

    /// Static priority: the lowest requesting index wins.
    FixedPriority,
}

/// Arbiter over `ports` requesters.
///
/// A grant is held while the granted requester is offered but not yet transferred, so that an offered item is never
/// swapped for another. After a transfer the grant is released, unless the caller asks to keep it (e.g. until the
/// last item of a packet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arbiter {
    policy: ArbPolicy,
    ports: usize,
    /// Last granted index whose item transferred. Only meaningful for round robin.
    last: usize,
    /// Grant kept from the previous tick.
    held: Option<usize>,
}

impl Arbiter {
    /// Creates a new arbiter. Round robin starts its search at index 0.
    pub fn new(ports: usize, policy: ArbPolicy) -> Self {
        Self { policy, ports, last: ports.saturating_sub(1), held: None }
    }

    /// Returns the policy.
    pub fn policy(&self) -> ArbPolicy { self.policy }

    /// Returns the number of requesters.
    pub fn ports(&self) -> usize { self.ports }

    /// Returns the grant kept from the previous tick, if any.
    pub fn held(&self) -> Option<usize> { self.held }

    /// Returns the requester granted under the given requests, or `None` if nobody requests.
    pub fn grant(&self, request: &[bool]) -> Option<usize> {
        let requesting = |k: usize| request.get(k).copied().unwrap_or(false);

        if let Some(held) = self.held.filter(|held| requesting(*held)) {
            return Some(held);
        }

        match self.policy {
            ArbPolicy::FixedPriority => (0..self.ports).find(|k| requesting(*k)),
            ArbPolicy::RoundRobin => {
                (1..=self.ports).map(|offset| (self.last + offset) % self.ports).find(|k| requesting(*k))
            }
        }
    }

    /// Advances the arbitration state at the end of a tick.
    ///
    /// `transferred` tells whether the granted requester's item transferred in this tick, and `release` whether its
    /// grant may be given up after the transfer.
    pub fn update(&mut self, request: &[bool], transferred: bool, release: bool) {
        self.held = match self.grant(request) {
            None => None,
            Some(granted) if transferred => {
                self.last = granted;
                if release {
                    None
                } else {
                    Some(granted)
                }
            }
            Some(granted) => Some(granted),
        };
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    /// Runs the arbiter for `ticks` ticks under a constant request pattern where every grant transfers.
    fn grants(arbiter: &mut Arbiter, request: &[bool], ticks: usize) -> Vec<usize> {
        (0..ticks)
            .filter_map(|_| {
                let granted = arbiter.grant(request);
                arbiter.update(request, granted.is_some(), true);
                granted
            })
            .collect()
    }

    #[test]
    fn fixed_priority_prefers_lowest_index() {
        let mut arbiter = Arbiter::new(4, ArbPolicy::FixedPriority);
        assert_eq!(grants(&mut arbiter, &[false, true, false, true], 3), vec![1, 1, 1]);
        assert_eq!(arbiter.grant(&[false; 4]), None);
    }

    #[test]
    fn round_robin_rotates() {
        let mut arbiter = Arbiter::new(3, ArbPolicy::RoundRobin);
        assert_eq!(grants(&mut arbiter, &[true, true, true], 6), vec![0, 1, 2, 0, 1, 2]);
        assert_eq!(grants(&mut arbiter, &[true, false, true], 4), vec![0, 2, 0, 2]);
    }

    #[test]
    fn grant_is_held_until_transfer() {
        let mut arbiter = Arbiter::new(2, ArbPolicy::FixedPriority);
        assert_eq!(arbiter.grant(&[false, true]), Some(1));
        arbiter.update(&[false, true], false, true);

        // Index 0 now requests too, but index 1 is still offered.
        assert_eq!(arbiter.grant(&[true, true]), Some(1));
        arbiter.update(&[true, true], true, true);
        assert_eq!(arbiter.grant(&[true, true]), Some(0));
    }

    #[test]
    fn packet_grant_is_kept_until_released() {
        let mut arbiter = Arbiter::new(2, ArbPolicy::RoundRobin);
        assert_eq!(arbiter.grant(&[true, true]), Some(0));
        arbiter.update(&[true, true], true, false);
        assert_eq!(arbiter.grant(&[true, true]), Some(0));
        arbiter.update(&[true, true], true, true);
        assert_eq!(arbiter.grant(&[true, true]), Some(1));
    }

    proptest! {
        #[test]
        fn round_robin_grants_everyone_within_n(
            request in prop::collection::vec(any::<bool>(), 1..9)
                .prop_filter("needs a requester", |r| r.contains(&true)),
            warmup in 0usize..20,
        ) {
            let mut arbiter = Arbiter::new(request.len(), ArbPolicy::RoundRobin);
            grants(&mut arbiter, &request, warmup);

            let requesters = request.iter().filter(|r| **r).count();
            let window = grants(&mut arbiter, &request, requesters);
            for (k, requesting) in request.iter().enumerate() {
                prop_assert_eq!(window.contains(&k), *requesting);
            }
        }
    }
}
