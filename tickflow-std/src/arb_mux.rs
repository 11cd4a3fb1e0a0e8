//! Arbitrated mux.

use std::fmt;

use tickflow::{Module, SimError, Signal};
use tracing::debug;

use crate::{ArbPolicy, Arbiter, Ready, Valid, VrChannel};

/// Arbitrated mux: merges N channels into one. The output item is appended by the granted input index.
///
/// In packet mode, the grant is kept after a transfer until an item for which `is_last` holds has transferred.
pub struct ArbMux<V: Signal> {
    name: String,
    arbiter: Arbiter,
    is_last: Option<fn(&V) -> bool>,
}

impl<V: Signal> ArbMux<V> {
    /// Creates a new arbitrated mux that re-arbitrates after every transfer.
    pub fn new(name: &str, ports: usize, policy: ArbPolicy) -> Self {
        Self { name: name.to_string(), arbiter: Arbiter::new(ports, policy), is_last: None }
    }

    /// Creates a new arbitrated mux that holds its grant for whole packets.
    pub fn packet(name: &str, ports: usize, policy: ArbPolicy, is_last: fn(&V) -> bool) -> Self {
        Self { is_last: Some(is_last), ..Self::new(name, ports, policy) }
    }

    /// Returns the arbiter.
    pub fn arbiter(&self) -> &Arbiter { &self.arbiter }
}

impl<V: Signal> fmt::Debug for ArbMux<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbMux")
            .field("name", &self.name)
            .field("arbiter", &self.arbiter)
            .field("packet", &self.is_last.is_some())
            .finish()
    }
}

fn request<V: Signal>(i_fwd: &[Valid<V>]) -> Vec<bool> { i_fwd.iter().map(|lane| lane.valid).collect() }

impl<V: Signal> Module<Vec<VrChannel<V>>, VrChannel<(V, usize)>> for ArbMux<V> {
    fn name(&self) -> &str { &self.name }

    fn comb(&mut self, i_fwd: &Vec<Valid<V>>, o_bwd: &Ready) -> Result<(Valid<(V, usize)>, Vec<Ready>), SimError> {
        let grant = self.arbiter.grant(&request(i_fwd));

        let o_fwd = match grant {
            Some(granted) => Valid::valid((i_fwd[granted].inner.clone(), granted)),
            None => Valid::invalid(),
        };
        let i_bwd = (0..i_fwd.len()).map(|k| Ready::new(grant == Some(k) && o_bwd.ready)).collect();

        Ok((o_fwd, i_bwd))
    }

    fn tick(&mut self, i_fwd: &Vec<Valid<V>>, o_bwd: &Ready) -> Result<(), SimError> {
        let (o_fwd, _) = self.comb(i_fwd, o_bwd)?;
        let transferred = o_fwd.fire(o_bwd);
        let release = match self.is_last {
            Some(is_last) => transferred && is_last(&o_fwd.inner.0),
            None => true,
        };

        if transferred {
            debug!(mux = %self.name, grant = o_fwd.inner.1, "granted");
        }
        self.arbiter.update(&request(i_fwd), transferred, release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::cycle;

    fn offer(items: &[Option<u8>]) -> Vec<Valid<u8>> {
        items.iter().map(|item| item.map_or(Valid::invalid(), Valid::valid)).collect()
    }

    #[test]
    fn stamps_grant_and_routes_ready() {
        let mut mux = ArbMux::<u8>::new("mux", 3, ArbPolicy::RoundRobin);
        let (o_fwd, i_bwd) = cycle(&mut mux, &offer(&[None, Some(7), Some(8)]), &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid((7, 1)));
        assert_eq!(i_bwd, vec![Ready::new(false), Ready::new(true), Ready::new(false)]);

        let (o_fwd, _) = cycle(&mut mux, &offer(&[None, Some(9), Some(8)]), &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid((8, 2)));
    }

    #[test]
    fn stalled_output_keeps_its_item() {
        let mut mux = ArbMux::<u8>::new("mux", 2, ArbPolicy::FixedPriority);
        let (o_fwd, _) = cycle(&mut mux, &offer(&[None, Some(4)]), &Ready::new(false));
        assert_eq!(o_fwd, Valid::valid((4, 1)));

        // The higher-priority input arrives while the output is stalled.
        for _ in 0..3 {
            let (o_fwd, i_bwd) = cycle(&mut mux, &offer(&[Some(3), Some(4)]), &Ready::new(false));
            assert_eq!(o_fwd, Valid::valid((4, 1)));
            assert!(i_bwd.iter().all(|r| !r.ready));
        }
        let (o_fwd, _) = cycle(&mut mux, &offer(&[Some(3), Some(4)]), &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid((4, 1)));
        let (o_fwd, _) = cycle(&mut mux, &offer(&[Some(3), None]), &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid((3, 0)));
    }

    #[test]
    fn packet_mode_holds_until_last() {
        let mut mux = ArbMux::<u8>::packet("mux", 2, ArbPolicy::RoundRobin, |item| *item == 0);
        let both = |a, b| offer(&[Some(a), Some(b)]);
        assert_eq!(cycle(&mut mux, &both(1, 5), &Ready::new(true)).0, Valid::valid((1, 0)));
        assert_eq!(cycle(&mut mux, &both(2, 5), &Ready::new(true)).0, Valid::valid((2, 0)));
        assert_eq!(cycle(&mut mux, &both(0, 5), &Ready::new(true)).0, Valid::valid((0, 0)));
        assert_eq!(cycle(&mut mux, &both(1, 5), &Ready::new(true)).0, Valid::valid((5, 1)));
    }
}
