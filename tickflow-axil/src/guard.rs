//! Outstanding-request guard.

use tickflow::{DynFsm, Signal};
use tickflow_std::{Ready, UniChannel, Valid, VrChannel};

/// Guard state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardState {
    /// May accept a new request. `accepted[k]` is set once lane `k` of the current request has been accepted.
    Idle {
        /// Accepted lanes of the current request.
        accepted: Vec<bool>,
    },

    /// A request has been issued and its response has not been delivered yet.
    InFlight,
}

impl GuardState {
    /// Returns whether a new request may be accepted.
    pub fn is_idle(&self) -> bool { matches!(self, Self::Idle { .. }) }
}

/// Outstanding-request guard of one initiator and kind.
///
/// Passes the lanes of one request (e.g. address and data of a write), each lane at most once, and then blocks every
/// lane until the response is delivered. The second input is high on the tick the response is delivered.
pub type Guard<V> = DynFsm<(Vec<VrChannel<V>>, UniChannel<bool>), Vec<VrChannel<V>>, GuardState>;

/// Creates a guard over `lanes` lanes.
pub fn guard<V: Signal>(name: &str, lanes: usize) -> Guard<V> {
    DynFsm::boxed(
        name,
        GuardState::Idle { accepted: vec![false; lanes] },
        move |(i_fwd, delivered): &(Vec<Valid<V>>, bool), o_bwd: &Vec<Ready>, state: &GuardState| match state {
            GuardState::Idle { accepted } => {
                let o_fwd = i_fwd
                    .iter()
                    .zip(accepted)
                    .map(|(lane, done)| if *done { Valid::invalid() } else { lane.clone() })
                    .collect::<Vec<_>>();
                let i_bwd = o_bwd
                    .iter()
                    .zip(accepted)
                    .map(|(bwd, done)| Ready::new(!*done && bwd.ready))
                    .collect::<Vec<_>>();

                let accepted_next = o_fwd
                    .iter()
                    .zip(o_bwd)
                    .zip(accepted)
                    .map(|((fwd, bwd), done)| *done || fwd.fire(bwd))
                    .collect::<Vec<_>>();
                let state_next = if accepted_next.iter().all(|done| *done) {
                    GuardState::InFlight
                } else {
                    GuardState::Idle { accepted: accepted_next }
                };

                (o_fwd, (i_bwd, ()), state_next)
            }
            GuardState::InFlight => {
                let o_fwd = vec![Valid::invalid(); i_fwd.len()];
                let i_bwd = vec![Ready::default(); i_fwd.len()];
                let state_next = if *delivered {
                    GuardState::Idle { accepted: vec![false; lanes] }
                } else {
                    GuardState::InFlight
                };

                (o_fwd, (i_bwd, ()), state_next)
            }
        },
    )
}

#[cfg(test)]
mod tests {
    use tickflow::Module;

    use super::*;

    fn step(
        guard: &mut Guard<u8>, lanes: Vec<Valid<u8>>, delivered: bool, o_bwd: &Vec<Ready>,
    ) -> (Vec<Valid<u8>>, Vec<Ready>) {
        let i_fwd = (lanes, delivered);
        let (o_fwd, (i_bwd, ())) = guard.comb(&i_fwd, o_bwd).unwrap();
        guard.tick(&i_fwd, o_bwd).unwrap();
        (o_fwd, i_bwd)
    }

    #[test]
    fn blocks_until_delivery() {
        let mut g = guard::<u8>("guard", 1);
        let ready = vec![Ready::new(true)];

        let (o_fwd, i_bwd) = step(&mut g, vec![Valid::valid(1)], false, &ready);
        assert_eq!(o_fwd, vec![Valid::valid(1)]);
        assert!(i_bwd[0].ready);
        assert_eq!(*g.state(), GuardState::InFlight);

        for _ in 0..3 {
            let (o_fwd, i_bwd) = step(&mut g, vec![Valid::valid(2)], false, &ready);
            assert!(!o_fwd[0].valid);
            assert!(!i_bwd[0].ready);
        }

        step(&mut g, vec![Valid::valid(2)], true, &ready);
        assert!(g.state().is_idle());
        let (o_fwd, _) = step(&mut g, vec![Valid::valid(2)], false, &ready);
        assert_eq!(o_fwd, vec![Valid::valid(2)]);
    }

    #[test]
    fn lanes_are_accepted_independently() {
        let mut g = guard::<u8>("guard", 2);

        // The address lane is accepted first; the data lane is stalled.
        let o_bwd = vec![Ready::new(true), Ready::new(false)];
        let (_, i_bwd) = step(&mut g, vec![Valid::valid(1), Valid::valid(9)], false, &o_bwd);
        assert!(i_bwd[0].ready);
        assert_eq!(*g.state(), GuardState::Idle { accepted: vec![true, false] });

        // A second address must not slip through while the data lane is pending.
        let (o_fwd, i_bwd) = step(&mut g, vec![Valid::valid(2), Valid::valid(9)], false, &vec![Ready::new(true); 2]);
        assert_eq!(o_fwd, vec![Valid::invalid(), Valid::valid(9)]);
        assert!(!i_bwd[0].ready);
        assert!(i_bwd[1].ready);
        assert_eq!(*g.state(), GuardState::InFlight);
    }
}
