//! Broadcaster: fans one channel out to consumers advancing at their own pace.

use itertools::izip;
use tickflow::{DynFsm, Signal};

use crate::{Ready, Valid, VrChannel};

/// Broadcaster. The state holds, per output, whether it already accepted the current item.
///
/// Each output sees the item until it accepts it once. The input is accepted once every output has accepted, and
/// the latches are cleared for the next item.
pub type Broadcaster<V> = DynFsm<VrChannel<V>, Vec<VrChannel<V>>, Vec<bool>>;

/// Creates a broadcaster with `n` outputs.
pub fn broadcaster<V: Signal>(name: &str, n: usize) -> Broadcaster<V> {
    DynFsm::boxed(name, vec![false; n], move |i_fwd: &Valid<V>, o_bwd: &Vec<Ready>, accepted: &Vec<bool>| {
        let o_fwd =
            accepted.iter().map(|done| if *done { Valid::invalid() } else { i_fwd.clone() }).collect::<Vec<_>>();
        let i_bwd = Ready::new(accepted.iter().zip(o_bwd).all(|(done, bwd)| *done || bwd.ready));

        let accepted_next = if i_fwd.fire(&i_bwd) {
            vec![false; n]
        } else {
            izip!(accepted, &o_fwd, o_bwd).map(|(done, fwd, bwd)| *done || fwd.fire(bwd)).collect()
        };

        (o_fwd, i_bwd, accepted_next)
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::testing::cycle;

    fn ready(pattern: &[bool]) -> Vec<Ready> { pattern.iter().map(|r| Ready::new(*r)).collect() }

    #[test]
    fn holds_item_until_every_output_accepted() {
        let mut fanout = broadcaster::<u8>("fanout", 2);
        let (o_fwd, i_bwd) = cycle(&mut fanout, &Valid::valid(5), &ready(&[true, false]));
        assert!(o_fwd.iter().all(|o| *o == Valid::valid(5)));
        assert!(!i_bwd.ready);

        // Output 0 already accepted; it must not see the item again.
        let (o_fwd, i_bwd) = cycle(&mut fanout, &Valid::valid(5), &ready(&[true, true]));
        assert_eq!(o_fwd, vec![Valid::invalid(), Valid::valid(5)]);
        assert!(i_bwd.ready);

        let (o_fwd, _) = cycle(&mut fanout, &Valid::valid(6), &ready(&[false, false]));
        assert_eq!(o_fwd, vec![Valid::valid(6), Valid::valid(6)]);
    }

    proptest! {
        #[test]
        fn every_output_sees_every_item_once(
            n in 1usize..5,
            items in prop::collection::vec(any::<u8>(), 1..8),
            seed in prop::collection::vec(any::<bool>(), 16..64),
        ) {
            let mut fanout = broadcaster::<u8>("fanout", n);
            let mut received = vec![vec![]; n];
            let mut next = 0;
            let mut now = 0;
            while next < items.len() {
                prop_assert!(now < 10_000, "broadcaster stalled");
                let i_fwd = Valid::valid(items[next]);
                // Every output is eventually ready: the pattern is forced high every fourth tick.
                let o_bwd =
                    (0..n).map(|k| Ready::new(now % 4 == 3 || seed[(now + k) % seed.len()])).collect::<Vec<_>>();
                let (o_fwd, i_bwd) = cycle(&mut fanout, &i_fwd, &o_bwd);
                for (k, (fwd, bwd)) in o_fwd.iter().zip(&o_bwd).enumerate() {
                    if fwd.fire(bwd) {
                        received[k].push(fwd.inner);
                    }
                }
                if i_fwd.fire(&i_bwd) {
                    next += 1;
                    // The source advances only after every output has its copy.
                    for lane in &received {
                        prop_assert_eq!(&lane[..], &items[..next]);
                    }
                }
                now += 1;
            }
        }
    }
}
