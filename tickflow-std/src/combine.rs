//! Combiner: joins lanes that must be accepted together.

use tickflow::{DynFsm, Signal};

use crate::{Ready, Valid, VrChannel};

/// Combiner. Its output is valid only while every input lane is valid, and every lane is accepted in the tick the
/// merged item transfers.
pub type Combiner<V> = DynFsm<Vec<VrChannel<V>>, VrChannel<V>, ()>;

/// Creates a combiner. `merge` builds the output item from the items of all lanes, in lane order.
pub fn combiner<V: Signal>(name: &str, merge: fn(&[V]) -> V) -> Combiner<V> {
    DynFsm::boxed(name, (), move |i_fwd: &Vec<Valid<V>>, o_bwd: &Ready, _: &()| {
        let all_valid = i_fwd.iter().all(|lane| lane.valid);
        let o_fwd = if all_valid {
            Valid::valid(merge(&i_fwd.iter().map(|lane| lane.inner.clone()).collect::<Vec<_>>()))
        } else {
            Valid::invalid()
        };
        let i_bwd = vec![Ready::new(all_valid && o_bwd.ready); i_fwd.len()];
        (o_fwd, i_bwd, ())
    })
}

/// Merge function taking the item of the first lane. The other lanes only synchronize.
pub fn first<V: Signal>(items: &[V]) -> V { items.first().cloned().unwrap_or_default() }

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::cycle;

    fn sum(items: &[u8]) -> u8 { items.iter().sum() }

    #[test]
    fn waits_for_every_lane() {
        let mut join = combiner::<u8>("join", first);
        let (o_fwd, i_bwd) = cycle(&mut join, &vec![Valid::valid(1), Valid::invalid()], &Ready::new(true));
        assert!(!o_fwd.valid);
        assert!(i_bwd.iter().all(|r| !r.ready));

        let (o_fwd, i_bwd) = cycle(&mut join, &vec![Valid::valid(1), Valid::valid(9)], &Ready::new(true));
        assert_eq!(o_fwd, Valid::valid(1));
        assert!(i_bwd.iter().all(|r| r.ready));
    }

    #[test]
    fn lanes_may_arrive_in_either_order() {
        let mut join = combiner::<u8>("join", sum);
        let (o_fwd, _) = cycle(&mut join, &vec![Valid::invalid(), Valid::valid(2)], &Ready::new(true));
        assert!(!o_fwd.valid);
        let (o_fwd, i_bwd) = cycle(&mut join, &vec![Valid::valid(3), Valid::valid(2)], &Ready::new(false));
        assert_eq!(o_fwd, Valid::valid(5));
        assert!(i_bwd.iter().all(|r| !r.ready));
    }
}
