//! Test harness for single modules.

use tickflow::{Interface, Module};

/// Simulates one tick of a module with fixed inputs. Returns the outputs seen during the tick.
pub(crate) fn cycle<I: Interface, O: Interface, M: Module<I, O>>(
    module: &mut M, i_fwd: &I::Fwd, o_bwd: &O::Bwd,
) -> (O::Fwd, I::Bwd) {
    let outputs = module.comb(i_fwd, o_bwd).unwrap();
    module.tick(i_fwd, o_bwd).unwrap();
    outputs
}
