//! Error sink: the responder of unmapped addresses.

use tickflow::DynFsm;
use tickflow_std::{Ready, UniChannel, Valid, VrChannel};

use crate::{Item, Resp};

/// Error sink state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ErrorSinkState {
    /// Response waiting to be accepted.
    pub pending: Valid<Item>,
    /// Whether the error pulse is raised.
    pub pulse: bool,
}

/// Error sink.
///
/// Answers every request with [`Resp::DecodeError`], echoing its tag, kind and address, and raises a one-tick pulse
/// on the tick after the request is accepted. Holds one response; a new request is accepted on the tick the pending
/// response leaves.
pub type ErrorSink = DynFsm<VrChannel<Item>, (VrChannel<Item>, UniChannel<bool>), ErrorSinkState>;

/// Creates an error sink.
pub fn error_sink(name: &str) -> ErrorSink {
    DynFsm::boxed(name, ErrorSinkState::default(), |i_fwd: &Valid<Item>, (o_bwd, ()): &(Ready, ()), s: &ErrorSinkState| {
        let i_bwd = Ready::new(!s.pending.valid || o_bwd.ready);
        let accepted = i_fwd.fire(&i_bwd);

        let pending = if accepted {
            let request = &i_fwd.inner;
            Valid::valid(Item {
                address: request.address,
                tag: request.tag,
                ..Item::response(request.kind, Resp::DecodeError, 0)
            })
        } else if s.pending.fire(o_bwd) {
            Valid::invalid()
        } else {
            s.pending.clone()
        };

        ((s.pending.clone(), s.pulse), i_bwd, ErrorSinkState { pending, pulse: accepted })
    })
}
