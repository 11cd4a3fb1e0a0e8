//! AXI4-Lite style switch: lets several initiators share several responders.
//!
//! Requests are guarded so that every initiator has at most one request of each kind in flight, joined (address
//! and data of writes), arbitrated, decoded and routed to a responder, or to an error sink answering with
//! [`Resp::DecodeError`]. Responses are joined with the correlation tag of their request, arbitrated and routed back
//! to the initiator named by the tag.
//!
//! The crate also provides bus-functional initiator and responder models and a [`Testbench`] closing them around a
//! [`Switch`].

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
#![deny(unreachable_pub)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::type_complexity)]
#![allow(elided_lifetimes_in_paths)]
#![allow(type_alias_bounds)]

mod config;
mod crossbar;
mod error_sink;
mod guard;
mod initiator;
mod responder;
mod route;
mod switch;
mod testbench;
mod types;

pub use config::{ConfigError, StageConfig, SwitchConfig};
pub use crossbar::{Crossbar, CrossbarI, CrossbarIBwd, CrossbarIFwd, CrossbarO, CrossbarOBwd, CrossbarOFwd};
pub use error_sink::{error_sink, ErrorSink, ErrorSinkState};
pub use guard::{guard, Guard, GuardState};
pub use initiator::{
    Command, Completion, Initiator, InitiatorI, InitiatorIBwd, InitiatorIFwd, InitiatorO, InitiatorOBwd, InitiatorOFwd,
    Op,
};
pub use responder::{
    Accepted, Backpressure, Channel, Responder, ResponderI, ResponderIBwd, ResponderIFwd, ResponderModel, ResponderO,
    ResponderOBwd, ResponderOFwd,
};
pub use route::{AddressDecoder, Route, Target};
pub use switch::{Switch, SwitchI, SwitchIBwd, SwitchIFwd, SwitchO, SwitchOBwd, SwitchOFwd};
pub use testbench::Testbench;
pub use types::{Item, Kind, Resp, Tag};
