//! Tickflow: cycle-level simulation of latency-insensitive hardware modules.
//!
//! A design is a tree of [`Module`]s connected through [`Interface`]s. Every tick, each module first computes its
//! combinational outputs from its inputs and current state ([`Module::comb`], possibly several times until the
//! design settles), then commits its next state exactly once ([`Module::tick`]).

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

mod error;
mod interface;
mod link;
mod module;
mod signal;
mod sim;
mod utils;

pub use error::SimError;
pub use interface::{Interface, Value};
pub use link::Link;
pub use module::{DynFsm, Fsm, FsmFn, Module, Phase};
pub use signal::{format_ports, PortDecls, Signal};
pub use sim::{Settle, Simulator, SETTLE_LIMIT};
pub use tickflow_macro::{Interface, Signal};
