//! Switch configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tickflow_std::{ArbPolicy, Buffering};

use crate::{AddressDecoder, Route};

/// Configuration error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No initiator.
    #[error("a switch needs at least one initiator")]
    NoInitiators,

    /// No responder.
    #[error("a switch needs at least one responder")]
    NoResponders,

    /// A range route without addresses.
    #[error("route of responder {responder} is empty: {start:#x} is above {end:#x}")]
    EmptyRange {
        /// Responder index.
        responder: usize,
        /// First address.
        start: u64,
        /// Last address.
        end: u64,
    },

    /// A masked route whose base has bits outside its mask, so that no address matches.
    #[error("route of responder {responder} never matches: base {base:#x} has bits outside mask {mask:#x}")]
    UnmatchableMask {
        /// Responder index.
        responder: usize,
        /// Base address.
        base: u64,
        /// Mask.
        mask: u64,
    },

    /// The link matrix does not have one row per initiator and one column per responder.
    #[error("link matrix has {rows} rows of lengths {cols:?}, expected {initiators} rows of length {responders}")]
    LinkShape {
        /// Number of rows found.
        rows: usize,
        /// Row lengths found.
        cols: Vec<usize>,
        /// Number of initiators.
        initiators: usize,
        /// Number of responders.
        responders: usize,
    },

    /// A responder model that can never accept a request.
    #[error("model of responder {responder} never asserts ready")]
    NeverReady {
        /// Responder index.
        responder: usize,
    },

    /// The number of responder models differs from the number of responders.
    #[error("{found} responder models given for {expected} responders")]
    ModelCount {
        /// Number of responders.
        expected: usize,
        /// Number of models.
        found: usize,
    },
}

/// Buffering of every pipeline stage of a switch. The same choice applies in both directions (read and write).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Per initiator, after the address and data of a request are joined.
    pub initiator_request: Buffering,
    /// After the request arbitration.
    pub arbitration: Buffering,
    /// Per responder and request channel, in front of the responder.
    pub responder_request: Buffering,
    /// Per responder, behind its response channel.
    pub responder_response: Buffering,
    /// After the response arbitration.
    pub response_arbitration: Buffering,
    /// Per initiator, in front of its response channel.
    pub initiator_response: Buffering,
}

impl StageConfig {
    /// Uses the same buffering for every stage.
    pub fn uniform(buffering: Buffering) -> Self {
        Self {
            initiator_request: buffering,
            arbitration: buffering,
            responder_request: buffering,
            responder_response: buffering,
            response_arbitration: buffering,
            initiator_response: buffering,
        }
    }

    /// Returns the added latency of a request travelling from an initiator to a responder.
    pub fn request_latency(&self) -> usize {
        self.initiator_request.latency() + self.arbitration.latency() + self.responder_request.latency()
    }

    /// Returns the added latency of a response travelling from a responder to an initiator.
    pub fn response_latency(&self) -> usize {
        self.responder_response.latency() + self.response_arbitration.latency() + self.initiator_response.latency()
    }
}

/// Switch configuration. Fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchConfig {
    /// Number of initiators.
    pub initiators: usize,

    /// Route of every responder; `routes[j]` belongs to responder `j`.
    pub routes: Vec<Route>,

    /// Arbitration policy of both request and response arbitration.
    #[serde(default)]
    pub arbitration: ArbPolicy,

    /// Pipeline stage buffering.
    #[serde(default)]
    pub stages: StageConfig,

    /// Per-link enables: `links[i][j]` allows initiator `i` to reach responder `j`. Every link is enabled if absent.
    /// A request over a disabled link is answered as unmapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Vec<Vec<bool>>>,
}

impl SwitchConfig {
    /// Creates a new configuration with round-robin arbitration, no pipeline stages and every link enabled.
    pub fn new(initiators: usize, routes: Vec<Route>) -> Self {
        Self { initiators, routes, arbitration: ArbPolicy::default(), stages: StageConfig::default(), links: None }
    }

    /// Sets the arbitration policy.
    pub fn with_arbitration(self, arbitration: ArbPolicy) -> Self { Self { arbitration, ..self } }

    /// Sets the pipeline stage buffering.
    pub fn with_stages(self, stages: StageConfig) -> Self { Self { stages, ..self } }

    /// Sets the per-link enables.
    pub fn with_links(self, links: Vec<Vec<bool>>) -> Self { Self { links: Some(links), ..self } }

    /// Returns the number of responders.
    pub fn responders(&self) -> usize { self.routes.len() }

    /// Returns whether initiator `initiator` may reach responder `responder`.
    pub fn link_enabled(&self, initiator: usize, responder: usize) -> bool {
        self.links.as_ref().map_or(true, |links| {
            links.get(initiator).and_then(|row| row.get(responder)).copied().unwrap_or(false)
        })
    }

    /// Returns the address decoder of the route table.
    pub fn decoder(&self) -> AddressDecoder { AddressDecoder::new(self.routes.clone()) }

    /// Checks the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initiators == 0 {
            return Err(ConfigError::NoInitiators);
        }
        if self.routes.is_empty() {
            return Err(ConfigError::NoResponders);
        }

        for (responder, route) in self.routes.iter().enumerate() {
            match *route {
                Route::Range { start, end } if start > end => {
                    return Err(ConfigError::EmptyRange { responder, start, end });
                }
                Route::Masked { base, mask } if base & !mask != 0 => {
                    return Err(ConfigError::UnmatchableMask { responder, base, mask });
                }
                _ => {}
            }
        }

        if let Some(links) = &self.links {
            let cols = links.iter().map(Vec::len).collect::<Vec<_>>();
            if links.len() != self.initiators || cols.iter().any(|len| *len != self.responders()) {
                return Err(ConfigError::LinkShape {
                    rows: links.len(),
                    cols,
                    initiators: self.initiators,
                    responders: self.responders(),
                });
            }
        }

        Ok(())
    }
}
