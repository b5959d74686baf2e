//! Accordo — an automated B2B procurement negotiation engine.
//!
//! The crate is organized as a set of small, mostly-pure components
//! (offer parsing, accumulation, utility scoring, behavioral inference,
//! decision-making, MESO generation, state update, config building) plus
//! one I/O-touching orchestrator (the message [`pipeline`]) that wires
//! them against caller-supplied [`capabilities`]: a `Store`, an
//! `LLMClient`, a `Notifier`, and a `Reporter`. None of the pure
//! components know anything about persistence, LLMs, or notification —
//! they can be tested and reused without any of those in place.

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod accumulator;
pub mod behavioral;
pub mod cache;
pub mod capabilities;
pub mod config_builder;
pub mod decision_engine;
pub mod errors;
pub mod meso;
pub mod parser;
pub mod pipeline;
pub mod state;
pub mod testing;
pub mod types;
pub mod utility;
pub mod utils;

pub use capabilities::{LLMClient, Notifier, NotifyOutcome, Reporter, Store};
pub use errors::{NegotiationError, NegotiationResult};
pub use pipeline::{NegotiationPipeline, PipelineOutcome};
