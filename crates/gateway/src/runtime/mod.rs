//! Core runtime: the per-request pipeline from client payload to outbound
//! text stream.
//!
//! history window → prompt composer → phase-1 stream → accumulator →
//! (tool call → phase-2 stream)
//!
//! Entry point: [`handle_turn`].

pub mod accumulator;
pub mod history;
pub mod prompt;
pub mod turn;

pub use accumulator::{Outcome, PendingToolCall, ToolCallAccumulator, TOOL_PLACEHOLDER};
pub use turn::{handle_turn, TextStream, TurnError, TurnInput, TOOL_APOLOGY};
