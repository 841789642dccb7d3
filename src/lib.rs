//! Minimal multi-client line chat over TCP.
//!
//! See `README.md` for an overview and usage instructions. Each module
//! focuses on a concrete responsibility:
//!
//! - [`cli`] parses the command-line interface for server and client modes.
//! - [`history`] records every relayed line for replay to late joiners.
//! - [`registry`] tracks live participants and their transport write halves.
//! - [`room`] serializes joins, leaves, and broadcasts behind one lock so
//!   every participant observes the same global message order.
//! - [`server`] accepts TCP connections and runs one receive loop per
//!   participant.
//! - [`client`] connects to a server, multiplexing stdin and incoming chat
//!   lines for a terminal user.
//! - [`message`] provides the newline-delimited text codec plus the wire
//!   formats for chat lines and system notices.
//!
//! Integration and end-to-end tests use this crate directly to exercise the
//! room invariants and the wire behavior.

pub mod cli;
pub mod client;
pub mod history;
pub mod message;
pub mod registry;
pub mod room;
pub mod server;
