//! `lilypad` is a CoAP endpoint for small sensor/actuator nodes.
//!
//! It plays both protocol roles:
//! - **server**: a path-sorted resource table routes inbound requests to
//!   handlers for sensors, actuators and node metadata
//!   ([`server`], [`endpoint::Endpoint::dispatch`])
//! - **client**: outbound GET/PUT requests with transparent continuation of
//!   [blockwise] responses, optionally through a forward proxy
//!   ([`endpoint::Endpoint::get`], [`block`])
//!
//! Message encoding, identifiers and retransmission belong to the CoAP
//! engine underneath; `lilypad` speaks [`toad_msg`] messages and hands them
//! to a [`net::Transport`]. Devices are reached through the [`dev::Registry`]
//! seam, so the same endpoint runs against real hardware or a test double.
//!
//! [blockwise]: https://datatracker.ietf.org/doc/html/rfc7959
//!
//! ```
//! use lilypad::dev::{Error, Kind, Registry, Value};
//! use lilypad::req::Req;
//! use lilypad::Endpoint;
//!
//! struct NoDevices;
//!
//! impl Registry for NoDevices {
//!   type Handle = ();
//!
//!   fn find_by_kind(&self, _: Kind) -> Option<()> {
//!     None
//!   }
//!   fn find_by_name(&self, _: &str) -> Option<()> {
//!     None
//!   }
//!   fn read(&self, _: ()) -> Result<Value, Error> {
//!     Err(Error::Read)
//!   }
//!   fn write(&mut self, _: (), _: Value) -> Result<(), Error> {
//!     Err(Error::Write)
//!   }
//!   fn devices<F>(&self, _: F) where F: FnMut(Option<&str>, Kind) {}
//! }
//!
//! let mut node = Endpoint::new(NoDevices, "nucleo-f767zi").unwrap();
//! let rep = node.dispatch(Req::get("/riot/board"));
//! assert_eq!(rep.payload_str().unwrap(), "nucleo-f767zi");
//! ```

// style
#![allow(clippy::unused_unit)]
// deny
#![deny(missing_docs)]
#![deny(missing_debug_implementations)]
#![cfg_attr(not(test), deny(unsafe_code))]
// warnings
#![cfg_attr(not(test), warn(unreachable_pub))]

/// Client-side blockwise transfer continuation
pub mod block;
/// Compile-time buffer sizing
pub mod config;
/// Device registry seam
pub mod dev;
/// The endpoint context object
pub mod endpoint;
/// Networking seam
pub mod net;
/// Requests
pub mod req;
/// Responses
pub mod resp;
/// Resource table & dispatch
pub mod server;
/// URI splitting
pub mod uri;

#[cfg(test)]
pub(crate) mod test;

pub use endpoint::Endpoint;

/// The message type exchanged with the engine (heap-backed [`toad_msg`] message)
pub type Message = toad_msg::alloc::Message;
