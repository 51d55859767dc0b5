//! The seam between the endpoint and the datagram transport underneath it.

use std::net::SocketAddr;

use crate::Message;

/// A piece of data associated with a network peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Addrd<T>(pub T, pub SocketAddr);

impl<T> Addrd<T> {
  /// Borrow the contents of this Addrd
  pub fn as_ref(&self) -> Addrd<&T> {
    Addrd(self.data(), self.addr())
  }

  /// Discard the peer address, yielding the data
  pub fn unwrap(self) -> T {
    self.0
  }

  /// Map the data, keeping the peer address
  pub fn map<R>(self, f: impl FnOnce(T) -> R) -> Addrd<R> {
    Addrd(f(self.0), self.1)
  }

  /// The data
  pub fn data(&self) -> &T {
    &self.0
  }

  /// The data, mutably
  pub fn data_mut(&mut self) -> &mut T {
    &mut self.0
  }

  /// The peer address
  pub fn addr(&self) -> SocketAddr {
    self.1
  }
}

/// The outbound half of the CoAP engine.
///
/// The endpoint builds complete messages and hands them off here; assigning
/// message IDs and tokens, encoding, retransmitting and response matching
/// all happen on the far side of this trait.
pub trait Transport {
  /// Why a hand-off failed
  type Error: core::fmt::Debug;

  /// Hand a message to the transport for delivery to `msg.addr()`.
  ///
  /// `Ok(n)` means `n` bytes were accepted for sending. `Ok(0)` means the
  /// transport dropped the message without error; callers should treat it
  /// as not sent.
  fn send(&mut self, msg: Addrd<&Message>) -> Result<usize, Self::Error>;
}
