//! The endpoint: one value owning everything the node mutates.
//!
//! Request counter, actuator mirrors, proxy configuration and the in-flight
//! transfer record all live here rather than in statics, so two endpoints
//! can share a process and every test gets a fresh world. All protocol
//! entry points take `&mut self`; within one endpoint, handlers and the
//! continuation engine never race.

use std::net::SocketAddr;

use toad_msg::{ContentFormat, MessageOptions};
use toad_string::String;

use crate::block::{BeginError, Transfer};
use crate::config::URI_MAX;
use crate::dev::Registry;
use crate::net::{Addrd, Transport};
use crate::req::{Method, Req};
use crate::server::{Resources, TableError};
use crate::{uri, Message};

/// A CoAP endpoint: the server's resource table and state, and the client's
/// transfer bookkeeping, over a device registry `R`.
pub struct Endpoint<R: Registry> {
  pub(crate) reg: R,
  pub(crate) resources: Resources,
  pub(crate) board: &'static str,
  /// Requests sent, not received; see [`Endpoint::send`]
  pub(crate) req_count: u16,
  /// Last state written to the binary actuator
  pub(crate) led: i16,
  /// Last triple written to the color actuator
  pub(crate) rgb: [i16; 3],
  pub(crate) transfer: Transfer,
  proxy_uri: String<URI_MAX>,
}

impl<R: Registry> core::fmt::Debug for Endpoint<R> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("Endpoint")
     .field("board", &self.board)
     .field("req_count", &self.req_count)
     .field("transfer", &self.transfer)
     .finish_non_exhaustive()
  }
}

/// The proxy URI exceeds [`URI_MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyUriTooLong;

/// Why an outbound request was not sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientError<E> {
  /// The URI does not parse as a `coap://` URI
  BadUri,
  /// The URI exceeds [`URI_MAX`] and could not be recorded
  UriTooLong,
  /// A blockwise transfer for another URI is mid-flight
  Busy,
  /// The transport refused the message
  Send(E),
}

impl<R: Registry> Endpoint<R> {
  /// Create an endpoint over `reg`, serving [`Resources::standard`] and
  /// reporting `board` at `/riot/board`
  pub fn new(reg: R, board: &'static str) -> Result<Self, TableError> {
    Ok(Self { reg,
              resources: Resources::standard()?,
              board,
              req_count: 0,
              led: 0,
              rgb: [0; 3],
              transfer: Transfer::default(),
              proxy_uri: String::new() })
  }

  /// The resource table this endpoint serves
  pub fn resources(&self) -> &Resources {
    &self.resources
  }

  /// Requests sent since boot, or since the counter was last PUT
  pub fn request_count(&self) -> u16 {
    self.req_count
  }

  /// Send outbound requests through a forward proxy.
  ///
  /// `uri` names the proxy; targets still go to [`Endpoint::get`] /
  /// [`Endpoint::put`] whole, and ride in the Proxy-Uri option. The empty
  /// string turns proxying back off.
  pub fn set_proxy_uri(&mut self, uri: &str) -> Result<(), ProxyUriTooLong> {
    if uri.len() > URI_MAX {
      return Err(ProxyUriTooLong);
    }

    self.proxy_uri = String::from(uri);
    Ok(())
  }

  /// The configured proxy, if any
  pub fn proxy_uri(&self) -> Option<&str> {
    match self.proxy_uri.as_str() {
      | "" => None,
      | uri => Some(uri),
    }
  }

  pub(crate) fn proxied(&self) -> bool {
    self.proxy_uri().is_some()
  }

  /// Issue a GET for `uri`, recording it for blockwise continuation.
  ///
  /// `remote` is where the datagram goes: the origin server, or the proxy
  /// when one is configured.
  pub fn get<T>(&mut self, sock: &mut T, remote: SocketAddr, uri: &str) -> Result<usize, ClientError<T::Error>>
    where T: Transport
  {
    self.request(sock, remote, Method::Get, uri, "")
  }

  /// Issue a PUT of `payload` (as text) to `uri`
  pub fn put<T>(&mut self,
                sock: &mut T,
                remote: SocketAddr,
                uri: &str,
                payload: &str)
                -> Result<usize, ClientError<T::Error>>
    where T: Transport
  {
    self.request(sock, remote, Method::Put, uri, payload)
  }

  fn request<T>(&mut self,
                sock: &mut T,
                remote: SocketAddr,
                method: Method,
                uri: &str,
                payload: &str)
                -> Result<usize, ClientError<T::Error>>
    where T: Transport
  {
    let parts = uri::parts(uri).map_err(|_| ClientError::BadUri)?;

    self.transfer.begin(uri).map_err(|e| match e {
                             | BeginError::Busy => ClientError::Busy,
                             | BeginError::UriTooLong => ClientError::UriTooLong,
                           })?;

    let mut req = if self.proxied() {
      Req::proxied(method, uri)
    } else {
      Req::new(method, parts.path)
    };

    if method == Method::Put {
      req.msg_mut().set_content_format(ContentFormat::Text).ok();
      req.set_payload(payload.as_bytes());
    }

    let msg = Message::from(req);
    match self.send(sock, Addrd(&msg, remote)) {
      | Ok(n) => Ok(n),
      | Err(e) => {
        log::error!("msg send failed");
        self.transfer.idle();
        Err(ClientError::Send(e))
      },
    }
  }

  /// Hand `msg` to the transport, counting it as sent if the transport
  /// took it.
  ///
  /// This is the only place the request counter moves on its own; inbound
  /// traffic never touches it.
  pub(crate) fn send<T>(&mut self, sock: &mut T, msg: Addrd<&Message>) -> Result<usize, T::Error>
    where T: Transport
  {
    let sent = sock.send(msg)?;
    if sent > 0 {
      self.req_count = self.req_count.wrapping_add(1);
    }

    Ok(sent)
  }
}
