//! Client-side continuation of blockwise ([RFC 7959]) responses.
//!
//! When a response arrives carrying a Block2 option with the more-blocks
//! flag set, the endpoint rebuilds a follow-up GET for the next block from
//! the URI it recorded when the original request went out. Nothing is
//! reused from the inbound buffer except the token (for correlation) and
//! the peer address; path, proxy target and block size are all re-derived
//! from recorded state.
//!
//! [RFC 7959]: https://datatracker.ietf.org/doc/html/rfc7959

use toad_msg::{MessageOptions, Type};
use toad_string::String;

use crate::config::URI_MAX;
use crate::dev::Registry;
use crate::endpoint::Endpoint;
use crate::net::{Addrd, Transport};
use crate::req::{Method, Req};
use crate::{uri, Message};

/// Where the client currently is in a request/response exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
  /// Nothing in flight
  #[default]
  Idle,
  /// A request went out; nothing heard back yet
  AwaitingResponse,
  /// A blockwise response arrived and the next block was requested
  ContinuingBlock,
}

/// Record of the (at most one) in-flight exchange.
///
/// Blockwise continuation needs the original request URI after the original
/// request is long gone, so it is copied here when the request is issued.
/// At most one blockwise transfer is in flight per endpoint; starting a
/// request for a *different* URI mid-transfer is refused as [`BeginError::Busy`]
/// rather than silently clobbering the recorded URI.
#[derive(Debug, Clone, Copy, Default)]
pub struct Transfer {
  state: State,
  uri: String<URI_MAX>,
}

/// Why a new exchange could not begin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginError {
  /// A blockwise transfer for another URI is mid-flight
  Busy,
  /// The URI exceeds [`URI_MAX`] and cannot be recorded
  UriTooLong,
}

impl Transfer {
  /// Record `uri` and mark an exchange in flight
  pub fn begin(&mut self, uri: &str) -> Result<(), BeginError> {
    if self.state == State::ContinuingBlock && self.uri != uri {
      return Err(BeginError::Busy);
    }

    if uri.len() > URI_MAX {
      return Err(BeginError::UriTooLong);
    }

    if self.state == State::AwaitingResponse {
      log::warn!("re-requesting while {} is unanswered", self.uri.as_str());
    }

    self.uri = String::from(uri);
    self.state = State::AwaitingResponse;
    Ok(())
  }

  /// The exchange's current state
  pub fn state(&self) -> State {
    self.state
  }

  /// The URI recorded by [`Transfer::begin`]
  pub fn last_req_uri(&self) -> &str {
    self.uri.as_str()
  }

  pub(crate) fn uri_copy(&self) -> String<URI_MAX> {
    self.uri
  }

  pub(crate) fn idle(&mut self) {
    self.state = State::Idle;
  }

  pub(crate) fn continuing(&mut self) {
    self.state = State::ContinuingBlock;
  }
}

/// The transport's verdict on the exchange a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Memo {
  /// A response arrived
  Resp,
  /// A response arrived but did not fit the receive buffer whole
  RespTruncated,
  /// The request timed out
  Timeout,
  /// The transport gave up on the exchange
  Error,
}

/// What the endpoint did with a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
  /// The request timed out; the transfer is over
  TimedOut,
  /// The transport reported the exchange failed
  ProtocolError,
  /// A complete non-blockwise response; nothing left to do
  Complete,
  /// The final block arrived
  BlockwiseComplete,
  /// More blocks follow; the block with this number was requested
  Continued(u32),
  /// A blockwise response arrived but no URI was recorded to continue with
  PathTooLong,
  /// The recorded URI no longer parses
  BadUri,
  /// The follow-up request could not be handed to the transport
  SendFailed,
}

impl<R: Registry> Endpoint<R> {
  /// Digest a response (or lack of one) to the in-flight request.
  ///
  /// This is the continuation engine: a Block2 option with more blocks
  /// coming triggers a follow-up GET for the next block, sent to the peer
  /// the response came from. On timeout `rep` is the unanswered request,
  /// echoed back by the transport.
  ///
  /// Checks run in a fixed order; the first that fails ends the transfer:
  /// timeout, truncation, transport error, blockwise bookkeeping, and
  /// finally the more-blocks decision.
  pub fn on_response<T>(&mut self, sock: &mut T, memo: Memo, rep: &Addrd<Message>) -> Outcome
    where T: Transport
  {
    match memo {
      | Memo::Timeout => {
        log::error!("timeout for msg {:?}", rep.data().id);
        self.transfer.idle();
        return Outcome::TimedOut;
      },
      | Memo::Error => {
        log::error!("error in response");
        self.transfer.idle();
        return Outcome::ProtocolError;
      },
      | Memo::RespTruncated => {
        log::warn!("response truncated; continuing with what fit");
      },
      | Memo::Resp => (),
    }

    let block2 = rep.data().block2().map(|b| (b.num(), b.more(), b.size()));

    if let Some((0, _, _)) = block2 {
      log::info!("--- blockwise start ---");
    }

    log_response(rep.data());

    match block2 {
      | Some((num, true, size)) => self.continue_block(sock, rep, num, size),
      | Some(_) => {
        log::info!("--- blockwise complete ---");
        self.transfer.idle();
        Outcome::BlockwiseComplete
      },
      | None => {
        self.transfer.idle();
        Outcome::Complete
      },
    }
  }

  fn continue_block<T>(&mut self,
                       sock: &mut T,
                       rep: &Addrd<Message>,
                       num: u32,
                       size: u16)
                       -> Outcome
    where T: Transport
  {
    let uri = self.transfer.uri_copy();

    if num == 0 && uri.as_str().is_empty() {
      log::error!("no recorded uri; can't complete blockwise");
      self.transfer.idle();
      return Outcome::PathTooLong;
    }

    let parts = match uri::parts(uri.as_str()) {
      | Ok(parts) => parts,
      | Err(_) => {
        log::error!("recorded uri {} no longer parses", uri.as_str());
        self.transfer.idle();
        return Outcome::BadUri;
      },
    };

    let mut req = if self.proxied() {
      Req::proxied(Method::Get, uri.as_str())
    } else {
      Req::new(Method::Get, parts.path)
    };

    match rep.data().ty {
      // the prior exchange was confirmable; stay confirmable
      | Type::Ack => (),
      | _ => req.non(),
    }

    req.msg_mut().token = rep.data().token;
    req.msg_mut().set_block2(size, num + 1, false).ok();

    let msg = Message::from(req);
    match self.send(sock, Addrd(&msg, rep.addr())) {
      | Ok(n) if n > 0 => {
        self.transfer.continuing();
        Outcome::Continued(num + 1)
      },
      | Ok(_) | Err(_) => {
        log::error!("msg send failed");
        self.transfer.idle();
        Outcome::SendFailed
      },
    }
  }
}

fn log_response(msg: &Message) {
  let class = match msg.code.class {
    | 2 => "Success",
    | _ => "Error",
  };

  match core::str::from_utf8(&msg.payload.0) {
    | _ if msg.payload.0.is_empty() => {
      log::info!("{} response, code {}.{:02}, empty payload",
                 class,
                 msg.code.class,
                 msg.code.detail)
    },
    | Ok(text) => log::info!("{} response, code {}.{:02}, payload: {}",
                             class,
                             msg.code.class,
                             msg.code.detail,
                             text),
    | Err(_) => log::info!("{} response, code {}.{:02}, {} bytes",
                           class,
                           msg.code.class,
                           msg.code.detail,
                           msg.payload.0.len()),
  }
}
