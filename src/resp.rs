//! Responses

use core::str::Utf8Error;

use toad_msg::{Code, ContentFormat, MessageOptions, Payload, Type};

use crate::req::Req;
use crate::Message;

/// Response codes used by this endpoint
pub mod code {
  use toad_msg::Code;

  /// 2.04 Changed
  pub const CHANGED: Code = Code::new(2, 4);
  /// 2.05 Content
  pub const CONTENT: Code = Code::new(2, 5);
  /// 4.00 Bad Request
  pub const BAD_REQUEST: Code = Code::new(4, 0);
  /// 4.04 Not Found
  pub const NOT_FOUND: Code = Code::new(4, 4);
  /// 4.05 Method Not Allowed
  pub const METHOD_NOT_ALLOWED: Code = Code::new(4, 5);
  /// 5.00 Internal Server Error
  pub const INTERNAL_SERVER_ERROR: Code = Code::new(5, 0);
}

/// A CoAP response.
///
/// Wraps [`Message`] the same way [`Req`] does. ID and token are zeroed;
/// matching the response to its request is the engine's job.
#[derive(Debug, Clone, PartialEq)]
pub struct Resp(Message);

impl Resp {
  /// Respond to `req` with `code` and no payload.
  ///
  /// Confirmable requests get a piggybacked ACK, everything else a NON.
  pub fn for_request(req: &Req, code: Code) -> Self {
    let ty = match req.msg_type() {
      | Type::Con => Type::Ack,
      | _ => Type::Non,
    };

    Self(Message::new(ty, code, req.msg().id, req.msg().token))
  }

  /// Respond to `req` with `code` and a text payload
  pub fn text(req: &Req, code: Code, text: &str) -> Self {
    let mut rep = Self::for_request(req, code);
    rep.0.set_content_format(ContentFormat::Text).ok();
    rep.0.payload = Payload(text.as_bytes().to_vec());
    rep
  }

  /// The response code
  pub fn code(&self) -> Code {
    self.0.code
  }

  /// The payload bytes
  pub fn payload(&self) -> &[u8] {
    &self.0.payload.0
  }

  /// The payload, as UTF-8 text
  pub fn payload_str(&self) -> Result<&str, Utf8Error> {
    core::str::from_utf8(self.payload())
  }

  /// Borrow the wire message
  pub fn msg(&self) -> &Message {
    &self.0
  }

  /// Borrow the wire message mutably
  pub fn msg_mut(&mut self) -> &mut Message {
    &mut self.0
  }
}

impl From<Message> for Resp {
  fn from(msg: Message) -> Self {
    Self(msg)
  }
}

impl From<Resp> for Message {
  fn from(rep: Resp) -> Self {
    rep.0
  }
}
