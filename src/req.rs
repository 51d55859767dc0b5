//! Requests

use core::str::Utf8Error;

use toad_msg::{Code, ContentFormat, Id, MessageOptions, OptNumber, OptValue, Payload, Token, Type};

use crate::Message;

/// Proxy-Uri (RFC 7252 §5.10.2)
pub(crate) const PROXY_URI: OptNumber = OptNumber(35);

/// The request methods this endpoint understands.
///
/// The resource table only ever routes GET and PUT; any other method code
/// falls out of [`Method::try_from_code`] as `None` and is answered 4.05.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  /// CoAP 0.01 GET
  Get,
  /// CoAP 0.03 PUT
  Put,
}

impl Method {
  /// The method's message code
  pub fn code(&self) -> Code {
    match self {
      | Method::Get => Code::new(0, 1),
      | Method::Put => Code::new(0, 3),
    }
  }

  /// Recognize a message code as one of ours
  pub fn try_from_code(code: Code) -> Option<Method> {
    match (code.class, code.detail) {
      | (0, 1) => Some(Method::Get),
      | (0, 3) => Some(Method::Put),
      | _ => None,
    }
  }
}

/// A CoAP request.
///
/// Thin wrapper around [`Message`] with the accessors dispatch and the
/// handlers need. ID and token are left zeroed; the engine assigns real
/// ones when the message is handed off.
#[derive(Debug, Clone, PartialEq)]
pub struct Req(Message);

impl Req {
  /// Create a request with the given method and path.
  ///
  /// A leading `/` is dropped; the wire representation of paths is
  /// slash-free segments.
  pub fn new(method: Method, path: &str) -> Self {
    let mut msg = Message::new(Type::Con,
                               method.code(),
                               Id(0),
                               Token(Default::default()));
    msg.opts.insert(toad_msg::opt::known::repeat::PATH,
                    vec![OptValue(path.trim_start_matches('/').as_bytes().to_vec())]);
    Self(msg)
  }

  /// Create a GET request
  pub fn get(path: &str) -> Self {
    Self::new(Method::Get, path)
  }

  /// Create a request addressed through a forward proxy.
  ///
  /// The target URI rides whole in the Proxy-Uri option; no path is set.
  /// How to reach the proxy itself is the caller's business.
  pub fn proxied(method: Method, target: &str) -> Self {
    let mut msg = Message::new(Type::Con,
                               method.code(),
                               Id(0),
                               Token(Default::default()));
    msg.opts
       .insert(PROXY_URI, vec![OptValue(target.as_bytes().to_vec())]);
    Self(msg)
  }

  /// Create a PUT request carrying a text payload
  pub fn put(path: &str, payload: &str) -> Self {
    let mut req = Self::new(Method::Put, path);
    req.0.set_content_format(ContentFormat::Text).ok();
    req.set_payload(payload.as_bytes());
    req
  }

  /// The request method, if it is one this endpoint understands
  pub fn method(&self) -> Option<Method> {
    Method::try_from_code(self.0.code)
  }

  /// The request path
  pub fn path(&self) -> Result<Option<&str>, Utf8Error> {
    self.0.get_str(toad_msg::opt::known::repeat::PATH)
  }

  /// The message type (CON / NON)
  pub fn msg_type(&self) -> Type {
    self.0.ty
  }

  /// Mark this request non-confirmable
  pub fn non(&mut self) {
    self.0.ty = Type::Non;
  }

  /// The payload bytes
  pub fn payload(&self) -> &[u8] {
    &self.0.payload.0
  }

  /// The payload, as UTF-8 text
  pub fn payload_str(&self) -> Result<&str, Utf8Error> {
    core::str::from_utf8(self.payload())
  }

  /// Replace the payload
  pub fn set_payload(&mut self, bytes: &[u8]) {
    self.0.payload = Payload(bytes.to_vec());
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

impl From<Message> for Req {
  fn from(msg: Message) -> Self {
    Self(msg)
  }
}

impl From<Req> for Message {
  fn from(req: Req) -> Self {
    req.0
  }
}
