//! Splitting `coap://` URIs into their parts.
//!
//! This is plumbing for the client role: the continuation engine re-derives
//! the request path (or proxy target) from the URI string it recorded when
//! the original request went out. It is a splitter, not a validator; percent
//! decoding and scheme semantics stay with the engine.

/// The parts of a `coap://` URI, borrowed from the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parts<'a> {
  /// Scheme, without the `://` (e.g. `coap`)
  pub scheme: &'a str,
  /// Host, without brackets for IPv6 literals
  pub host: &'a str,
  /// Port, if one was given
  pub port: Option<u16>,
  /// Path beginning with `/`, or `""` when absent
  pub path: &'a str,
}

/// The input is not a URI this endpoint can use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadUri;

/// Split `uri` into [`Parts`].
///
/// Accepts `<scheme>://<host>[:<port>][/<path>]` where `<host>` may be a
/// `[`-bracketed IPv6 literal. The scheme must start with `coap`.
pub fn parts(uri: &str) -> Result<Parts<'_>, BadUri> {
  let (scheme, rest) = uri.split_once("://").ok_or(BadUri)?;
  if !scheme.starts_with("coap") {
    return Err(BadUri);
  }

  let (authority, path) = match rest.find('/') {
    | Some(ix) => (&rest[..ix], &rest[ix..]),
    | None => (rest, ""),
  };

  let (host, port) = if let Some(v6) = authority.strip_prefix('[') {
    let (host, after) = v6.split_once(']').ok_or(BadUri)?;
    (host, after.strip_prefix(':'))
  } else {
    match authority.rsplit_once(':') {
      | Some((host, port)) => (host, Some(port)),
      | None => (authority, None),
    }
  };

  if host.is_empty() {
    return Err(BadUri);
  }

  let port = match port {
    | Some(p) => Some(p.parse::<u16>().map_err(|_| BadUri)?),
    | None => None,
  };

  Ok(Parts { scheme,
             host,
             port,
             path })
}
