//! The server role: a path-sorted resource table and request dispatch.
//!
//! Routing is an exact-match binary search over the table; there are no
//! wildcards. Lookup happens before method checking, so an unknown path is
//! always 4.04 and a known path with a bad method always 4.05.

mod handlers;
mod link;

pub use handlers::{Handler, Sense};
pub(crate) use link::encode_link;

use crate::dev::Registry;
use crate::endpoint::Endpoint;
use crate::req::{Method, Req};
use crate::resp::{code, Resp};

/// The methods a resource admits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Methods(u8);

impl Methods {
  /// GET only
  pub const GET: Methods = Methods(0b01);
  /// GET and PUT
  pub const GET_PUT: Methods = Methods(0b11);
  /// PUT only
  pub const PUT: Methods = Methods(0b10);

  /// Does this resource admit `m`?
  pub fn allows(&self, m: Method) -> bool {
    match m {
      | Method::Get => self.0 & 0b01 != 0,
      | Method::Put => self.0 & 0b10 != 0,
    }
  }
}

/// One row of the resource table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
  /// Absolute path, with a leading `/`
  pub path: &'static str,
  /// Methods this resource admits
  pub methods: Methods,
  /// The behavior behind the path
  pub handler: Handler,
  /// Extra link-format attributes (e.g. `;ct=0;rt="count"`)
  pub link_attr: Option<&'static str>,
}

/// The resource table handed to [`Resources::new`] was malformed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
  /// Entries are not in ascending byte order of path
  Unsorted {
    /// The first out-of-place path
    at: &'static str,
  },
  /// The same path appears twice
  Duplicate {
    /// The repeated path
    path: &'static str,
  },
}

/// The resource table.
///
/// The strictly-ascending path order is established at construction and
/// relied on by [`Resources::find`] forever after; there is no way to add
/// entries later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
  entries: Vec<Resource>,
}

impl Resources {
  /// Validate `entries` (strictly ascending byte order of `path`) and wrap
  /// them in a table
  pub fn new(entries: Vec<Resource>) -> Result<Self, TableError> {
    for pair in entries.windows(2) {
      if pair[0].path == pair[1].path {
        return Err(TableError::Duplicate { path: pair[1].path });
      } else if pair[0].path > pair[1].path {
        return Err(TableError::Unsorted { at: pair[1].path });
      }
    }

    Ok(Self { entries })
  }

  /// The table every [`Endpoint`] serves
  pub fn standard() -> Result<Self, TableError> {
    // paths stay in ascending byte order; `new` re-checks
    Self::new(vec![
      Resource { path: "/.well-known/core",
                 methods: Methods::GET,
                 handler: Handler::WellKnownCore,
                 link_attr: None },
      Resource { path: "/cli/stats",
                 methods: Methods::GET_PUT,
                 handler: Handler::Stats,
                 link_attr: Some(";ct=0;rt=\"count\";obs") },
      Resource { path: "/devices",
                 methods: Methods::GET,
                 handler: Handler::Devices,
                 link_attr: None },
      Resource { path: "/info",
                 methods: Methods::GET,
                 handler: Handler::Info,
                 link_attr: None },
      Resource { path: "/led",
                 methods: Methods::GET_PUT,
                 handler: Handler::Led,
                 link_attr: None },
      Resource { path: "/led/color",
                 methods: Methods::GET_PUT,
                 handler: Handler::LedColor,
                 link_attr: None },
      Resource { path: "/led/usage",
                 methods: Methods::GET,
                 handler: Handler::LedUsage,
                 link_attr: None },
      Resource { path: "/riot/board",
                 methods: Methods::GET,
                 handler: Handler::Board,
                 link_attr: None },
      Resource { path: "/sensors",
                 methods: Methods::GET,
                 handler: Handler::SensorIndex,
                 link_attr: None },
      Resource { path: "/sensors/accel",
                 methods: Methods::GET,
                 handler: Handler::Sensor(Sense::Accel),
                 link_attr: None },
      Resource { path: "/sensors/hum",
                 methods: Methods::GET,
                 handler: Handler::Sensor(Sense::Hum),
                 link_attr: None },
      Resource { path: "/sensors/light",
                 methods: Methods::GET,
                 handler: Handler::Sensor(Sense::Light),
                 link_attr: None },
      Resource { path: "/sensors/press",
                 methods: Methods::GET,
                 handler: Handler::Sensor(Sense::Press),
                 link_attr: None },
      Resource { path: "/sensors/temp",
                 methods: Methods::GET,
                 handler: Handler::Sensor(Sense::Temp),
                 link_attr: None },
    ])
  }

  /// Exact-match lookup, ignoring a leading `/` on either side
  pub fn find(&self, path: &str) -> Option<&Resource> {
    let path = path.strip_prefix('/').unwrap_or(path);
    self.entries
        .binary_search_by(|r| r.path.trim_start_matches('/').cmp(path))
        .ok()
        .map(|ix| &self.entries[ix])
  }

  /// Visit the table in path order
  pub fn iter(&self) -> impl Iterator<Item = &Resource> {
    self.entries.iter()
  }
}

impl<R: Registry> Endpoint<R> {
  /// Route an inbound request to its resource handler.
  ///
  /// Always yields a response: unknown path 4.04, known path with a method
  /// outside the resource's set 4.05, unreadable path 4.00. Handlers that
  /// mutate state validate the whole payload before touching anything, so a
  /// 4.00 from a handler implies no side effect happened.
  pub fn dispatch(&mut self, req: Req) -> Resp {
    let path = match req.path() {
      | Ok(Some(p)) => p,
      | Ok(None) => "",
      | Err(_) => return Resp::for_request(&req, code::BAD_REQUEST),
    };

    let found = self.resources().find(path).map(|r| (r.methods, r.handler));

    match found {
      | None => {
        log::debug!("no resource at {:?}", path);
        Resp::for_request(&req, code::NOT_FOUND)
      },
      | Some((methods, _)) if !req.method().map(|m| methods.allows(m)).unwrap_or(false) => {
        Resp::for_request(&req, code::METHOD_NOT_ALLOWED)
      },
      | Some((_, handler)) => handler.run(self, &req),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test;

  fn entry(path: &'static str) -> Resource {
    Resource { path,
               methods: Methods::GET,
               handler: Handler::Info,
               link_attr: None }
  }

  #[test]
  fn when_entries_unsorted_new_should_reject_them() {
    assert_eq!(Resources::new(vec![entry("/b"), entry("/a")]),
               Err(TableError::Unsorted { at: "/a" }));
  }

  #[test]
  fn when_entries_repeat_new_should_reject_them() {
    assert_eq!(Resources::new(vec![entry("/a"), entry("/a")]),
               Err(TableError::Duplicate { path: "/a" }));
  }

  #[test]
  fn find_should_match_exactly_and_ignore_leading_slash() {
    let table = Resources::standard().unwrap();
    assert_eq!(table.find("/led").map(|r| r.path), Some("/led"));
    assert_eq!(table.find("led/color").map(|r| r.path), Some("/led/color"));
    assert_eq!(table.find("/led/"), None);
    assert_eq!(table.find("/led/colo"), None);
  }

  #[test]
  fn when_path_unknown_dispatch_should_respond_4_04() {
    let mut ep = test::endpoint();
    let rep = ep.dispatch(Req::get("/nope"));
    assert_eq!(rep.code(), code::NOT_FOUND);
  }

  #[test]
  fn when_method_not_admitted_dispatch_should_respond_4_05() {
    let mut ep = test::endpoint();
    let rep = ep.dispatch(Req::put("/riot/board", "x"));
    assert_eq!(rep.code(), code::METHOD_NOT_ALLOWED);
  }

  #[test]
  fn when_method_unknown_dispatch_should_respond_4_05() {
    use toad_msg::Code;

    let mut ep = test::endpoint();
    let mut req = Req::get("/led");
    req.msg_mut().code = Code::new(0, 2); // POST
    assert_eq!(ep.dispatch(req).code(), code::METHOD_NOT_ALLOWED);
  }

  #[test]
  fn method_check_should_happen_after_lookup() {
    let mut ep = test::endpoint();
    // PUT to a GET-only path that exists -> 4.05, not 4.04
    let rep = ep.dispatch(Req::put("/sensors/temp", "x"));
    assert_eq!(rep.code(), code::METHOD_NOT_ALLOWED);
    // PUT to a missing path -> 4.04
    let rep = ep.dispatch(Req::put("/sensors/nope", "x"));
    assert_eq!(rep.code(), code::NOT_FOUND);

    // neither refusal touched a device or the counter
    assert!(ep.reg.writes.is_empty());
    assert_eq!(ep.request_count(), 0);
  }
}
