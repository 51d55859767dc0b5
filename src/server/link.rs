//! CoRE link-format ([RFC 6690]) encoding of resource table entries.
//!
//! [RFC 6690]: https://datatracker.ietf.org/doc/html/rfc6690

use core::fmt::Write;

use toad_string::String;

use super::Resource;

/// One `</path>;attrs` fragment for `res`.
///
/// If the entry's attributes don't fit next to the base link they are
/// dropped whole rather than emitted cut off; the base link always comes
/// out intact for every table path.
pub(crate) fn encode_link(res: &Resource) -> String<64> {
  let mut out = String::new();
  write!(out, "<{}>", res.path).ok();

  if let Some(attr) = res.link_attr {
    if out.as_str().len() + attr.len() <= out.capacity() {
      out.push_str(attr);
    }
  }

  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::server::{Handler, Methods};

  fn res(path: &'static str, link_attr: Option<&'static str>) -> Resource {
    Resource { path,
               methods: Methods::GET,
               handler: Handler::Info,
               link_attr }
  }

  #[test]
  fn encode_should_wrap_path_in_angle_brackets() {
    assert_eq!(encode_link(&res("/led", None)), "</led>");
  }

  #[test]
  fn encode_should_append_attributes_when_they_fit() {
    assert_eq!(encode_link(&res("/cli/stats", Some(";ct=0;rt=\"count\";obs"))),
               "</cli/stats>;ct=0;rt=\"count\";obs");
  }

  #[test]
  fn when_attributes_overflow_encode_should_keep_base_link() {
    let attr = ";rt=\"0123456789012345678901234567890123456789012345678901234567890123456789\"";
    assert_eq!(encode_link(&res("/led", Some(attr))), "</led>");
  }
}
