//! The behaviors behind the resource table.
//!
//! Handlers that mutate endpoint or device state parse and validate the
//! entire payload before the first write, so a 4.00 never leaves anything
//! half-changed. Payload parsing is strict: no whitespace, no signs, no
//! empty fields.

use core::fmt::Write;

use toad_msg::{ContentFormat, MessageOptions, Payload};
use toad_string::String;

use super::encode_link;
use crate::config::PAYLOAD_MAX;
use crate::dev::{Kind, Registry, Value};
use crate::endpoint::Endpoint;
use crate::req::{Method, Req};
use crate::resp::{code, Resp};

/// What lives behind a path in the resource table.
///
/// A closed set rather than function pointers: the whole routable surface
/// is visible here, and adding a behavior means adding a variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
  /// `/riot/board`: the board name
  Board,
  /// `/devices`: enumerate the device registry
  Devices,
  /// `/info`: human-readable tour of the resource surface
  Info,
  /// `/led`: binary actuator
  Led,
  /// `/led/color`: tri-channel actuator
  LedColor,
  /// `/led/usage`: how to drive the actuators
  LedUsage,
  /// `/sensors/<name>`: one sensor reading
  Sensor(Sense),
  /// `/sensors`: index of sensor subpaths
  SensorIndex,
  /// `/cli/stats`: the request counter
  Stats,
  /// `/.well-known/core`: link-format listing of this table
  WellKnownCore,
}

impl Handler {
  pub(crate) fn run<R: Registry>(self, ep: &mut Endpoint<R>, req: &Req) -> Resp {
    match self {
      | Handler::Board => Resp::text(req, code::CONTENT, ep.board),
      | Handler::Devices => devices(ep, req),
      | Handler::Info => Resp::text(req, code::CONTENT, INFO),
      | Handler::Led => led(ep, req),
      | Handler::LedColor => led_color(ep, req),
      | Handler::LedUsage => Resp::text(req, code::CONTENT, LED_USAGE),
      | Handler::Sensor(sense) => sensor(ep, req, sense),
      | Handler::SensorIndex => sensor_index(req),
      | Handler::Stats => stats(ep, req),
      | Handler::WellKnownCore => well_known_core(ep, req),
    }
  }
}

/// The sensors exposed under `/sensors`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
  /// 3-axis acceleration
  Accel,
  /// Relative humidity
  Hum,
  /// Illuminance
  Light,
  /// Barometric pressure
  Press,
  /// Temperature
  Temp,
}

impl Sense {
  /// Every sensor resource, in path order
  pub const ALL: [Sense; 5] = [Sense::Accel, Sense::Hum, Sense::Light, Sense::Press, Sense::Temp];

  /// The device class read for this resource
  pub fn kind(&self) -> Kind {
    match self {
      | Sense::Accel => Kind::Accel,
      | Sense::Hum => Kind::Hum,
      | Sense::Light => Kind::Light,
      | Sense::Press => Kind::Press,
      | Sense::Temp => Kind::Temp,
    }
  }

  /// The path segment under `/sensors`
  pub fn subpath(&self) -> &'static str {
    match self {
      | Sense::Accel => "accel",
      | Sense::Hum => "hum",
      | Sense::Light => "light",
      | Sense::Press => "press",
      | Sense::Temp => "temp",
    }
  }

  fn render(&self, val: Value) -> String<48> {
    let Value([a, b, c]) = val;
    match self {
      | Sense::Accel => toad_string::format!(48, "x:{} y:{} z:{}", a, b, c),
      | Sense::Hum => centi(a, "%"),
      | Sense::Light => toad_string::format!(48, "{} lux", a),
      | Sense::Press => toad_string::format!(48, "{} Pa", a),
      | Sense::Temp => centi(a, "\u{b0}C"),
    }
  }
}

const INFO: &str = "Sensors live under /sensors (see the index there).\n\
                    Actuators: /led (on/off), /led/color (rgb); usage at /led/usage.\n\
                    Registered hardware is listed at /devices.\n";

const LED_USAGE: &str = "PUT /led: \"<name>,<0|1>\" or bare \"<0|1>\" for the default LED\n\
                         PUT /led/color: \"<r>,<g>,<b>\", each channel 0-255\n";

/// Render a centi-scaled reading (`2215` -> `22.15`) with `unit` appended
fn centi(v: i16, unit: &str) -> String<48> {
  // v/100 loses the sign for -99..=-1
  let sign = if (-99..=-1).contains(&v) { "-" } else { "" };
  toad_string::format!(48, "{}{}.{:02}{}", sign, v / 100, (v % 100).abs(), unit)
}

/// Strict bounded decimal: 1..=`max_digits` ASCII digits, value <= `max`
fn decimal(bytes: &[u8], max_digits: usize, max: u32) -> Option<u32> {
  if bytes.is_empty() || bytes.len() > max_digits {
    return None;
  }

  bytes.iter()
       .try_fold(0u32, |acc, b| match b {
         | b'0'..=b'9' => Some(acc * 10 + u32::from(b - b'0')),
         | _ => None,
       })
       .filter(|n| *n <= max)
}

/// Exactly `<r>,<g>,<b>`, each channel 0..=255
fn parse_rgb(bytes: &[u8]) -> Option<[i16; 3]> {
  let mut channels = bytes.split(|b| *b == b',');
  let r = decimal(channels.next()?, 3, 255)? as i16;
  let g = decimal(channels.next()?, 3, 255)? as i16;
  let b = decimal(channels.next()?, 3, 255)? as i16;

  match channels.next() {
    | Some(_) => None,
    | None => Some([r, g, b]),
  }
}

fn switch_state(bytes: &[u8]) -> Option<i16> {
  match bytes {
    | [b'0'] => Some(0),
    | [b'1'] => Some(1),
    | _ => None,
  }
}

fn rgb_text(rgb: [i16; 3]) -> String<16> {
  toad_string::format!(16, "{},{},{}", rgb[0], rgb[1], rgb[2])
}

fn stats<R: Registry>(ep: &mut Endpoint<R>, req: &Req) -> Resp {
  match req.method() {
    | Some(Method::Put) => match decimal(req.payload(), 5, u32::from(u16::MAX)) {
      | Some(n) => {
        ep.req_count = n as u16;
        Resp::for_request(req, code::CHANGED)
      },
      | None => Resp::for_request(req, code::BAD_REQUEST),
    },
    | _ => Resp::text(req,
                      code::CONTENT,
                      toad_string::format!(8, "{}", ep.req_count).as_str()),
  }
}

fn led<R: Registry>(ep: &mut Endpoint<R>, req: &Req) -> Resp {
  match req.method() {
    | Some(Method::Put) => led_put(ep, req),
    | _ => Resp::text(req,
                      code::CONTENT,
                      toad_string::format!(8, "{}", ep.led).as_str()),
  }
}

fn led_put<R: Registry>(ep: &mut Endpoint<R>, req: &Req) -> Resp {
  let payload = req.payload();

  let (dev, state) = match payload.iter().position(|b| *b == b',') {
    | Some(ix) => {
      let name = match core::str::from_utf8(&payload[..ix]) {
        | Ok(name) if !name.is_empty() => name,
        | _ => return Resp::for_request(req, code::BAD_REQUEST),
      };
      let state = match switch_state(&payload[ix + 1..]) {
        | Some(s) => s,
        | None => return Resp::for_request(req, code::BAD_REQUEST),
      };
      match ep.reg.find_by_name(name) {
        | Some(dev) => (dev, state),
        | None => {
          log::error!("no device named {:?}", name);
          return Resp::for_request(req, code::INTERNAL_SERVER_ERROR);
        },
      }
    },
    | None => {
      let state = match switch_state(payload) {
        | Some(s) => s,
        | None => return Resp::for_request(req, code::BAD_REQUEST),
      };
      match ep.reg.find_by_kind(Kind::Switch) {
        | Some(dev) => (dev, state),
        | None => {
          log::error!("no default switch device");
          return Resp::for_request(req, code::INTERNAL_SERVER_ERROR);
        },
      }
    },
  };

  match ep.reg.write(dev, Value::scalar(state)) {
    | Ok(()) => {
      ep.led = state;
      Resp::text(req,
                 code::CHANGED,
                 toad_string::format!(8, "{}", state).as_str())
    },
    | Err(e) => {
      log::error!("switch write failed: {:?}", e);
      Resp::for_request(req, code::INTERNAL_SERVER_ERROR)
    },
  }
}

fn led_color<R: Registry>(ep: &mut Endpoint<R>, req: &Req) -> Resp {
  match req.method() {
    | Some(Method::Put) => {
      let rgb = match parse_rgb(req.payload()) {
        | Some(rgb) => rgb,
        | None => return Resp::for_request(req, code::BAD_REQUEST),
      };
      let dev = match ep.reg.find_by_kind(Kind::RgbLed) {
        | Some(dev) => dev,
        | None => return Resp::for_request(req, code::NOT_FOUND),
      };
      match ep.reg.write(dev, Value(rgb)) {
        | Ok(()) => {
          ep.rgb = rgb;
          Resp::text(req, code::CHANGED, rgb_text(rgb).as_str())
        },
        | Err(e) => {
          log::error!("rgb write failed: {:?}", e);
          Resp::for_request(req, code::INTERNAL_SERVER_ERROR)
        },
      }
    },
    | _ => Resp::text(req, code::CONTENT, rgb_text(ep.rgb).as_str()),
  }
}

fn sensor<R: Registry>(ep: &Endpoint<R>, req: &Req, sense: Sense) -> Resp {
  let val = ep.reg
              .find_by_kind(sense.kind())
              .and_then(|dev| ep.reg.read(dev).ok());

  match val {
    | Some(v) => Resp::text(req, code::CONTENT, sense.render(v).as_str()),
    | None => {
      log::debug!("{:?} sensor unavailable", sense);
      Resp::for_request(req, code::NOT_FOUND)
    },
  }
}

fn sensor_index(req: &Req) -> Resp {
  let mut out = String::<128>::new();
  for sense in Sense::ALL {
    writeln!(out, "/sensors/{}", sense.subpath()).ok();
  }

  Resp::text(req, code::CONTENT, out.as_str())
}

fn devices<R: Registry>(ep: &Endpoint<R>, req: &Req) -> Resp {
  // room for one more line plus an elision marker
  const MARGIN: usize = 50;

  let mut out = String::<PAYLOAD_MAX>::new();
  writeln!(out, "Available devices:").ok();
  ep.reg.devices(|name, kind| {
          if out.as_str().len() + MARGIN > out.capacity() {
            return;
          }
          writeln!(out, "- {} (type: {})", name.unwrap_or("unnamed"), kind.code()).ok();
        });

  Resp::text(req, code::CONTENT, out.as_str())
}

fn well_known_core<R: Registry>(ep: &Endpoint<R>, req: &Req) -> Resp {
  let mut out = String::<PAYLOAD_MAX>::new();
  for (ix, res) in ep.resources().iter().enumerate() {
    if ix > 0 {
      write!(out, ",").ok();
    }
    write!(out, "{}", encode_link(res)).ok();
  }

  let mut rep = Resp::for_request(req, code::CONTENT);
  rep.msg_mut().set_content_format(ContentFormat::LinkFormat).ok();
  rep.msg_mut().payload = Payload(out.as_str().as_bytes().to_vec());
  rep
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test;

  #[test]
  fn counter_put_then_get_should_agree() {
    let mut ep = test::endpoint();
    assert_eq!(ep.dispatch(Req::put("/cli/stats", "42")).code(), code::CHANGED);
    let rep = ep.dispatch(Req::get("/cli/stats"));
    assert_eq!(rep.code(), code::CONTENT);
    assert_eq!(rep.payload_str().unwrap(), "42");
  }

  #[test]
  fn counter_put_should_reject_bad_payloads() {
    let mut ep = test::endpoint();
    ep.dispatch(Req::put("/cli/stats", "7"));

    for bad in ["", "123456", "12a", "70000", " 7", "-1"] {
      assert_eq!(ep.dispatch(Req::put("/cli/stats", bad)).code(),
                 code::BAD_REQUEST,
                 "payload {:?}",
                 bad);
    }

    // none of those rejections touched the counter
    assert_eq!(ep.dispatch(Req::get("/cli/stats")).payload_str().unwrap(), "7");
  }

  #[test]
  fn rgb_put_should_write_then_echo_and_get_should_mirror() {
    let mut ep = test::endpoint();
    let rep = ep.dispatch(Req::put("/led/color", "10,20,30"));
    assert_eq!(rep.code(), code::CHANGED);
    assert_eq!(rep.payload_str().unwrap(), "10,20,30");

    assert_eq!(ep.dispatch(Req::get("/led/color")).payload_str().unwrap(),
               "10,20,30");
    assert_eq!(ep.reg.writes, vec![(test::RGB, Value([10, 20, 30]))]);
  }

  #[test]
  fn rgb_put_out_of_range_should_leave_device_untouched() {
    let mut ep = test::endpoint();
    assert_eq!(ep.dispatch(Req::put("/led/color", "10,20,300")).code(),
               code::BAD_REQUEST);
    assert!(ep.reg.writes.is_empty());
    assert_eq!(ep.dispatch(Req::get("/led/color")).payload_str().unwrap(),
               "0,0,0");
  }

  #[test]
  fn rgb_put_should_reject_malformed_triples() {
    let mut ep = test::endpoint();
    for bad in ["", "10,20", "10,20,30,40", "10, 20, 30", "10,,30", "a,b,c", "1000,0,0"] {
      assert_eq!(ep.dispatch(Req::put("/led/color", bad)).code(),
                 code::BAD_REQUEST,
                 "payload {:?}",
                 bad);
    }
    assert!(ep.reg.writes.is_empty());
  }

  #[test]
  fn when_rgb_device_missing_put_should_respond_4_04() {
    let mut ep = test::bare_endpoint();
    assert_eq!(ep.dispatch(Req::put("/led/color", "1,2,3")).code(),
               code::NOT_FOUND);
  }

  #[test]
  fn when_rgb_write_fails_put_should_respond_5_00() {
    let mut ep = test::endpoint();
    ep.reg.devs[test::RGB].fail_write = true;
    assert_eq!(ep.dispatch(Req::put("/led/color", "1,2,3")).code(),
               code::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn led_put_should_accept_named_and_bare_forms() {
    let mut ep = test::endpoint();

    let rep = ep.dispatch(Req::put("/led", "red,1"));
    assert_eq!(rep.code(), code::CHANGED);
    assert_eq!(rep.payload_str().unwrap(), "1");
    assert_eq!(ep.reg.writes, vec![(test::RED, Value::scalar(1))]);

    // bare form drives the first switch in the registry
    ep.dispatch(Req::put("/led", "0"));
    assert_eq!(ep.reg.writes[1], (test::BLUE, Value::scalar(0)));
  }

  #[test]
  fn led_get_should_mirror_last_write() {
    let mut ep = test::endpoint();
    assert_eq!(ep.dispatch(Req::get("/led")).payload_str().unwrap(), "0");
    ep.dispatch(Req::put("/led", "1"));
    assert_eq!(ep.dispatch(Req::get("/led")).payload_str().unwrap(), "1");
  }

  #[test]
  fn led_put_should_reject_bad_payloads() {
    let mut ep = test::endpoint();
    for bad in ["", "2", "on", "red,2", "red,", ",1", "red,1,1"] {
      assert_eq!(ep.dispatch(Req::put("/led", bad)).code(),
                 code::BAD_REQUEST,
                 "payload {:?}",
                 bad);
    }
  }

  #[test]
  fn when_led_name_unknown_put_should_respond_5_00() {
    let mut ep = test::endpoint();
    assert_eq!(ep.dispatch(Req::put("/led", "green,1")).code(),
               code::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn sensors_should_render_their_units() {
    let mut ep = test::endpoint();
    let read = |ep: &mut crate::Endpoint<test::TestRegistry>, path| {
      ep.dispatch(Req::get(path)).payload_str().unwrap().to_string()
    };

    assert_eq!(read(&mut ep, "/sensors/temp"), "22.15\u{b0}C");
    assert_eq!(read(&mut ep, "/sensors/hum"), "47.50%");
    assert_eq!(read(&mut ep, "/sensors/press"), "1013 Pa");
    assert_eq!(read(&mut ep, "/sensors/light"), "560 lux");
    assert_eq!(read(&mut ep, "/sensors/accel"), "x:2 y:-5 z:1020");
  }

  #[test]
  fn sub_degree_negatives_should_keep_their_sign() {
    let mut ep = test::endpoint();
    ep.reg.devs[test::TEMP].value = Value::scalar(-50);
    assert_eq!(ep.dispatch(Req::get("/sensors/temp")).payload_str().unwrap(),
               "-0.50\u{b0}C");

    ep.reg.devs[test::TEMP].value = Value::scalar(-523);
    assert_eq!(ep.dispatch(Req::get("/sensors/temp")).payload_str().unwrap(),
               "-5.23\u{b0}C");
  }

  #[test]
  fn when_sensor_missing_get_should_respond_4_04_and_not_count() {
    let mut ep = test::bare_endpoint();
    let before = ep.request_count();
    assert_eq!(ep.dispatch(Req::get("/sensors/temp")).code(), code::NOT_FOUND);
    assert_eq!(ep.request_count(), before);
  }

  #[test]
  fn when_sensor_read_fails_get_should_respond_4_04() {
    let mut ep = test::endpoint();
    ep.reg.devs[test::TEMP].fail_read = true;
    assert_eq!(ep.dispatch(Req::get("/sensors/temp")).code(), code::NOT_FOUND);
  }

  #[test]
  fn board_should_report_its_name() {
    let mut ep = test::endpoint();
    assert_eq!(ep.dispatch(Req::get("/riot/board")).payload_str().unwrap(),
               "nucleo-f767zi");
  }

  #[test]
  fn sensor_index_should_list_every_subpath() {
    let mut ep = test::endpoint();
    let rep = ep.dispatch(Req::get("/sensors"));
    let body = rep.payload_str().unwrap();
    for sense in Sense::ALL {
      assert!(body.contains(sense.subpath()), "{} missing", sense.subpath());
    }
  }

  #[test]
  fn devices_should_list_names_and_type_codes() {
    let mut ep = test::endpoint();
    let rep = ep.dispatch(Req::get("/devices"));
    let body = rep.payload_str().unwrap();
    assert!(body.starts_with("Available devices:\n"));
    assert!(body.contains("- red (type: 65)\n"));
    assert!(body.contains("- accel (type: 133)\n"));
  }

  #[test]
  fn when_registry_is_huge_devices_should_truncate_at_a_line() {
    let mut ep = test::endpoint();
    for _ in 0..100 {
      ep.reg.devs.push(test::device(Some("pressure-sensor-breakout"),
                                       Kind::Press,
                                       Value::scalar(0)));
    }

    let rep = ep.dispatch(Req::get("/devices"));
    let body = rep.payload_str().unwrap();
    assert!(body.len() <= PAYLOAD_MAX);
    assert!(body.ends_with('\n'), "cut mid-line: {:?}", body);
  }

  #[test]
  fn well_known_core_should_link_the_whole_table() {
    let mut ep = test::endpoint();
    let rep = ep.dispatch(Req::get("/.well-known/core"));
    assert_eq!(rep.code(), code::CONTENT);

    let body = rep.payload_str().unwrap();
    assert!(body.starts_with("</.well-known/core>,"));
    assert!(body.contains("</cli/stats>;ct=0;rt=\"count\";obs,"));
    assert!(body.ends_with("</sensors/temp>"));
  }

  #[test]
  fn info_and_usage_should_have_content() {
    let mut ep = test::endpoint();
    for path in ["/info", "/led/usage"] {
      let rep = ep.dispatch(Req::get(path));
      assert_eq!(rep.code(), code::CONTENT);
      assert!(!rep.payload().is_empty());
    }
  }
}
