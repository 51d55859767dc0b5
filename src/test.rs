//! Scripted doubles for the registry and transport seams.

use std::net::SocketAddr;

use crate::dev::{Error, Kind, Registry, Value};
use crate::net::{Addrd, Transport};
use crate::{Endpoint, Message};

// indices into TestRegistry::standard()
pub(crate) const BLUE: usize = 0;
pub(crate) const RED: usize = 1;
pub(crate) const RGB: usize = 2;
pub(crate) const TEMP: usize = 3;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Device {
  pub(crate) name: Option<&'static str>,
  pub(crate) kind: Kind,
  pub(crate) value: Value,
  pub(crate) fail_read: bool,
  pub(crate) fail_write: bool,
}

pub(crate) fn device(name: Option<&'static str>, kind: Kind, value: Value) -> Device {
  Device { name,
           kind,
           value,
           fail_read: false,
           fail_write: false }
}

/// An in-memory [`Registry`] recording every write
#[derive(Debug, Default)]
pub(crate) struct TestRegistry {
  pub(crate) devs: Vec<Device>,
  pub(crate) writes: Vec<(usize, Value)>,
}

impl TestRegistry {
  pub(crate) fn standard() -> Self {
    Self { devs: vec![device(Some("blue"), Kind::Switch, Value::scalar(0)),
                      device(Some("red"), Kind::Switch, Value::scalar(0)),
                      device(Some("rgb"), Kind::RgbLed, Value::default()),
                      device(Some("temp"), Kind::Temp, Value::scalar(2215)),
                      device(Some("hum"), Kind::Hum, Value::scalar(4750)),
                      device(Some("press"), Kind::Press, Value::scalar(1013)),
                      device(Some("light"), Kind::Light, Value::scalar(560)),
                      device(Some("accel"), Kind::Accel, Value([2, -5, 1020]))],
           writes: vec![] }
  }
}

impl Registry for TestRegistry {
  type Handle = usize;

  fn find_by_kind(&self, kind: Kind) -> Option<usize> {
    self.devs.iter().position(|d| d.kind == kind)
  }

  fn find_by_name(&self, name: &str) -> Option<usize> {
    self.devs.iter().position(|d| d.name == Some(name))
  }

  fn read(&self, dev: usize) -> Result<Value, Error> {
    let d = &self.devs[dev];
    if d.fail_read {
      Err(Error::Read)
    } else {
      Ok(d.value)
    }
  }

  fn write(&mut self, dev: usize, val: Value) -> Result<(), Error> {
    if self.devs[dev].fail_write {
      return Err(Error::Write);
    }

    self.devs[dev].value = val;
    self.writes.push((dev, val));
    Ok(())
  }

  fn devices<F>(&self, mut f: F)
    where F: FnMut(Option<&str>, Kind)
  {
    for d in &self.devs {
      f(d.name, d.kind);
    }
  }
}

/// A [`Transport`] that records what it is handed
#[derive(Debug, Default)]
pub(crate) struct TestSock {
  pub(crate) sent: Vec<Addrd<Message>>,
  pub(crate) fail: bool,
}

impl Transport for TestSock {
  type Error = &'static str;

  fn send(&mut self, msg: Addrd<&Message>) -> Result<usize, &'static str> {
    if self.fail {
      return Err("transport refused message");
    }

    self.sent.push(msg.map(Clone::clone));
    Ok(1152)
  }
}

pub(crate) fn endpoint() -> Endpoint<TestRegistry> {
  init_log();
  Endpoint::new(TestRegistry::standard(), "nucleo-f767zi").unwrap()
}

/// An endpoint whose registry has no devices at all
pub(crate) fn bare_endpoint() -> Endpoint<TestRegistry> {
  init_log();
  Endpoint::new(TestRegistry::default(), "nucleo-f767zi").unwrap()
}

pub(crate) fn addr() -> SocketAddr {
  "[2001:db8::2]:5683".parse().unwrap()
}

fn init_log() {
  simple_logger::SimpleLogger::new().with_level(log::LevelFilter::Debug)
                                    .init()
                                    .ok();
}
