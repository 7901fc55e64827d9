use std::time::Duration;

use tracing::{Level, event};
use url::Url;
use wsd_scan_rs::proto::Protocol;

#[derive(Debug)]
pub struct Config {
    /// Endpoint of the device's scan service
    pub url: Url,
    pub protocol: Protocol,
    pub timeout: Duration,
    pub verbosity: Level,
}

impl Config {
    pub fn log(&self) {
        event!(Level::INFO, ?self);
    }
}
