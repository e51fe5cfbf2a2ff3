// Runtime configuration.
//
// Read once at startup from the environment. Invalid values fall back to defaults with a warning.

use chrono::{FixedOffset, Offset, Utc};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const HTTP_ADDR: &str = "LIVE_ORDERS_HTTP_ADDR";
pub const UTC_OFFSET_MINUTES: &str = "LIVE_ORDERS_UTC_OFFSET_MINUTES";
pub const SEED_PATH: &str = "LIVE_ORDERS_SEED_PATH";
pub const CHANNEL_CAPACITY: &str = "LIVE_ORDERS_CHANNEL_CAPACITY";

const DEFAULT_HTTP_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 8080);
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub http_addr: SocketAddr,
    /// Offset of the venue's wall clock. Business days start at its midnight.
    pub venue_offset: FixedOffset,
    pub seed_path: Option<PathBuf>,
    pub channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(DEFAULT_HTTP_ADDR),
            venue_offset: Utc.fix(),
            seed_path: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let http_addr = parse_or(&lookup, HTTP_ADDR, defaults.http_addr);
        let venue_offset = parse_or(&lookup, UTC_OFFSET_MINUTES, 0i32)
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| {
                tracing::warn!(key = UTC_OFFSET_MINUTES, "offset out of range, using UTC");
                defaults.venue_offset
            });
        let seed_path = lookup(SEED_PATH)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        let channel_capacity = match parse_or(&lookup, CHANNEL_CAPACITY, defaults.channel_capacity) {
            0 => {
                tracing::warn!(key = CHANNEL_CAPACITY, "capacity must be positive, using default");
                defaults.channel_capacity
            }
            capacity => capacity,
        };
        Self {
            http_addr,
            venue_offset,
            seed_path,
            channel_capacity,
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, fallback = ?default, "invalid configuration value");
            default
        }
    }
}
