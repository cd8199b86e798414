//! Configuration module for Tubecast.
//!
//! Settings are layered: built-in defaults, an optional TOML file, then
//! values from the environment or command line.

mod settings;

pub use settings::{
    DeliverySettings, FetcherSettings, GeneralSettings, Settings, TelegramSettings,
    DEFAULT_SIZE_LIMIT_BYTES,
};
