//! Bootstrap configuration: host-based environment detection and the cached
//! `FWK_ConfigSettings` snapshot that every target resolves its connection string from.

mod clock;
mod environment;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use environment::{BootstrapConnections, Environment, host_identity};
pub use store::{
    BootstrapSource, CONFIG_TABLE_QUERY, CONFIG_TTL, ConfigRow, ConfigSnapshot, ConfigSource,
    ConfigStore,
};
