/*!
 # Office Lamp Routine

 Keeps a LIFX bulb in step with the time of day. Each run looks at the local
 hour, picks one of five daily time blocks and, when the block differs from the
 one recorded in the state file, sends the block's color preset to the bulb and
 records the new block.

 The routine is meant to be fired by an external scheduler (cron, a systemd
 timer). A failed run leaves the state file untouched, so the next invocation
 attempts the same transition again.

 ## Example

 ```no_run
 use office_lamp::*;

 #[tokio::main(flavor = "current_thread")]
 async fn main() -> Result<()> {
     let config = Config::default();
     let store = FileBlockStore::new(&config.state_file);
     let discovery = LifxDiscovery::new(config.discovery_timeout, config.command_timeout);

     let mut routine = Routine::new(store, discovery, &config);
     let transition = routine.run_now().await?;
     println!("{transition}");

     Ok(())
 }
 ```
*/

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Error types for the office lamp routine
#[derive(Error, Debug)]
pub enum Error {
    /// The state file does not exist, so the run is aborted
    #[error("{0} file not found. Aborting light change")]
    MissingStateFile(PathBuf),

    /// The hour does not belong to any time block
    #[error("Hour #{0} not present in any defined block")]
    UnresolvableHour(u32),

    /// The bulb did not answer discovery
    #[error("Office lamp {0} not found. Aborting light change")]
    DeviceNotFound(MacAddress),

    /// A MAC address could not be parsed
    #[error("Invalid MAC address: {0}")]
    InvalidMacAddress(String),

    /// A persisted or requested block name is not a known time block
    #[error("Unknown time block: {0}")]
    UnknownBlock(String),

    /// LIFX packet could not be built or parsed
    #[error("LIFX protocol error: {0}")]
    Protocol(String),

    /// A network operation did not complete in time
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),

    /// Filesystem or socket error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod colors;
pub mod config;
pub mod device;
pub mod routine;
pub mod schedule;
pub mod state;

pub use colors::{Color, Colors, COLORS};
pub use config::Config;
pub use device::{Bulb, Discovery, LifxBulb, LifxDiscovery, MacAddress};
pub use routine::{Routine, Transition};
pub use schedule::{resolve, TimeBlock};
pub use state::{BlockStore, FileBlockStore, State};
