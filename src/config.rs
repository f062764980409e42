/*!
 # Routine configuration

 Compiled-in defaults for the single office lamp. The binary overrides any of
 them from command line options or `OFFICE_LAMP_*` environment variables.
*/

use std::path::PathBuf;
use std::time::Duration;

use crate::device::MacAddress;

/// Default location of the state file
pub const DEFAULT_STATE_FILE: &str = "/home/pi/Dev/SmartHome/office_lamp_block";

/// Default MAC address of the office lamp
pub const DEFAULT_MAC: MacAddress = MacAddress([0xd0, 0x73, 0xd5, 0x3e, 0x44, 0xc3]);

/// Default fade duration when switching presets
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(50_000);

/// Settings for one routine run
#[derive(Debug, Clone)]
pub struct Config {
    /// File holding the name of the last applied block
    pub state_file: PathBuf,
    /// Hardware address of the bulb
    pub mac: MacAddress,
    /// Fade duration sent with each color change
    pub transition: Duration,
    /// How long to wait for the bulb to answer discovery
    pub discovery_timeout: Duration,
    /// How long a single command send may take
    pub command_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(DEFAULT_STATE_FILE),
            mac: DEFAULT_MAC,
            transition: DEFAULT_TRANSITION,
            discovery_timeout: Duration::from_secs(10),
            command_timeout: Duration::from_secs(2),
        }
    }
}
