/*!
 # Daily time blocks

 This module splits the day into five blocks and maps an hour to the block it
 belongs to, together with the color the lamp should show during that block.

 Some hours are claimed by two blocks (3, 6, 10 and 17). Blocks are checked in
 the order of [`TimeBlock::ALL`] and the first one containing the hour wins.
*/

use std::fmt;
use std::str::FromStr;

use tracing::{instrument, trace, warn};

use crate::colors::{Color, COLORS};
use crate::{Error, Result};

/// A named segment of the day with its own lighting preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeBlock {
    /// 3am to 6am
    MidMorning,
    /// 6am to 10am
    Morning,
    /// 10am to 5pm
    Day,
    /// 5pm to 10pm
    Night,
    /// 10pm to 3am
    Midnight,
}

impl TimeBlock {
    /// All blocks, in matching precedence order
    pub const ALL: [TimeBlock; 5] = [
        TimeBlock::MidMorning,
        TimeBlock::Morning,
        TimeBlock::Day,
        TimeBlock::Night,
        TimeBlock::Midnight,
    ];

    /// Hours claimed by this block. Hour 24 is accepted as an alias of midnight.
    pub fn hours(self) -> &'static [u32] {
        match self {
            TimeBlock::MidMorning => &[3, 4, 5, 6],
            TimeBlock::Morning => &[6, 7, 8, 9, 10],
            TimeBlock::Day => &[10, 11, 12, 13, 14, 15, 16, 17],
            TimeBlock::Night => &[17, 18, 19, 20, 21],
            TimeBlock::Midnight => &[0, 1, 2, 3, 22, 23, 24],
        }
    }

    /// Color preset shown during this block
    pub fn color(self) -> Color {
        match self {
            TimeBlock::MidMorning => COLORS.green_soft,
            TimeBlock::Morning => COLORS.cyan,
            TimeBlock::Day => COLORS.cold_white,
            TimeBlock::Night => COLORS.warm_white,
            TimeBlock::Midnight => COLORS.purple_soft,
        }
    }

    /// Name as written to the state file
    pub fn name(self) -> &'static str {
        match self {
            TimeBlock::MidMorning => "MID_MORNING",
            TimeBlock::Morning => "MORNING",
            TimeBlock::Day => "DAY",
            TimeBlock::Night => "NIGHT",
            TimeBlock::Midnight => "MIDNIGHT",
        }
    }

    /// Whether `hour` is one of this block's hours
    pub fn contains(self, hour: u32) -> bool {
        self.hours().contains(&hour)
    }
}

impl fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeBlock {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase().replace('-', "_");
        TimeBlock::ALL
            .into_iter()
            .find(|block| block.name() == wanted)
            .ok_or_else(|| Error::UnknownBlock(s.to_string()))
    }
}

/// Resolves an hour of the day to its time block and color preset
#[instrument]
pub fn resolve(hour: u32) -> Result<(TimeBlock, Color)> {
    match TimeBlock::ALL.into_iter().find(|block| block.contains(hour)) {
        Some(block) => {
            trace!("Hour {} resolved to {}", hour, block);
            Ok((block, block.color()))
        }
        None => {
            warn!("Hour #{} not present in any defined block", hour);
            Err(Error::UnresolvableHour(hour))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_hour_of_the_day_resolves_deterministically() {
        for hour in 0..24 {
            let first = resolve(hour).unwrap();
            let second = resolve(hour).unwrap();
            assert_eq!(first, second, "hour {hour}");
            assert_eq!(first.1, first.0.color());
        }
    }

    #[test]
    fn overlapping_hours_go_to_the_earlier_block() {
        assert_eq!(resolve(3).unwrap().0, TimeBlock::MidMorning);
        assert_eq!(resolve(6).unwrap().0, TimeBlock::MidMorning);
        assert_eq!(resolve(10).unwrap().0, TimeBlock::Morning);
        assert_eq!(resolve(17).unwrap().0, TimeBlock::Day);
    }

    #[test]
    fn evening_hours() {
        assert_eq!(resolve(18).unwrap(), (TimeBlock::Night, COLORS.warm_white));
        assert_eq!(resolve(21).unwrap().0, TimeBlock::Night);
        assert_eq!(resolve(22).unwrap(), (TimeBlock::Midnight, COLORS.purple_soft));
        assert_eq!(resolve(0).unwrap().0, TimeBlock::Midnight);
        assert_eq!(resolve(24).unwrap().0, TimeBlock::Midnight);
    }

    #[test]
    fn hour_out_of_range_is_unresolvable() {
        assert!(matches!(resolve(25), Err(Error::UnresolvableHour(25))));
    }

    #[test]
    fn names_parse_back() {
        for block in TimeBlock::ALL {
            assert_eq!(block.name().parse::<TimeBlock>().unwrap(), block);
        }
        assert_eq!("mid-morning".parse::<TimeBlock>().unwrap(), TimeBlock::MidMorning);
        assert_eq!("NIGHT\n".parse::<TimeBlock>().unwrap(), TimeBlock::Night);
        assert!(matches!(
            "LUNCH".parse::<TimeBlock>(),
            Err(Error::UnknownBlock(_))
        ));
    }
}
