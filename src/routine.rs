/*!
 # Time block routine

 One run of the routine: load the last applied block, resolve the block for
 the current hour and, only when they differ, push the new preset to the bulb
 and record it. Any failure aborts the run before the state is touched.
*/

use std::fmt;
use std::time::Duration;

use chrono::Timelike;
use tracing::{debug, error, info, instrument};

use crate::config::Config;
use crate::device::{Bulb, Discovery, MacAddress};
use crate::schedule::{self, TimeBlock};
use crate::state::{BlockStore, State};
use crate::{Error, Result};

/// Outcome of a successful run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The bulb already shows this block, nothing was sent
    Unchanged(TimeBlock),
    /// The bulb was switched to a new block
    Applied {
        from: Option<TimeBlock>,
        to: TimeBlock,
    },
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::Unchanged(block) => {
                write!(f, "Lamp already in {block}, nothing to do")
            }
            Transition::Applied { from: Some(from), to } => {
                write!(f, "Lamp switched from {from} to {to}")
            }
            Transition::Applied { from: None, to } => write!(f, "Lamp switched to {to}"),
        }
    }
}

/// Drives one lamp through the daily blocks
pub struct Routine<S, D> {
    store: S,
    discovery: D,
    mac: MacAddress,
    transition: Duration,
}

impl<S, D> Routine<S, D>
where
    S: BlockStore,
    D: Discovery,
{
    pub fn new(store: S, discovery: D, config: &Config) -> Self {
        Self {
            store,
            discovery,
            mac: config.mac,
            transition: config.transition,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs for the current local hour
    pub async fn run_now(&mut self) -> Result<Transition> {
        let hour = chrono::Local::now().hour();
        self.run(hour).await
    }

    /// Runs for the given hour of the day
    #[instrument(skip(self))]
    pub async fn run(&mut self, hour: u32) -> Result<Transition> {
        let state = self.store.load().await?;
        let (block, _) = schedule::resolve(hour)?;

        if state.block == Some(block) {
            debug!("Lamp already in {}, skipping update", block);
            return Ok(Transition::Unchanged(block));
        }

        self.switch(state, block).await
    }

    /// Applies `block` regardless of what was recorded last
    #[instrument(skip(self))]
    pub async fn apply(&mut self, block: TimeBlock) -> Result<Transition> {
        let state = self.store.load().await?;
        self.switch(state, block).await
    }

    async fn switch(&mut self, state: State, block: TimeBlock) -> Result<Transition> {
        info!(
            "Switching lamp from {} to {}",
            state.block.map_or("nothing", TimeBlock::name),
            block
        );

        let Some(bulb) = self.discovery.find_device(self.mac).await? else {
            error!("Office lamp {} not found", self.mac);
            return Err(Error::DeviceNotFound(self.mac));
        };

        bulb.set_color(block.color(), self.transition).await?;
        self.store.save(block).await?;

        Ok(Transition::Applied {
            from: state.block,
            to: block,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::{Color, COLORS};
    use std::future::Future;
    use std::sync::{Arc, Mutex};

    /// In-memory store; `None` plays a missing state file
    #[derive(Default)]
    struct MemoryStore {
        value: Mutex<Option<String>>,
        saves: Mutex<usize>,
    }

    impl MemoryStore {
        fn with(contents: &str) -> Self {
            Self {
                value: Mutex::new(Some(contents.to_string())),
                saves: Mutex::new(0),
            }
        }

        fn contents(&self) -> Option<String> {
            self.value.lock().unwrap().clone()
        }

        fn saves(&self) -> usize {
            *self.saves.lock().unwrap()
        }
    }

    impl BlockStore for MemoryStore {
        fn load(&self) -> impl Future<Output = Result<State>> + Send {
            let result = match self.value.lock().unwrap().as_deref() {
                Some(contents) => Ok(State::parse(contents)),
                None => Err(Error::MissingStateFile("memory".into())),
            };
            async { result }
        }

        fn save(&self, block: TimeBlock) -> impl Future<Output = Result<()>> + Send {
            *self.value.lock().unwrap() = Some(block.name().to_string());
            *self.saves.lock().unwrap() += 1;
            async { Ok(()) }
        }
    }

    type Sent = Arc<Mutex<Vec<(Color, Duration)>>>;

    struct MockBulb {
        sent: Sent,
        failing: bool,
    }

    impl Bulb for MockBulb {
        fn set_color(
            &self,
            color: Color,
            duration: Duration,
        ) -> impl Future<Output = Result<()>> + Send {
            let result = if self.failing {
                Err(Error::Timeout(Duration::from_secs(2)))
            } else {
                self.sent.lock().unwrap().push((color, duration));
                Ok(())
            };
            async { result }
        }
    }

    struct MockDiscovery {
        present: bool,
        failing: bool,
        lookups: Mutex<Vec<MacAddress>>,
        sent: Sent,
    }

    impl MockDiscovery {
        fn present() -> Self {
            Self {
                present: true,
                failing: false,
                lookups: Mutex::new(Vec::new()),
                sent: Sent::default(),
            }
        }

        fn absent() -> Self {
            Self {
                present: false,
                ..Self::present()
            }
        }

        /// Bulb answers discovery but every command fails
        fn failing() -> Self {
            Self {
                failing: true,
                ..Self::present()
            }
        }

        fn sent(&self) -> Vec<(Color, Duration)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Discovery for MockDiscovery {
        type Handle = MockBulb;

        fn find_device(
            &self,
            mac: MacAddress,
        ) -> impl Future<Output = Result<Option<MockBulb>>> + Send {
            self.lookups.lock().unwrap().push(mac);
            let handle = self.present.then(|| MockBulb {
                sent: self.sent.clone(),
                failing: self.failing,
            });
            async { Ok(handle) }
        }
    }

    fn routine(
        store: MemoryStore,
        discovery: MockDiscovery,
    ) -> Routine<MemoryStore, MockDiscovery> {
        Routine::new(store, discovery, &Config::default())
    }

    #[tokio::test]
    async fn day_to_night_sends_warm_white_and_records_night() {
        let mut routine = routine(MemoryStore::with("DAY"), MockDiscovery::present());

        let transition = routine.run(18).await.unwrap();

        assert_eq!(
            transition,
            Transition::Applied {
                from: Some(TimeBlock::Day),
                to: TimeBlock::Night
            }
        );
        assert_eq!(
            routine.discovery.sent(),
            vec![(COLORS.warm_white, Duration::from_millis(50_000))]
        );
        assert_eq!(routine.store().contents().as_deref(), Some("NIGHT"));
    }

    #[tokio::test]
    async fn same_block_is_a_no_op() {
        let mut routine = routine(MemoryStore::with("NIGHT"), MockDiscovery::present());

        let transition = routine.run(19).await.unwrap();

        assert_eq!(transition, Transition::Unchanged(TimeBlock::Night));
        assert!(routine.discovery.lookups.lock().unwrap().is_empty());
        assert!(routine.discovery.sent().is_empty());
        assert_eq!(routine.store().saves(), 0);
        assert_eq!(routine.store().contents().as_deref(), Some("NIGHT"));
    }

    #[tokio::test]
    async fn empty_state_counts_as_a_change() {
        let mut routine = routine(MemoryStore::with(""), MockDiscovery::present());

        let transition = routine.run(4).await.unwrap();

        assert_eq!(
            transition,
            Transition::Applied {
                from: None,
                to: TimeBlock::MidMorning
            }
        );
        assert_eq!(routine.discovery.sent()[0].0, COLORS.green_soft);
        assert_eq!(routine.store().contents().as_deref(), Some("MID_MORNING"));
    }

    #[tokio::test]
    async fn missing_bulb_leaves_state_untouched() {
        let mut routine = routine(MemoryStore::with("DAY"), MockDiscovery::absent());

        let err = routine.run(22).await.unwrap_err();

        assert!(matches!(err, Error::DeviceNotFound(mac) if mac == Config::default().mac));
        assert_eq!(routine.store().saves(), 0);
        assert_eq!(routine.store().contents().as_deref(), Some("DAY"));
    }

    #[tokio::test]
    async fn failed_command_leaves_state_untouched() {
        let mut routine = routine(MemoryStore::with("DAY"), MockDiscovery::failing());

        let err = routine.run(18).await.unwrap_err();

        assert!(matches!(err, Error::Timeout(_)));
        assert_eq!(routine.discovery.lookups.lock().unwrap().len(), 1);
        assert_eq!(routine.store().saves(), 0);
        assert_eq!(routine.store().contents().as_deref(), Some("DAY"));
    }

    #[tokio::test]
    async fn missing_state_file_aborts_before_discovery() {
        let mut routine = routine(MemoryStore::default(), MockDiscovery::present());

        let err = routine.run(12).await.unwrap_err();

        assert!(matches!(err, Error::MissingStateFile(_)));
        assert!(routine.discovery.lookups.lock().unwrap().is_empty());
        assert_eq!(routine.store().contents(), None);
    }

    #[tokio::test]
    async fn unresolvable_hour_aborts() {
        let mut routine = routine(MemoryStore::with("DAY"), MockDiscovery::present());

        let err = routine.run(25).await.unwrap_err();

        assert!(matches!(err, Error::UnresolvableHour(25)));
        assert!(routine.discovery.sent().is_empty());
        assert_eq!(routine.store().saves(), 0);
    }

    #[tokio::test]
    async fn apply_forces_the_preset_even_when_recorded() {
        let mut routine = routine(MemoryStore::with("MORNING"), MockDiscovery::present());

        let transition = routine.apply(TimeBlock::Morning).await.unwrap();

        assert_eq!(
            transition,
            Transition::Applied {
                from: Some(TimeBlock::Morning),
                to: TimeBlock::Morning
            }
        );
        assert_eq!(routine.discovery.sent()[0].0, COLORS.cyan);
        assert_eq!(routine.store().saves(), 1);
    }
}
