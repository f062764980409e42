/*!
 # Persisted block state

 The last applied time block survives between runs in a one-line text file.
 [`BlockStore`] is the seam the routine talks to; [`FileBlockStore`] is the
 filesystem implementation.
*/

use std::future::Future;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::schedule::TimeBlock;
use crate::{Error, Result};

/// What the previous run left behind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct State {
    /// Last block applied to the bulb, if any
    pub block: Option<TimeBlock>,
}

impl State {
    /// State recording `block` as the last applied one
    pub fn new(block: TimeBlock) -> Self {
        Self { block: Some(block) }
    }

    /// Interprets the raw file contents: only the first line counts, and an
    /// empty or unrecognised value means there is no prior state
    pub fn parse(contents: &str) -> Self {
        let line = contents.lines().next().unwrap_or("").trim();
        if line.is_empty() {
            return Self::default();
        }

        match line.parse() {
            Ok(block) => Self::new(block),
            Err(_) => {
                warn!("Ignoring unknown block {:?} in state file", line);
                Self::default()
            }
        }
    }
}

/// Single-value store for the last applied block
pub trait BlockStore {
    /// Loads the persisted state. Fails when the backing store is missing.
    fn load(&self) -> impl Future<Output = Result<State>> + Send;

    /// Overwrites the persisted block
    fn save(&self, block: TimeBlock) -> impl Future<Output = Result<()>> + Send;
}

/// Keeps the block name in a plain text file
#[derive(Debug, Clone)]
pub struct FileBlockStore {
    path: PathBuf,
}

impl FileBlockStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BlockStore for FileBlockStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn load(&self) -> Result<State> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Err(Error::MissingStateFile(self.path.clone()));
        }

        let contents = tokio::fs::read_to_string(&self.path).await?;
        let state = State::parse(&contents);
        debug!("Loaded state: {:?}", state.block);
        Ok(state)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn save(&self, block: TimeBlock) -> Result<()> {
        tokio::fs::write(&self.path, block.name()).await?;
        debug!("Saved block {}", block);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("office-lamp-{}-{}", std::process::id(), name))
    }

    #[test]
    fn parse_reads_first_line_only() {
        assert_eq!(State::parse("NIGHT\nDAY\n"), State::new(TimeBlock::Night));
        assert_eq!(State::parse("  MORNING  "), State::new(TimeBlock::Morning));
    }

    #[test]
    fn parse_empty_or_unknown_is_no_state() {
        assert_eq!(State::parse(""), State::default());
        assert_eq!(State::parse("\n"), State::default());
        assert_eq!(State::parse("BRUNCH"), State::default());
    }

    #[tokio::test]
    async fn missing_file_is_reported_and_not_created() {
        let path = scratch_path("missing");
        let _ = std::fs::remove_file(&path);

        let store = FileBlockStore::new(&path);
        assert_eq!(store.path(), path.as_path());
        let err = store.load().await.unwrap_err();

        assert!(matches!(err, Error::MissingStateFile(p) if p == path));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn save_overwrites_with_bare_name() {
        let path = scratch_path("overwrite");
        std::fs::write(&path, "MIDNIGHT\n").unwrap();

        let store = FileBlockStore::new(&path);
        assert_eq!(store.load().await.unwrap(), State::new(TimeBlock::Midnight));

        store.save(TimeBlock::MidMorning).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "MID_MORNING");
        assert_eq!(store.load().await.unwrap(), State::new(TimeBlock::MidMorning));

        std::fs::remove_file(&path).unwrap();
    }
}
