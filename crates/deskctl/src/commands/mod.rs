pub mod allocate;
pub mod feedback;
pub mod seed;
pub mod simulate;
pub mod workspaces;

use std::path::Path;

use anyhow::Context as _;
use tracing::debug;

use deskgrid_allocator::{load_ledger, Allocator};
use deskgrid_core::DeskgridConfig;
use deskgrid_state::StateStore;

const STORE_FILE: &str = "deskgrid.redb";

/// What every command needs: the opened store and the active configuration.
pub struct Context {
    pub store: StateStore,
    pub config: DeskgridConfig,
}

impl Context {
    pub fn open(data_dir: &Path, config_path: Option<&Path>) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)
            .with_context(|| format!("creating data directory {}", data_dir.display()))?;
        let store = StateStore::open(&data_dir.join(STORE_FILE))?;

        let config = match config_path {
            Some(path) => DeskgridConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DeskgridConfig::default(),
        };
        debug!(data_dir = %data_dir.display(), "context ready");
        Ok(Self { store, config })
    }

    /// Seed a ledger from the store and wrap it in an allocator.
    pub fn into_allocator(self) -> anyhow::Result<Allocator<StateStore>> {
        let ledger = load_ledger(&self.store)?;
        Ok(Allocator::new(self.store, ledger, &self.config))
    }
}

/// Write one workspace's ledger state back to the store, under its lock.
pub(crate) fn persist_from_ledger(
    store: &StateStore,
    ledger: &deskgrid_ledger::OccupancyLedger,
    workspace_id: &str,
) -> anyhow::Result<()> {
    ledger.with_workspace(workspace_id, |ws| store.put_workspace(ws))??;
    Ok(())
}
