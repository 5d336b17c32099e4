use crate::restore::Restorer;
use crate::CoreError;
use std::path::{Path, PathBuf};
use tessera_remote::{PackageClient, ResolutionClient};
use tessera_schema::LOCK_FILE_NAME;
use tessera_store::StoreLayout;
use tracing::info;

/// Central facade over the restore pipeline.
///
/// Owns the store layout and the remote clients; each [`restore`](Self::restore)
/// call runs with a fresh processed set, so separate invocations never
/// share skip state.
pub struct Engine {
    layout: StoreLayout,
    resolution: Box<dyn ResolutionClient>,
    packages: Box<dyn PackageClient>,
}

impl Engine {
    pub fn new(
        store_root: impl Into<PathBuf>,
        resolution: Box<dyn ResolutionClient>,
        packages: Box<dyn PackageClient>,
    ) -> Self {
        Self {
            layout: StoreLayout::new(store_root),
            resolution,
            packages,
        }
    }

    pub fn layout(&self) -> &StoreLayout {
        &self.layout
    }

    /// Restore the project rooted at `project_dir`: ensure its lock exists,
    /// install every referenced package, and recurse into every build/tool
    /// extension closure.
    pub fn restore(&self, project_dir: &Path) -> Result<(), CoreError> {
        info!("restoring project {}", project_dir.display());
        self.layout.initialize()?;

        let lock_path = project_dir.join(LOCK_FILE_NAME);
        let mut restorer = Restorer::new(
            &self.layout,
            self.resolution.as_ref(),
            self.packages.as_ref(),
        );
        restorer.restore(project_dir, &lock_path)
    }
}
