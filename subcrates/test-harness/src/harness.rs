use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use resource_harness::{
    backend::{local::LocalService, memory::MemoryAccount},
    config::HarnessConfig,
    context::{ScenarioContext, SequentialNameSource},
    level::{AccountType, Location},
    manager::{AccountResourceManager, ManagerHandle},
};
use tempfile::TempDir;


/// A local-filesystem service rooted in a fresh temporary directory.
///
/// ```
/// # use resource_harness_test_harness::LocalServiceHarness;
/// let harness = LocalServiceHarness::initialize();
///
/// let _context = harness.context("example");
/// // ... create and validate resources against `harness.service()` ...
///
/// harness.destroy();
/// ```
pub struct LocalServiceHarness {
    temporary_directory: TempDir,

    service: ManagerHandle,
}

impl LocalServiceHarness {
    /// Sets up the temporary directory and opens a local service on it.
    pub fn initialize() -> Self {
        let temporary_directory = tempfile::tempdir().expect("failed to create temporary directory");

        let service = LocalService::open(temporary_directory.path())
            .expect("failed to open local service in temporary directory");

        Self {
            temporary_directory,
            service: ManagerHandle::Service(Arc::new(service)),
        }
    }

    /// The service-level manager of the harness.
    pub fn service(&self) -> &ManagerHandle {
        &self.service
    }

    /// Root directory of the service.
    pub fn root_path(&self) -> &Path {
        self.temporary_directory.path()
    }

    /// Obtain a custom sub-path, by providing a relative `sub_path`.
    pub fn child_path<P>(&self, sub_path: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        self.root_path().join(sub_path)
    }

    /// Configuration pointing the local back-end at this harness' directory.
    pub fn config(&self) -> HarnessConfig {
        HarnessConfig {
            dry_run: false,
            local_root: Some(self.root_path().to_path_buf()),
        }
    }

    /// A fresh scenario context with deterministic names (`{scenario_name}-0`, `{scenario_name}-1`, ...).
    pub fn context(&self, scenario_name: &str) -> ScenarioContext {
        ScenarioContext::new(scenario_name, self.config())
            .with_name_source(SequentialNameSource::new(scenario_name))
    }

    /// Consume `self` and remove the entire testing temporary directory.
    pub fn destroy(self) {
        self.temporary_directory
            .close()
            .expect("failed to remove temporary directory");
    }
}


/// Returns the service at `location` of a fresh, empty in-memory account.
///
/// # Panics
/// Panics for [`Location::Local`]; use [`LocalServiceHarness`] instead.
pub fn memory_service(location: Location) -> ManagerHandle {
    let account_type = match location {
        Location::Local => panic!("the memory back-end does not emulate the local filesystem"),
        Location::FileNfs => AccountType::PremiumFileShares,
        Location::Blob | Location::File | Location::BlobFs => AccountType::Standard,
    };

    let account = MemoryAccount::new(format!("memory-{location}"), account_type);

    let service = account
        .get_service(location)
        .expect("account type offers the requested location");

    ManagerHandle::Service(service)
}
