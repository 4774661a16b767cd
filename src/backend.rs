//! Reference storage back-ends and the account registry that resolves root resources.
//!
//! - [`mock`]: stateless managers used for dry runs,
//! - [`local`]: the local filesystem, and
//! - [`memory`]: an in-process emulation of cloud storage accounts that retains every property.

use std::sync::Arc;

use log::debug;

pub mod local;
pub mod memory;
pub mod mock;

use crate::{
    context::ScenarioContext,
    error::HarnessError,
    level::Location,
    manager::{AccountResourceManager, ManagerHandle},
};


/// Options for [`AccountRegistry::get_root_resource`].
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct GetResourceOptions {
    /// Name of the account to use for remote locations.
    ///
    /// Defaults to `None`, meaning the first registered account that offers the location.
    pub preferred_account: Option<String>,
}


/// Named storage accounts, in registration order.
#[derive(Clone, Debug, Default)]
pub struct AccountRegistry {
    accounts: Vec<Arc<dyn AccountResourceManager>>,
}

impl AccountRegistry {
    /// An empty registry. Only [`Location::Local`] and dry runs resolve without accounts.
    pub fn new() -> Self {
        Self {
            accounts: Vec::new(),
        }
    }

    /// Registers `account`, replacing a previously registered account with the same name.
    pub fn register<A>(&mut self, account: A)
    where
        A: AccountResourceManager + 'static,
    {
        self.register_shared(Arc::new(account));
    }

    /// Registers an already shared `account`, replacing one with the same name.
    pub fn register_shared(&mut self, account: Arc<dyn AccountResourceManager>) {
        self.accounts
            .retain(|existing| existing.account_name() != account.account_name());
        self.accounts.push(account);
    }

    /// Returns the account named `name`.
    pub fn account(&self, name: &str) -> Option<&Arc<dyn AccountResourceManager>> {
        self.accounts
            .iter()
            .find(|account| account.account_name() == name)
    }

    /// Registered accounts, in registration order.
    pub fn accounts(&self) -> &[Arc<dyn AccountResourceManager>] {
        &self.accounts
    }

    /// Resolves the service-level root resource for `location`.
    ///
    /// - In a dry run, this is always a [`mock`] service.
    /// - [`Location::Local`] resolves to a [`local`] service rooted at
    ///   [`HarnessConfig::local_root`][crate::config::HarnessConfig::local_root]
    ///   (or the system temporary directory).
    /// - Remote locations resolve to the preferred account, or else to the first
    ///   registered account whose type offers the location.
    ///
    /// # Errors
    /// - [`HarnessError::NoAccountForLocation`] if no suitable account is registered,
    /// - [`HarnessError::Backend`] if the local root cannot be prepared,
    ///   or the preferred account does not offer the location.
    pub fn get_root_resource(
        &self,
        context: &ScenarioContext,
        location: Location,
        options: &GetResourceOptions,
    ) -> Result<ManagerHandle, HarnessError> {
        if context.is_dry_run() {
            debug!("[{}] dry run, using a mock {location} service", context.name());

            return Ok(ManagerHandle::Service(Arc::new(mock::MockService::new(
                location,
            ))));
        }

        if !location.is_remote() {
            let root = context.config().local_root_or_temp();

            let service = local::LocalService::open(&root).map_err(|error| {
                HarnessError::backend("open local root", root.display().to_string(), error)
            })?;

            return Ok(ManagerHandle::Service(Arc::new(service)));
        }


        let account = match &options.preferred_account {
            Some(preferred_name) => self.account(preferred_name),
            None => self
                .accounts
                .iter()
                .find(|account| account.account_type().offers(location)),
        }
        .ok_or(HarnessError::NoAccountForLocation { location })?;

        debug!(
            "[{}] resolving the {location} service of account {}",
            context.name(),
            account.account_name()
        );

        let service = account.get_service(location).map_err(|error| {
            HarnessError::backend("get service", account.account_name(), error)
        })?;

        Ok(ManagerHandle::Service(service))
    }
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HarnessConfig, level::AccountType};

    #[test]
    fn dry_runs_always_resolve_to_mock_services() {
        let context = ScenarioContext::new(
            "dry",
            HarnessConfig {
                dry_run: true,
                ..Default::default()
            },
        );

        let service = AccountRegistry::new()
            .get_root_resource(&context, Location::Blob, &GetResourceOptions::default())
            .unwrap();

        assert_eq!(service.location(), Location::Blob);
        assert!(service.account().is_none());
    }

    #[test]
    fn remote_locations_need_an_offering_account() {
        let context = ScenarioContext::new("remote", HarnessConfig::default());

        let mut registry = AccountRegistry::new();
        registry.register(memory::MemoryAccount::new(
            "premium-files",
            AccountType::PremiumFileShares,
        ));

        assert!(matches!(
            registry.get_root_resource(&context, Location::Blob, &Default::default()),
            Err(HarnessError::NoAccountForLocation {
                location: Location::Blob
            })
        ));

        registry.register(memory::MemoryAccount::new("standard", AccountType::Standard));

        let service = registry
            .get_root_resource(&context, Location::Blob, &Default::default())
            .unwrap();

        assert_eq!(
            service.account().map(|account| account.account_name().to_string()),
            Some("standard".to_string())
        );
    }

    #[test]
    fn preferred_account_must_offer_the_location() {
        let context = ScenarioContext::new("preferred", HarnessConfig::default());

        let mut registry = AccountRegistry::new();
        registry.register(memory::MemoryAccount::new("standard", AccountType::Standard));
        registry.register(memory::MemoryAccount::new(
            "premium-files",
            AccountType::PremiumFileShares,
        ));

        let options = GetResourceOptions {
            preferred_account: Some("premium-files".to_string()),
        };

        assert!(registry
            .get_root_resource(&context, Location::FileNfs, &options)
            .is_ok());
        assert!(matches!(
            registry.get_root_resource(&context, Location::Blob, &options),
            Err(HarnessError::Backend { .. })
        ));
    }
}
