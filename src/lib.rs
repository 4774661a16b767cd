//! Declarative creation and validation of storage resources for functional test scenarios.
//!
//! Storage is modelled as a three-level hierarchy: services contain containers, and
//! containers contain objects (files and folders). A test scenario describes the resources
//! it needs as [`ResourceDefinition`]s at any of these levels, and the crate takes care of
//! creating or validating them through a [`ManagerHandle`] that may sit at a different level.
//!
//!
//! # Main features
//! - declarative [definitions](crate::definition) of services, containers and objects,
//!   including property bags, bodies and negative ("should not exist") expectations,
//! - [`create_resource`], which wraps a definition in generated parents until it
//!   matches the level of the given manager, creates everything, and returns the
//!   manager of the requested resource,
//! - [`validate_resource`], which compares real resources against a definition and
//!   records every divergence as a soft failure instead of stopping at the first one, and
//! - reference [back-ends](crate::backend): the local filesystem, an in-memory
//!   emulation of cloud accounts, and stateless mocks for dry runs.
//!
//! <br>
//!
//! # Feature flags
//! The following feature flags enable optional functionality:
//! - `dunce` (*enabled by default*): enables the optional [`dunce`](../dunce/index.html) support:
//!   the local back-end's root directory is stripped of Windows' UNC prefix when possible
//!   (e.g. `\\?\C:\foo -> C:\foo`). This only has an effect when compiling for Windows targets.
//! - `fs-err` (*disabled by default*): enables the optional [`fs-err`](../fs_err/index.html) support
//!   in the local back-end, for more helpful underlying IO error messages.
//! - `miette` (*disabled by default*): derives `miette::Diagnostic` on all [error types](crate::error).
//!
//!
//! <br>
//!
//! # Example
//! Creating two objects in a fresh container and validating them afterwards:
//! ```no_run
//! # use resource_harness::backend::AccountRegistry;
//! # use resource_harness::config::HarnessConfig;
//! # use resource_harness::content::BufferedContent;
//! # use resource_harness::context::ScenarioContext;
//! # use resource_harness::definition::{ContainerDefinition, ObjectDefinition};
//! # use resource_harness::level::Location;
//! # use resource_harness::mapping::ObjectResourceMapping;
//! # use resource_harness::task::{create_resource, validate_resource, ValidateResourceOptions};
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut context = ScenarioContext::new("two-objects", HarnessConfig::from_env()?);
//!
//! let service = AccountRegistry::new()
//!     .get_root_resource(&context, Location::Local, &Default::default())?;
//!
//! let definition = ContainerDefinition::with_objects(ObjectResourceMapping::flat([
//!     ("foo.txt", ObjectDefinition::default().with_body(BufferedContent::random(1024))),
//!     ("dir/bar.txt", ObjectDefinition::default().with_body(BufferedContent::random(2048))),
//! ]));
//!
//! let container = create_resource(&mut context, &service, definition.clone())?;
//!
//! validate_resource(
//!     &mut context,
//!     &container,
//!     &definition,
//!     ValidateResourceOptions {
//!         validate_object_content: true,
//!     },
//! )?;
//!
//! context.cleanup()?;
//! context.into_report().into_result()?;
//! # Ok(())
//! # }
//! ```
//!
//! [`ResourceDefinition`]: crate::definition::ResourceDefinition
//! [`ManagerHandle`]: crate::manager::ManagerHandle
//! [`create_resource`]: crate::task::create_resource
//! [`validate_resource`]: crate::task::validate_resource

mod macros;

pub mod backend;
pub mod config;
pub mod content;
pub mod context;
pub mod definition;
pub mod error;
pub mod level;
pub mod manager;
pub mod mapping;
pub mod properties;
pub mod report;
pub mod task;
