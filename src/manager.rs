//! Resource managers: live handles to concrete storage resources.
//!
//! Each level of the hierarchy has its own capability trait
//! ([`ServiceResourceManager`], [`ContainerResourceManager`], [`ObjectResourceManager`]),
//! all sharing the [`ResourceManager`] basics. [`ManagerHandle`] stores a manager
//! together with its level tag, and every cross-level access goes through
//! checked accessors such as [`ManagerHandle::as_container`].

use std::{collections::BTreeMap, fmt::Debug, sync::Arc};

use crate::{
    content::{ObjectContentContainer, ReadSeek},
    error::{BackendError, HarnessError},
    level::{AccountType, EntityType, Level, Location},
    properties::{ContainerProperties, ObjectProperties},
};


/// Capabilities shared by managers of every level.
pub trait ResourceManager: Send + Sync + Debug {
    /// The back-end the resource lives on.
    fn location(&self) -> Location;

    /// The level of the resource. Fixed per implementing type.
    fn level(&self) -> Level;

    /// Human-readable unique name, e.g. `account/blob/container/dir/file.txt`.
    fn canonical_name(&self) -> String;

    /// Either a local path or a remote URL.
    fn uri(&self) -> String;

    /// The manager one level up. `None` for roots, or when the parent handle was dropped.
    fn parent(&self) -> Option<ManagerHandle>;

    /// The owning account, if the back-end has accounts.
    fn account(&self) -> Option<Arc<dyn AccountResourceManager>>;
}


/// A storage account.
pub trait AccountResourceManager: Send + Sync + Debug {
    fn account_name(&self) -> &str;

    fn account_type(&self) -> AccountType;

    /// The service locations this account exposes.
    fn available_services(&self) -> &'static [Location] {
        self.account_type().available_services()
    }

    /// Returns the service at `location`.
    ///
    /// Fails with [`BackendError::ServiceUnavailable`] when the account does not expose it.
    fn get_service(
        &self,
        location: Location,
    ) -> Result<Arc<dyn ServiceResourceManager>, BackendError>;
}


/// A service of an account (or the root directory of the local back-end).
pub trait ServiceResourceManager: ResourceManager {
    fn list_containers(&self) -> Result<Vec<String>, BackendError>;

    /// Returns a manager for the container `name`. Does not create it.
    fn get_container(&self, name: &str) -> Arc<dyn ContainerResourceManager>;

    /// Whether folders are real entities on this service.
    fn is_hierarchical(&self) -> bool {
        self.location().is_hierarchical()
    }
}


/// A container, share or root directory.
pub trait ContainerResourceManager: ResourceManager {
    fn container_name(&self) -> &str;

    /// Creates the container. An existing container is left untouched and is not an error.
    ///
    /// Returns `true` only if the container did not exist before this call.
    fn create(&self, properties: &ContainerProperties) -> Result<bool, BackendError>;

    /// Deletes the container. A missing container is not an error.
    fn delete(&self) -> Result<(), BackendError>;

    fn exists(&self) -> Result<bool, BackendError>;

    fn get_properties(&self) -> Result<ContainerProperties, BackendError>;

    fn set_properties(&self, properties: &ContainerProperties) -> Result<(), BackendError>;

    /// Lists objects under `prefix_or_directory`.
    ///
    /// The argument is a name prefix on flat services and a directory on hierarchical ones.
    /// Keys of the returned map are paths relative to the container root.
    fn list_objects(
        &self,
        prefix_or_directory: &str,
        recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError>;

    /// Returns a manager for the object at `path`. Does not create it.
    ///
    /// The empty path denotes the container's root folder.
    fn get_object(&self, path: &str, entity_type: EntityType) -> Arc<dyn ObjectResourceManager>;
}


/// A file or folder inside a container.
pub trait ObjectResourceManager: ResourceManager {
    fn container_name(&self) -> String;

    /// Path of the object relative to its container.
    fn object_name(&self) -> &str;

    fn entity_type(&self) -> EntityType;

    /// Creates the object, overwriting an existing one.
    fn create(
        &self,
        body: &dyn ObjectContentContainer,
        properties: &ObjectProperties,
    ) -> Result<(), BackendError>;

    /// Deletes the object. A missing object is not an error.
    fn delete(&self) -> Result<(), BackendError>;

    fn exists(&self) -> Result<bool, BackendError>;

    fn get_properties(&self) -> Result<ObjectProperties, BackendError>;

    fn set_properties(&self, properties: &ObjectProperties) -> Result<(), BackendError>;

    /// Lists the descendants of a folder. Keys are relative to this object.
    fn list_children(
        &self,
        recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError>;

    /// Returns a reader over the object's body.
    fn download(&self) -> Result<Box<dyn ReadSeek>, BackendError>;
}



/// A manager of any level, tagged with that level.
#[derive(Clone, Debug)]
pub enum ManagerHandle {
    Service(Arc<dyn ServiceResourceManager>),
    Container(Arc<dyn ContainerResourceManager>),
    Object(Arc<dyn ObjectResourceManager>),
}

impl ManagerHandle {
    /// The level tag of the handle.
    pub fn level(&self) -> Level {
        match self {
            ManagerHandle::Service(_) => Level::Service,
            ManagerHandle::Container(_) => Level::Container,
            ManagerHandle::Object(_) => Level::Object,
        }
    }

    pub fn location(&self) -> Location {
        match self {
            ManagerHandle::Service(service) => service.location(),
            ManagerHandle::Container(container) => container.location(),
            ManagerHandle::Object(object) => object.location(),
        }
    }

    pub fn canonical_name(&self) -> String {
        match self {
            ManagerHandle::Service(service) => service.canonical_name(),
            ManagerHandle::Container(container) => container.canonical_name(),
            ManagerHandle::Object(object) => object.canonical_name(),
        }
    }

    pub fn uri(&self) -> String {
        match self {
            ManagerHandle::Service(service) => service.uri(),
            ManagerHandle::Container(container) => container.uri(),
            ManagerHandle::Object(object) => object.uri(),
        }
    }

    pub fn parent(&self) -> Option<ManagerHandle> {
        match self {
            ManagerHandle::Service(service) => service.parent(),
            ManagerHandle::Container(container) => container.parent(),
            ManagerHandle::Object(object) => object.parent(),
        }
    }

    pub fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        match self {
            ManagerHandle::Service(service) => service.account(),
            ManagerHandle::Container(container) => container.account(),
            ManagerHandle::Object(object) => object.account(),
        }
    }

    /// Returns the service manager, or [`HarnessError::LevelMismatch`] for any other level.
    pub fn as_service(&self) -> Result<&Arc<dyn ServiceResourceManager>, HarnessError> {
        match self {
            ManagerHandle::Service(service) => Ok(service),
            other => Err(HarnessError::LevelMismatch {
                expected: Level::Service,
                actual: other.level(),
            }),
        }
    }

    /// Returns the container manager, or [`HarnessError::LevelMismatch`] for any other level.
    pub fn as_container(&self) -> Result<&Arc<dyn ContainerResourceManager>, HarnessError> {
        match self {
            ManagerHandle::Container(container) => Ok(container),
            other => Err(HarnessError::LevelMismatch {
                expected: Level::Container,
                actual: other.level(),
            }),
        }
    }

    /// Returns the object manager, or [`HarnessError::LevelMismatch`] for any other level.
    pub fn as_object(&self) -> Result<&Arc<dyn ObjectResourceManager>, HarnessError> {
        match self {
            ManagerHandle::Object(object) => Ok(object),
            other => Err(HarnessError::LevelMismatch {
                expected: Level::Object,
                actual: other.level(),
            }),
        }
    }

    /// Returns the manager of the child `name`, one level down.
    ///
    /// `entity_type` is only used when the child is an object.
    pub fn child(&self, name: &str, entity_type: EntityType) -> Result<ManagerHandle, HarnessError> {
        match self {
            ManagerHandle::Service(service) => {
                Ok(ManagerHandle::Container(service.get_container(name)))
            }
            ManagerHandle::Container(container) => {
                Ok(ManagerHandle::Object(container.get_object(name, entity_type)))
            }
            ManagerHandle::Object(_) => Err(HarnessError::NoAdoptiveChild {
                level: Level::Object,
            }),
        }
    }

    /// Whether the resource exists. Services always exist.
    pub fn exists(&self) -> Result<bool, BackendError> {
        match self {
            ManagerHandle::Service(_) => Ok(true),
            ManagerHandle::Container(container) => container.exists(),
            ManagerHandle::Object(object) => object.exists(),
        }
    }

    /// Deletes the resource. Services cannot be deleted.
    pub fn delete(&self) -> Result<(), BackendError> {
        match self {
            ManagerHandle::Service(service) => Err(BackendError::Unsupported {
                operation: "delete service",
                location: service.location(),
            }),
            ManagerHandle::Container(container) => container.delete(),
            ManagerHandle::Object(object) => object.delete(),
        }
    }
}

impl From<Arc<dyn ServiceResourceManager>> for ManagerHandle {
    fn from(service: Arc<dyn ServiceResourceManager>) -> Self {
        ManagerHandle::Service(service)
    }
}

impl From<Arc<dyn ContainerResourceManager>> for ManagerHandle {
    fn from(container: Arc<dyn ContainerResourceManager>) -> Self {
        ManagerHandle::Container(container)
    }
}

impl From<Arc<dyn ObjectResourceManager>> for ManagerHandle {
    fn from(object: Arc<dyn ObjectResourceManager>) -> Self {
        ManagerHandle::Object(object)
    }
}



/// A manager type that a [`ManagerHandle`] can be converted to and from.
///
/// Lets [`create_resource`][crate::task::create_resource] return the concrete manager
/// type matching its definition.
pub trait ManagerLevel: Sized {
    /// Unwraps a handle, failing with [`HarnessError::LevelMismatch`] on the wrong level.
    fn from_handle(handle: ManagerHandle) -> Result<Self, HarnessError>;

    fn to_handle(&self) -> ManagerHandle;
}

impl ManagerLevel for ManagerHandle {
    fn from_handle(handle: ManagerHandle) -> Result<Self, HarnessError> {
        Ok(handle)
    }

    fn to_handle(&self) -> ManagerHandle {
        self.clone()
    }
}

impl ManagerLevel for Arc<dyn ServiceResourceManager> {
    fn from_handle(handle: ManagerHandle) -> Result<Self, HarnessError> {
        handle.as_service().cloned()
    }

    fn to_handle(&self) -> ManagerHandle {
        ManagerHandle::Service(Arc::clone(self))
    }
}

impl ManagerLevel for Arc<dyn ContainerResourceManager> {
    fn from_handle(handle: ManagerHandle) -> Result<Self, HarnessError> {
        handle.as_container().cloned()
    }

    fn to_handle(&self) -> ManagerHandle {
        ManagerHandle::Container(Arc::clone(self))
    }
}

impl ManagerLevel for Arc<dyn ObjectResourceManager> {
    fn from_handle(handle: ManagerHandle) -> Result<Self, HarnessError> {
        handle.as_object().cloned()
    }

    fn to_handle(&self) -> ManagerHandle {
        ManagerHandle::Object(Arc::clone(self))
    }
}
