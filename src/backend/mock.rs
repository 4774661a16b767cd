//! Stateless managers for dry runs.
//!
//! Every operation succeeds without touching any storage: resources always exist,
//! property bags are empty, listings are empty and downloads yield no bytes.

use std::{collections::BTreeMap, io::Cursor, sync::Arc};

use crate::{
    content::{ObjectContentContainer, ReadSeek},
    error::BackendError,
    level::{EntityType, Level, Location},
    manager::{
        AccountResourceManager,
        ContainerResourceManager,
        ManagerHandle,
        ObjectResourceManager,
        ResourceManager,
        ServiceResourceManager,
    },
    mapping::join_object_path,
    properties::{ContainerProperties, ObjectProperties},
};


/// A dry-run service at any location.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MockService {
    location: Location,
}

impl MockService {
    pub fn new(location: Location) -> Self {
        Self { location }
    }
}

impl ResourceManager for MockService {
    fn location(&self) -> Location {
        self.location
    }

    fn level(&self) -> Level {
        Level::Service
    }

    fn canonical_name(&self) -> String {
        format!("mock/{}", self.location)
    }

    fn uri(&self) -> String {
        format!("mock://{}", self.location)
    }

    fn parent(&self) -> Option<ManagerHandle> {
        None
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        None
    }
}

impl ServiceResourceManager for MockService {
    fn list_containers(&self) -> Result<Vec<String>, BackendError> {
        Ok(Vec::new())
    }

    fn get_container(&self, name: &str) -> Arc<dyn ContainerResourceManager> {
        Arc::new(MockContainer {
            service: self.clone(),
            name: name.to_string(),
        })
    }
}



/// A dry-run container.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MockContainer {
    service: MockService,

    name: String,
}

impl ResourceManager for MockContainer {
    fn location(&self) -> Location {
        self.service.location
    }

    fn level(&self) -> Level {
        Level::Container
    }

    fn canonical_name(&self) -> String {
        format!("{}/{}", self.service.canonical_name(), self.name)
    }

    fn uri(&self) -> String {
        format!("{}/{}", self.service.uri(), self.name)
    }

    fn parent(&self) -> Option<ManagerHandle> {
        Some(ManagerHandle::Service(Arc::new(self.service.clone())))
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        None
    }
}

impl ContainerResourceManager for MockContainer {
    fn container_name(&self) -> &str {
        &self.name
    }

    fn create(&self, _properties: &ContainerProperties) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn delete(&self) -> Result<(), BackendError> {
        Ok(())
    }

    fn exists(&self) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn get_properties(&self) -> Result<ContainerProperties, BackendError> {
        Ok(ContainerProperties::default())
    }

    fn set_properties(&self, _properties: &ContainerProperties) -> Result<(), BackendError> {
        Ok(())
    }

    fn list_objects(
        &self,
        _prefix_or_directory: &str,
        _recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
        Ok(BTreeMap::new())
    }

    fn get_object(&self, path: &str, entity_type: EntityType) -> Arc<dyn ObjectResourceManager> {
        Arc::new(MockObject {
            container: self.clone(),
            path: join_object_path("", path),
            entity_type,
        })
    }
}



/// A dry-run object.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MockObject {
    container: MockContainer,

    path: String,

    entity_type: EntityType,
}

impl ResourceManager for MockObject {
    fn location(&self) -> Location {
        self.container.location()
    }

    fn level(&self) -> Level {
        Level::Object
    }

    fn canonical_name(&self) -> String {
        if self.path.is_empty() {
            return self.container.canonical_name();
        }

        format!("{}/{}", self.container.canonical_name(), self.path)
    }

    fn uri(&self) -> String {
        format!("{}/{}", self.container.uri(), self.path)
    }

    fn parent(&self) -> Option<ManagerHandle> {
        Some(ManagerHandle::Container(Arc::new(self.container.clone())))
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        None
    }
}

impl ObjectResourceManager for MockObject {
    fn container_name(&self) -> String {
        self.container.name.clone()
    }

    fn object_name(&self) -> &str {
        &self.path
    }

    fn entity_type(&self) -> EntityType {
        self.entity_type
    }

    fn create(
        &self,
        _body: &dyn ObjectContentContainer,
        _properties: &ObjectProperties,
    ) -> Result<(), BackendError> {
        Ok(())
    }

    fn delete(&self) -> Result<(), BackendError> {
        Ok(())
    }

    fn exists(&self) -> Result<bool, BackendError> {
        Ok(true)
    }

    fn get_properties(&self) -> Result<ObjectProperties, BackendError> {
        Ok(ObjectProperties {
            entity_type: self.entity_type,
            ..Default::default()
        })
    }

    fn set_properties(&self, _properties: &ObjectProperties) -> Result<(), BackendError> {
        Ok(())
    }

    fn list_children(
        &self,
        _recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
        Ok(BTreeMap::new())
    }

    fn download(&self) -> Result<Box<dyn ReadSeek>, BackendError> {
        Ok(Box::new(Cursor::new(Vec::<u8>::new())))
    }
}
