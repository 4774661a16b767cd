//! Declarative resource definitions and their level-scaling algebra.
//!
//! A [`ResourceDefinition`] describes desired state at one [`Level`].
//! Two inverse operations move a definition along the level axis:
//! - [`ResourceDefinition::generate_adoptive_parent`] wraps it one level shallower, and
//! - [`ResourceDefinition::match_adoptive_child`] walks a singleton definition one level deeper,
//!   pairing it with the matching child manager.
//!
//! [`ResourceDefinition::apply_definition`] is the traversal primitive used by both
//! creation and validation: it dispatches to [`LevelCallbacks`] and recurses into children.

use std::collections::BTreeMap;

use log::debug;

mod callbacks;

pub use callbacks::*;

use crate::{
    content::ObjectContentContainer,
    context::ScenarioContext,
    error::HarnessError,
    level::Level,
    manager::{
        ContainerResourceManager,
        ManagerHandle,
        ManagerLevel,
        ObjectResourceManager,
        ServiceResourceManager,
    },
    mapping::ObjectResourceMapping,
    properties::{ContainerProperties, Metadata, ObjectProperties},
};


/// Desired state of a whole service: its containers, keyed by name.
///
/// A service always exists; it cannot be declared absent.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ServiceDefinition {
    pub containers: BTreeMap<String, ContainerDefinition>,
}

impl ServiceDefinition {
    /// A service definition with the given `(name, container)` pairs.
    pub fn with_containers<I, K>(containers: I) -> Self
    where
        I: IntoIterator<Item = (K, ContainerDefinition)>,
        K: Into<String>,
    {
        Self {
            containers: containers
                .into_iter()
                .map(|(name, container)| (name.into(), container))
                .collect(),
        }
    }
}



/// Desired state of a container and the objects inside it.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct ContainerDefinition {
    /// Name of the container.
    ///
    /// When the definition is nested in a [`ServiceDefinition`], the map key takes precedence.
    /// When `None` and the definition is lifted, a unique name is generated.
    pub container_name: Option<String>,

    pub properties: ContainerProperties,

    /// Objects inside the container. The `""` entry denotes the container's root folder.
    pub objects: ObjectResourceMapping,

    /// Whether the container is expected to exist. `None` means it should.
    pub should_exist: Option<bool>,
}

impl ContainerDefinition {
    /// An unnamed container definition with the given objects.
    pub fn with_objects(objects: ObjectResourceMapping) -> Self {
        Self {
            objects,
            ..Default::default()
        }
    }

    /// Sets the container name.
    pub fn named<S>(mut self, name: S) -> Self
    where
        S: Into<String>,
    {
        self.container_name = Some(name.into());
        self
    }

    /// Sets the container properties.
    pub fn with_properties(mut self, properties: ContainerProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the container metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.properties.metadata = Some(metadata);
        self
    }

    /// Sets whether the container is expected to exist.
    pub fn with_should_exist(mut self, should_exist: bool) -> Self {
        self.should_exist = Some(should_exist);
        self
    }

    /// Whether the container is expected to exist. Defaults to `true`.
    pub fn should_exist(&self) -> bool {
        self.should_exist.unwrap_or(true)
    }

    /// Returns a copy of this definition bound to `name`.
    pub fn bound_to<S>(&self, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            container_name: Some(name.into()),
            ..self.clone()
        }
    }
}



/// Desired state of a single object (a file or a folder).
#[derive(Clone, Debug, Default)]
pub struct ObjectDefinition {
    /// Path of the object relative to its container.
    ///
    /// When the definition is nested in an [`ObjectResourceMapping`], the flattened path takes precedence.
    pub object_name: Option<String>,

    pub properties: ObjectProperties,

    /// Body of the object. When `None`, creation writes an empty body
    /// and validation does not compare content.
    pub body: Option<Box<dyn ObjectContentContainer>>,

    /// Whether the object is expected to exist. `None` means it should.
    pub should_exist: Option<bool>,
}

impl ObjectDefinition {
    /// A file definition with the given name and nothing else specified.
    pub fn named<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            object_name: Some(name.into()),
            ..Default::default()
        }
    }

    /// A folder definition with nothing else specified.
    pub fn folder() -> Self {
        Self {
            properties: ObjectProperties::folder(),
            ..Default::default()
        }
    }

    /// Sets the body of the object.
    pub fn with_body<C>(mut self, body: C) -> Self
    where
        C: ObjectContentContainer + 'static,
    {
        self.body = Some(Box::new(body));
        self
    }

    /// Sets the object properties.
    pub fn with_properties(mut self, properties: ObjectProperties) -> Self {
        self.properties = properties;
        self
    }

    /// Sets the object metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.properties.metadata = Some(metadata);
        self
    }

    /// Sets whether the object is expected to exist.
    pub fn with_should_exist(mut self, should_exist: bool) -> Self {
        self.should_exist = Some(should_exist);
        self
    }

    /// Whether the object is expected to exist. Defaults to `true`.
    pub fn should_exist(&self) -> bool {
        self.should_exist.unwrap_or(true)
    }

    /// Returns a copy of this definition bound to `name`.
    pub fn bound_to<S>(&self, name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            object_name: Some(name.into()),
            ..self.clone()
        }
    }
}

impl PartialEq for ObjectDefinition {
    fn eq(&self, other: &Self) -> bool {
        let bodies_equal = match (&self.body, &other.body) {
            (Some(body), Some(other_body)) => {
                body.size() == other_body.size()
                    && matches!(
                        (body.content_hash(), other_body.content_hash()),
                        (Ok(hash), Ok(other_hash)) if hash == other_hash
                    )
            }
            (None, None) => true,
            _ => false,
        };

        bodies_equal
            && self.object_name == other.object_name
            && self.properties == other.properties
            && self.should_exist == other.should_exist
    }
}



/// A definition at any level, tagged with that level.
#[derive(Clone, PartialEq, Debug)]
pub enum ResourceDefinition {
    Service(ServiceDefinition),
    Container(ContainerDefinition),
    Object(ObjectDefinition),
}

impl ResourceDefinition {
    /// The level this definition addresses.
    pub fn definition_target(&self) -> Level {
        match self {
            ResourceDefinition::Service(_) => Level::Service,
            ResourceDefinition::Container(_) => Level::Container,
            ResourceDefinition::Object(_) => Level::Object,
        }
    }

    /// Whether the described resource is expected to exist. Services always are.
    pub fn should_exist(&self) -> bool {
        match self {
            ResourceDefinition::Service(_) => true,
            ResourceDefinition::Container(container) => container.should_exist(),
            ResourceDefinition::Object(object) => object.should_exist(),
        }
    }

    /// Name of the described resource, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            ResourceDefinition::Service(_) => None,
            ResourceDefinition::Container(container) => container.container_name.as_deref(),
            ResourceDefinition::Object(object) => object.object_name.as_deref(),
        }
    }

    /// Returns the service definition, or [`HarnessError::UnexpectedDefinitionShape`].
    pub fn as_service(&self) -> Result<&ServiceDefinition, HarnessError> {
        match self {
            ResourceDefinition::Service(service) => Ok(service),
            other => Err(other.unexpected_shape(Level::Service)),
        }
    }

    /// Returns the container definition, or [`HarnessError::UnexpectedDefinitionShape`].
    pub fn as_container(&self) -> Result<&ContainerDefinition, HarnessError> {
        match self {
            ResourceDefinition::Container(container) => Ok(container),
            other => Err(other.unexpected_shape(Level::Container)),
        }
    }

    /// Returns the object definition, or [`HarnessError::UnexpectedDefinitionShape`].
    pub fn as_object(&self) -> Result<&ObjectDefinition, HarnessError> {
        match self {
            ResourceDefinition::Object(object) => Ok(object),
            other => Err(other.unexpected_shape(Level::Object)),
        }
    }

    fn unexpected_shape(&self, expected: Level) -> HarnessError {
        HarnessError::UnexpectedDefinitionShape {
            expected,
            actual: self.definition_target(),
        }
    }

    /// Wraps this definition in a new definition one level shallower.
    ///
    /// The wrapped resource keeps its own name, or gets a fresh one from the
    /// context's name source if it has none.
    ///
    /// # Errors
    /// Service-level definitions have no parent: [`HarnessError::NoAdoptiveParent`].
    pub fn generate_adoptive_parent(
        self,
        context: &mut ScenarioContext,
    ) -> Result<ResourceDefinition, HarnessError> {
        match self {
            ResourceDefinition::Service(_) => Err(HarnessError::NoAdoptiveParent {
                level: Level::Service,
            }),
            ResourceDefinition::Container(container) => {
                let name = match &container.container_name {
                    Some(name) => name.clone(),
                    None => context.generate_name(),
                };

                debug!("wrapping container definition \"{name}\" in a service definition");

                let container = container.bound_to(name.clone());

                Ok(ResourceDefinition::Service(ServiceDefinition {
                    containers: BTreeMap::from([(name, container)]),
                }))
            }
            ResourceDefinition::Object(object) => {
                let name = match &object.object_name {
                    Some(name) => name.clone(),
                    None => context.generate_name(),
                };

                debug!("wrapping object definition \"{name}\" in a container definition");

                let object = object.bound_to(name.clone());

                Ok(ResourceDefinition::Container(ContainerDefinition {
                    objects: ObjectResourceMapping::Flat(BTreeMap::from([(name, object)])),
                    ..Default::default()
                }))
            }
        }
    }

    /// Walks one level down: given `manager` at this definition's level,
    /// returns the manager and the name-bound definition of the single child.
    ///
    /// # Errors
    /// - [`HarnessError::LevelMismatch`] if `manager` is not at this definition's level,
    /// - [`HarnessError::AmbiguousAdoptiveChild`] if the definition does not have exactly one child,
    /// - [`HarnessError::NoAdoptiveChild`] for object-level definitions.
    pub fn match_adoptive_child(
        &self,
        manager: &ManagerHandle,
    ) -> Result<(ManagerHandle, ResourceDefinition), HarnessError> {
        ensure_same_level(manager, self)?;

        match self {
            ResourceDefinition::Service(service) => {
                let (name, container) = single_entry(Level::Service, &service.containers)?;

                let child_manager = manager.child(name, Default::default())?;
                Ok((
                    child_manager,
                    ResourceDefinition::Container(container.bound_to(name.as_str())),
                ))
            }
            ResourceDefinition::Container(container) => {
                let objects = container.objects.flatten();
                let (path, object) = single_entry(Level::Container, &objects)?;

                let child_manager = manager.child(path, object.properties.entity_type)?;
                Ok((
                    child_manager,
                    ResourceDefinition::Object(object.bound_to(path.as_str())),
                ))
            }
            ResourceDefinition::Object(_) => Err(HarnessError::NoAdoptiveChild {
                level: Level::Object,
            }),
        }
    }

    /// Applies `callbacks` to this definition and, depth-first, to every nested definition.
    ///
    /// The callback for this definition's level (if any) runs first. Unless it returns
    /// [`Traversal::SkipChildren`], every child is then bound to its map key, paired with
    /// the manager of the same name one level down, and applied in turn.
    /// Children are visited in key order.
    ///
    /// # Errors
    /// Fails with [`HarnessError::LevelMismatch`] if `manager` is not at this
    /// definition's level. Errors returned by callbacks abort the whole traversal.
    pub fn apply_definition(
        &self,
        context: &mut ScenarioContext,
        manager: &ManagerHandle,
        callbacks: &mut LevelCallbacks<'_>,
    ) -> Result<(), HarnessError> {
        ensure_same_level(manager, self)?;

        if callbacks.invoke(context, manager, self)? == Traversal::SkipChildren {
            return Ok(());
        }

        match self {
            ResourceDefinition::Service(service) => {
                for (name, container) in &service.containers {
                    let child_manager = manager.child(name, Default::default())?;

                    ResourceDefinition::Container(container.bound_to(name.as_str()))
                        .apply_definition(context, &child_manager, callbacks)?;
                }
            }
            ResourceDefinition::Container(container) => {
                for (path, object) in container.objects.flatten() {
                    let child_manager = manager.child(&path, object.properties.entity_type)?;

                    ResourceDefinition::Object(object.bound_to(path))
                        .apply_definition(context, &child_manager, callbacks)?;
                }
            }
            ResourceDefinition::Object(_) => {}
        }

        Ok(())
    }
}

fn ensure_same_level(
    manager: &ManagerHandle,
    definition: &ResourceDefinition,
) -> Result<(), HarnessError> {
    if manager.level() != definition.definition_target() {
        return Err(HarnessError::LevelMismatch {
            expected: definition.definition_target(),
            actual: manager.level(),
        });
    }

    Ok(())
}

fn single_entry<V>(level: Level, entries: &BTreeMap<String, V>) -> Result<(&String, &V), HarnessError> {
    let mut iterator = entries.iter();

    match (iterator.next(), entries.len()) {
        (Some(entry), 1) => Ok(entry),
        (_, candidates) => Err(HarnessError::AmbiguousAdoptiveChild { level, candidates }),
    }
}

impl From<ServiceDefinition> for ResourceDefinition {
    fn from(definition: ServiceDefinition) -> Self {
        ResourceDefinition::Service(definition)
    }
}

impl From<ContainerDefinition> for ResourceDefinition {
    fn from(definition: ContainerDefinition) -> Self {
        ResourceDefinition::Container(definition)
    }
}

impl From<ObjectDefinition> for ResourceDefinition {
    fn from(definition: ObjectDefinition) -> Self {
        ResourceDefinition::Object(definition)
    }
}



/// A definition type paired with the manager type at its level.
///
/// Lets [`create_resource`][crate::task::create_resource] and
/// [`validate_resource`][crate::task::validate_resource] work with concrete managers.
pub trait MatchedDefinition: Clone + Into<ResourceDefinition> {
    /// Manager type at the definition's level.
    type Manager: ManagerLevel;
}

impl MatchedDefinition for ServiceDefinition {
    type Manager = std::sync::Arc<dyn ServiceResourceManager>;
}

impl MatchedDefinition for ContainerDefinition {
    type Manager = std::sync::Arc<dyn ContainerResourceManager>;
}

impl MatchedDefinition for ObjectDefinition {
    type Manager = std::sync::Arc<dyn ObjectResourceManager>;
}

impl MatchedDefinition for ResourceDefinition {
    type Manager = ManagerHandle;
}



#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::HarnessConfig, context::SequentialNameSource};

    fn context() -> ScenarioContext {
        ScenarioContext::new("definition-tests", HarnessConfig::default())
            .with_name_source(SequentialNameSource::new("generated"))
    }

    #[test]
    fn lifting_an_unnamed_object_generates_its_name() {
        let mut context = context();

        let lifted = ResourceDefinition::from(ObjectDefinition::default())
            .generate_adoptive_parent(&mut context)
            .unwrap();

        let container = lifted.as_container().unwrap();
        let objects = container.objects.flatten();

        assert_eq!(container.container_name, None);
        assert_eq!(
            objects["generated-0"].object_name.as_deref(),
            Some("generated-0")
        );

        let lifted_again = lifted.generate_adoptive_parent(&mut context).unwrap();
        let service = lifted_again.as_service().unwrap();
        assert!(service.containers.contains_key("generated-1"));
    }

    #[test]
    fn lifting_a_named_definition_keeps_its_name() {
        let mut context = context();

        let lifted = ResourceDefinition::from(ContainerDefinition::default().named("kept"))
            .generate_adoptive_parent(&mut context)
            .unwrap();

        let service = lifted.as_service().unwrap();
        assert_eq!(
            service.containers["kept"].container_name.as_deref(),
            Some("kept")
        );
    }

    #[test]
    fn services_have_no_adoptive_parent() {
        let result = ResourceDefinition::from(ServiceDefinition::default())
            .generate_adoptive_parent(&mut context());

        assert!(matches!(
            result,
            Err(HarnessError::NoAdoptiveParent {
                level: Level::Service
            })
        ));
    }

    #[test]
    fn definitions_default_to_existing() {
        assert!(ResourceDefinition::from(ObjectDefinition::default()).should_exist());
        assert!(ResourceDefinition::from(ServiceDefinition::default()).should_exist());
        assert!(
            !ResourceDefinition::from(ContainerDefinition::default().with_should_exist(false))
                .should_exist()
        );
    }

    #[test]
    fn binding_a_name_leaves_the_original_untouched() {
        let original = ObjectDefinition::named("original");
        let bound = original.bound_to("a/b");

        assert_eq!(original.object_name.as_deref(), Some("original"));
        assert_eq!(bound.object_name.as_deref(), Some("a/b"));
    }
}
