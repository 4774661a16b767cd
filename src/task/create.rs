use log::{debug, info};

use crate::{
    content::{ObjectContentContainer, ZeroContent},
    context::ScenarioContext,
    definition::{LevelCallbacks, MatchedDefinition, ResourceDefinition, Traversal},
    error::HarnessError,
    level::Level,
    manager::{
        ContainerResourceManager,
        ManagerHandle,
        ManagerLevel,
        ObjectResourceManager,
        ResourceManager,
    },
};


/// Creates the resource described by `definition`, starting from `base`.
///
/// `base` may be shallower than the definition: the definition is first wrapped in
/// adoptive parents until it reaches the level of `base`, and every container and object
/// implied by that chain is created too. The manager of the originally requested resource
/// is returned.
///
/// Resources whose definition says they should not exist are not created, nor are their children.
/// Every created object, and every container that did not exist before, is tracked on `context`
/// for [`ScenarioContext::cleanup`]. Pre-existing containers are never tracked.
///
/// # Errors
/// - [`HarnessError::ManagerDeeperThanDefinition`] if `base` is deeper than the definition,
/// - [`HarnessError::Backend`] if any create call fails. Resources created before the failure
///   are left in place.
///
/// # Example
/// ```no_run
/// # use resource_harness::backend::AccountRegistry;
/// # use resource_harness::config::HarnessConfig;
/// # use resource_harness::content::BufferedContent;
/// # use resource_harness::context::ScenarioContext;
/// # use resource_harness::definition::ObjectDefinition;
/// # use resource_harness::level::Location;
/// # use resource_harness::manager::ObjectResourceManager;
/// # use resource_harness::task::create_resource;
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut context = ScenarioContext::new("example", HarnessConfig::default());
/// let registry = AccountRegistry::new();
/// let service = registry.get_root_resource(&context, Location::Local, &Default::default())?;
///
/// let object = create_resource(
///     &mut context,
///     &service,
///     ObjectDefinition::named("hello.txt").with_body(BufferedContent::from_text("hello")),
/// )?;
///
/// assert_eq!(object.object_name(), "hello.txt");
/// # Ok(())
/// # }
/// ```
pub fn create_resource<D>(
    context: &mut ScenarioContext,
    base: &ManagerHandle,
    definition: D,
) -> Result<D::Manager, HarnessError>
where
    D: MatchedDefinition,
{
    let mut definition: ResourceDefinition = definition.into();
    let requested_level = definition.definition_target();

    if base.level() > requested_level {
        return Err(HarnessError::ManagerDeeperThanDefinition {
            manager: base.level(),
            definition: requested_level,
        });
    }


    // Lift the definition up to the level of the base manager.
    let mut lift_count: usize = 0;
    while definition.definition_target() > base.level() {
        definition = definition.generate_adoptive_parent(context)?;
        lift_count += 1;
    }

    debug!(
        "[{}] lifted {} definition {} time(s) to match {}",
        context.name(),
        requested_level,
        lift_count,
        base.canonical_name()
    );


    let mut callbacks = LevelCallbacks::new()
        .on(Level::Container, create_container)
        .on(Level::Object, create_object);

    definition.apply_definition(context, base, &mut callbacks)?;


    // Lower back down to the originally requested resource.
    let mut manager = base.clone();
    for _ in 0..lift_count {
        let (child_manager, child_definition) = definition.match_adoptive_child(&manager)?;

        manager = child_manager;
        definition = child_definition;
    }

    info!(
        "[{}] created {} {}",
        context.name(),
        requested_level,
        manager.canonical_name()
    );

    D::Manager::from_handle(manager)
}


fn create_container(
    context: &mut ScenarioContext,
    manager: &ManagerHandle,
    definition: &ResourceDefinition,
) -> Result<Traversal, HarnessError> {
    let container_definition = definition.as_container()?;
    let container = manager.as_container()?;

    if !container_definition.should_exist() {
        debug!(
            "[{}] not creating container {}: it should not exist",
            context.name(),
            container.canonical_name()
        );

        return Ok(Traversal::SkipChildren);
    }

    debug!("[{}] creating container {}", context.name(), container.canonical_name());

    let newly_created = container
        .create(&container_definition.properties)
        .map_err(|error| HarnessError::backend("create container", container.canonical_name(), error))?;

    if newly_created {
        context.track_created(manager.clone());
    } else {
        debug!(
            "[{}] container {} already existed, not tracking it",
            context.name(),
            container.canonical_name()
        );
    }

    Ok(Traversal::Continue)
}


fn create_object(
    context: &mut ScenarioContext,
    manager: &ManagerHandle,
    definition: &ResourceDefinition,
) -> Result<Traversal, HarnessError> {
    let object_definition = definition.as_object()?;
    let object = manager.as_object()?;

    if !object_definition.should_exist() {
        debug!(
            "[{}] not creating object {}: it should not exist",
            context.name(),
            object.canonical_name()
        );

        return Ok(Traversal::SkipChildren);
    }

    let empty_body = ZeroContent::new(0);
    let body: &dyn ObjectContentContainer = match &object_definition.body {
        Some(body) => body.as_ref(),
        None => &empty_body,
    };

    debug!(
        "[{}] creating {} {} ({} bytes)",
        context.name(),
        object.entity_type(),
        object.canonical_name(),
        body.size()
    );

    object
        .create(body, &object_definition.properties)
        .map_err(|error| HarnessError::backend("create object", object.canonical_name(), error))?;

    context.track_created(manager.clone());

    Ok(Traversal::Continue)
}
