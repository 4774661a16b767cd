use std::fs;

use resource_harness::{
    content::BufferedContent,
    context::{ScenarioContext, SequentialNameSource},
    definition::{ContainerDefinition, ObjectDefinition, ResourceDefinition, ServiceDefinition},
    error::HarnessError,
    level::{EntityType, Level, Location},
    manager::{
        ContainerResourceManager,
        ManagerHandle,
        ObjectResourceManager,
        ResourceManager,
        ServiceResourceManager,
    },
    mapping::ObjectResourceMapping,
    task::{create_resource, validate_resource},
};
use resource_harness_test_harness::prelude::*;


#[test]
pub fn object_is_created_from_a_service_base() -> TestResult {
    init_test_logging();

    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("round-trip");

    let object = create_resource(
        &mut context,
        harness.service(),
        ObjectDefinition::default().with_body(BufferedContent::from_text("hello")),
    )?;

    // The object is lifted first, so it receives the first generated name.
    assert_eq!(object.level(), Level::Object);
    assert_eq!(object.object_name(), "round-trip-0");
    assert_eq!(object.container_name(), "round-trip-1");
    assert_eq!(object.entity_type(), EntityType::File);

    let object_path = harness.child_path("round-trip-1/round-trip-0");
    assert!(object_path.is_file());
    assert_eq!(fs::read_to_string(object_path)?, "hello");

    assert_eq!(context.created_resources().len(), 2);
    context.assert_no_failures();


    harness.destroy();
    Ok(())
}


#[test]
pub fn explicit_names_are_kept() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("named");

    let object = create_resource(
        &mut context,
        harness.service(),
        ObjectDefinition::named("dir/explicit.txt").with_body(BufferedContent::from_text("x")),
    )?;

    assert_eq!(object.object_name(), "dir/explicit.txt");
    assert_eq!(object.container_name(), "named-0");
    assert!(harness.child_path("named-0/dir/explicit.txt").is_file());


    harness.destroy();
    Ok(())
}


#[test]
pub fn returned_object_knows_its_parent() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("parent");

    let object = create_resource(
        &mut context,
        harness.service(),
        ObjectDefinition::named("child.txt"),
    )?;

    let parent = object.parent().expect("objects always have a parent container");
    assert_eq!(parent.level(), Level::Container);
    assert_eq!(parent.as_container()?.container_name(), "parent-0");

    let service = parent.parent().expect("containers always have a parent service");
    assert_eq!(service.level(), Level::Service);
    assert_eq!(service.canonical_name(), harness.service().canonical_name());


    harness.destroy();
    Ok(())
}


#[test]
pub fn container_is_created_with_every_object() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("container");
    let mut content = SeededContentGenerator::new(2024);

    let foo = content.next_content(1024);
    let bar = content.next_content(2048);

    let definition = ContainerDefinition::with_objects(ObjectResourceMapping::flat([
        ("foo.txt", ObjectDefinition::default().with_body(foo.clone())),
        ("dir/bar.txt", ObjectDefinition::default().with_body(bar.clone())),
        ("empty", ObjectDefinition::folder()),
    ]));

    let container = create_resource(&mut context, harness.service(), definition)?;

    assert_eq!(container.container_name(), "container-0");
    assert!(container.exists()?);

    assert_eq!(fs::read(harness.child_path("container-0/foo.txt"))?, foo.as_bytes());
    assert_eq!(fs::read(harness.child_path("container-0/dir/bar.txt"))?, bar.as_bytes());
    assert!(harness.child_path("container-0/empty").is_dir());

    // The container and its three objects.
    assert_eq!(context.created_resources().len(), 4);


    harness.destroy();
    Ok(())
}


#[test]
pub fn service_definition_creates_named_containers() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("service");

    let definition = ServiceDefinition::with_containers([
        (
            "first",
            ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
                "a.txt",
                ObjectDefinition::default(),
            )])),
        ),
        ("second", ContainerDefinition::default()),
    ]);

    let service = create_resource(&mut context, harness.service(), definition)?;

    let mut containers = service.list_containers()?;
    containers.sort();
    assert_eq!(containers, vec!["first".to_string(), "second".to_string()]);

    let empty_file = harness.child_path("first/a.txt");
    assert!(empty_file.is_file());
    assert_eq!(fs::metadata(empty_file)?.len(), 0);


    harness.destroy();
    Ok(())
}


#[test]
pub fn base_deeper_than_definition_is_rejected() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("too-deep");

    let object = create_resource(
        &mut context,
        harness.service(),
        ObjectDefinition::named("base.txt"),
    )?;

    let result = create_resource(
        &mut context,
        &ManagerHandle::Object(object),
        ContainerDefinition::default(),
    );

    assert_matches!(
        result,
        Err(HarnessError::ManagerDeeperThanDefinition {
            manager: Level::Object,
            definition: Level::Container,
        })
    );


    harness.destroy();
    Ok(())
}


#[test]
pub fn resources_that_should_not_exist_are_not_created() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("negative");

    let definition = ContainerDefinition::with_objects(ObjectResourceMapping::flat([
        ("present.txt", ObjectDefinition::default()),
        ("absent.txt", ObjectDefinition::default().with_should_exist(false)),
    ]));

    create_resource(&mut context, harness.service(), definition)?;

    assert!(harness.child_path("negative-0/present.txt").is_file());
    assert!(!harness.child_path("negative-0/absent.txt").exists());
    assert_eq!(context.created_resources().len(), 2);


    let skipped = ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
        "never.txt",
        ObjectDefinition::default(),
    )]))
    .named("skipped")
    .with_should_exist(false);

    create_resource(&mut context, harness.service(), skipped)?;

    assert!(!harness.child_path("skipped").exists());


    harness.destroy();
    Ok(())
}


#[test]
pub fn cleanup_removes_created_resources() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("cleanup");

    let definition = ContainerDefinition::with_objects(ObjectResourceMapping::flat([
        ("foo.txt", ObjectDefinition::default()),
        ("dir/bar.txt", ObjectDefinition::default()),
    ]));

    create_resource(&mut context, harness.service(), definition)?;
    assert!(harness.child_path("cleanup-0/dir/bar.txt").is_file());

    context.cleanup()?;

    assert!(!harness.child_path("cleanup-0").exists());
    assert!(context.created_resources().is_empty());


    harness.destroy();
    Ok(())
}


#[test]
pub fn memory_service_tracks_created_objects() -> TestResult {
    let service = memory_service(Location::Blob);
    let mut context = ScenarioContext::new("memory", Default::default())
        .with_name_source(SequentialNameSource::new("memory"));

    let object = create_resource(
        &mut context,
        &service,
        ObjectDefinition::named("folder/blob.bin").with_body(BufferedContent::random(512)),
    )?;

    assert!(object.exists()?);
    assert_eq!(object.location(), Location::Blob);

    let container = object.parent().expect("objects always have a parent container");
    let listed = container
        .as_container()?
        .list_objects("", true)?
        .into_keys()
        .collect::<Vec<_>>();

    assert_eq!(listed, vec!["folder/blob.bin".to_string()]);

    Ok(())
}


#[test]
pub fn cleanup_keeps_containers_that_already_existed() -> TestResult {
    let service = memory_service(Location::Blob);

    let mut setup = ScenarioContext::new("setup", Default::default());
    let preexisting = create_resource(
        &mut setup,
        &service,
        ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
            "keep.txt",
            ObjectDefinition::default(),
        )]))
        .named("preexisting"),
    )?;

    let mut context = ScenarioContext::new("scenario", Default::default());
    let created = create_resource(
        &mut context,
        &ManagerHandle::Container(preexisting.clone()),
        ObjectDefinition::named("new.txt"),
    )?;

    assert_eq!(context.created_resources().len(), 1);
    assert_eq!(
        context.created_resources()[0].canonical_name(),
        created.canonical_name()
    );

    context.cleanup()?;

    assert!(!created.exists()?);
    assert!(preexisting.exists()?);
    assert!(preexisting.get_object("keep.txt", EntityType::File).exists()?);

    Ok(())
}


#[test]
pub fn local_cleanup_keeps_containers_that_already_existed() -> TestResult {
    let harness = LocalServiceHarness::initialize();

    let mut setup = harness.context("existing");
    let container = create_resource(
        &mut setup,
        harness.service(),
        ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
            "keep.txt",
            ObjectDefinition::default(),
        )])),
    )?;

    let mut context = harness.context("scenario");
    create_resource(
        &mut context,
        &ManagerHandle::Container(container),
        ObjectDefinition::named("new.txt"),
    )?;
    assert!(harness.child_path("existing-0/new.txt").is_file());

    context.cleanup()?;

    assert!(harness.child_path("existing-0/keep.txt").is_file());
    assert!(!harness.child_path("existing-0/new.txt").exists());


    harness.destroy();
    Ok(())
}


#[test]
pub fn mapping_key_overrides_the_definition_name() -> TestResult {
    let service = memory_service(Location::Blob);
    let mut context = ScenarioContext::new("renamed", Default::default())
        .with_name_source(SequentialNameSource::new("renamed"));

    let definition = ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
        "real.txt",
        ObjectDefinition::named("other.txt"),
    )]));

    let container = create_resource(&mut context, &service, definition.clone())?;

    assert!(container.get_object("real.txt", EntityType::File).exists()?);
    assert!(!container.get_object("other.txt", EntityType::File).exists()?);

    validate_resource(
        &mut context,
        &ManagerHandle::Container(container.clone()),
        &ResourceDefinition::from(definition.clone()),
        Default::default(),
    )?;
    context.assert_no_failures();

    let (child_manager, child_definition) = ResourceDefinition::from(definition)
        .match_adoptive_child(&ManagerHandle::Container(container))?;

    assert_eq!(child_manager.as_object()?.object_name(), "real.txt");
    assert_eq!(child_definition.name(), Some("real.txt"));

    Ok(())
}
