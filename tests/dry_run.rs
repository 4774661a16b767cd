use std::collections::BTreeMap;

use resource_harness::{
    backend::AccountRegistry,
    config::HarnessConfig,
    content::BufferedContent,
    context::{ScenarioContext, SequentialNameSource},
    definition::{ContainerDefinition, ObjectDefinition},
    level::{Level, Location},
    manager::ContainerResourceManager,
    mapping::ObjectResourceMapping,
    task::{create_resource, validate_resource, ValidateResourceOptions},
};
use resource_harness_test_harness::prelude::*;


fn dry_run_context(name: &str) -> ScenarioContext {
    let config = HarnessConfig {
        dry_run: true,
        ..Default::default()
    };

    ScenarioContext::new(name, config).with_name_source(SequentialNameSource::new(name))
}


#[test]
pub fn dry_run_resolves_mock_services_without_accounts() -> TestResult {
    let context = dry_run_context("mock-services");
    let registry = AccountRegistry::new();

    for location in [
        Location::Local,
        Location::Blob,
        Location::File,
        Location::FileNfs,
        Location::BlobFs,
    ] {
        let service = registry.get_root_resource(&context, location, &Default::default())?;

        assert_eq!(service.level(), Level::Service);
        assert_eq!(service.location(), location);
        assert!(service.exists()?);
    }

    Ok(())
}


#[test]
pub fn dry_run_creation_touches_nothing() -> TestResult {
    let harness = LocalServiceHarness::initialize();

    let config = HarnessConfig {
        dry_run: true,
        ..harness.config()
    };
    let mut context = ScenarioContext::new("dry-create", config)
        .with_name_source(SequentialNameSource::new("dry-create"));
    let service =
        AccountRegistry::new().get_root_resource(&context, Location::Local, &Default::default())?;

    let container = create_resource(
        &mut context,
        &service,
        ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
            "foo.txt",
            ObjectDefinition::default().with_body(BufferedContent::random(128)),
        )])),
    )?;

    assert_eq!(container.container_name(), "dry-create-0");
    assert!(container.exists()?);
    assert_eq!(std::fs::read_dir(harness.root_path())?.count(), 0);


    harness.destroy();
    Ok(())
}


#[test]
pub fn dry_run_validation_records_nothing() -> TestResult {
    let mut context = dry_run_context("dry-validate");
    let service =
        AccountRegistry::new().get_root_resource(&context, Location::Blob, &Default::default())?;

    let container = create_resource(&mut context, &service, ContainerDefinition::default())?;

    let impossible = ContainerDefinition::with_objects(ObjectResourceMapping::flat([
        (
            "absent.txt",
            ObjectDefinition::default().with_should_exist(false),
        ),
        (
            "tagged.txt",
            ObjectDefinition::default()
                .with_metadata(BTreeMap::from([("key".to_string(), "value".to_string())]))
                .with_body(BufferedContent::from_text("not empty")),
        ),
    ]));

    validate_resource(
        &mut context,
        &container,
        &impossible,
        ValidateResourceOptions {
            validate_object_content: true,
        },
    )?;

    context.assert_no_failures();
    assert!(context.into_report().is_clean());

    Ok(())
}
