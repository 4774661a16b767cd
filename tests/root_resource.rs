use resource_harness::{
    backend::{memory::MemoryAccount, AccountRegistry, GetResourceOptions},
    context::ScenarioContext,
    definition::{ContainerDefinition, ObjectDefinition, ResourceDefinition},
    error::HarnessError,
    level::{AccountType, Level, Location},
    manager::ServiceResourceManager,
    mapping::ObjectResourceMapping,
    task::{create_resource, validate_resource},
};
use resource_harness_test_harness::prelude::*;


#[test]
pub fn local_root_resource_uses_configured_directory() -> TestResult {
    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("local-root");

    let service =
        AccountRegistry::new().get_root_resource(&context, Location::Local, &Default::default())?;

    assert_eq!(service.level(), Level::Service);
    assert_eq!(service.location(), Location::Local);
    assert!(service.account().is_none());

    create_resource(&mut context, &service, ContainerDefinition::default())?;

    assert!(harness.child_path("local-root-0").is_dir());
    assert_eq!(
        service.as_service()?.list_containers()?,
        vec!["local-root-0".to_string()]
    );


    harness.destroy();
    Ok(())
}


#[test]
pub fn accounts_share_state_between_lookups() -> TestResult {
    let mut registry = AccountRegistry::new();
    registry.register(MemoryAccount::new("standard", AccountType::Standard));

    let mut context = ScenarioContext::new("shared", Default::default());

    let first = registry.get_root_resource(&context, Location::Blob, &Default::default())?;
    let definition = ContainerDefinition::with_objects(ObjectResourceMapping::flat([(
        "a.txt",
        ObjectDefinition::default(),
    )]))
    .named("shared-container");

    create_resource(&mut context, &first, definition.clone())?;

    let options = GetResourceOptions {
        preferred_account: Some("standard".to_string()),
    };
    let second = registry.get_root_resource(&context, Location::Blob, &options)?;

    let container = second.child("shared-container", Default::default())?;
    validate_resource(
        &mut context,
        &container,
        &ResourceDefinition::from(definition),
        Default::default(),
    )?;

    context.assert_no_failures();

    Ok(())
}


#[test]
pub fn unregistered_locations_are_fatal() -> TestResult {
    let mut registry = AccountRegistry::new();
    registry.register(MemoryAccount::new("standard", AccountType::Standard));

    let context = ScenarioContext::new("unregistered", Default::default());

    assert_matches!(
        registry.get_root_resource(&context, Location::FileNfs, &Default::default()),
        Err(HarnessError::NoAccountForLocation {
            location: Location::FileNfs
        })
    );

    let missing_account = GetResourceOptions {
        preferred_account: Some("nobody".to_string()),
    };

    assert_matches!(
        registry.get_root_resource(&context, Location::Blob, &missing_account),
        Err(HarnessError::NoAccountForLocation {
            location: Location::Blob
        })
    );

    Ok(())
}


#[cfg(unix)]
#[test]
pub fn local_file_mode_is_applied_and_validated() -> TestResult {
    use std::os::unix::fs::PermissionsExt;

    use resource_harness::properties::{NfsProperties, ObjectProperties};

    let harness = LocalServiceHarness::initialize();
    let mut context = harness.context("file-mode");

    let with_mode = |file_mode: u32| {
        ObjectDefinition::named("restricted.txt").with_properties(ObjectProperties {
            nfs: NfsProperties {
                file_mode: Some(file_mode),
                ..Default::default()
            },
            ..Default::default()
        })
    };

    let object = create_resource(&mut context, harness.service(), with_mode(0o600))?;

    let permissions = std::fs::metadata(harness.child_path("file-mode-0/restricted.txt"))?.permissions();
    assert_eq!(permissions.mode() & 0o7777, 0o600);

    validate_resource(&mut context, &object, &with_mode(0o600), Default::default())?;
    context.assert_no_failures();

    validate_resource(&mut context, &object, &with_mode(0o644), Default::default())?;
    context.assert_failure_count(1);
    assert_eq!(context.failures()[0].field(), "file mode");


    harness.destroy();
    Ok(())
}
