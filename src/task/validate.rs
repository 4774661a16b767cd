use std::{
    collections::BTreeMap,
    fmt::Debug,
    time::{SystemTime, UNIX_EPOCH},
};

use log::{debug, info};

use crate::{
    content::ContentHash,
    context::ScenarioContext,
    definition::{LevelCallbacks, MatchedDefinition, ObjectDefinition, ResourceDefinition, Traversal},
    error::HarnessError,
    level::{EntityType, Level, Location},
    manager::{
        ContainerResourceManager,
        ManagerHandle,
        ManagerLevel,
        ObjectResourceManager,
        ResourceManager,
    },
    properties::{ContainerProperties, ObjectProperties},
    report::SoftFailure,
};


/// Options for [`validate_resource`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct ValidateResourceOptions {
    /// Whether to download every file that has an expected body and compare content hashes.
    ///
    /// Defaults to `false`.
    pub validate_object_content: bool,
}


/// Validates the real resource behind `target` (and everything nested in it) against `definition`.
///
/// Fields left unset in the definition are not compared. Every divergence is recorded
/// on `context` as a [`SoftFailure`] and validation continues; a resource whose existence
/// disagrees with the definition is recorded once and its properties and children are skipped.
///
/// In a dry run, this returns right after checking the precondition.
///
/// # Errors
/// - [`HarnessError::LevelMismatch`] if `target` is not at the definition's level,
/// - [`HarnessError::Backend`] or [`HarnessError::ContentRead`] if reading
///   the real resource fails.
pub fn validate_resource<D>(
    context: &mut ScenarioContext,
    target: &D::Manager,
    definition: &D,
    options: ValidateResourceOptions,
) -> Result<(), HarnessError>
where
    D: MatchedDefinition,
{
    let target = target.to_handle();
    let definition: ResourceDefinition = definition.clone().into();

    if target.level() != definition.definition_target() {
        return Err(HarnessError::LevelMismatch {
            expected: definition.definition_target(),
            actual: target.level(),
        });
    }

    if context.is_dry_run() {
        debug!(
            "[{}] dry run, skipping validation of {}",
            context.name(),
            target.canonical_name()
        );

        return Ok(());
    }


    let failures_before = context.failures().len();

    let mut callbacks = LevelCallbacks::new()
        .on(Level::Container, validate_container)
        .on(Level::Object, move |context, manager, definition| {
            validate_object(context, manager, definition, options)
        });

    definition.apply_definition(context, &target, &mut callbacks)?;

    info!(
        "[{}] validated {} with {} new failure(s)",
        context.name(),
        target.canonical_name(),
        context.failures().len() - failures_before
    );

    Ok(())
}


/// Records an existence mismatch. Returns whether the resource's properties should be compared.
fn validate_existence(
    context: &mut ScenarioContext,
    resource: &str,
    expected_exists: bool,
    actually_exists: bool,
) -> bool {
    if expected_exists != actually_exists {
        context.record_failure(SoftFailure::Existence {
            resource: resource.to_string(),
            expected_exists,
        });

        return false;
    }

    if !expected_exists {
        debug!("[{}] {resource} is absent, as expected", context.name());
        return false;
    }

    true
}


fn validate_container(
    context: &mut ScenarioContext,
    manager: &ManagerHandle,
    definition: &ResourceDefinition,
) -> Result<Traversal, HarnessError> {
    let container_definition = definition.as_container()?;
    let container = manager.as_container()?;
    let resource = container.canonical_name();

    let exists = container
        .exists()
        .map_err(|error| HarnessError::backend("check container existence", &resource, error))?;

    if !validate_existence(context, &resource, container_definition.should_exist(), exists) {
        return Ok(Traversal::SkipChildren);
    }

    let actual = container
        .get_properties()
        .map_err(|error| HarnessError::backend("get container properties", &resource, error))?;

    validate_container_properties(
        context,
        &resource,
        container.location(),
        &container_definition.properties,
        &actual,
    );

    Ok(Traversal::Continue)
}


fn validate_container_properties(
    context: &mut ScenarioContext,
    resource: &str,
    location: Location,
    expected: &ContainerProperties,
    actual: &ContainerProperties,
) {
    validate_map(context, resource, "metadata", &expected.metadata, &actual.metadata);

    match location {
        Location::Blob | Location::BlobFs => {
            validate_property(
                context,
                resource,
                "public access",
                &expected.blob.access,
                &actual.blob.access,
            );
        }
        Location::File | Location::FileNfs => {
            let (expected, actual) = (&expected.file, &actual.file);

            validate_property(
                context,
                resource,
                "share access tier",
                &expected.access_tier,
                &actual.access_tier,
            );
            validate_property(
                context,
                resource,
                "enabled protocols",
                &expected.enabled_protocols,
                &actual.enabled_protocols,
            );
            validate_property(context, resource, "quota", &expected.quota, &actual.quota);
            validate_property(
                context,
                resource,
                "root squash",
                &expected.root_squash,
                &actual.root_squash,
            );
        }
        Location::Local => {}
    }
}


fn validate_object(
    context: &mut ScenarioContext,
    manager: &ManagerHandle,
    definition: &ResourceDefinition,
    options: ValidateResourceOptions,
) -> Result<Traversal, HarnessError> {
    let object_definition = definition.as_object()?;
    let object = manager.as_object()?;
    let resource = object.canonical_name();

    let exists = object
        .exists()
        .map_err(|error| HarnessError::backend("check object existence", &resource, error))?;

    if !validate_existence(context, &resource, object_definition.should_exist(), exists) {
        return Ok(Traversal::SkipChildren);
    }

    let actual = object
        .get_properties()
        .map_err(|error| HarnessError::backend("get object properties", &resource, error))?;

    if object.location().is_hierarchical()
        && !object.object_name().is_empty()
        && object_definition.properties.entity_type != actual.entity_type
    {
        context.record_failure(SoftFailure::Property {
            resource: resource.clone(),
            field: "entity type",
            expected: object_definition.properties.entity_type.to_string(),
            actual: actual.entity_type.to_string(),
        });
    }

    validate_object_properties(
        context,
        &resource,
        object.location(),
        &object_definition.properties,
        &actual,
    );

    if options.validate_object_content {
        validate_object_content(context, manager, object_definition)?;
    }

    Ok(Traversal::Continue)
}


fn validate_object_properties(
    context: &mut ScenarioContext,
    resource: &str,
    location: Location,
    expected: &ObjectProperties,
    actual: &ObjectProperties,
) {
    let (expected_headers, actual_headers) = (&expected.http_headers, &actual.http_headers);

    validate_property(
        context,
        resource,
        "cache control",
        &expected_headers.cache_control,
        &actual_headers.cache_control,
    );
    validate_property(
        context,
        resource,
        "content disposition",
        &expected_headers.content_disposition,
        &actual_headers.content_disposition,
    );
    validate_property(
        context,
        resource,
        "content encoding",
        &expected_headers.content_encoding,
        &actual_headers.content_encoding,
    );
    validate_property(
        context,
        resource,
        "content language",
        &expected_headers.content_language,
        &actual_headers.content_language,
    );
    validate_property(
        context,
        resource,
        "content type",
        &expected_headers.content_type,
        &actual_headers.content_type,
    );

    validate_map(context, resource, "metadata", &expected.metadata, &actual.metadata);

    match location {
        Location::Blob => {
            let (expected, actual) = (&expected.blob, &actual.blob);

            validate_property(context, resource, "blob type", &expected.blob_type, &actual.blob_type);
            validate_map(context, resource, "blob tags", &expected.tags, &actual.tags);
            validate_property(
                context,
                resource,
                "block blob access tier",
                &expected.block_blob_access_tier,
                &actual.block_blob_access_tier,
            );
            validate_property(
                context,
                resource,
                "page blob access tier",
                &expected.page_blob_access_tier,
                &actual.page_blob_access_tier,
            );
        }
        Location::BlobFs => {
            let (expected, actual) = (&expected.blob_fs, &actual.blob_fs);

            validate_property(
                context,
                resource,
                "permissions",
                &expected.permissions,
                &actual.permissions,
            );
            validate_property(context, resource, "owner", &expected.owner, &actual.owner);
            validate_property(context, resource, "group", &expected.group, &actual.group);
            validate_property(context, resource, "acl", &expected.acl, &actual.acl);
        }
        Location::File => {
            let (expected, actual) = (&expected.file, &actual.file);

            validate_property(
                context,
                resource,
                "smb attributes",
                &expected.attributes,
                &actual.attributes,
            );
            validate_time(
                context,
                resource,
                "smb creation time",
                &expected.creation_time,
                &actual.creation_time,
            );
            validate_time(
                context,
                resource,
                "smb last write time",
                &expected.last_write_time,
                &actual.last_write_time,
            );
            validate_property(
                context,
                resource,
                "smb permissions",
                &expected.permissions,
                &actual.permissions,
            );
        }
        Location::FileNfs | Location::Local => {
            if location == Location::Local {
                validate_time(
                    context,
                    resource,
                    "last write time",
                    &expected.file.last_write_time,
                    &actual.file.last_write_time,
                );
            }

            let (expected, actual) = (&expected.nfs, &actual.nfs);

            validate_property(context, resource, "nfs owner", &expected.owner, &actual.owner);
            validate_property(context, resource, "nfs group", &expected.group, &actual.group);
            validate_property(
                context,
                resource,
                "file mode",
                &expected.file_mode,
                &actual.file_mode,
            );
        }
    }
}


fn validate_object_content(
    context: &mut ScenarioContext,
    manager: &ManagerHandle,
    definition: &ObjectDefinition,
) -> Result<(), HarnessError> {
    let expected_body = match &definition.body {
        Some(body) if definition.properties.entity_type == EntityType::File => body,
        _ => return Ok(()),
    };

    let object = manager.as_object()?;
    let resource = object.canonical_name();

    let reader = object
        .download()
        .map_err(|error| HarnessError::backend("download object", &resource, error))?;

    let actual_hash = ContentHash::of_reader(reader).map_err(|error| HarnessError::ContentRead {
        resource: resource.clone(),
        error,
    })?;
    let expected_hash = expected_body
        .content_hash()
        .map_err(|error| HarnessError::ContentRead {
            resource: format!("expected body of {resource}"),
            error,
        })?;

    if actual_hash != expected_hash {
        context.record_failure(SoftFailure::ContentHash {
            resource,
            expected: expected_hash.to_hex(),
            actual: actual_hash.to_hex(),
        });
    }

    Ok(())
}



/// Compares a single optional property. An unset expectation always passes.
fn validate_property<T>(
    context: &mut ScenarioContext,
    resource: &str,
    field: &'static str,
    expected: &Option<T>,
    actual: &Option<T>,
) where
    T: PartialEq + Debug,
{
    let Some(expected) = expected else {
        return;
    };

    if actual.as_ref() == Some(expected) {
        return;
    }

    context.record_failure(SoftFailure::Property {
        resource: resource.to_string(),
        field,
        expected: format!("{expected:?}"),
        actual: match actual {
            Some(actual) => format!("{actual:?}"),
            None => "<unset>".to_string(),
        },
    });
}


/// Compares an optional timestamp at whole-second precision.
fn validate_time(
    context: &mut ScenarioContext,
    resource: &str,
    field: &'static str,
    expected: &Option<SystemTime>,
    actual: &Option<SystemTime>,
) {
    validate_property(
        context,
        resource,
        field,
        &expected.map(whole_seconds_since_epoch),
        &actual.map(whole_seconds_since_epoch),
    );
}

/// Seconds since the Unix epoch, rounded towards negative infinity.
fn whole_seconds_since_epoch(time: SystemTime) -> i128 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after_epoch) => i128::from(after_epoch.as_secs()),
        Err(before_epoch) => {
            let before_epoch = before_epoch.duration();

            -i128::from(before_epoch.as_secs()) - i128::from(before_epoch.subsec_nanos() > 0)
        }
    }
}


/// Compares a metadata or tag map as a whole. An unset expectation always passes,
/// and an unset real map compares equal to an empty one.
fn validate_map(
    context: &mut ScenarioContext,
    resource: &str,
    field: &'static str,
    expected: &Option<BTreeMap<String, String>>,
    actual: &Option<BTreeMap<String, String>>,
) {
    let Some(expected) = expected else {
        return;
    };

    let empty = BTreeMap::new();
    let actual = actual.as_ref().unwrap_or(&empty);

    if expected != actual {
        context.record_failure(SoftFailure::Property {
            resource: resource.to_string(),
            field,
            expected: format!("{expected:?}"),
            actual: format!("{actual:?}"),
        });
    }
}



#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timestamps_are_truncated_to_whole_seconds() {
        let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);

        assert_eq!(
            whole_seconds_since_epoch(base + Duration::from_millis(999)),
            1_700_000_000
        );
        assert_eq!(whole_seconds_since_epoch(base), 1_700_000_000);

        assert_eq!(whole_seconds_since_epoch(UNIX_EPOCH - Duration::from_millis(1)), -1);
        assert_eq!(whole_seconds_since_epoch(UNIX_EPOCH - Duration::from_secs(2)), -2);
    }
}
