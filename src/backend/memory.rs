//! An in-process emulation of cloud storage accounts.
//!
//! Every service location offered by a [`MemoryAccount`] has its own store, shared by all
//! managers obtained from that account. Unlike the local filesystem, the memory back-end
//! retains every property bag it is given, so property validation can be exercised end to end.

use std::{
    collections::{btree_map::Entry, BTreeMap},
    fmt::{self, Debug, Formatter},
    io::{Cursor, Read},
    path::PathBuf,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::{
    content::{ObjectContentContainer, ReadSeek},
    error::BackendError,
    level::{AccountType, EntityType, Level, Location},
    manager::{
        AccountResourceManager,
        ContainerResourceManager,
        ManagerHandle,
        ObjectResourceManager,
        ResourceManager,
        ServiceResourceManager,
    },
    mapping::join_object_path,
    properties::{BlobType, ContainerProperties, ObjectProperties},
};


#[derive(Default)]
struct ServiceStore {
    containers: BTreeMap<String, StoredContainer>,
}

struct StoredContainer {
    properties: ContainerProperties,

    /// Properties of the container's root folder (the `""` object).
    root_properties: ObjectProperties,

    objects: BTreeMap<String, StoredObject>,
}

impl StoredContainer {
    fn new(properties: ContainerProperties) -> Self {
        Self {
            properties,
            root_properties: ObjectProperties::folder(),
            objects: BTreeMap::new(),
        }
    }

    /// Whether `path` is a parent directory of any stored object.
    fn has_implicit_folder(&self, path: &str) -> bool {
        let folder_prefix = format!("{path}/");

        self.objects
            .keys()
            .any(|object_path| object_path.starts_with(&folder_prefix))
    }
}

struct StoredObject {
    properties: ObjectProperties,

    data: Vec<u8>,
}


/// Lists stored objects under `prefix_or_directory`.
///
/// On hierarchical services the argument is a directory and parent directories
/// of deeper objects are listed as folders. On flat services the argument is a name prefix,
/// and a non-recursive listing collapses deeper objects into virtual folders.
fn list_stored_objects(
    objects: &BTreeMap<String, StoredObject>,
    prefix_or_directory: &str,
    recursive: bool,
    hierarchical: bool,
) -> BTreeMap<String, ObjectProperties> {
    let prefix = if hierarchical {
        let directory = join_object_path("", prefix_or_directory);

        if directory.is_empty() {
            directory
        } else {
            format!("{directory}/")
        }
    } else {
        prefix_or_directory.to_string()
    };

    let mut listed = BTreeMap::new();

    for (path, object) in objects {
        let Some(remainder) = path.strip_prefix(&prefix) else {
            continue;
        };

        if remainder.is_empty() {
            continue;
        }

        if recursive {
            if hierarchical {
                for (separator_index, _) in remainder.match_indices('/') {
                    listed
                        .entry(format!("{prefix}{}", &remainder[..separator_index]))
                        .or_insert_with(ObjectProperties::folder);
                }
            }

            listed.insert(path.clone(), object.properties.clone());
        } else {
            match remainder.find('/') {
                None => {
                    listed.insert(path.clone(), object.properties.clone());
                }
                Some(separator_index) => {
                    listed
                        .entry(format!("{prefix}{}", &remainder[..separator_index]))
                        .or_insert_with(ObjectProperties::folder);
                }
            }
        }
    }

    listed
}



struct AccountState {
    name: String,

    account_type: AccountType,

    stores: BTreeMap<Location, Mutex<ServiceStore>>,
}

/// An emulated storage account. Clones share the same stores.
#[derive(Clone)]
pub struct MemoryAccount {
    state: Arc<AccountState>,
}

impl MemoryAccount {
    /// Creates an empty account offering the services of `account_type`.
    pub fn new<S>(name: S, account_type: AccountType) -> Self
    where
        S: Into<String>,
    {
        let stores = account_type
            .available_services()
            .iter()
            .map(|location| (*location, Mutex::new(ServiceStore::default())))
            .collect();

        Self {
            state: Arc::new(AccountState {
                name: name.into(),
                account_type,
                stores,
            }),
        }
    }

    /// Returns the concrete service at `location`.
    pub fn service(&self, location: Location) -> Result<MemoryService, BackendError> {
        if !self.state.stores.contains_key(&location) {
            return Err(BackendError::ServiceUnavailable {
                account: self.state.name.clone(),
                service: location,
            });
        }

        Ok(MemoryService {
            account: self.clone(),
            location,
        })
    }
}

impl Debug for MemoryAccount {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAccount")
            .field("name", &self.state.name)
            .field("account_type", &self.state.account_type)
            .finish_non_exhaustive()
    }
}

impl AccountResourceManager for MemoryAccount {
    fn account_name(&self) -> &str {
        &self.state.name
    }

    fn account_type(&self) -> AccountType {
        self.state.account_type
    }

    fn get_service(
        &self,
        location: Location,
    ) -> Result<Arc<dyn ServiceResourceManager>, BackendError> {
        Ok(Arc::new(self.service(location)?))
    }
}



/// One service of a [`MemoryAccount`].
#[derive(Clone, Debug)]
pub struct MemoryService {
    account: MemoryAccount,

    location: Location,
}

impl MemoryService {
    fn lock_store(&self) -> Result<MutexGuard<'_, ServiceStore>, BackendError> {
        let store = self.account.state.stores.get(&self.location).ok_or_else(|| {
            BackendError::ServiceUnavailable {
                account: self.account.state.name.clone(),
                service: self.location,
            }
        })?;

        Ok(store.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl ResourceManager for MemoryService {
    fn location(&self) -> Location {
        self.location
    }

    fn level(&self) -> Level {
        Level::Service
    }

    fn canonical_name(&self) -> String {
        format!("{}/{}", self.account.state.name, self.location)
    }

    fn uri(&self) -> String {
        format!("memory://{}.{}", self.account.state.name, self.location)
    }

    fn parent(&self) -> Option<ManagerHandle> {
        None
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        Some(Arc::new(self.account.clone()))
    }
}

impl ServiceResourceManager for MemoryService {
    fn list_containers(&self) -> Result<Vec<String>, BackendError> {
        Ok(self.lock_store()?.containers.keys().cloned().collect())
    }

    fn get_container(&self, name: &str) -> Arc<dyn ContainerResourceManager> {
        Arc::new(MemoryContainer {
            service: self.clone(),
            name: name.to_string(),
        })
    }
}



/// A container of a [`MemoryService`].
#[derive(Clone, Debug)]
pub struct MemoryContainer {
    service: MemoryService,

    name: String,
}

impl MemoryContainer {
    fn not_found(&self) -> BackendError {
        BackendError::NotFound {
            resource: self.canonical_name(),
        }
    }
}

impl ResourceManager for MemoryContainer {
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
        self.service.account()
    }
}

impl ContainerResourceManager for MemoryContainer {
    fn container_name(&self) -> &str {
        &self.name
    }

    fn create(&self, properties: &ContainerProperties) -> Result<bool, BackendError> {
        let mut store = self.service.lock_store()?;

        match store.containers.entry(self.name.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(entry) => {
                entry.insert(StoredContainer::new(properties.clone()));
                Ok(true)
            }
        }
    }

    fn delete(&self) -> Result<(), BackendError> {
        self.service.lock_store()?.containers.remove(&self.name);

        Ok(())
    }

    fn exists(&self) -> Result<bool, BackendError> {
        Ok(self
            .service
            .lock_store()?
            .containers
            .contains_key(&self.name))
    }

    fn get_properties(&self) -> Result<ContainerProperties, BackendError> {
        let store = self.service.lock_store()?;
        let container = store.containers.get(&self.name).ok_or_else(|| self.not_found())?;

        Ok(container.properties.clone())
    }

    fn set_properties(&self, properties: &ContainerProperties) -> Result<(), BackendError> {
        let mut store = self.service.lock_store()?;
        let container = store
            .containers
            .get_mut(&self.name)
            .ok_or_else(|| self.not_found())?;

        container.properties = properties.clone();

        Ok(())
    }

    fn list_objects(
        &self,
        prefix_or_directory: &str,
        recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
        let store = self.service.lock_store()?;
        let container = store.containers.get(&self.name).ok_or_else(|| self.not_found())?;

        Ok(list_stored_objects(
            &container.objects,
            prefix_or_directory,
            recursive,
            self.service.is_hierarchical(),
        ))
    }

    fn get_object(&self, path: &str, entity_type: EntityType) -> Arc<dyn ObjectResourceManager> {
        Arc::new(MemoryObject {
            container: self.clone(),
            path: join_object_path("", path),
            entity_type,
        })
    }
}



/// An object inside a [`MemoryContainer`].
#[derive(Clone, Debug)]
pub struct MemoryObject {
    container: MemoryContainer,

    path: String,

    entity_type: EntityType,
}

impl MemoryObject {
    fn not_found(&self) -> BackendError {
        BackendError::NotFound {
            resource: self.canonical_name(),
        }
    }

    fn is_container_root(&self) -> bool {
        self.path.is_empty()
    }

    fn is_hierarchical(&self) -> bool {
        self.container.service.is_hierarchical()
    }
}

impl ResourceManager for MemoryObject {
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
        self.container.account()
    }
}

impl ObjectResourceManager for MemoryObject {
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
        body: &dyn ObjectContentContainer,
        properties: &ObjectProperties,
    ) -> Result<(), BackendError> {
        let mut data = Vec::new();
        body.reader()
            .read_to_end(&mut data)
            .map_err(|error| BackendError::Io {
                path: PathBuf::from(self.canonical_name()),
                error,
            })?;

        let mut properties = properties.clone();
        properties.entity_type = self.entity_type;

        if matches!(self.location(), Location::Blob | Location::BlobFs)
            && self.entity_type == EntityType::File
            && properties.blob.blob_type.is_none()
        {
            properties.blob.blob_type = Some(BlobType::BlockBlob);
        }


        let mut store = self.container.service.lock_store()?;
        let container = store
            .containers
            .get_mut(&self.container.name)
            .ok_or_else(|| self.container.not_found())?;

        if self.is_container_root() {
            properties.entity_type = EntityType::Folder;
            container.root_properties = properties;
        } else {
            container
                .objects
                .insert(self.path.clone(), StoredObject { properties, data });
        }

        Ok(())
    }

    fn delete(&self) -> Result<(), BackendError> {
        // The root folder goes away with its container.
        if self.is_container_root() {
            return Ok(());
        }

        let hierarchical = self.is_hierarchical();

        let mut store = self.container.service.lock_store()?;
        let Some(container) = store.containers.get_mut(&self.container.name) else {
            return Ok(());
        };

        let removed = container.objects.remove(&self.path);

        let is_folder = match &removed {
            Some(removed) => removed.properties.entity_type == EntityType::Folder,
            None => true,
        };

        if hierarchical && is_folder {
            let folder_prefix = format!("{}/", self.path);
            container
                .objects
                .retain(|object_path, _| !object_path.starts_with(&folder_prefix));
        }

        Ok(())
    }

    fn exists(&self) -> Result<bool, BackendError> {
        let store = self.container.service.lock_store()?;
        let Some(container) = store.containers.get(&self.container.name) else {
            return Ok(false);
        };

        if self.is_container_root() {
            return Ok(true);
        }

        Ok(container.objects.contains_key(&self.path)
            || (self.is_hierarchical() && container.has_implicit_folder(&self.path)))
    }

    fn get_properties(&self) -> Result<ObjectProperties, BackendError> {
        let store = self.container.service.lock_store()?;
        let container = store
            .containers
            .get(&self.container.name)
            .ok_or_else(|| self.not_found())?;

        if self.is_container_root() {
            return Ok(container.root_properties.clone());
        }

        match container.objects.get(&self.path) {
            Some(object) => Ok(object.properties.clone()),
            None if self.is_hierarchical() && container.has_implicit_folder(&self.path) => {
                Ok(ObjectProperties::folder())
            }
            None => Err(self.not_found()),
        }
    }

    fn set_properties(&self, properties: &ObjectProperties) -> Result<(), BackendError> {
        let mut store = self.container.service.lock_store()?;
        let container = store
            .containers
            .get_mut(&self.container.name)
            .ok_or_else(|| self.not_found())?;

        let stored_properties = if self.is_container_root() {
            &mut container.root_properties
        } else {
            &mut container
                .objects
                .get_mut(&self.path)
                .ok_or_else(|| self.not_found())?
                .properties
        };

        let entity_type = stored_properties.entity_type;
        *stored_properties = properties.clone();
        stored_properties.entity_type = entity_type;

        Ok(())
    }

    fn list_children(
        &self,
        recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
        let store = self.container.service.lock_store()?;
        let container = store
            .containers
            .get(&self.container.name)
            .ok_or_else(|| self.not_found())?;

        let listed = list_stored_objects(&container.objects, &self.path, recursive, true);

        let folder_prefix = if self.is_container_root() {
            String::new()
        } else {
            format!("{}/", self.path)
        };

        Ok(listed
            .into_iter()
            .filter_map(|(path, properties)| {
                path.strip_prefix(&folder_prefix)
                    .map(|relative_path| (relative_path.to_string(), properties))
            })
            .collect())
    }

    fn download(&self) -> Result<Box<dyn ReadSeek>, BackendError> {
        let store = self.container.service.lock_store()?;

        let data = store
            .containers
            .get(&self.container.name)
            .and_then(|container| container.objects.get(&self.path))
            .map(|object| object.data.clone())
            .ok_or_else(|| self.not_found())?;

        Ok(Box::new(Cursor::new(data)))
    }
}



#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;
    use crate::content::BufferedContent;

    fn create_objects(service: &MemoryService, paths: &[&str]) -> Arc<dyn ContainerResourceManager> {
        let container = service.get_container("listing");
        container.create(&ContainerProperties::default()).unwrap();

        for path in paths {
            container
                .get_object(path, EntityType::File)
                .create(&BufferedContent::from_text(*path), &ObjectProperties::default())
                .unwrap();
        }

        container
    }

    #[test]
    fn flat_listing_uses_name_prefixes() {
        let account = MemoryAccount::new("flat", AccountType::Standard);
        let service = account.service(Location::Blob).unwrap();
        let container = create_objects(&service, &["dir/a.txt", "dir/sub/b.txt", "direct.txt"]);

        let recursive = container.list_objects("dir", true).unwrap();
        assert_eq!(
            recursive.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["dir/a.txt", "dir/sub/b.txt", "direct.txt"]
        );

        let single_level = container.list_objects("dir/", false).unwrap();
        assert_eq!(
            single_level.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["dir/a.txt", "dir/sub"]
        );
        assert_eq!(single_level["dir/sub"].entity_type, EntityType::Folder);
    }

    #[test]
    fn hierarchical_listing_uses_directories() {
        let account = MemoryAccount::new("hierarchical", AccountType::Standard);
        let service = account.service(Location::File).unwrap();
        let container = create_objects(&service, &["dir/a.txt", "dir/sub/b.txt", "direct.txt"]);

        let recursive = container.list_objects("dir", true).unwrap();
        assert_eq!(
            recursive.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["dir/a.txt", "dir/sub", "dir/sub/b.txt"]
        );

        let folder = container.get_object("dir", EntityType::Folder);
        assert!(folder.exists().unwrap());

        let children = folder.list_children(false).unwrap();
        assert_eq!(
            children.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["a.txt", "sub"]
        );

        folder.delete().unwrap();
        assert!(!container.get_object("dir/sub/b.txt", EntityType::File).exists().unwrap());
        assert!(container.get_object("direct.txt", EntityType::File).exists().unwrap());
    }

    #[test]
    fn objects_need_an_existing_container() {
        let account = MemoryAccount::new("missing", AccountType::Standard);
        let service = account.service(Location::Blob).unwrap();

        let result = service
            .get_container("never-created")
            .get_object("file.txt", EntityType::File)
            .create(&BufferedContent::from_text("x"), &ObjectProperties::default());

        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[test]
    fn blobs_default_to_block_blobs_and_keep_their_body() {
        let account = MemoryAccount::new("blobs", AccountType::Standard);
        let service = account.service(Location::Blob).unwrap();
        let container = create_objects(&service, &["file.bin"]);

        let object = container.get_object("file.bin", EntityType::File);
        let properties = object.get_properties().unwrap();
        assert_eq!(properties.blob.blob_type, Some(BlobType::BlockBlob));

        let mut downloaded = String::new();
        object
            .download()
            .unwrap()
            .read_to_string(&mut downloaded)
            .unwrap();
        assert_eq!(downloaded, "file.bin");
    }

    /// Declares a huge size but only holds a few bytes.
    #[derive(Debug, Clone)]
    struct OversizedContent;

    impl ObjectContentContainer for OversizedContent {
        fn size(&self) -> u64 {
            u64::MAX
        }

        fn reader(&self) -> Box<dyn ReadSeek + '_> {
            Box::new(Cursor::new(b"tiny".to_vec()))
        }

        fn clone_container(&self) -> Box<dyn ObjectContentContainer> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn object_body_is_buffered_from_its_reader() {
        let account = MemoryAccount::new("oversized", AccountType::Standard);
        let service = account.service(Location::Blob).unwrap();
        let container = create_objects(&service, &[]);

        let object = container.get_object("huge.bin", EntityType::File);
        object
            .create(&OversizedContent, &ObjectProperties::default())
            .unwrap();

        let mut downloaded = Vec::new();
        object
            .download()
            .unwrap()
            .read_to_end(&mut downloaded)
            .unwrap();
        assert_eq!(downloaded, b"tiny");
    }

    #[test]
    fn container_create_reports_whether_it_was_new() {
        let account = MemoryAccount::new("created", AccountType::Standard);
        let container = account.service(Location::Blob).unwrap().get_container("once");

        assert!(container.create(&ContainerProperties::default()).unwrap());
        assert!(!container.create(&ContainerProperties::default()).unwrap());
        assert!(container.exists().unwrap());
    }

    #[test]
    fn services_share_the_account_store() {
        let account = MemoryAccount::new("shared", AccountType::Standard);

        account
            .service(Location::Blob)
            .unwrap()
            .get_container("shared-container")
            .create(&ContainerProperties::default())
            .unwrap();

        let listed = account.service(Location::Blob).unwrap().list_containers().unwrap();
        assert_eq!(listed, vec!["shared-container".to_string()]);

        assert!(account
            .service(Location::File)
            .unwrap()
            .list_containers()
            .unwrap()
            .is_empty());
        assert!(account.service(Location::FileNfs).is_err());
    }
}
