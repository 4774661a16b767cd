//! The local filesystem back-end.
//!
//! A [`LocalService`] is a root directory whose sub-directories are containers.
//! Objects are files or directories at a path relative to their container directory;
//! the empty path is the container directory itself.
//!
//! Metadata, headers and cloud-specific property bags cannot be represented on a
//! local filesystem and are always reported as unset. On Unix, [`NfsProperties::file_mode`]
//! is applied on create and reported on read.
//!
//! [`NfsProperties::file_mode`]: crate::properties::NfsProperties::file_mode

use std::{
    collections::{BTreeMap, VecDeque},
    fs::Metadata,
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use_enabled_fs_module!();

use crate::{
    content::{ObjectContentContainer, ReadSeek},
    error::BackendError,
    level::{EntityType, Level, Location},
    macros::use_enabled_fs_module,
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


fn io_error(path: &Path, error: io::Error) -> BackendError {
    BackendError::Io {
        path: path.to_path_buf(),
        error,
    }
}

/// Maps [`io::ErrorKind::NotFound`] to [`BackendError::NotFound`], and everything else to [`BackendError::Io`].
fn missing_or_io_error(path: &Path, error: io::Error) -> BackendError {
    if error.kind() == io::ErrorKind::NotFound {
        BackendError::NotFound {
            resource: path.display().to_string(),
        }
    } else {
        io_error(path, error)
    }
}


fn object_properties_from_metadata(metadata: &Metadata) -> ObjectProperties {
    let entity_type = if metadata.is_dir() {
        EntityType::Folder
    } else {
        EntityType::File
    };

    let mut properties = ObjectProperties {
        entity_type,
        ..Default::default()
    };

    properties.file.last_write_time = metadata.modified().ok();

    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::fs::PermissionsExt;

            properties.nfs.file_mode = Some(metadata.permissions().mode() & 0o7777);
        }
    }

    properties
}

#[allow(unused_variables)]
fn apply_file_mode(path: &Path, properties: &ObjectProperties) -> Result<(), BackendError> {
    cfg_if::cfg_if! {
        if #[cfg(unix)] {
            use std::os::unix::fs::PermissionsExt;

            if let Some(file_mode) = properties.nfs.file_mode {
                fs::set_permissions(path, std::fs::Permissions::from_mode(file_mode))
                    .map_err(|error| io_error(path, error))?;
            }
        }
    }

    Ok(())
}


/// Lists the contents of `base_directory`, breadth-first.
///
/// Keys are `/`-separated paths relative to `base_directory`.
/// A missing base directory lists as empty.
fn scan_directory(
    base_directory: &Path,
    recursive: bool,
) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
    let mut scanned = BTreeMap::new();

    match base_directory.try_exists() {
        Ok(true) => {}
        Ok(false) => return Ok(scanned),
        Err(error) => return Err(io_error(base_directory, error)),
    }


    struct PendingDirectoryScan {
        path: PathBuf,

        /// Path relative to the base directory, `""` for the base directory itself.
        relative_path: String,
    }

    let mut directory_scan_queue = VecDeque::new();
    directory_scan_queue.push_back(PendingDirectoryScan {
        path: base_directory.to_path_buf(),
        relative_path: String::new(),
    });


    while let Some(next_directory) = directory_scan_queue.pop_front() {
        let directory_entry_iterator = fs::read_dir(&next_directory.path)
            .map_err(|error| io_error(&next_directory.path, error))?;

        for directory_entry in directory_entry_iterator {
            let directory_entry =
                directory_entry.map_err(|error| io_error(&next_directory.path, error))?;

            let entry_path = directory_entry.path();
            let metadata = directory_entry
                .metadata()
                .map_err(|error| io_error(&entry_path, error))?;

            let relative_path = join_object_path(
                &next_directory.relative_path,
                &directory_entry.file_name().to_string_lossy(),
            );

            if recursive && metadata.is_dir() {
                directory_scan_queue.push_back(PendingDirectoryScan {
                    path: entry_path,
                    relative_path: relative_path.clone(),
                });
            }

            scanned.insert(relative_path, object_properties_from_metadata(&metadata));
        }
    }

    Ok(scanned)
}



/// A directory acting as a local storage service.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LocalService {
    root: PathBuf,
}

impl LocalService {
    /// Opens the service rooted at `root`, creating the directory if it does not exist.
    ///
    /// The root is canonicalized (and, with the `dunce` feature, simplified on Windows).
    pub fn open<P>(root: P) -> Result<Self, BackendError>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();

        fs::create_dir_all(root).map_err(|error| io_error(root, error))?;

        let canonical_root = fs::canonicalize(root).map_err(|error| io_error(root, error))?;

        #[cfg(feature = "dunce")]
        let canonical_root = dunce::simplified(&canonical_root).to_path_buf();

        Ok(Self {
            root: canonical_root,
        })
    }

    /// The service's root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ResourceManager for LocalService {
    fn location(&self) -> Location {
        Location::Local
    }

    fn level(&self) -> Level {
        Level::Service
    }

    fn canonical_name(&self) -> String {
        self.root.display().to_string()
    }

    fn uri(&self) -> String {
        self.root.display().to_string()
    }

    fn parent(&self) -> Option<ManagerHandle> {
        None
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        None
    }
}

impl ServiceResourceManager for LocalService {
    fn list_containers(&self) -> Result<Vec<String>, BackendError> {
        let containers = scan_directory(&self.root, false)?
            .into_iter()
            .filter(|(_, properties)| properties.entity_type == EntityType::Folder)
            .map(|(name, _)| name)
            .collect();

        Ok(containers)
    }

    fn get_container(&self, name: &str) -> Arc<dyn ContainerResourceManager> {
        Arc::new(LocalContainer {
            service: self.clone(),
            name: name.to_string(),
        })
    }
}



/// A directory directly inside a [`LocalService`] root.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LocalContainer {
    service: LocalService,

    name: String,
}

impl LocalContainer {
    /// Path of the container directory.
    pub fn path(&self) -> PathBuf {
        self.service.root.join(&self.name)
    }
}

impl ResourceManager for LocalContainer {
    fn location(&self) -> Location {
        Location::Local
    }

    fn level(&self) -> Level {
        Level::Container
    }

    fn canonical_name(&self) -> String {
        format!("{}/{}", self.service.canonical_name(), self.name)
    }

    fn uri(&self) -> String {
        self.path().display().to_string()
    }

    fn parent(&self) -> Option<ManagerHandle> {
        Some(ManagerHandle::Service(Arc::new(self.service.clone())))
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        None
    }
}

impl ContainerResourceManager for LocalContainer {
    fn container_name(&self) -> &str {
        &self.name
    }

    fn create(&self, _properties: &ContainerProperties) -> Result<bool, BackendError> {
        let container_path = self.path();
        let already_existed = self.exists()?;

        fs::create_dir_all(&container_path).map_err(|error| io_error(&container_path, error))?;

        Ok(!already_existed)
    }

    fn delete(&self) -> Result<(), BackendError> {
        let container_path = self.path();

        match fs::remove_dir_all(&container_path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(io_error(&container_path, error)),
        }
    }

    fn exists(&self) -> Result<bool, BackendError> {
        let container_path = self.path();

        let exists = container_path
            .try_exists()
            .map_err(|error| io_error(&container_path, error))?;

        Ok(exists && container_path.is_dir())
    }

    fn get_properties(&self) -> Result<ContainerProperties, BackendError> {
        if !self.exists()? {
            return Err(BackendError::NotFound {
                resource: self.canonical_name(),
            });
        }

        Ok(ContainerProperties::default())
    }

    fn set_properties(&self, _properties: &ContainerProperties) -> Result<(), BackendError> {
        if !self.exists()? {
            return Err(BackendError::NotFound {
                resource: self.canonical_name(),
            });
        }

        Ok(())
    }

    fn list_objects(
        &self,
        prefix_or_directory: &str,
        recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
        let directory = join_object_path("", prefix_or_directory);

        let scanned = scan_directory(&self.path().join(&directory), recursive)?;

        Ok(scanned
            .into_iter()
            .map(|(relative_path, properties)| {
                (join_object_path(&directory, &relative_path), properties)
            })
            .collect())
    }

    fn get_object(&self, path: &str, entity_type: EntityType) -> Arc<dyn ObjectResourceManager> {
        Arc::new(LocalObject {
            container: self.clone(),
            path: join_object_path("", path),
            entity_type,
        })
    }
}



/// A file or directory inside a [`LocalContainer`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct LocalObject {
    container: LocalContainer,

    path: String,

    entity_type: EntityType,
}

impl LocalObject {
    /// Path of the file or directory on disk.
    pub fn path(&self) -> PathBuf {
        if self.path.is_empty() {
            self.container.path()
        } else {
            self.container.path().join(&self.path)
        }
    }

    fn is_container_root(&self) -> bool {
        self.path.is_empty()
    }
}

impl ResourceManager for LocalObject {
    fn location(&self) -> Location {
        Location::Local
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
        self.path().display().to_string()
    }

    fn parent(&self) -> Option<ManagerHandle> {
        Some(ManagerHandle::Container(Arc::new(self.container.clone())))
    }

    fn account(&self) -> Option<Arc<dyn AccountResourceManager>> {
        None
    }
}

impl ObjectResourceManager for LocalObject {
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
        let object_path = self.path();

        if self.is_container_root() || self.entity_type == EntityType::Folder {
            fs::create_dir_all(&object_path).map_err(|error| io_error(&object_path, error))?;

            return apply_file_mode(&object_path, properties);
        }

        if let Some(parent_directory) = object_path.parent() {
            fs::create_dir_all(parent_directory)
                .map_err(|error| io_error(parent_directory, error))?;
        }

        let mut file =
            fs::File::create(&object_path).map_err(|error| io_error(&object_path, error))?;

        io::copy(&mut body.reader(), &mut file).map_err(|error| io_error(&object_path, error))?;

        apply_file_mode(&object_path, properties)
    }

    fn delete(&self) -> Result<(), BackendError> {
        // The root folder goes away with its container.
        if self.is_container_root() {
            return Ok(());
        }

        let object_path = self.path();

        let metadata = match fs::symlink_metadata(&object_path) {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(error) => return Err(io_error(&object_path, error)),
        };

        let removal = if metadata.is_dir() {
            fs::remove_dir_all(&object_path)
        } else {
            fs::remove_file(&object_path)
        };

        removal.map_err(|error| io_error(&object_path, error))
    }

    fn exists(&self) -> Result<bool, BackendError> {
        if self.is_container_root() {
            return self.container.exists();
        }

        let object_path = self.path();

        object_path
            .try_exists()
            .map_err(|error| io_error(&object_path, error))
    }

    fn get_properties(&self) -> Result<ObjectProperties, BackendError> {
        let object_path = self.path();

        let metadata =
            fs::metadata(&object_path).map_err(|error| missing_or_io_error(&object_path, error))?;

        Ok(object_properties_from_metadata(&metadata))
    }

    fn set_properties(&self, properties: &ObjectProperties) -> Result<(), BackendError> {
        if !self.exists()? {
            return Err(BackendError::NotFound {
                resource: self.canonical_name(),
            });
        }

        apply_file_mode(&self.path(), properties)
    }

    fn list_children(
        &self,
        recursive: bool,
    ) -> Result<BTreeMap<String, ObjectProperties>, BackendError> {
        scan_directory(&self.path(), recursive)
    }

    fn download(&self) -> Result<Box<dyn ReadSeek>, BackendError> {
        let object_path = self.path();

        let file =
            fs::File::open(&object_path).map_err(|error| missing_or_io_error(&object_path, error))?;

        Ok(Box::new(file))
    }
}
