//! Property bags of container- and object-level resources.
//!
//! Every optional field follows the same convention:
//! in a definition, `None` means "unspecified, don't check";
//! when returned by a manager, `None` means "not supported by this back-end".

use std::{collections::BTreeMap, time::SystemTime};

use crate::level::EntityType;


/// User-defined key-value metadata.
pub type Metadata = BTreeMap<String, String>;

/// Blob index tags.
pub type Tags = BTreeMap<String, String>;



/// Properties of a container (blob container, file share, or local directory).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ContainerProperties {
    /// Container metadata.
    pub metadata: Option<Metadata>,

    /// Properties of blob and BlobFs containers (they are the same resource).
    pub blob: BlobContainerProperties,

    /// Properties of SMB and NFS file shares.
    pub file: FileContainerProperties,
}

/// Public access level of a blob container.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum PublicAccessType {
    /// Anonymous read access to blobs.
    Blob,

    /// Anonymous read access to blobs and container listings.
    Container,
}

/// Blob container property bag.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BlobContainerProperties {
    pub access: Option<PublicAccessType>,
}

/// Access tier of a file share.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShareAccessTier {
    TransactionOptimized,
    Hot,
    Cool,
    Premium,
}

/// Root squash setting of an NFS share.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum RootSquash {
    NoRootSquash,
    RootSquash,
    AllSquash,
}

/// File share property bag.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FileContainerProperties {
    pub access_tier: Option<ShareAccessTier>,

    /// Enabled protocols, e.g. `"SMB"` or `"NFS"`.
    pub enabled_protocols: Option<String>,

    /// Quota in GiB.
    pub quota: Option<i32>,

    pub root_squash: Option<RootSquash>,
}



/// Properties of an object (file or folder).
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ObjectProperties {
    /// Whether the object is a file or a folder. Defaults to a file.
    pub entity_type: EntityType,

    pub http_headers: ContentHeaders,

    pub metadata: Option<Metadata>,

    pub blob: BlobProperties,

    pub blob_fs: BlobFsProperties,

    pub file: FileProperties,

    pub nfs: NfsProperties,
}

impl ObjectProperties {
    /// Properties of a folder, with nothing else specified.
    pub fn folder() -> Self {
        Self {
            entity_type: EntityType::Folder,
            ..Default::default()
        }
    }
}

/// Standard HTTP content headers.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct ContentHeaders {
    pub cache_control: Option<String>,
    pub content_disposition: Option<String>,
    pub content_encoding: Option<String>,
    pub content_language: Option<String>,
    pub content_type: Option<String>,
}

/// Type of a blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum BlobType {
    BlockBlob,
    PageBlob,
    AppendBlob,
}

/// Access tier of a block blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AccessTier {
    Hot,
    Cool,
    Cold,
    Archive,
}

/// Blob property bag.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BlobProperties {
    pub blob_type: Option<BlobType>,

    pub tags: Option<Tags>,

    pub block_blob_access_tier: Option<AccessTier>,

    /// Premium page blob tier, e.g. `"P10"`.
    pub page_blob_access_tier: Option<String>,
}

/// BlobFs (Data Lake) property bag.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct BlobFsProperties {
    /// POSIX permissions in symbolic form, e.g. `"rwxr-x---"`.
    pub permissions: Option<String>,
    pub owner: Option<String>,
    pub group: Option<String>,
    pub acl: Option<String>,
}

/// SMB file property bag.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct FileProperties {
    pub attributes: Option<String>,
    pub change_time: Option<SystemTime>,
    pub creation_time: Option<SystemTime>,
    pub last_write_time: Option<SystemTime>,

    /// Security descriptor in SDDL form.
    pub permissions: Option<String>,
}

/// NFS file property bag.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct NfsProperties {
    pub owner: Option<String>,
    pub group: Option<String>,

    /// Permission bits, e.g. `0o644`.
    pub file_mode: Option<u32>,
}
