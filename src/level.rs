use std::fmt::{self, Display, Formatter};


/// A position in the storage hierarchy.
///
/// Levels are totally ordered: `Service < Container < Object`.
/// A manager is "too shallow" for a definition when its level is smaller
/// than the definition's target level.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Level {
    /// A storage service of an account (e.g. the blob endpoint), or a local root directory.
    Service,

    /// A container, share or filesystem (or a directory directly under a local root).
    Container,

    /// A single file or folder inside a container.
    Object,
}

impl Level {
    /// All levels, from the shallowest to the deepest.
    pub const ALL: [Level; 3] = [Level::Service, Level::Container, Level::Object];

    /// Returns the level directly above this one, or `None` for [`Level::Service`].
    pub fn parent(self) -> Option<Level> {
        match self {
            Level::Service => None,
            Level::Container => Some(Level::Service),
            Level::Object => Some(Level::Container),
        }
    }

    /// Returns the level directly below this one, or `None` for [`Level::Object`].
    pub fn child(self) -> Option<Level> {
        match self {
            Level::Service => Some(Level::Container),
            Level::Container => Some(Level::Object),
            Level::Object => None,
        }
    }
}

impl Display for Level {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Level::Service => f.write_str("service"),
            Level::Container => f.write_str("container"),
            Level::Object => f.write_str("object"),
        }
    }
}



/// The storage back-end a resource lives on.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Location {
    /// The local filesystem.
    Local,

    /// Blob storage (flat namespace).
    Blob,

    /// SMB file shares.
    File,

    /// NFS file shares.
    FileNfs,

    /// Data Lake storage (blob storage with a hierarchical namespace).
    BlobFs,
}

impl Location {
    /// Whether the location is a remote (cloud) service.
    pub fn is_remote(self) -> bool {
        !matches!(self, Location::Local)
    }

    /// Whether the location has real directories
    /// (as opposed to a flat namespace where folders are only name prefixes).
    pub fn is_hierarchical(self) -> bool {
        !matches!(self, Location::Blob)
    }
}

impl Display for Location {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Location::Local => f.write_str("local"),
            Location::Blob => f.write_str("blob"),
            Location::File => f.write_str("file"),
            Location::FileNfs => f.write_str("file-nfs"),
            Location::BlobFs => f.write_str("blobfs"),
        }
    }
}



/// The kind of entity an object-level resource is.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum EntityType {
    /// A regular file with a body.
    #[default]
    File,

    /// A folder (a real directory, or a directory stub on flat services).
    Folder,
}

impl Display for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            EntityType::File => f.write_str("file"),
            EntityType::Folder => f.write_str("folder"),
        }
    }
}



/// The kind of storage account, which decides the services it offers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum AccountType {
    /// General-purpose account.
    #[default]
    Standard,

    /// Premium account for block blobs.
    PremiumBlockBlobs,

    /// Premium account for page blobs.
    PremiumPageBlobs,

    /// Premium account for file shares (SMB and NFS).
    PremiumFileShares,

    /// General-purpose account with a hierarchical namespace.
    HierarchicalNamespaceEnabled,
}

impl AccountType {
    /// The service locations an account of this type exposes.
    pub fn available_services(self) -> &'static [Location] {
        match self {
            AccountType::Standard => &[Location::Blob, Location::File, Location::BlobFs],
            AccountType::PremiumBlockBlobs => &[Location::Blob, Location::BlobFs],
            AccountType::PremiumPageBlobs => &[Location::Blob],
            AccountType::PremiumFileShares => &[Location::File, Location::FileNfs],
            AccountType::HierarchicalNamespaceEnabled => {
                &[Location::Blob, Location::File, Location::BlobFs]
            }
        }
    }

    /// Whether an account of this type exposes `location`.
    pub fn offers(self, location: Location) -> bool {
        self.available_services().contains(&location)
    }
}

impl Display for AccountType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Standard => f.write_str("standard"),
            AccountType::PremiumBlockBlobs => f.write_str("premium-block-blobs"),
            AccountType::PremiumPageBlobs => f.write_str("premium-page-blobs"),
            AccountType::PremiumFileShares => f.write_str("premium-file-shares"),
            AccountType::HierarchicalNamespaceEnabled => f.write_str("hierarchical-namespace"),
        }
    }
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_from_service_to_object() {
        assert!(Level::Service < Level::Container);
        assert!(Level::Container < Level::Object);

        let mut shuffled = vec![Level::Object, Level::Service, Level::Container];
        shuffled.sort();

        assert_eq!(shuffled, Level::ALL);
    }

    #[test]
    fn parent_and_child_are_inverse() {
        for level in Level::ALL {
            if let Some(parent) = level.parent() {
                assert_eq!(parent.child(), Some(level));
            }

            if let Some(child) = level.child() {
                assert_eq!(child.parent(), Some(level));
            }
        }

        assert_eq!(Level::Service.parent(), None);
        assert_eq!(Level::Object.child(), None);
    }

    #[test]
    fn premium_file_accounts_only_offer_shares() {
        assert!(AccountType::PremiumFileShares.offers(Location::FileNfs));
        assert!(!AccountType::PremiumFileShares.offers(Location::Blob));
        assert!(!AccountType::Standard.offers(Location::Local));
    }
}
