//! Mappings of one or many named object definitions.
//!
//! However a mapping is built (flat, as a folder tree, as a single object, ...),
//! [`ObjectResourceMapping::flatten`] normalizes it into one canonical
//! `path -> definition` table, so the rest of the crate never branches on the shape.

use std::collections::BTreeMap;

use crate::{definition::ObjectDefinition, level::EntityType};


/// One or many object definitions, keyed by path.
///
/// The empty path `""` denotes the folder (or container) the mapping is rooted at.
#[derive(Clone, PartialEq, Debug)]
pub enum ObjectResourceMapping {
    /// Already flat: relative path to definition.
    Flat(BTreeMap<String, ObjectDefinition>),

    /// A folder with its own properties and named child mappings.
    ///
    /// Flattens to `{"": properties}` plus every child entry, prefixed by the child's name.
    Folder {
        /// The folder's own definition. Flattening marks it as a [`EntityType::Folder`].
        properties: ObjectDefinition,

        /// Child mappings, keyed by their name inside the folder.
        children: BTreeMap<String, ObjectResourceMapping>,
    },

    /// Exactly one object, which flattens to `{"": definition}`.
    Single(ObjectDefinition),

    /// Places every entry of `mapping` under the folder `folder_name`.
    ParentFolder {
        folder_name: String,
        mapping: Box<ObjectResourceMapping>,
    },

    /// Entries of `overlay` replace entries of `base` with the same path.
    Overlay {
        base: Box<ObjectResourceMapping>,
        overlay: Box<ObjectResourceMapping>,
    },
}

impl Default for ObjectResourceMapping {
    fn default() -> Self {
        ObjectResourceMapping::Flat(BTreeMap::new())
    }
}

impl ObjectResourceMapping {
    /// A flat mapping built from `(path, definition)` pairs.
    pub fn flat<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, ObjectDefinition)>,
        K: Into<String>,
    {
        ObjectResourceMapping::Flat(
            entries
                .into_iter()
                .map(|(path, definition)| (path.into(), definition))
                .collect(),
        )
    }

    /// A folder mapping built from the folder's own definition and `(name, mapping)` pairs.
    pub fn folder<I, K>(properties: ObjectDefinition, children: I) -> Self
    where
        I: IntoIterator<Item = (K, ObjectResourceMapping)>,
        K: Into<String>,
    {
        ObjectResourceMapping::Folder {
            properties,
            children: children
                .into_iter()
                .map(|(name, child)| (name.into(), child))
                .collect(),
        }
    }

    /// A mapping of exactly one object.
    pub fn single(definition: ObjectDefinition) -> Self {
        ObjectResourceMapping::Single(definition)
    }

    /// Places this mapping under the folder `folder_name`.
    pub fn under_folder<S>(self, folder_name: S) -> Self
    where
        S: Into<String>,
    {
        ObjectResourceMapping::ParentFolder {
            folder_name: folder_name.into(),
            mapping: Box::new(self),
        }
    }

    /// Overlays `overlay` on top of this mapping.
    pub fn overlaid_with(self, overlay: ObjectResourceMapping) -> Self {
        ObjectResourceMapping::Overlay {
            base: Box::new(self),
            overlay: Box::new(overlay),
        }
    }

    /// Normalizes the mapping into a `path -> definition` table.
    ///
    /// Paths are joined like POSIX paths (see [`join_object_path`]).
    /// Flattening is associative: flattening nested folders gives the same table
    /// as flattening each child and prefixing its keys with the child's name.
    pub fn flatten(&self) -> BTreeMap<String, ObjectDefinition> {
        match self {
            ObjectResourceMapping::Flat(entries) => entries.clone(),
            ObjectResourceMapping::Single(definition) => {
                BTreeMap::from([(String::new(), definition.clone())])
            }
            ObjectResourceMapping::Folder {
                properties,
                children,
            } => {
                let mut own_definition = properties.clone();
                own_definition.properties.entity_type = EntityType::Folder;

                let mut flattened = BTreeMap::from([(String::new(), own_definition)]);

                for (child_name, child) in children {
                    flattened.extend(prefix_entries(child_name, child.flatten()));
                }

                flattened
            }
            ObjectResourceMapping::ParentFolder {
                folder_name,
                mapping,
            } => prefix_entries(folder_name, mapping.flatten()).collect(),
            ObjectResourceMapping::Overlay { base, overlay } => {
                let mut flattened = base.flatten();
                flattened.extend(overlay.flatten());

                flattened
            }
        }
    }
}

fn prefix_entries<'p>(
    prefix: &'p str,
    entries: BTreeMap<String, ObjectDefinition>,
) -> impl Iterator<Item = (String, ObjectDefinition)> + 'p {
    entries
        .into_iter()
        .map(move |(path, definition)| (join_object_path(prefix, &path), definition))
}


/// Joins two object paths like POSIX `path.join` followed by cleaning.
///
/// Empty and `.` segments are dropped, `..` removes the previous segment,
/// and the result never has leading or trailing slashes.
/// Joining anything with `""` yields the other side unchanged (cleaned).
pub fn join_object_path(parent: &str, child: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in parent.split('/').chain(child.split('/')) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            segment => segments.push(segment),
        }
    }

    segments.join("/")
}



#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_like_posix_paths() {
        assert_eq!(join_object_path("a", "b"), "a/b");
        assert_eq!(join_object_path("a/", "/b/"), "a/b");
        assert_eq!(join_object_path("x", ""), "x");
        assert_eq!(join_object_path("", "b/c"), "b/c");
        assert_eq!(join_object_path("", ""), "");
        assert_eq!(join_object_path("a//b", "./c"), "a/b/c");
        assert_eq!(join_object_path("a/b", "../c"), "a/c");
    }

    #[test]
    fn single_flattens_to_the_empty_path() {
        let flattened = ObjectResourceMapping::single(ObjectDefinition::named("ignored")).flatten();

        assert_eq!(flattened.len(), 1);
        assert!(flattened.contains_key(""));
    }

    #[test]
    fn overlay_replaces_base_entries() {
        let base = ObjectResourceMapping::flat([
            ("a", ObjectDefinition::default()),
            ("b", ObjectDefinition::default()),
        ]);
        let overlay = ObjectResourceMapping::flat([("b", ObjectDefinition::folder())]);

        let flattened = base.overlaid_with(overlay).flatten();

        assert_eq!(flattened.len(), 2);
        assert_eq!(flattened["a"].properties.entity_type, EntityType::File);
        assert_eq!(flattened["b"].properties.entity_type, EntityType::Folder);
    }

    #[test]
    fn parent_folder_prefixes_every_entry() {
        let mapping = ObjectResourceMapping::flat([
            ("", ObjectDefinition::folder()),
            ("file.txt", ObjectDefinition::default()),
        ])
        .under_folder("source");

        let paths: Vec<String> = mapping.flatten().into_keys().collect();

        assert_eq!(paths, vec!["source".to_string(), "source/file.txt".to_string()]);
    }
}
