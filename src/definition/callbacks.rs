use std::collections::BTreeMap;

use super::ResourceDefinition;
use crate::{context::ScenarioContext, error::HarnessError, level::Level, manager::ManagerHandle};


/// Tells [`ResourceDefinition::apply_definition`] whether to descend into children.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Traversal {
    /// Continue with the definition's children.
    Continue,

    /// Do not visit the definition's children (e.g. the resource should not exist).
    SkipChildren,
}


type LevelCallback<'a> = Box<
    dyn FnMut(&mut ScenarioContext, &ManagerHandle, &ResourceDefinition) -> Result<Traversal, HarnessError>
        + 'a,
>;


/// A table of per-level callbacks driven by [`ResourceDefinition::apply_definition`].
///
/// At most one callback is registered per [`Level`]. Levels without a callback
/// are traversed without doing anything at that level.
///
/// # Example
/// ```
/// # use resource_harness::definition::{LevelCallbacks, Traversal};
/// # use resource_harness::level::Level;
/// let mut visited_objects = 0;
///
/// let callbacks = LevelCallbacks::new().on(Level::Object, |_, _, _| {
///     visited_objects += 1;
///     Ok(Traversal::Continue)
/// });
/// # drop(callbacks);
/// ```
#[derive(Default)]
pub struct LevelCallbacks<'a> {
    callbacks: BTreeMap<Level, LevelCallback<'a>>,
}

impl<'a> LevelCallbacks<'a> {
    /// An empty callback table.
    pub fn new() -> Self {
        Self {
            callbacks: BTreeMap::new(),
        }
    }

    /// Registers `callback` for `level`, replacing any previous callback for that level.
    pub fn on<F>(mut self, level: Level, callback: F) -> Self
    where
        F: FnMut(&mut ScenarioContext, &ManagerHandle, &ResourceDefinition) -> Result<Traversal, HarnessError>
            + 'a,
    {
        self.callbacks.insert(level, Box::new(callback));
        self
    }

    /// Runs the callback registered for the definition's level, if any.
    pub(crate) fn invoke(
        &mut self,
        context: &mut ScenarioContext,
        manager: &ManagerHandle,
        definition: &ResourceDefinition,
    ) -> Result<Traversal, HarnessError> {
        match self.callbacks.get_mut(&definition.definition_target()) {
            Some(callback) => callback(context, manager, definition),
            None => Ok(Traversal::Continue),
        }
    }
}

impl std::fmt::Debug for LevelCallbacks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.callbacks.keys()).finish()
    }
}
