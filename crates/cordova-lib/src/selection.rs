//! Platform selection.
//!
//! Callers may ask for nothing (build everything), one platform, or an ordered
//! list. [`PlatformSelection::resolve`] turns all three shapes into one validated,
//! ordered, duplicate-free list, so the dispatcher never branches on input shape.

use crate::registry::PlatformRegistry;
use crate::types::{BuildError, PlatformName};

/// Platform names as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PlatformSelectionInput {
    /// Every registered platform, in registration order.
    #[default]
    All,
    One(String),
    Many(Vec<String>),
}

impl From<&str> for PlatformSelectionInput {
    fn from(name: &str) -> Self {
        PlatformSelectionInput::One(name.to_string())
    }
}

impl From<String> for PlatformSelectionInput {
    fn from(name: String) -> Self {
        PlatformSelectionInput::One(name)
    }
}

impl From<Vec<String>> for PlatformSelectionInput {
    fn from(names: Vec<String>) -> Self {
        PlatformSelectionInput::Many(names)
    }
}

impl From<&[&str]> for PlatformSelectionInput {
    fn from(names: &[&str]) -> Self {
        PlatformSelectionInput::Many(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<T: Into<PlatformSelectionInput>> From<Option<T>> for PlatformSelectionInput {
    fn from(input: Option<T>) -> Self {
        input.map_or(PlatformSelectionInput::All, Into::into)
    }
}

/// Resolved, validated platforms for one build invocation.
///
/// Never empty, every entry is registered, and order is significant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformSelection(Vec<PlatformName>);

impl PlatformSelection {
    /// Validates `input` against the registry.
    ///
    /// An empty [`PlatformSelectionInput::Many`] is treated like
    /// [`PlatformSelectionInput::All`]. Explicit lists keep the first occurrence
    /// of each name. The first unregistered name fails the whole selection.
    pub fn resolve(
        input: &PlatformSelectionInput,
        registry: &PlatformRegistry,
    ) -> Result<Self, BuildError> {
        let names: &[String] = match input {
            PlatformSelectionInput::One(name) => std::slice::from_ref(name),
            PlatformSelectionInput::Many(names) if !names.is_empty() => names,
            PlatformSelectionInput::All | PlatformSelectionInput::Many(_) => {
                return Ok(Self(
                    registry.list_registered().iter().map(|r| r.platform).collect(),
                ));
            }
        };

        let mut platforms = Vec::with_capacity(names.len());
        for name in names {
            let platform = registry.lookup(name)?;
            if !platforms.contains(&platform) {
                platforms.push(platform);
            }
        }
        Ok(Self(platforms))
    }

    pub fn platforms(&self) -> &[PlatformName] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a PlatformSelection {
    type Item = &'a PlatformName;
    type IntoIter = std::slice::Iter<'a, PlatformName>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
