//! Kind tags with declared supertypes.
//!
//! Events and event sources are classified by a [`Kind`]. A kind names its
//! parent, so a handler declared for a broad kind also receives events of
//! every kind derived from it. Kinds are declared as statics:
//!
//! ```rust
//! use herald_bus::{Kind, kinds};
//!
//! static ORDER_PLACED: Kind = Kind::derived("order_placed", &kinds::EVENT);
//!
//! assert!(ORDER_PLACED.is_a(&kinds::EVENT));
//! assert!(!kinds::EVENT.is_a(&ORDER_PLACED));
//! ```

use std::fmt;

use serde::{Serialize, Serializer};

/// A type tag with an optional declared supertype.
///
/// Two kinds are equal when their names and parent chains are equal, not
/// when they are the same static. Names must therefore be unique under a
/// given parent: a second `Kind::derived("ping", &kinds::EVENT)` declared
/// elsewhere is the same kind as the first, and `Kind::root("object")` is
/// [`kinds::ANY`](crate::kinds::ANY).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Kind {
    name: &'static str,
    parent: Option<&'static Kind>,
}

impl Kind {
    /// Declare a kind with no supertype.
    #[must_use]
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Declare a kind that is-a `parent`.
    #[must_use]
    pub const fn derived(name: &'static str, parent: &'static Kind) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    /// The kind's own name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The declared supertype, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<&'static Kind> {
        self.parent
    }

    /// Whether this kind is `ancestor` or derives from it.
    ///
    /// The relation is reflexive and follows the declared parent chain.
    #[must_use]
    pub fn is_a(&self, ancestor: &Kind) -> bool {
        self.lineage().any(|kind| kind == ancestor)
    }

    /// Iterate over this kind followed by each of its ancestors.
    pub fn lineage(&self) -> impl Iterator<Item = &Kind> {
        std::iter::successors(Some(self), |kind| kind.parent)
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for kind in self.lineage() {
            list.entry(&kind.name);
        }
        list.finish()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl Serialize for Kind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name)
    }
}
