//! Built-in kinds.

use crate::kind::Kind;

/// Root of the built-in kinds. Bindings without a source constraint accept
/// sources of any kind, including ones declared with [`Kind::root`].
pub static ANY: Kind = Kind::root("object");

/// Root of every event kind. Handlers may only bind kinds derived from it.
pub static EVENT: Kind = Kind::derived("event", &ANY);

/// A committed change of a named value.
pub static PROPERTY_CHANGE: Kind = Kind::derived("property_change", &EVENT);

/// A committed change of one slot of an indexed value.
pub static INDEXED_PROPERTY_CHANGE: Kind =
    Kind::derived("indexed_property_change", &PROPERTY_CHANGE);

/// A proposed change of a named value, which handlers may veto.
pub static VETOABLE_PROPERTY_CHANGE: Kind = Kind::derived("vetoable_property_change", &EVENT);

/// A proposed change of one slot of an indexed value.
pub static VETOABLE_INDEXED_PROPERTY_CHANGE: Kind =
    Kind::derived("vetoable_indexed_property_change", &EVENT);

/// A committed insertion into or removal from a list value.
pub static LIST_CHANGE: Kind = Kind::derived("list_change", &EVENT);

/// A proposed insertion into or removal from a list value.
pub static VETOABLE_LIST_CHANGE: Kind = Kind::derived("vetoable_list_change", &EVENT);

/// A committed insertion into or removal from a set value.
pub static SET_CHANGE: Kind = Kind::derived("set_change", &EVENT);

/// A proposed insertion into or removal from a set value.
pub static VETOABLE_SET_CHANGE: Kind = Kind::derived("vetoable_set_change", &EVENT);
