use serde::{Deserialize, Serialize};

/// Nullness lattice: `NonNull < Unspecified < Nullable`.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Nullness {
    NonNull,
    #[default]
    Unspecified,
    Nullable,
}

impl Nullness {
    #[must_use]
    pub fn join(self, other: Nullness) -> Nullness {
        self.max(other)
    }
}

/// Orthogonal, lattice-valued attributes carried by a nominal type.
///
/// Attributes never participate in type equality; they are combined with
/// [`TypeAttrs::union`] when two types meet (for example in a least upper bound).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeAttrs {
    #[serde(default)]
    pub nullness: Nullness,
}

impl TypeAttrs {
    pub const NON_NULL: TypeAttrs = TypeAttrs {
        nullness: Nullness::NonNull,
    };
    pub const NULLABLE: TypeAttrs = TypeAttrs {
        nullness: Nullness::Nullable,
    };

    #[must_use]
    pub fn union(self, other: TypeAttrs) -> TypeAttrs {
        TypeAttrs {
            nullness: self.nullness.join(other.nullness),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == TypeAttrs::default()
    }
}
