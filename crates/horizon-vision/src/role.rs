//! Enhancement roles and event contexts.
//!
//! A [`Role`] is one of the three enhancement capabilities a provider can
//! offer. A [`Context`] names the semantic source of a position update. Both
//! are closed sets, so [`RoleSet`] and [`ContextSet`] are small bit sets.

use std::fmt;
use std::ops::{BitAnd, BitOr, Sub};
use std::str::FromStr;

use crate::error::VisionError;

/// An enhancement capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Magnifies the full screen or a part of it.
    Magnifier,
    /// Highlights important areas of the screen (focus, caret, review position).
    Highlighter,
    /// Changes the color presentation of the screen.
    ColorEnhancer,
}

impl Role {
    /// Every role, in table order.
    pub const ALL: [Role; 3] = [Role::Magnifier, Role::Highlighter, Role::ColorEnhancer];

    /// Configuration key of this role.
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::Magnifier => "magnifier",
            Role::Highlighter => "highlighter",
            Role::ColorEnhancer => "colorEnhancer",
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| VisionError::InvalidArgument(format!("unknown role '{s}'")))
    }
}

/// The semantic source of a position update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Context {
    /// No particular source.
    #[default]
    Undetermined,
    /// The focused object.
    Focus,
    /// The foreground object.
    Foreground,
    /// The system caret.
    Caret,
    /// The review cursor.
    Review,
    /// The navigator object.
    Navigator,
    /// The mouse pointer.
    Mouse,
}

impl Context {
    /// Every context, in declaration order.
    pub const ALL: [Context; 7] = [
        Context::Undetermined,
        Context::Focus,
        Context::Foreground,
        Context::Caret,
        Context::Review,
        Context::Navigator,
        Context::Mouse,
    ];

    /// Lower-case name of this context.
    pub const fn as_str(self) -> &'static str {
        match self {
            Context::Undetermined => "undetermined",
            Context::Focus => "focus",
            Context::Foreground => "foreground",
            Context::Caret => "caret",
            Context::Review => "review",
            Context::Navigator => "navigator",
            Context::Mouse => "mouse",
        }
    }

    /// Whether this context follows the review cursor.
    #[inline]
    pub const fn is_review(self) -> bool {
        matches!(self, Context::Review | Context::Navigator)
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Generates a copyable bit set over a closed enum with `ALL` and `index()`.
macro_rules! enum_bit_set {
    ($(#[$meta:meta])* $name:ident, $item:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name(u8);

        impl $name {
            /// The empty set.
            pub const EMPTY: Self = Self(0);

            /// A set containing every member.
            pub const ALL: Self = Self((1u8 << $item::ALL.len()) - 1);

            /// A set with a single member.
            #[inline]
            pub const fn single(item: $item) -> Self {
                Self(1 << item.index())
            }

            /// Whether `item` is a member.
            #[inline]
            pub const fn contains(self, item: $item) -> bool {
                self.0 & (1 << item.index()) != 0
            }

            /// Add `item`. Returns `true` if it was not already present.
            #[inline]
            pub fn insert(&mut self, item: $item) -> bool {
                let added = !self.contains(item);
                self.0 |= 1 << item.index();
                added
            }

            /// Remove `item`. Returns `true` if it was present.
            #[inline]
            pub fn remove(&mut self, item: $item) -> bool {
                let removed = self.contains(item);
                self.0 &= !(1 << item.index());
                removed
            }

            /// Whether the set has no members.
            #[inline]
            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            /// Number of members.
            #[inline]
            pub const fn len(self) -> usize {
                self.0.count_ones() as usize
            }

            /// Members of both sets.
            #[inline]
            pub const fn intersection(self, other: Self) -> Self {
                Self(self.0 & other.0)
            }

            /// Members of either set.
            #[inline]
            pub const fn union(self, other: Self) -> Self {
                Self(self.0 | other.0)
            }

            /// Members of `self` not in `other`.
            #[inline]
            pub const fn difference(self, other: Self) -> Self {
                Self(self.0 & !other.0)
            }

            /// Whether every member of `self` is in `other`.
            #[inline]
            pub const fn is_subset(self, other: Self) -> bool {
                self.0 & !other.0 == 0
            }

            /// Iterate members in declaration order.
            pub fn iter(self) -> impl Iterator<Item = $item> {
                $item::ALL.into_iter().filter(move |item| self.contains(*item))
            }
        }

        impl From<$item> for $name {
            fn from(item: $item) -> Self {
                Self::single(item)
            }
        }

        impl FromIterator<$item> for $name {
            fn from_iter<I: IntoIterator<Item = $item>>(iter: I) -> Self {
                let mut set = Self::EMPTY;
                for item in iter {
                    set.insert(item);
                }
                set
            }
        }

        impl<const N: usize> From<[$item; N]> for $name {
            fn from(items: [$item; N]) -> Self {
                items.into_iter().collect()
            }
        }

        impl BitOr for $name {
            type Output = Self;

            fn bitor(self, rhs: Self) -> Self {
                self.union(rhs)
            }
        }

        impl BitAnd for $name {
            type Output = Self;

            fn bitand(self, rhs: Self) -> Self {
                self.intersection(rhs)
            }
        }

        impl Sub for $name {
            type Output = Self;

            fn sub(self, rhs: Self) -> Self {
                self.difference(rhs)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }
    };
}

enum_bit_set!(
    /// A set of [`Role`]s.
    RoleSet,
    Role
);

enum_bit_set!(
    /// A set of [`Context`]s.
    ContextSet,
    Context
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!("COLORENHANCER".parse::<Role>().unwrap(), Role::ColorEnhancer);
        assert!("caret".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_set_operations() {
        let mut set = RoleSet::EMPTY;
        assert!(set.is_empty());
        assert!(set.insert(Role::Highlighter));
        assert!(!set.insert(Role::Highlighter));
        assert_eq!(set.len(), 1);

        let both = RoleSet::from([Role::Magnifier, Role::Highlighter]);
        assert_eq!(both & set, set);
        assert_eq!(both - set, RoleSet::single(Role::Magnifier));
        assert_eq!(both | RoleSet::single(Role::ColorEnhancer), RoleSet::ALL);
        assert!(set.is_subset(both));
        assert!(!both.is_subset(set));

        assert!(set.remove(Role::Highlighter));
        assert!(!set.remove(Role::Highlighter));
        assert!(set.is_empty());
    }

    #[test]
    fn test_role_set_iterates_in_order() {
        let set = RoleSet::from([Role::ColorEnhancer, Role::Magnifier]);
        assert_eq!(
            set.iter().collect::<Vec<_>>(),
            vec![Role::Magnifier, Role::ColorEnhancer]
        );
        assert_eq!(format!("{set:?}"), "{Magnifier, ColorEnhancer}");
    }

    #[test]
    fn test_context_set() {
        let set = ContextSet::from([Context::Focus, Context::Navigator, Context::Caret]);
        assert_eq!(set.len(), 3);
        assert!(set.contains(Context::Caret));
        assert!(!set.contains(Context::Review));
        assert_eq!(ContextSet::ALL.len(), Context::ALL.len());
    }

    #[test]
    fn test_review_contexts() {
        assert!(Context::Review.is_review());
        assert!(Context::Navigator.is_review());
        assert!(!Context::Caret.is_review());
    }
}
