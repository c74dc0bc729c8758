//! Typed ID wrappers providing compile-time safety for segment and part ids.
//!
//! Each ID type is a newtype over `u64`, preventing accidental misuse
//! (e.g., passing a `PartId` where a `SegmentId` is expected). Ids are
//! assigned in production order and only ever grow.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generate a newtype ID wrapper over `u64`.
///
/// The macro produces a struct with:
/// - `new(u64)` and `get()` accessors
/// - `next()` returning the id that follows this one
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `PartialOrd`, `Ord`, `Hash`,
///   `Default`, `Serialize`, `Deserialize`
/// - `Display` and `FromStr` delegating to the inner integer
/// - `From<u64>` and `Into<u64>` conversions
macro_rules! typed_id {
    ($($(#[doc = $doc:expr])* $name:ident),+ $(,)?) => {
        $(
            $(#[doc = $doc])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
                Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(u64);

            impl $name {
                /// Wrap a raw id value.
                #[must_use]
                pub const fn new(value: u64) -> Self {
                    Self(value)
                }

                /// Return the inner value.
                #[must_use]
                pub const fn get(self) -> u64 {
                    self.0
                }

                /// The id assigned right after this one.
                #[must_use]
                pub const fn next(self) -> Self {
                    Self(self.0 + 1)
                }
            }

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    write!(f, "{}", self.0)
                }
            }

            impl FromStr for $name {
                type Err = std::num::ParseIntError;

                fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                    s.parse::<u64>().map(Self)
                }
            }

            impl From<u64> for $name {
                fn from(value: u64) -> Self {
                    Self(value)
                }
            }

            impl From<$name> for u64 {
                fn from(id: $name) -> Self {
                    id.0
                }
            }
        )+
    };
}

typed_id! {
    /// Identifier of a finalized media segment (doubles as its `_HLS_msn`).
    SegmentId,
    /// Identifier of a partial segment, unique across the whole stream.
    PartId,
}
