//! Forwarded header kinds and the trusted header set.
//!
//! # Responsibilities
//! - Map each forwarded header kind to its canonical name and bit
//! - Compose enabled kinds into a `HeaderSet` by OR
//!
//! # Design Decisions
//! - The kind table is static data, never mutated at runtime
//! - `HeaderSet` is a flags newtype so callers never handle raw integers

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// A proxy-supplied header whose value may be trusted.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    Forwarded = 0b00001,
    XForwardedFor = 0b00010,
    XForwardedHost = 0b00100,
    XForwardedProto = 0b01000,
    XForwardedPort = 0b10000,
}

/// Canonical header name per kind, in bit order.
static CANONICAL_NAMES: [(HeaderKind, &str); 5] = [
    (HeaderKind::Forwarded, "forwarded"),
    (HeaderKind::XForwardedFor, "x-forwarded-for"),
    (HeaderKind::XForwardedHost, "x-forwarded-host"),
    (HeaderKind::XForwardedProto, "x-forwarded-proto"),
    (HeaderKind::XForwardedPort, "x-forwarded-port"),
];

impl HeaderKind {
    /// All kinds, in bit order.
    pub const ALL: [HeaderKind; 5] = [
        HeaderKind::Forwarded,
        HeaderKind::XForwardedFor,
        HeaderKind::XForwardedHost,
        HeaderKind::XForwardedProto,
        HeaderKind::XForwardedPort,
    ];

    /// The lowercase header name this kind is read from.
    pub fn canonical_name(self) -> &'static str {
        CANONICAL_NAMES
            .iter()
            .find(|(kind, _)| *kind == self)
            .map(|(_, name)| *name)
            .unwrap_or_default()
    }

    pub fn bit(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for HeaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Set of header kinds a request may take values from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct HeaderSet(u8);

impl HeaderSet {
    pub const EMPTY: HeaderSet = HeaderSet(0);

    pub const ALL: HeaderSet = HeaderSet(0b11111);

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, kind: HeaderKind) -> bool {
        self.0 & kind.bit() != 0
    }

    pub fn insert(&mut self, kind: HeaderKind) {
        self.0 |= kind.bit();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Kinds in the set, in bit order.
    pub fn iter(self) -> impl Iterator<Item = HeaderKind> {
        HeaderKind::ALL.into_iter().filter(move |kind| self.contains(*kind))
    }
}

impl From<HeaderKind> for HeaderSet {
    fn from(kind: HeaderKind) -> Self {
        HeaderSet(kind.bit())
    }
}

impl BitOr for HeaderSet {
    type Output = HeaderSet;

    fn bitor(self, rhs: HeaderSet) -> HeaderSet {
        HeaderSet(self.0 | rhs.0)
    }
}

impl BitOr<HeaderKind> for HeaderSet {
    type Output = HeaderSet;

    fn bitor(self, rhs: HeaderKind) -> HeaderSet {
        HeaderSet(self.0 | rhs.bit())
    }
}

impl BitOrAssign<HeaderKind> for HeaderSet {
    fn bitor_assign(&mut self, rhs: HeaderKind) {
        self.insert(rhs);
    }
}

impl FromIterator<HeaderKind> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = HeaderKind>>(iter: I) -> Self {
        iter.into_iter().fold(HeaderSet::EMPTY, |set, kind| set | kind)
    }
}

// Serialized as the list of canonical header names.
impl Serialize for HeaderSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(None)?;
        for kind in self.iter() {
            seq.serialize_element(kind.canonical_name())?;
        }
        seq.end()
    }
}
