//! Rank ladder identifiers.
//!
//! The ladder is the ordered sequence `A, B, ..., Z, FREE`. A [`RankId`]
//! stores the ladder index (`A..Z` map to `0..25`, `FREE` to `26`), so
//! ordering comparisons are index comparisons and "next rank" is a simple
//! increment. Parsing rejects anything outside the ladder; a string that
//! fails to parse can therefore never compare as higher-or-equal to a valid
//! rank, which is the access-gating primitive zones rely on.

use serde::{Deserialize, Serialize};

/// Display names for every ladder position, in index order.
const LADDER_NAMES: [&str; 27] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L", "M", "N", "O", "P", "Q", "R", "S",
    "T", "U", "V", "W", "X", "Y", "Z", "FREE",
];

/// A position on the rank ladder.
///
/// Ordering derives from the ladder index, so `RankId::parse("B") >
/// RankId::parse("A")` and `FREE` is the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RankId(u8);

impl RankId {
    /// The first rank on the ladder ("A"), the default for new players.
    pub const FIRST: Self = Self(0);

    /// The terminal rank ("FREE").
    pub const FREE: Self = Self(26);

    /// Total number of ladder positions, including "FREE".
    pub const LADDER_LEN: usize = LADDER_NAMES.len();

    /// Parse a rank identifier from its display form.
    ///
    /// Accepts a single letter `A`-`Z` (case-insensitive) or `FREE`.
    /// Returns `None` for anything else -- an unparseable identifier has
    /// no ladder index and never gates access open.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        if upper == "FREE" {
            return Some(Self::FREE);
        }
        let mut chars = upper.chars();
        match (chars.next(), chars.next()) {
            (Some(c @ 'A'..='Z'), None) => {
                let offset = u32::from(c).checked_sub(u32::from('A'))?;
                u8::try_from(offset).ok().map(Self)
            }
            _ => None,
        }
    }

    /// Construct a rank from a raw ladder index, if in range.
    pub const fn from_index(index: usize) -> Option<Self> {
        if index < Self::LADDER_LEN {
            #[allow(clippy::cast_possible_truncation)]
            Some(Self(index as u8))
        } else {
            None
        }
    }

    /// Return the ladder index (`A..Z` are `0..25`, `FREE` is `26`).
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Whether this is the terminal "FREE" rank.
    pub const fn is_free(self) -> bool {
        self.0 == Self::FREE.0
    }

    /// Return the next rank up the ladder, or `None` at "FREE".
    pub const fn next(self) -> Option<Self> {
        if self.is_free() {
            None
        } else {
            Some(Self(self.0.saturating_add(1)))
        }
    }

    /// The display form (`"A"` .. `"Z"`, `"FREE"`).
    pub fn as_str(self) -> &'static str {
        LADDER_NAMES.get(self.index()).copied().unwrap_or("FREE")
    }
}

impl Default for RankId {
    fn default() -> Self {
        Self::FIRST
    }
}

impl core::fmt::Display for RankId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<RankId> for String {
    fn from(rank: RankId) -> Self {
        rank.as_str().to_owned()
    }
}

impl TryFrom<String> for RankId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown rank identifier: {value}"))
    }
}
