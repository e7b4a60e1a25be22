//! Animation clip name grammar
//!
//! **Why**: Clip files carry no metadata; the file name IS the data model.
//! This module turns a raw name into its structured parts so the resolver
//! can synthesize and compare candidate names.
//!
//! **Used by**: resolver (candidate synthesis, sibling lookup)
//!
//! # Grammar
//!
//! ```text
//! A_ <group> [_] [<CHAR> [_]] <NN> [[_|-] <ALT>] [- [<group> [_]] <NN>]
//! ```
//!
//! - `A_`: marker for animation assets (must start the name)
//! - `group`: lowercase animation family (`intro`, `relax`)
//! - `CHAR`: optional uppercase character tag (`A_talk_B_01`)
//! - `NN`: two-digit clip index
//! - `ALT`: optional uppercase alternate letter (`A_intro_01_B`, `A_intro_01B`)
//! - transition: `-NN` (same group) or `-group_NN` (cross-group)
//!
//! A letter right after the group is always read as the character tag; only
//! a letter after the index is an alternate. The match is anchored at the
//! start only, trailing text is ignored.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// Literal marker every animation clip name starts with.
pub const MARKER: &str = "A_";

/// Highest two-digit clip index.
pub const MAX_INDEX: u8 = 99;

static CLIP_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^A_(?P<group>[a-z]+)_?",
        r"(?:(?P<character>[A-Z])_?)?",
        r"(?P<index>[0-9]{2})",
        r"(?:[_-]?(?P<alternate>[A-Z]))?",
        r"(?:-(?:(?P<target_group>[a-z]+)_?)?(?P<target_index>[0-9]{2}))?",
    ))
    .expect("clip name grammar is a valid regex")
});

/// Hand-authored bridge suffix on a clip name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Transition {
    /// `A_intro_01-02`: bridge to another index of the same group (and character)
    Inline { index: u8 },
    /// `A_intro_01-relax_01`: bridge into another group
    CrossGroup { group: String, index: u8 },
}

impl Transition {
    /// Canonical name of the clip this transition leads into.
    ///
    /// Inline targets keep the source's group and character; cross-group
    /// targets drop both.
    pub fn target_name(&self, source: &ParsedClip) -> String {
        match self {
            Transition::Inline { index } => canonical_name(&source.group, source.character, *index),
            Transition::CrossGroup { group, index } => canonical_name(group, None, *index),
        }
    }
}

/// Identity shared by a clip and all of its alternates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClipKey {
    pub group: String,
    pub character: Option<char>,
    pub index: u8,
}

impl fmt::Display for ClipKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.character {
            Some(c) => write!(f, "{}/{}/{:02}", self.group, c, self.index),
            None => write!(f, "{}/{:02}", self.group, self.index),
        }
    }
}

/// Structured view of a clip name that matched the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClip {
    pub group: String,
    pub character: Option<char>,
    pub index: u8,
    pub alternate: Option<char>,
    pub transition: Option<Transition>,
    /// Text consumed by the grammar (name without any trailing junk)
    pub matched: String,
}

impl ParsedClip {
    pub fn key(&self) -> ClipKey {
        ClipKey {
            group: self.group.clone(),
            character: self.character,
            index: self.index,
        }
    }

    /// Plain sequence clip: neither an alternate nor a transition.
    pub fn is_plain(&self) -> bool {
        self.alternate.is_none() && self.transition.is_none()
    }

    /// Canonical name of the clip that follows in the sequence, or `None`
    /// when the index is already [`MAX_INDEX`].
    pub fn successor_name(&self) -> Option<String> {
        if self.index >= MAX_INDEX {
            return None;
        }
        Some(canonical_name(&self.group, self.character, self.index + 1))
    }
}

/// Parse a clip name; `None` when it doesn't follow the naming convention.
pub fn parse(name: &str) -> Option<ParsedClip> {
    let caps = CLIP_NAME_RE.captures(name)?;

    let index = caps.name("index")?.as_str().parse::<u8>().ok()?;
    let transition = match caps.name("target_index") {
        Some(m) => {
            let target = m.as_str().parse::<u8>().ok()?;
            Some(match caps.name("target_group") {
                Some(g) => Transition::CrossGroup {
                    group: g.as_str().to_string(),
                    index: target,
                },
                None => Transition::Inline { index: target },
            })
        }
        None => None,
    };

    Some(ParsedClip {
        group: caps.name("group")?.as_str().to_string(),
        character: first_char(caps.name("character").map(|m| m.as_str())),
        index,
        alternate: first_char(caps.name("alternate").map(|m| m.as_str())),
        transition,
        matched: caps.get(0)?.as_str().to_string(),
    })
}

/// Build the canonical (fully underscored) name for a group/character/index.
///
/// `("intro", None, 2)` -> `A_intro_02`, `("talk", Some('B'), 1)` -> `A_talk_B_01`
pub fn canonical_name(group: &str, character: Option<char>, index: u8) -> String {
    match character {
        Some(c) => format!("{}{}_{}_{:02}", MARKER, group, c, index),
        None => format!("{}{}_{:02}", MARKER, group, index),
    }
}

/// True when `name` is `base` plus an alternate letter, optionally `_`-separated.
pub fn is_lettered_form(name: &str, base: &str) -> bool {
    let Some(rest) = name.strip_prefix(base) else {
        return false;
    };
    let letter = rest.strip_prefix('_').unwrap_or(rest);
    let mut chars = letter.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

fn first_char(s: Option<&str>) -> Option<char> {
    s.and_then(|s| s.chars().next())
}
