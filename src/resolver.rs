//! Clip relationship resolution
//!
//! **Why**: Turns a flat list of clip names into a playback graph: which clip
//! plays next, which clips are interchangeable variants, and which clip came
//! before.
//!
//! **Used by**: runner (CLI driver), library users via [`resolve`]
//!
//! # Phases
//!
//! 1. next + alternates, computed per clip from the static parsed names only
//!    (runs in parallel on the rayon pool)
//! 2. previous, a single ordered pass over the finished `next` lists
//!
//! All lookups go through [`ClipIndex`], built once per run.

use indexmap::IndexMap;
use log::{debug, trace};
use rayon::prelude::*;
use serde::Serialize;
use std::fmt;

use crate::clip_name::{self, ClipKey, ParsedClip, MAX_INDEX};

/// Node of the resolved graph, one per input name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Clip {
    pub name: String,
    #[serde(rename = "nextAnimations")]
    pub next: Vec<String>,
    #[serde(rename = "alternateAnimations")]
    pub alternates: Vec<String>,
    #[serde(rename = "previousAnimation", skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl Clip {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            next: Vec::new(),
            alternates: Vec::new(),
            previous: None,
        }
    }
}

/// Non-fatal conditions found while resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Several plain clips (no alternate letter, no transition) share one key
    AmbiguousGroup { key: ClipKey, clips: Vec<String> },
    /// Plain clip at index 99 with nothing to bridge to; a successor can't be named
    IndexOverflow { clip: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::AmbiguousGroup { key, clips } => {
                write!(f, "Ambiguous clip group {}: {}", key, clips.join(", "))
            }
            Diagnostic::IndexOverflow { clip } => {
                write!(f, "Clip index overflow: {} has no successor past {:02}", clip, MAX_INDEX)
            }
        }
    }
}

/// Lookup tables over one immutable snapshot of clip names.
///
/// Positions are input positions; every probe returns the first hit in input order.
#[derive(Debug, Clone)]
pub struct ClipIndex {
    names: Vec<String>,
    parsed: Vec<Option<ParsedClip>>,
    by_name: IndexMap<String, usize>,
    by_key: IndexMap<ClipKey, Vec<usize>>,
}

impl ClipIndex {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let parsed: Vec<Option<ParsedClip>> = names.iter().map(|n| clip_name::parse(n)).collect();

        let mut by_name = IndexMap::with_capacity(names.len());
        let mut by_key: IndexMap<ClipKey, Vec<usize>> = IndexMap::new();
        for (pos, name) in names.iter().enumerate() {
            by_name.entry(name.clone()).or_insert(pos);
            match &parsed[pos] {
                Some(p) => by_key.entry(p.key()).or_default().push(pos),
                None => trace!("Unparseable clip name: {}", name),
            }
        }

        Self { names, parsed, by_name, by_key }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, pos: usize) -> Option<&str> {
        self.names.get(pos).map(String::as_str)
    }

    fn name_at(&self, pos: usize) -> &str {
        &self.names[pos]
    }

    pub fn parsed(&self, pos: usize) -> Option<&ParsedClip> {
        self.parsed.get(pos).and_then(Option::as_ref)
    }

    /// Positions of all parsed clips sharing `key`, in input order.
    pub fn siblings(&self, key: &ClipKey) -> &[usize] {
        self.by_key.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn find_exact(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// First clip named `base` + alternate letter (`A_intro_02B`, `A_intro_02_B`).
    pub fn find_lettered(&self, base: &str) -> Option<usize> {
        let key = clip_name::parse(base)?.key();
        self.siblings(&key)
            .iter()
            .copied()
            .find(|&pos| clip_name::is_lettered_form(&self.names[pos], base))
    }

    /// Exact name first, lettered variant as fallback.
    pub fn find_exact_or_lettered(&self, base: &str) -> Option<usize> {
        self.find_exact(base).or_else(|| self.find_lettered(base))
    }

    /// First transition clip other than `exclude` whose name starts with `prefix-`.
    ///
    /// Alternates spelled with a hyphen (`A_intro_01-B`) and unparsed tails
    /// (`A_intro_01-zz`) are not bridges.
    pub fn find_inline_transition(&self, prefix: &str, key: &ClipKey, exclude: usize) -> Option<usize> {
        self.siblings(key).iter().copied().find(|&pos| {
            pos != exclude
                && self.parsed(pos).is_some_and(|p| p.transition.is_some() && p.alternate.is_none())
                && self.names[pos]
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('-'))
        })
    }
}

/// Resolved graph plus whatever diagnostics the run produced.
#[derive(Debug, Clone, Default)]
pub struct ClipGraph {
    clips: Vec<Clip>,
    diagnostics: Vec<Diagnostic>,
}

impl ClipGraph {
    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// First clip with this name.
    pub fn get(&self, name: &str) -> Option<&Clip> {
        self.clips.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Clip> {
        self.clips.iter()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    pub fn into_clips(self) -> Vec<Clip> {
        self.clips
    }
}

impl<'a> IntoIterator for &'a ClipGraph {
    type Item = &'a Clip;
    type IntoIter = std::slice::Iter<'a, Clip>;

    fn into_iter(self) -> Self::IntoIter {
        self.clips.iter()
    }
}

/// Resolve every relationship for the given names (input order is kept).
pub fn resolve<I, S>(names: I) -> ClipGraph
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    resolve_index(&ClipIndex::new(names))
}

/// Same as [`resolve_index`] but runs phase 1 inside `pool`.
pub fn resolve_with_pool(pool: &rayon::ThreadPool, index: &ClipIndex) -> ClipGraph {
    pool.install(|| resolve_index(index))
}

pub fn resolve_index(index: &ClipIndex) -> ClipGraph {
    // Phase 1: independent per clip
    let mut clips: Vec<Clip> = (0..index.len())
        .into_par_iter()
        .map(|pos| {
            let mut clip = Clip::new(index.name_at(pos));
            clip.next = resolve_next(index, pos);
            clip.alternates = resolve_alternates(index, pos);
            clip
        })
        .collect();

    // Phase 2: needs every `next` list in place
    let previous: Vec<Option<String>> = (0..clips.len())
        .map(|pos| resolve_previous(&clips, pos))
        .collect();
    for (clip, prev) in clips.iter_mut().zip(previous) {
        clip.previous = prev;
    }

    let diagnostics = diagnose(index);

    debug!(
        "Resolved {} clips: {} next links, {} alternate links, {} diagnostics",
        clips.len(),
        clips.iter().map(|c| c.next.len()).sum::<usize>(),
        clips.iter().map(|c| c.alternates.len()).sum::<usize>(),
        diagnostics.len()
    );

    ClipGraph { clips, diagnostics }
}

/// Next clip(s) for the clip at `pos`. At most one rule fires:
///
/// 1. alternate clip -> nothing
/// 2. transition clip -> its target (exact, then lettered)
/// 3. plain clip -> inline transition `<prefix>-...`, else the successor index (exact, then lettered)
pub fn resolve_next(index: &ClipIndex, pos: usize) -> Vec<String> {
    let Some(parsed) = index.parsed(pos) else {
        return Vec::new();
    };
    if parsed.alternate.is_some() {
        return Vec::new();
    }

    let found = match &parsed.transition {
        Some(transition) => index.find_exact_or_lettered(&transition.target_name(parsed)),
        None => index
            .find_inline_transition(&parsed.matched, &parsed.key(), pos)
            .or_else(|| {
                parsed
                    .successor_name()
                    .and_then(|base| index.find_exact_or_lettered(&base))
            }),
    };

    match found {
        Some(next) => {
            debug!("{} -> {}", index.name_at(pos), index.name_at(next));
            vec![index.name_at(next).to_string()]
        }
        None => {
            trace!("{}: no next clip", index.name_at(pos));
            Vec::new()
        }
    }
}

/// Clips sharing group, character and index with a different alternate letter.
///
/// Transition clips have no alternates and are never alternates of anything.
pub fn resolve_alternates(index: &ClipIndex, pos: usize) -> Vec<String> {
    let Some(parsed) = index.parsed(pos) else {
        return Vec::new();
    };
    if parsed.transition.is_some() {
        return Vec::new();
    }

    let own_name = index.name_at(pos);
    let mut alternates: Vec<String> = Vec::new();
    for &other in index.siblings(&parsed.key()) {
        let name = index.name_at(other);
        if name == own_name {
            continue;
        }
        let Some(other_parsed) = index.parsed(other) else {
            continue;
        };
        if other_parsed.transition.is_some() || other_parsed.alternate == parsed.alternate {
            continue;
        }
        if !alternates.iter().any(|a| a == name) {
            alternates.push(name.to_string());
        }
    }
    alternates
}

/// Name of the first other clip (input order) whose `next` contains the clip at `pos`.
pub fn resolve_previous(clips: &[Clip], pos: usize) -> Option<String> {
    let target = &clips.get(pos)?.name;
    clips
        .iter()
        .enumerate()
        .find(|(other, clip)| *other != pos && clip.next.contains(target))
        .map(|(_, clip)| clip.name.clone())
}

/// Collect ambiguous key groups and index overflows.
pub fn diagnose(index: &ClipIndex) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    for (key, positions) in &index.by_key {
        let plain: Vec<String> = positions
            .iter()
            .filter(|&&pos| index.parsed(pos).is_some_and(ParsedClip::is_plain))
            .map(|&pos| index.name_at(pos).to_string())
            .collect();
        if plain.len() > 1 {
            diagnostics.push(Diagnostic::AmbiguousGroup { key: key.clone(), clips: plain });
        }
    }

    for pos in 0..index.len() {
        let Some(parsed) = index.parsed(pos) else {
            continue;
        };
        if parsed.is_plain()
            && parsed.successor_name().is_none()
            && index.find_inline_transition(&parsed.matched, &parsed.key(), pos).is_none()
        {
            diagnostics.push(Diagnostic::IndexOverflow { clip: index.name_at(pos).to_string() });
        }
    }

    diagnostics
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next_of(graph: &ClipGraph, name: &str) -> Vec<String> {
        graph.get(name).unwrap().next.clone()
    }

    fn alts_of(graph: &ClipGraph, name: &str) -> Vec<String> {
        graph.get(name).unwrap().alternates.clone()
    }

    #[test]
    fn test_sequential_increment() {
        let graph = resolve(["A_intro_01", "A_intro_02"]);
        assert_eq!(next_of(&graph, "A_intro_01"), vec!["A_intro_02"]);
        assert!(next_of(&graph, "A_intro_02").is_empty());
        assert_eq!(graph.get("A_intro_02").unwrap().previous.as_deref(), Some("A_intro_01"));
        assert_eq!(graph.get("A_intro_01").unwrap().previous, None);
    }

    #[test]
    fn test_inline_transition_precedence() {
        let graph = resolve(["A_intro_01", "A_intro_01-02", "A_intro_02"]);
        assert_eq!(next_of(&graph, "A_intro_01"), vec!["A_intro_01-02"]);
        assert_eq!(next_of(&graph, "A_intro_01-02"), vec!["A_intro_02"]);
        assert_eq!(graph.get("A_intro_02").unwrap().previous.as_deref(), Some("A_intro_01-02"));
    }

    #[test]
    fn test_cross_group_transition() {
        let graph = resolve(["A_intro_01-relax_01", "A_relax_01"]);
        assert_eq!(next_of(&graph, "A_intro_01-relax_01"), vec!["A_relax_01"]);
        assert_eq!(
            graph.get("A_relax_01").unwrap().previous.as_deref(),
            Some("A_intro_01-relax_01")
        );
    }

    #[test]
    fn test_transition_lettered_fallback() {
        let graph = resolve(["A_intro_01-02", "A_intro_02A", "A_intro_03-relax_01", "A_relax_01_C"]);
        assert_eq!(next_of(&graph, "A_intro_01-02"), vec!["A_intro_02A"]);
        assert_eq!(next_of(&graph, "A_intro_03-relax_01"), vec!["A_relax_01_C"]);
    }

    #[test]
    fn test_transition_keeps_character() {
        let graph = resolve(["A_talk_B_01-02", "A_talk_02", "A_talk_B_02"]);
        assert_eq!(next_of(&graph, "A_talk_B_01-02"), vec!["A_talk_B_02"]);
    }

    #[test]
    fn test_alternate_letter_fallback() {
        let graph = resolve(["A_intro_01", "A_intro_02_B"]);
        assert_eq!(next_of(&graph, "A_intro_01"), vec!["A_intro_02_B"]);

        let graph = resolve(["A_intro_01", "A_intro_02C"]);
        assert_eq!(next_of(&graph, "A_intro_01"), vec!["A_intro_02C"]);
    }

    #[test]
    fn test_exact_successor_beats_lettered() {
        let graph = resolve(["A_intro_02_B", "A_intro_01", "A_intro_02"]);
        assert_eq!(next_of(&graph, "A_intro_01"), vec!["A_intro_02"]);
    }

    #[test]
    fn test_character_sequences_are_separate() {
        let graph = resolve(["A_talk_A_01", "A_talk_A_02", "A_talk_B_01", "A_talk_B_02"]);
        assert_eq!(next_of(&graph, "A_talk_A_01"), vec!["A_talk_A_02"]);
        assert_eq!(next_of(&graph, "A_talk_B_01"), vec!["A_talk_B_02"]);
        // Different characters are not alternates of each other
        assert!(alts_of(&graph, "A_talk_A_01").is_empty());
        assert!(alts_of(&graph, "A_talk_B_01").is_empty());
    }

    #[test]
    fn test_alternates_have_no_next() {
        let graph = resolve(["A_intro_01", "A_intro_01_B", "A_intro_02", "A_intro_01_B-02"]);
        assert!(next_of(&graph, "A_intro_01_B").is_empty());
        assert!(next_of(&graph, "A_intro_01_B-02").is_empty());
        for clip in &graph {
            if let Some(p) = clip_name::parse(&clip.name) {
                if p.alternate.is_some() {
                    assert!(clip.next.is_empty(), "{}", clip.name);
                }
            }
        }
    }

    #[test]
    fn test_alternates_both_directions() {
        let graph = resolve(["A_intro_01", "A_intro_01_B", "A_intro_01C"]);
        assert_eq!(alts_of(&graph, "A_intro_01"), vec!["A_intro_01_B", "A_intro_01C"]);
        assert_eq!(alts_of(&graph, "A_intro_01_B"), vec!["A_intro_01", "A_intro_01C"]);
        assert_eq!(alts_of(&graph, "A_intro_01C"), vec!["A_intro_01", "A_intro_01_B"]);
    }

    #[test]
    fn test_alternates_exclude_transitions() {
        let graph = resolve(["A_intro_01", "A_intro_01_B", "A_intro_01-02", "A_intro_02"]);
        assert!(alts_of(&graph, "A_intro_01-02").is_empty());
        assert_eq!(alts_of(&graph, "A_intro_01"), vec!["A_intro_01_B"]);
        assert_eq!(alts_of(&graph, "A_intro_01_B"), vec!["A_intro_01"]);
    }

    #[test]
    fn test_unlettered_duplicates_are_not_alternates() {
        let graph = resolve(["A_intro_01", "A_intro01"]);
        assert!(alts_of(&graph, "A_intro_01").is_empty());
        assert!(alts_of(&graph, "A_intro01").is_empty());
        assert_eq!(
            graph.diagnostics(),
            &[Diagnostic::AmbiguousGroup {
                key: clip_name::parse("A_intro_01").unwrap().key(),
                clips: vec!["A_intro_01".to_string(), "A_intro01".to_string()],
            }]
        );
    }

    #[test]
    fn test_unparseable_name() {
        let graph = resolve(["readme", "A_intro_01", "A_intro_02"]);
        let clip = graph.get("readme").unwrap();
        assert!(clip.next.is_empty());
        assert!(clip.alternates.is_empty());
        assert_eq!(clip.previous, None);
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_terminal_clip() {
        let graph = resolve(["A_intro_05"]);
        assert!(next_of(&graph, "A_intro_05").is_empty());
        assert!(graph.diagnostics().is_empty());
    }

    #[test]
    fn test_index_overflow() {
        let graph = resolve(["A_intro_98", "A_intro_99"]);
        assert_eq!(next_of(&graph, "A_intro_98"), vec!["A_intro_99"]);
        assert!(next_of(&graph, "A_intro_99").is_empty());
        assert_eq!(
            graph.diagnostics(),
            &[Diagnostic::IndexOverflow { clip: "A_intro_99".into() }]
        );

        // A bridge out of 99 is fine
        let graph = resolve(["A_intro_99", "A_intro_99-relax_01", "A_relax_01"]);
        assert_eq!(next_of(&graph, "A_intro_99"), vec!["A_intro_99-relax_01"]);
        assert!(graph.diagnostics().is_empty());
    }

    #[test]
    fn test_previous_first_match_wins() {
        let names = ["A_a_01-b_01", "A_c_01-b_01", "A_b_01"];
        let graph = resolve(names);
        assert_eq!(graph.get("A_b_01").unwrap().previous.as_deref(), Some("A_a_01-b_01"));

        // Every next link is reflected by previous, or shadowed by an earlier clip
        for (pos, clip) in graph.iter().enumerate() {
            for next in &clip.next {
                let prev = graph.get(next).unwrap().previous.as_deref().unwrap();
                let prev_pos = graph.iter().position(|c| c.name == prev).unwrap();
                assert!(prev_pos <= pos);
            }
        }
    }

    #[test]
    fn test_inline_probe_skips_self() {
        // Trailing "-zz" isn't a transition, but the name still starts with "A_intro_01-"
        let graph = resolve(["A_intro_01-zz", "A_intro_02"]);
        assert_eq!(next_of(&graph, "A_intro_01-zz"), vec!["A_intro_02"]);
    }

    #[test]
    fn test_hyphenated_alternate_is_not_a_bridge() {
        let graph = resolve(["A_intro_01", "A_intro_01-B", "A_intro_02"]);
        assert_eq!(next_of(&graph, "A_intro_01"), vec!["A_intro_02"]);
        assert_eq!(alts_of(&graph, "A_intro_01"), vec!["A_intro_01-B"]);
        assert_eq!(graph.get("A_intro_01-B").unwrap().previous, None);
        assert_eq!(graph.get("A_intro_02").unwrap().previous.as_deref(), Some("A_intro_01"));
    }

    #[test]
    fn test_transitions_have_no_alternates() {
        let graph = resolve([
            "A_intro_01",
            "A_intro_01_B",
            "A_intro_01-02",
            "A_intro_01_B-02",
            "A_intro_02",
        ]);
        for clip in &graph {
            if clip_name::parse(&clip.name).is_some_and(|p| p.transition.is_some()) {
                assert!(clip.alternates.is_empty(), "{}", clip.name);
            }
        }
    }

    #[test]
    fn test_resolve_with_pool_matches_default() {
        let names = vec!["A_intro_01", "A_intro_01-02", "A_intro_02", "A_intro_02_B", "A_intro_03"];
        let index = ClipIndex::new(names.clone());
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let pooled = resolve_with_pool(&pool, &index);
        let plain = resolve(names);
        assert_eq!(pooled.clips(), plain.clips());
    }

    #[test]
    fn test_index_probes() {
        let index = ClipIndex::new(["A_intro_01", "A_intro_01-02", "A_intro_02_B", "A_intro_02B"]);
        assert_eq!(index.find_exact("A_intro_01"), Some(0));
        assert_eq!(index.find_exact("A_intro_02"), None);
        assert_eq!(index.find_lettered("A_intro_02"), Some(2));
        assert_eq!(index.find_exact_or_lettered("A_intro_02"), Some(2));
        let key = index.parsed(0).unwrap().key();
        assert_eq!(index.find_inline_transition("A_intro_01", &key, 0), Some(1));
        assert_eq!(index.siblings(&key), &[0, 1]);
        assert_eq!(index.name(1), Some("A_intro_01-02"));
        assert_eq!(index.name(4), None);
    }

    #[test]
    fn test_serialized_field_names() {
        let graph = resolve(["A_intro_01", "A_intro_02"]);
        let json = serde_json::to_value(graph.clips()).unwrap();
        assert_eq!(json[0]["name"], "A_intro_01");
        assert_eq!(json[0]["nextAnimations"][0], "A_intro_02");
        assert_eq!(json[0]["alternateAnimations"].as_array().unwrap().len(), 0);
        assert!(json[0].get("previousAnimation").is_none());
        assert_eq!(json[1]["previousAnimation"], "A_intro_01");
    }
}
