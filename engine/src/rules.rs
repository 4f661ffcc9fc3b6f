//! Rules deciding whether an item is transferred at all.
//!
//! A rule sees the source-side `FileEntry` of an item. An item rejected by
//! any rule is finalized as skipped by rule instead of being transferred.

use std::fmt;

use crate::model::{EntryKind, FileEntry};

/// A filter evaluated against each planned item.
pub trait TransferRule: fmt::Debug + Send + Sync {
    /// Returns false to skip the entry.
    fn accepts(&self, entry: &FileEntry) -> bool;
}

/// Whether a rule's list names what to keep or what to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleMode {
    Include,
    Exclude,
}

/// Filters files by extension. Directories and links always pass.
#[derive(Debug, Clone)]
pub struct ExtensionRule {
    extensions: Vec<String>,
    mode: RuleMode,
}

impl ExtensionRule {
    /// Extensions are matched case-insensitively, with or without a leading dot.
    pub fn new<I, S>(mode: RuleMode, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        ExtensionRule { extensions, mode }
    }
}

impl TransferRule for ExtensionRule {
    fn accepts(&self, entry: &FileEntry) -> bool {
        if entry.kind != EntryKind::File {
            return true;
        }

        let listed = entry
            .extension()
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|e| *e == ext)
            })
            .unwrap_or(false);

        match self.mode {
            RuleMode::Include => listed,
            RuleMode::Exclude => !listed,
        }
    }
}

/// Filters files by size, both bounds inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeRule {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

impl TransferRule for SizeRule {
    fn accepts(&self, entry: &FileEntry) -> bool {
        if entry.kind != EntryKind::File {
            return true;
        }
        self.min.map_or(true, |min| entry.size >= min)
            && self.max.map_or(true, |max| entry.size <= max)
    }
}

/// Filters any kind of entry by name, with `*` and `?` wildcards.
#[derive(Debug, Clone)]
pub struct NameRule {
    patterns: Vec<String>,
    mode: RuleMode,
}

impl NameRule {
    pub fn new<I, S>(mode: RuleMode, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NameRule {
            patterns: patterns.into_iter().map(Into::into).collect(),
            mode,
        }
    }
}

impl TransferRule for NameRule {
    fn accepts(&self, entry: &FileEntry) -> bool {
        let listed = self
            .patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, &entry.name));

        match self.mode {
            RuleMode::Include => listed,
            RuleMode::Exclude => !listed,
        }
    }
}

/// Match `name` against a glob supporting `*` and `?`.
pub fn wildcard_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = name.chars().collect();
    let (mut pi, mut si) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut resume = 0usize;

    while si < s.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == s[si]) {
            pi += 1;
            si += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some(pi);
            pi += 1;
            resume = si;
        } else if let Some(star_at) = star {
            pi = star_at + 1;
            resume += 1;
            si = resume;
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// All rules of a job. Empty accepts everything.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<Box<dyn TransferRule>>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<R>(&mut self, rule: R)
    where
        R: TransferRule + 'static,
    {
        self.rules.push(Box::new(rule));
    }

    pub fn with<R>(mut self, rule: R) -> Self
    where
        R: TransferRule + 'static,
    {
        self.push(rule);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if every rule accepts the entry.
    pub fn accepts(&self, entry: &FileEntry) -> bool {
        self.rules.iter().all(|rule| rule.accepts(entry))
    }
}
