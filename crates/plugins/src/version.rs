//! Version ranges that module specs declare against the host version.
//!
//! Supports the range syntax package manifests commonly use: `*`, exact and
//! partial versions (`1.2.3`, `1.2`, `1.x`), the comparison operators
//! `=`, `>`, `>=`, `<`, `<=`, caret `^` and tilde `~` ranges, whitespace-joined
//! intersections and `||` unions. Pre-release and build suffixes are ignored.

use std::{fmt, str::FromStr};

/// A `major.minor.patch` triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a full version, tolerating a leading `v` and pre-release/build suffixes.
    pub fn parse(version: &str) -> Option<Self> {
        let core = strip_suffix(version.trim().trim_start_matches(['v', 'V']));
        let mut parts = core.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self::new(major, minor, patch))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

fn strip_suffix(version: &str) -> &str {
    version
        .split_once(['-', '+'])
        .map_or(version, |(core, _)| core)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Comparator {
    op: Op,
    version: Version,
}

impl Comparator {
    const fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    fn matches(&self, version: &Version) -> bool {
        match self.op {
            Op::Eq => version == &self.version,
            Op::Gt => version > &self.version,
            Op::Ge => version >= &self.version,
            Op::Lt => version < &self.version,
            Op::Le => version <= &self.version,
        }
    }
}

/// A version with optional trailing components (`1`, `1.2`, `1.x`).
#[derive(Debug, Clone, Copy)]
struct Partial {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
}

impl Partial {
    fn parse(text: &str) -> Option<Self> {
        let core = strip_suffix(text.trim_start_matches(['v', 'V']));
        let mut parts = core.split('.');
        let major = parse_component(parts.next()?)?;
        let minor = parts.next().map(parse_component).unwrap_or(Some(None))?;
        let patch = parts.next().map(parse_component).unwrap_or(Some(None))?;
        if parts.next().is_some() {
            return None;
        }
        // `1.x.3` is not meaningful.
        if (major.is_none() && minor.is_some()) || (minor.is_none() && patch.is_some()) {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    fn floor(&self) -> Version {
        Version::new(
            self.major.unwrap_or(0),
            self.minor.unwrap_or(0),
            self.patch.unwrap_or(0),
        )
    }

    /// The first version past everything this partial covers.
    fn ceiling(&self) -> Option<Version> {
        match (self.major, self.minor, self.patch) {
            (None, ..) => None,
            (Some(major), None, _) => Some(Version::new(major.saturating_add(1), 0, 0)),
            (Some(major), Some(minor), None) => {
                Some(Version::new(major, minor.saturating_add(1), 0))
            },
            (Some(major), Some(minor), Some(patch)) => {
                Some(Version::new(major, minor, patch.saturating_add(1)))
            },
        }
    }

    fn is_full(&self) -> bool {
        self.patch.is_some()
    }
}

/// `Some(None)` for a wildcard component, `None` for garbage.
fn parse_component(part: &str) -> Option<Option<u64>> {
    match part {
        "x" | "X" | "*" => Some(None),
        _ => part.parse().ok().map(Some),
    }
}

/// Error returned when a range cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReqError {
    pub range: String,
    pub token: String,
}

impl fmt::Display for VersionReqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid version range '{}': cannot parse '{}'",
            self.range, self.token
        )
    }
}

impl std::error::Error for VersionReqError {}

/// A parsed version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionReq {
    /// Union of intersections. An empty intersection matches everything.
    alternatives: Vec<Vec<Comparator>>,
}

impl VersionReq {
    /// The range that matches every version.
    pub fn any() -> Self {
        Self {
            alternatives: vec![Vec::new()],
        }
    }

    pub fn parse(range: &str) -> Result<Self, VersionReqError> {
        let mut alternatives = Vec::new();
        for alternative in range.split("||") {
            let mut comparators = Vec::new();
            for token in join_operators(alternative) {
                let parsed = parse_token(&token).ok_or_else(|| VersionReqError {
                    range: range.to_string(),
                    token: token.clone(),
                })?;
                comparators.extend(parsed);
            }
            alternatives.push(comparators);
        }
        Ok(Self { alternatives })
    }

    /// Whether the range accepts every version.
    pub fn is_any(&self) -> bool {
        self.alternatives.iter().any(Vec::is_empty)
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.alternatives
            .iter()
            .any(|set| set.iter().all(|c| c.matches(version)))
    }
}

impl FromStr for VersionReq {
    type Err = VersionReqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split on whitespace, gluing a bare operator to the version that follows it
/// so `>= 1.2` reads like `>=1.2`.
fn join_operators(alternative: &str) -> Vec<String> {
    let mut tokens: Vec<String> = Vec::new();
    let mut pending: Option<&str> = None;
    for word in alternative.split_whitespace() {
        if let Some(op) = pending.take() {
            tokens.push(format!("{op}{word}"));
        } else if matches!(word, "=" | ">" | ">=" | "<" | "<=" | "^" | "~") {
            pending = Some(word);
        } else {
            tokens.push(word.to_string());
        }
    }
    if let Some(op) = pending {
        tokens.push(op.to_string());
    }
    tokens
}

fn parse_token(token: &str) -> Option<Vec<Comparator>> {
    if matches!(token, "*" | "x" | "X") {
        return Some(Vec::new());
    }

    let (op, rest) = [">=", "<=", ">", "<", "=", "^", "~"]
        .iter()
        .find_map(|op| token.strip_prefix(op).map(|rest| (*op, rest)))
        .unwrap_or(("", token));
    let partial = Partial::parse(rest)?;
    let floor = partial.floor();

    let comparators = match op {
        "" | "=" => match partial.ceiling() {
            None => Vec::new(),
            Some(_) if partial.is_full() => vec![Comparator::new(Op::Eq, floor)],
            Some(ceiling) => vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, ceiling),
            ],
        },
        ">" => match partial.ceiling() {
            None => vec![Comparator::new(Op::Lt, Version::new(0, 0, 0))],
            Some(_) if partial.is_full() => vec![Comparator::new(Op::Gt, floor)],
            Some(ceiling) => vec![Comparator::new(Op::Ge, ceiling)],
        },
        ">=" => vec![Comparator::new(Op::Ge, floor)],
        "<" => match partial.major {
            None => vec![Comparator::new(Op::Lt, Version::new(0, 0, 0))],
            Some(_) => vec![Comparator::new(Op::Lt, floor)],
        },
        "<=" => match partial.ceiling() {
            None => Vec::new(),
            Some(_) if partial.is_full() => vec![Comparator::new(Op::Le, floor)],
            Some(ceiling) => vec![Comparator::new(Op::Lt, ceiling)],
        },
        "~" => match (partial.major, partial.minor) {
            (None, _) => Vec::new(),
            (Some(major), None) => vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, Version::new(major.saturating_add(1), 0, 0)),
            ],
            (Some(major), Some(minor)) => vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, Version::new(major, minor.saturating_add(1), 0)),
            ],
        },
        "^" => match caret_ceiling(&partial) {
            None => Vec::new(),
            Some(ceiling) => vec![
                Comparator::new(Op::Ge, floor),
                Comparator::new(Op::Lt, ceiling),
            ],
        },
        _ => return None,
    };
    Some(comparators)
}

/// `^` allows changes that do not modify the left-most non-zero component.
fn caret_ceiling(partial: &Partial) -> Option<Version> {
    match (partial.major?, partial.minor, partial.patch) {
        (major, _, _) if major > 0 => Some(Version::new(major.saturating_add(1), 0, 0)),
        (_, None, _) => Some(Version::new(1, 0, 0)),
        (_, Some(minor), _) if minor > 0 => Some(Version::new(0, minor.saturating_add(1), 0)),
        (_, Some(_), None) => Some(Version::new(0, 1, 0)),
        (_, Some(_), Some(patch)) => Some(Version::new(0, 0, patch.saturating_add(1))),
    }
}
