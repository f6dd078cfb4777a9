//! Compiled capability patterns.
//!
//! Capabilities are `.`-separated names such as `world.read.location`.
//! Patterns use the same segments plus two wildcards:
//!
//! - `*` matches exactly one segment and never crosses a `.`.
//! - `**` in trailing position matches one or more segments
//!   (`world.read.**` matches `world.read.location` but not `world.read`).
//! - `**` at the root or between segments matches zero or more segments
//!   (`a.**.b` matches `a.b`, `a.x.b` and `a.x.y.b`).

use crate::error::PatternError;
use std::fmt;

const UNSUPPORTED: &[char] = &['?', '[', ']', '{', '}', '\\', '!'];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*`
    One,
    /// `**`
    Many,
}

/// A capability pattern compiled once at grant time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityPattern {
    source: String,
    segments: Vec<Segment>,
}

impl CapabilityPattern {
    /// Compile a pattern, rejecting empty or malformed input.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        let mut segments = Vec::new();
        for (position, raw) in pattern.split('.').enumerate() {
            if raw.is_empty() {
                return Err(PatternError::EmptySegment(position));
            }
            if let Some(ch) = raw.chars().find(|c| UNSUPPORTED.contains(c)) {
                return Err(PatternError::UnsupportedCharacter(ch));
            }

            let segment = match raw {
                "*" => Segment::One,
                "**" => Segment::Many,
                _ if raw.chars().all(|c| c == '*') => {
                    return Err(PatternError::InvalidWildcard(raw.to_string()))
                }
                _ if raw.contains('*') => {
                    return Err(PatternError::PartialWildcard(raw.to_string()))
                }
                _ => Segment::Literal(raw.to_string()),
            };

            // `a.**.**.b` means the same as `a.**.b`.
            if segment == Segment::Many && segments.last() == Some(&Segment::Many) {
                continue;
            }
            segments.push(segment);
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
        })
    }

    /// The pattern text as it was granted.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Returns true if `capability` is matched by this pattern.
    ///
    /// Empty capabilities, and capabilities with empty segments, never match.
    pub fn matches(&self, capability: &str) -> bool {
        if capability.is_empty() {
            return false;
        }
        let parts: Vec<&str> = capability.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return false;
        }

        let p = self.segments.len();
        let c = parts.len();
        let width = c + 1;

        // table[i * width + j]: segments[i..] matches parts[j..]
        let mut table = vec![false; (p + 1) * width];
        table[p * width + c] = true;

        for i in (0..p).rev() {
            for j in (0..=c).rev() {
                table[i * width + j] = match &self.segments[i] {
                    Segment::Literal(lit) => {
                        j < c && parts[j] == lit && table[(i + 1) * width + j + 1]
                    }
                    Segment::One => j < c && table[(i + 1) * width + j + 1],
                    Segment::Many if i + 1 == p => j < c,
                    Segment::Many => (j..=c).any(|k| table[(i + 1) * width + k]),
                };
            }
        }

        table[0]
    }
}

impl fmt::Display for CapabilityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(pattern: &str, capability: &str) -> bool {
        CapabilityPattern::parse(pattern).unwrap().matches(capability)
    }

    #[test]
    fn test_exact_match() {
        assert!(matches("world.read.location", "world.read.location"));
        assert!(!matches("world.read.location", "world.read.object"));
        assert!(!matches("world.read.location", "world.read"));
        assert!(!matches("world.read", "world.read.location"));
    }

    #[test]
    fn test_single_wildcard_is_segment_exact() {
        assert!(matches("world.read.*", "world.read.location"));
        assert!(!matches("world.read.*", "world.read.character.name"));
        assert!(!matches("world.read.*", "world.readonly.location"));
        assert!(!matches("world.read.*", "world.read"));
        assert!(matches("world.*.location", "world.write.location"));
    }

    #[test]
    fn test_bare_star_matches_one_segment() {
        assert!(matches("*", "kv"));
        assert!(!matches("*", "kv.read"));
    }

    #[test]
    fn test_trailing_double_star_needs_a_segment() {
        assert!(matches("world.read.**", "world.read.location"));
        assert!(matches("world.read.**", "world.read.character.name"));
        assert!(!matches("world.read.**", "world.read"));
        assert!(!matches("world.read.**", "world.readonly.location"));
    }

    #[test]
    fn test_root_double_star_matches_everything() {
        assert!(matches("**", "kv"));
        assert!(matches("**", "world.read.character.name"));
        assert!(matches("**.name", "name"));
        assert!(matches("**.name", "world.read.character.name"));
        assert!(!matches("**.name", "world.read.character"));
    }

    #[test]
    fn test_interior_double_star_matches_zero_or_more() {
        assert!(matches("a.**.b", "a.b"));
        assert!(matches("a.**.b", "a.x.b"));
        assert!(matches("a.**.b", "a.x.y.b"));
        assert!(!matches("a.**.b", "a.x.y"));
        assert!(!matches("a.**.b", "b"));
        assert!(matches("a.**.*.c", "a.b.c"));
        assert!(!matches("a.**.*.c", "a.c"));
    }

    #[test]
    fn test_malformed_capabilities_never_match() {
        assert!(!matches("**", ""));
        assert!(!matches("**", "world..read"));
        assert!(!matches("world.**", "world."));
    }

    #[test]
    fn test_parse_rejects_invalid_patterns() {
        assert_eq!(CapabilityPattern::parse(""), Err(PatternError::Empty));
        assert_eq!(
            CapabilityPattern::parse("world..read"),
            Err(PatternError::EmptySegment(1))
        );
        assert_eq!(
            CapabilityPattern::parse(".world"),
            Err(PatternError::EmptySegment(0))
        );
        assert_eq!(
            CapabilityPattern::parse("world.read*"),
            Err(PatternError::PartialWildcard("read*".to_string()))
        );
        assert_eq!(
            CapabilityPattern::parse("world.***"),
            Err(PatternError::InvalidWildcard("***".to_string()))
        );
        assert_eq!(
            CapabilityPattern::parse("world.[abc"),
            Err(PatternError::UnsupportedCharacter('['))
        );
    }

    #[test]
    fn test_display_keeps_source_text() {
        let pattern = CapabilityPattern::parse("a.**.**.b").unwrap();
        assert_eq!(pattern.to_string(), "a.**.**.b");
        assert!(pattern.matches("a.b"));
    }
}
