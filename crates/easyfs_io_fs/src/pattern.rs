//! Basename glob filters and the `copy_files_x` source-pattern parser.
//!
//! Patterns are matched against `/`-separated paths relative to a traversal
//! root:
//! - a pattern without a separator is matched against the final segment;
//! - a pattern with a separator is matched against every segment-aligned tail;
//! - a bare name used for exclusion also matches any segment equal to it.

use std::path::PathBuf;

use globset::{GlobBuilder, GlobMatcher};

use crate::spec::{EnumCopyMode, FsError};

/// Marker for a recursive copy that keeps relative paths.
pub const C_MARKER_RECURSIVE: char = '+';
/// Marker for a recursive copy that flattens into the target.
pub const C_MARKER_FLATTEN: char = '-';
/// Separator between sub-patterns of the final segment.
pub const C_SEP_SUB_PATTERN: char = ';';
/// Prefix that turns a sub-pattern into an exclusion.
pub const C_PREFIX_NEGATE: char = '!';

const IF_CASE_INSENSITIVE: bool = cfg!(any(windows, target_os = "macos"));

////////////////////////////////////////////////////////////////////////////////
// #region PatternMatching

#[derive(Debug, Clone)]
struct SpecPatternMatcher {
    pattern: String,
    matcher: GlobMatcher,
    if_has_separator: bool,
    if_is_literal: bool,
}

impl SpecPatternMatcher {
    fn compile(pattern: &str) -> Result<Self, FsError> {
        let c_pattern = pattern.replace('\\', "/");
        let if_has_separator = c_pattern.contains('/');
        let matcher = GlobBuilder::new(c_pattern.trim_start_matches('/'))
            .case_insensitive(IF_CASE_INSENSITIVE)
            .literal_separator(true)
            .backslash_escape(false)
            .build()
            .map_err(|e| FsError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?
            .compile_matcher();
        Ok(Self {
            pattern: c_pattern,
            matcher,
            if_has_separator,
            if_is_literal: !pattern.contains(['*', '?', '[', ']', '{', '}']),
        })
    }

    fn is_match(&self, path_rel: &str, if_match_segments: bool) -> bool {
        if self.if_has_separator {
            return iter_segment_tails(path_rel).any(|tail| self.matcher.is_match(tail));
        }
        if if_match_segments && self.if_is_literal {
            return path_rel.split('/').any(|seg| self.is_same_name(seg));
        }
        self.matcher.is_match(derive_basename(path_rel))
    }

    fn is_same_name(&self, segment: &str) -> bool {
        if IF_CASE_INSENSITIVE {
            segment.eq_ignore_ascii_case(&self.pattern)
        } else {
            segment == self.pattern
        }
    }
}

fn derive_basename(path_rel: &str) -> &str {
    path_rel.rsplit('/').next().unwrap_or(path_rel)
}

fn iter_segment_tails(path_rel: &str) -> impl Iterator<Item = &str> {
    std::iter::once(path_rel).chain(
        path_rel
            .match_indices('/')
            .map(move |(n_idx, _)| &path_rel[n_idx + 1..]),
    )
}

/// An ordered list of glob patterns combined with OR.
#[derive(Debug, Clone, Default)]
pub struct SpecPatternList {
    l_matchers: Vec<SpecPatternMatcher>,
}

impl SpecPatternList {
    /// Compile every pattern; the first invalid one aborts.
    pub fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Self, FsError> {
        let l_matchers = patterns
            .iter()
            .map(|p| SpecPatternMatcher::compile(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { l_matchers })
    }

    pub fn is_empty(&self) -> bool {
        self.l_matchers.is_empty()
    }

    /// Inclusion semantics: an empty list accepts every path.
    pub fn should_include(&self, path_rel: &str) -> bool {
        self.is_empty() || self.l_matchers.iter().any(|m| m.is_match(path_rel, false))
    }

    /// Exclusion semantics: an empty list rejects nothing.
    pub fn should_exclude(&self, path_rel: &str) -> bool {
        self.l_matchers.iter().any(|m| m.is_match(path_rel, true))
    }
}

/// Paired inclusion/exclusion lists applied at every traversal level.
#[derive(Debug, Clone, Default)]
pub struct SpecPathFilter {
    pats_in: SpecPatternList,
    pats_out: SpecPatternList,
}

impl SpecPathFilter {
    pub fn new<S: AsRef<str>, T: AsRef<str>>(
        in_filter: &[S],
        out_filter: &[T],
    ) -> Result<Self, FsError> {
        Ok(Self {
            pats_in: SpecPatternList::compile(in_filter)?,
            pats_out: SpecPatternList::compile(out_filter)?,
        })
    }

    /// Whether an entry at `path_rel` is yielded.
    pub fn is_match(&self, path_rel: &str) -> bool {
        self.pats_in.should_include(path_rel) && !self.pats_out.should_exclude(path_rel)
    }

    /// Whether a directory at `path_rel` is cut off together with its subtree.
    pub fn is_pruned(&self, path_rel: &str) -> bool {
        self.pats_out.should_exclude(path_rel)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CopyPatternParsing

/// One `copy_files_x` source pattern, parsed.
///
/// `"+some/dir/*.txt;!tmp*"` becomes mode [`EnumCopyMode::Recursive`], base
/// directory `some/dir`, include `["*.txt"]`, exclude `["tmp*"]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecCopyPattern {
    pub mode: EnumCopyMode,
    pub path_dir_base: PathBuf,
    pub patterns_include: Vec<String>,
    pub patterns_exclude: Vec<String>,
}

impl SpecCopyPattern {
    pub fn parse(raw: &str) -> Result<Self, FsError> {
        let (mode, c_body) = if let Some(rest) = raw.strip_prefix(C_MARKER_RECURSIVE) {
            (EnumCopyMode::Recursive, rest)
        } else if let Some(rest) = raw.strip_prefix(C_MARKER_FLATTEN) {
            (EnumCopyMode::Flatten, rest)
        } else {
            (EnumCopyMode::Shallow, raw)
        };

        let Some(n_idx) = c_body.rfind(['/', '\\']) else {
            return Err(FsError::InvalidPattern {
                pattern: raw.to_string(),
                message: "missing base directory".to_string(),
            });
        };
        let (c_dir_base, c_mask) = (&c_body[..n_idx], &c_body[n_idx + 1..]);
        let path_dir_base = match c_dir_base {
            "" => PathBuf::from("/"),
            _ => PathBuf::from(c_dir_base),
        };

        let mut patterns_include = Vec::new();
        let mut patterns_exclude = Vec::new();
        for c_part in c_mask.split(C_SEP_SUB_PATTERN).filter(|p| !p.is_empty()) {
            match c_part.strip_prefix(C_PREFIX_NEGATE) {
                Some(negated) if !negated.is_empty() => {
                    patterns_exclude.push(negated.to_string());
                }
                Some(_) => {}
                None => patterns_include.push(c_part.to_string()),
            }
        }
        if patterns_include.is_empty() {
            patterns_include.push("*".to_string());
        }

        // Surface bad globs at parse time rather than mid-copy.
        SpecPathFilter::new(&patterns_include, &patterns_exclude)?;

        Ok(Self {
            mode,
            path_dir_base,
            patterns_include,
            patterns_exclude,
        })
    }

    pub fn build_filter(&self) -> Result<SpecPathFilter, FsError> {
        SpecPathFilter::new(&self.patterns_include, &self.patterns_exclude)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::{SpecCopyPattern, SpecPathFilter, SpecPatternList};
    use crate::spec::{EnumCopyMode, FsError};

    fn compile(patterns: &[&str]) -> SpecPatternList {
        SpecPatternList::compile(patterns).expect("compile")
    }

    #[test]
    fn empty_list_includes_everything_and_excludes_nothing() {
        let pats = compile(&[]);
        assert!(pats.is_empty());
        assert!(!compile(&["*"]).is_empty());
        for path_rel in ["a", "A/b.txt", "deep/er/still.bmp", ""] {
            assert!(pats.should_include(path_rel));
            assert!(!pats.should_exclude(path_rel));
        }
    }

    #[test]
    fn glob_matches_basename_only() {
        let pats = compile(&["*.bmp"]);
        assert!(pats.should_include("testRoot.bmp"));
        assert!(pats.should_include("A/B/testB.bmp"));
        assert!(!pats.should_include("A.bmp/testB.txt"));
    }

    #[test]
    fn char_class_and_question_mark() {
        let pats = compile(&["file[0-9].t?t"]);
        assert!(pats.should_include("file1.txt"));
        assert!(!pats.should_include("filea.txt"));
    }

    #[test]
    fn list_is_or_combined() {
        let pats = compile(&["1", "2"]);
        assert!(pats.should_include("1"));
        assert!(pats.should_include("2"));
        assert!(!pats.should_include("3"));
    }

    #[test]
    fn separator_pattern_matches_path_tail() {
        let pats = compile(&["B/*.bmp"]);
        assert!(pats.should_include("A/B/testB.bmp"));
        assert!(pats.should_include("B/x.bmp"));
        assert!(!pats.should_include("A/C/testC.bmp"));
        assert!(!pats.should_include("AB/x.bmp"));
    }

    #[test]
    fn bare_name_excludes_any_segment() {
        let pats = compile(&["B"]);
        assert!(pats.should_exclude("B"));
        assert!(pats.should_exclude("A/B/testB.bmp"));
        assert!(!pats.should_exclude("A/BB/testB.bmp"));
        // Inclusion stays basename-only.
        assert!(!pats.should_include("A/B/testB.bmp"));
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    #[test]
    fn matching_is_case_sensitive_on_linux() {
        let pats = compile(&["*.TXT"]);
        assert!(!pats.should_include("a.txt"));
        assert!(pats.should_include("a.TXT"));
    }

    #[test]
    fn filter_combines_in_and_out() {
        let spec_filter = SpecPathFilter::new(&["*.txt"], &["*A*"]).expect("filter");
        assert!(spec_filter.is_match("mytestRoot.txt"));
        assert!(!spec_filter.is_match("mytestA.txt"));
        assert!(!spec_filter.is_match("testRoot.bmp"));
        assert!(spec_filter.is_pruned("A"));
    }

    #[test]
    fn invalid_glob_rejected() {
        let err = SpecPatternList::compile(&["["]).expect_err("must fail");
        assert!(matches!(err, FsError::InvalidPattern { .. }));
    }

    #[test]
    fn parse_shallow_single_mask() {
        let spec = SpecCopyPattern::parse("/data/complex_tree/1").expect("parse");
        assert_eq!(spec.mode, EnumCopyMode::Shallow);
        assert_eq!(spec.path_dir_base, PathBuf::from("/data/complex_tree"));
        assert_eq!(spec.patterns_include, vec!["1".to_string()]);
        assert!(spec.patterns_exclude.is_empty());
    }

    #[test]
    fn parse_recursive_with_negation() {
        let spec = SpecCopyPattern::parse("+/data/root/*;!*2").expect("parse");
        assert_eq!(spec.mode, EnumCopyMode::Recursive);
        assert_eq!(spec.path_dir_base, PathBuf::from("/data/root"));
        assert_eq!(spec.patterns_include, vec!["*".to_string()]);
        assert_eq!(spec.patterns_exclude, vec!["*2".to_string()]);
    }

    #[test]
    fn parse_flatten_and_multiple_positive() {
        let spec = SpecCopyPattern::parse("-root/1.1*;2").expect("parse");
        assert_eq!(spec.mode, EnumCopyMode::Flatten);
        assert_eq!(spec.path_dir_base, PathBuf::from("root"));
        assert_eq!(
            spec.patterns_include,
            vec!["1.1*".to_string(), "2".to_string()]
        );
    }

    #[test]
    fn parse_only_negations_defaults_include_to_star() {
        let spec = SpecCopyPattern::parse("root/!*.md5").expect("parse");
        assert_eq!(spec.patterns_include, vec!["*".to_string()]);
        assert_eq!(spec.patterns_exclude, vec!["*.md5".to_string()]);
    }

    #[test]
    fn parse_requires_base_directory() {
        for raw in ["*.txt", "+1.1*", "-a;b"] {
            let err = SpecCopyPattern::parse(raw).expect_err("must fail");
            assert!(matches!(err, FsError::InvalidPattern { .. }));
        }
        let spec = SpecCopyPattern::parse("./*.txt").expect("parse");
        assert_eq!(spec.path_dir_base, PathBuf::from("."));
    }

    #[test]
    fn parse_rejects_bad_glob() {
        let err = SpecCopyPattern::parse("+root/[").expect_err("must fail");
        assert!(matches!(err, FsError::InvalidPattern { .. }));
    }
}
