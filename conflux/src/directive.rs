//! Inline merge directive grammar.
//!
//! Decoded keys may carry an instruction block as a suffix, e.g.
//! `retries((replace))` or `token((replace, secret))`. The block overrides
//! the default merge policy for that key. This parser is the single point
//! where the grammar is interpreted; codecs never parse it themselves.

use thiserror::Error;

/// Per-key merge policy override.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergePolicy {
    /// Discard the existing value and use the incoming one wholesale.
    Replace,
    /// Retain the existing value and discard the incoming one.
    Keep,
    /// Abort the merge with a conflict error.
    Fail,
    /// Discard all existing content before applying the incoming value.
    Clear,
    /// Merge map children key-by-key instead of replacing the whole map.
    Splice,
    /// Concatenate incoming array elements after the existing ones.
    Append,
    /// Concatenate incoming array elements before the existing ones.
    Prepend,
}

impl MergePolicy {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "replace" => Some(Self::Replace),
            "keep" => Some(Self::Keep),
            "fail" => Some(Self::Fail),
            "clear" => Some(Self::Clear),
            "splice" => Some(Self::Splice),
            "append" => Some(Self::Append),
            "prepend" => Some(Self::Prepend),
            _ => None,
        }
    }

    /// The directive name as it appears in source keys.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Keep => "keep",
            Self::Fail => "fail",
            Self::Clear => "clear",
            Self::Splice => "splice",
            Self::Append => "append",
            Self::Prepend => "prepend",
        }
    }
}

/// Directives attached to one decoded key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct DirectiveSet {
    /// Merge policy override, if any.
    pub policy: Option<MergePolicy>,
    /// Whether the value and its descendants are redacted on output.
    pub secret: bool,
}

impl DirectiveSet {
    /// Whether no directive was given.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.policy.is_none() && !self.secret
    }
}

/// Errors raised while parsing a directive block.
#[derive(Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum DirectiveError {
    /// The block named a directive this engine does not recognize.
    #[error("unknown directive '{name}'")]
    Unknown {
        /// The unrecognized directive text.
        name: String,
    },

    /// More than two directives were given.
    #[error("at most two directives are permitted, found {count}")]
    TooMany {
        /// Number of directives found.
        count: usize,
    },

    /// Two directives were given but they do not pair a policy with
    /// `secret`.
    #[error("directives '{first}' and '{second}' cannot be combined; pair one policy with 'secret'")]
    Conflicting {
        /// The directive seen first.
        first: String,
        /// The directive that clashed with it.
        second: String,
    },

    /// The instruction block contained no directives.
    #[error("empty directive block")]
    Empty,
}

const OPEN: &str = "((";
const CLOSE: &str = "))";

/// Split a raw decoded key into its clean name and directive set.
///
/// A key without a well-formed trailing instruction block is returned
/// verbatim with an empty [`DirectiveSet`]; a key containing `((` that does
/// not terminate in `))` is treated as a literal key rather than an error.
/// Whitespace between directives is insignificant, and directives may be
/// separated by commas or spaces.
///
/// # Errors
///
/// Returns a [`DirectiveError`] when the block names an unknown directive,
/// contains more than two directives, combines two directives without one
/// of them being `secret`, or is empty.
///
/// # Examples
///
/// ```
/// use conflux::{MergePolicy, parse_key};
///
/// let (key, directives) = parse_key("retries((replace))")?;
/// assert_eq!(key, "retries");
/// assert_eq!(directives.policy, Some(MergePolicy::Replace));
/// assert!(!directives.secret);
///
/// let (key, directives) = parse_key("plain")?;
/// assert_eq!(key, "plain");
/// assert!(directives.is_empty());
/// # Ok::<_, conflux::DirectiveError>(())
/// ```
pub fn parse_key(raw: &str) -> Result<(String, DirectiveSet), DirectiveError> {
    let Some(open_at) = raw.find(OPEN) else {
        return Ok((raw.to_owned(), DirectiveSet::default()));
    };
    if !raw.ends_with(CLOSE) {
        return Ok((raw.to_owned(), DirectiveSet::default()));
    }
    let block = raw
        .get(open_at + OPEN.len()..raw.len() - CLOSE.len())
        .unwrap_or("");
    let directives = parse_block(block)?;
    let clean = raw.get(..open_at).unwrap_or("").trim_end().to_owned();
    Ok((clean, directives))
}

fn parse_block(block: &str) -> Result<DirectiveSet, DirectiveError> {
    let tokens: Vec<&str> = block
        .split([',', ' '])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .collect();
    if tokens.is_empty() {
        return Err(DirectiveError::Empty);
    }
    if tokens.len() > 2 {
        return Err(DirectiveError::TooMany {
            count: tokens.len(),
        });
    }
    let mut set = DirectiveSet::default();
    for token in tokens {
        apply_token(&mut set, token)?;
    }
    Ok(set)
}

fn apply_token(set: &mut DirectiveSet, token: &str) -> Result<(), DirectiveError> {
    if token == "secret" {
        if set.secret {
            return Err(DirectiveError::Conflicting {
                first: "secret".to_owned(),
                second: "secret".to_owned(),
            });
        }
        set.secret = true;
        return Ok(());
    }
    let policy = MergePolicy::parse(token).ok_or_else(|| DirectiveError::Unknown {
        name: token.to_owned(),
    })?;
    if let Some(previous) = set.policy {
        return Err(DirectiveError::Conflicting {
            first: previous.as_str().to_owned(),
            second: policy.as_str().to_owned(),
        });
    }
    set.policy = Some(policy);
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::{Result, ensure};
    use rstest::rstest;

    use super::{DirectiveError, MergePolicy, parse_key};

    #[rstest]
    #[case::replace("b((replace))", "b", MergePolicy::Replace)]
    #[case::keep("b((keep))", "b", MergePolicy::Keep)]
    #[case::fail("b((fail))", "b", MergePolicy::Fail)]
    #[case::clear("b((clear))", "b", MergePolicy::Clear)]
    #[case::splice("b((splice))", "b", MergePolicy::Splice)]
    #[case::append("items((append))", "items", MergePolicy::Append)]
    #[case::prepend("items((prepend))", "items", MergePolicy::Prepend)]
    #[case::padded("b(( replace ))", "b", MergePolicy::Replace)]
    fn recognizes_single_policies(
        #[case] raw: &str,
        #[case] expected_key: &str,
        #[case] expected: MergePolicy,
    ) -> Result<()> {
        let (key, directives) = parse_key(raw)?;
        ensure!(key == expected_key, "unexpected key {key}");
        ensure!(directives.policy == Some(expected), "unexpected policy");
        ensure!(!directives.secret, "secret should be unset");
        Ok(())
    }

    #[rstest]
    #[case::comma("token((replace, secret))")]
    #[case::space("token((replace secret))")]
    #[case::reversed("token((secret, replace))")]
    fn pairs_policy_with_secret(#[case] raw: &str) -> Result<()> {
        let (key, directives) = parse_key(raw)?;
        ensure!(key == "token", "unexpected key {key}");
        ensure!(directives.policy == Some(MergePolicy::Replace), "policy lost");
        ensure!(directives.secret, "secret flag lost");
        Ok(())
    }

    #[test]
    fn secret_alone_sets_only_the_flag() -> Result<()> {
        let (_, directives) = parse_key("password((secret))")?;
        ensure!(directives.policy.is_none(), "policy should be unset");
        ensure!(directives.secret, "secret flag lost");
        Ok(())
    }

    #[test]
    fn rejects_unknown_directives() -> Result<()> {
        let error = parse_key("b((overwrite))").err();
        ensure!(
            matches!(error, Some(DirectiveError::Unknown { ref name }) if name == "overwrite"),
            "expected unknown-directive error, got {error:?}"
        );
        Ok(())
    }

    #[test]
    fn rejects_two_policies() -> Result<()> {
        let error = parse_key("b((replace, keep))").err();
        ensure!(
            matches!(error, Some(DirectiveError::Conflicting { .. })),
            "expected conflicting-directive error, got {error:?}"
        );
        Ok(())
    }

    #[test]
    fn rejects_more_than_two_directives() -> Result<()> {
        let error = parse_key("b((replace, secret, keep))").err();
        ensure!(
            matches!(error, Some(DirectiveError::TooMany { count: 3 })),
            "expected too-many error, got {error:?}"
        );
        Ok(())
    }

    #[test]
    fn rejects_empty_block() -> Result<()> {
        let error = parse_key("b(())").err();
        ensure!(
            matches!(error, Some(DirectiveError::Empty)),
            "expected empty-block error, got {error:?}"
        );
        Ok(())
    }

    #[rstest]
    #[case::no_block("plain")]
    #[case::unterminated("odd((replace")]
    #[case::interior("weird((x))suffix")]
    fn leaves_literal_keys_untouched(#[case] raw: &str) -> Result<()> {
        let (key, directives) = parse_key(raw)?;
        ensure!(key == raw, "key was altered: {key}");
        ensure!(directives.is_empty(), "directives should be empty");
        Ok(())
    }
}
