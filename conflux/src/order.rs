//! Record ordering strategies.
//!
//! One total order over record names is selected per compiler instance and
//! applied, with a stable sort, to all non-default records before merging.
//! Default records never pass through the comparator.

use std::cmp::Ordering;
use std::sync::Arc;

/// Caller-supplied comparator for [`RecordOrdering::Custom`].
///
/// Must implement a strict weak ordering; ties are broken by registration
/// order thanks to the stable sort.
pub type Comparator = Arc<dyn Fn(&str, &str) -> Ordering + Send + Sync>;

/// Total order applied to record names before merge.
#[derive(Clone, Default)]
pub enum RecordOrdering {
    /// Byte-wise string comparison.
    #[default]
    Lexical,
    /// Human-friendly ordering where numeric runs compare as magnitudes,
    /// so `2.yml` sorts before `10.yml`.
    Natural,
    /// Caller-supplied comparator.
    Custom(Comparator),
}

impl std::fmt::Debug for RecordOrdering {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexical => f.write_str("Lexical"),
            Self::Natural => f.write_str("Natural"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl RecordOrdering {
    /// Compare two record names under this ordering.
    #[must_use]
    pub fn compare(&self, left: &str, right: &str) -> Ordering {
        match self {
            Self::Lexical => left.cmp(right),
            Self::Natural => natural_cmp(left, right),
            Self::Custom(comparator) => comparator(left, right),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Run<'a> {
    Text(&'a str),
    Number(&'a str),
}

/// Compare two names naturally: alternating non-numeric/numeric runs,
/// numeric runs by magnitude with leading zeros stripped, non-numeric runs
/// case-normalized, and the shorter run list ordering first when all
/// shared runs tie.
#[must_use]
pub fn natural_cmp(left: &str, right: &str) -> Ordering {
    let left_runs = runs(left);
    let right_runs = runs(right);
    for (a, b) in left_runs.iter().zip(&right_runs) {
        let ordering = match (a, b) {
            (Run::Number(x), Run::Number(y)) => compare_magnitudes(x, y),
            (Run::Text(x), Run::Text(y)) => compare_caseless(x, y),
            (Run::Number(_), Run::Text(_)) => Ordering::Less,
            (Run::Text(_), Run::Number(_)) => Ordering::Greater,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left_runs.len().cmp(&right_runs.len())
}

fn runs(name: &str) -> Vec<Run<'_>> {
    let mut result = Vec::new();
    let mut start = 0;
    let mut numeric: Option<bool> = None;
    for (index, ch) in name.char_indices() {
        let digit = ch.is_ascii_digit();
        match numeric {
            None => numeric = Some(digit),
            Some(current) if current != digit => {
                if let Some(run) = name.get(start..index) {
                    result.push(if current {
                        Run::Number(run)
                    } else {
                        Run::Text(run)
                    });
                }
                start = index;
                numeric = Some(digit);
            }
            Some(_) => {}
        }
    }
    if let Some(current) = numeric
        && let Some(run) = name.get(start..)
    {
        result.push(if current {
            Run::Number(run)
        } else {
            Run::Text(run)
        });
    }
    result
}

fn compare_magnitudes(left: &str, right: &str) -> Ordering {
    let stripped_left = left.trim_start_matches('0');
    let stripped_right = right.trim_start_matches('0');
    stripped_left
        .len()
        .cmp(&stripped_right.len())
        .then_with(|| stripped_left.cmp(stripped_right))
}

fn compare_caseless(left: &str, right: &str) -> Ordering {
    let mut left_chars = left.chars().flat_map(char::to_lowercase);
    let mut right_chars = right.chars().flat_map(char::to_lowercase);
    loop {
        match (left_chars.next(), right_chars.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(a), Some(b)) => {
                let ordering = a.cmp(&b);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}
