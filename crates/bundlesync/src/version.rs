//! Dotted-numeric version ordering and release selection.

use std::cmp::Ordering;

/// Compare two dotted version strings component by component.
///
/// Components that are both numeric compare as integers (of any length), a
/// missing trailing component counts as `0`, anything else compares as text.
/// `"0.10.0" > "0.9.0"` and `"1.0" == "1.0.0"`.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<&str> = a.trim().split('.').collect();
    let right: Vec<&str> = b.trim().split('.').collect();
    let len = left.len().max(right.len());

    for i in 0..len {
        let l = left.get(i).copied().unwrap_or("0");
        let r = right.get(i).copied().unwrap_or("0");
        let ord = compare_component(l, r);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn compare_component(l: &str, r: &str) -> Ordering {
    if is_numeric(l) && is_numeric(r) {
        let l = l.trim_start_matches('0');
        let r = r.trim_start_matches('0');
        l.len().cmp(&r.len()).then_with(|| l.cmp(r))
    } else {
        l.cmp(r)
    }
}

/// Sort ascending by [`compare_versions`].
pub fn sort_versions<S: AsRef<str>>(versions: &mut [S]) {
    versions.sort_by(|a, b| compare_versions(a.as_ref(), b.as_ref()));
}

/// Pick the greatest entry of an ascending list that is `<= target`.
///
/// Returns `None` for an empty list or when every entry is newer than `target`.
pub fn find_closest_version<'a, S: AsRef<str>>(sorted: &'a [S], target: &str) -> Option<&'a str> {
    for (i, v) in sorted.iter().enumerate() {
        match compare_versions(target, v.as_ref()) {
            Ordering::Equal => return Some(v.as_ref()),
            Ordering::Less => {
                return if i == 0 {
                    None
                } else {
                    Some(sorted[i - 1].as_ref())
                };
            }
            Ordering::Greater => {}
        }
    }
    sorted.last().map(|v| v.as_ref())
}
