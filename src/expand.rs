// Copyright 2014-2015 The Rust Project Developers. See the COPYRIGHT
// file at the top-level directory of this distribution and at
// http://rust-lang.org/COPYRIGHT.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Rewrite templates.
//!
//! A template is literal text in which `\0` through `\9` stand for the
//! corresponding capture group (`\0` is the whole match) and `\\` stands for
//! a single backslash. Nothing else may follow a backslash.

use memchr::memchr;

use crate::error::RewriteError;

/// Returns the largest group number referenced by `rewrite`, or `0` if it
/// references none.
///
/// Malformed escapes are ignored here; `check` reports them.
pub fn max_submatch(rewrite: &[u8]) -> usize {
    let mut max = 0;
    let mut rest = rewrite;
    while let Some(i) = memchr(b'\\', rest) {
        match rest.get(i + 1) {
            Some(&b) if b.is_ascii_digit() => {
                max = std::cmp::max(max, (b - b'0') as usize);
                rest = &rest[i + 2..];
            }
            Some(_) => rest = &rest[i + 2..],
            None => break,
        }
    }
    max
}

/// Checks that `rewrite` is well formed and refers to no more than `groups`
/// capturing groups.
pub fn check(rewrite: &[u8], groups: usize) -> Result<(), RewriteError> {
    let mut max = 0;
    let mut rest = rewrite;
    while let Some(i) = memchr(b'\\', rest) {
        match rest.get(i + 1) {
            None => return Err(RewriteError::TrailingBackslash),
            Some(&b'\\') => {}
            Some(&b) if b.is_ascii_digit() => {
                max = std::cmp::max(max, (b - b'0') as usize);
            }
            Some(_) => return Err(RewriteError::BadEscape),
        }
        rest = &rest[i + 2..];
    }
    if max > groups {
        return Err(RewriteError::TooManyGroups {
            requested: max,
            available: groups,
        });
    }
    Ok(())
}

/// Appends `rewrite` to `dst`, with every `\N` replaced by `groups[N]`.
///
/// A group that didn't participate in the match expands to nothing. On
/// error, `dst` may hold a partial expansion.
pub fn expand(
    dst: &mut Vec<u8>,
    mut rewrite: &[u8],
    groups: &[Option<&[u8]>],
) -> Result<(), RewriteError> {
    while let Some(i) = memchr(b'\\', rewrite) {
        dst.extend_from_slice(&rewrite[..i]);
        match rewrite.get(i + 1) {
            None => return Err(RewriteError::TrailingBackslash),
            Some(&b'\\') => dst.push(b'\\'),
            Some(&b) if b.is_ascii_digit() => {
                let group = (b - b'0') as usize;
                match groups.get(group) {
                    None => {
                        return Err(RewriteError::InvalidSubstitution {
                            group,
                            groups: groups.len(),
                        })
                    }
                    Some(text) => dst.extend_from_slice(text.unwrap_or(b"")),
                }
            }
            Some(_) => return Err(RewriteError::BadEscape),
        }
        rewrite = &rewrite[i + 2..];
    }
    dst.extend_from_slice(rewrite);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check, expand, max_submatch};
    use crate::error::RewriteError;

    fn expand_to_vec(
        rewrite: &str,
        groups: &[Option<&str>],
    ) -> Result<String, RewriteError> {
        let groups: Vec<Option<&[u8]>> =
            groups.iter().map(|g| g.map(|g| g.as_bytes())).collect();
        let mut dst = vec![];
        expand(&mut dst, rewrite.as_bytes(), &groups)?;
        Ok(String::from_utf8(dst).unwrap())
    }

    #[test]
    fn max_submatch_counts_digits() {
        assert_eq!(max_submatch(b"foo \\2,\\1"), 2);
        assert_eq!(max_submatch(b"\\0"), 0);
        assert_eq!(max_submatch(b"no refs"), 0);
        assert_eq!(max_submatch(b"\\\\9"), 0);
        assert_eq!(max_submatch(b"trailing \\"), 0);
    }

    #[test]
    fn check_rewrite() {
        assert_eq!(check(b"\\1-\\\\", 1), Ok(()));
        assert_eq!(
            check(b"abc\\", 1),
            Err(RewriteError::TrailingBackslash)
        );
        assert_eq!(check(b"\\x", 1), Err(RewriteError::BadEscape));
        assert_eq!(
            check(b"\\2", 1),
            Err(RewriteError::TooManyGroups { requested: 2, available: 1 })
        );
    }

    #[test]
    fn expand_groups() {
        let groups = [Some("ab"), Some("a"), None];
        assert_eq!(
            expand_to_vec("[\\1|\\2|\\0]", &groups).unwrap(),
            "[a||ab]"
        );
        assert_eq!(expand_to_vec("a\\\\b", &groups).unwrap(), "a\\b");
        assert_eq!(
            expand_to_vec("\\3", &groups),
            Err(RewriteError::InvalidSubstitution { group: 3, groups: 3 })
        );
        assert_eq!(
            expand_to_vec("\\", &groups),
            Err(RewriteError::TrailingBackslash)
        );
    }
}
