//! Chunk sanitization.
//!
//! A [`Sanitizer`] is a pure, total transform from one chunk to its normalized
//! form. The runner calls it concurrently from every worker, so implementations
//! must not hold mutable state.
//!
//! The default [`TabLowercase`] lowercases each character independently and
//! replaces every tab with [`TAB_REPLACEMENT`]. Because the mapping is applied
//! per character, `sanitize(a + b) == sanitize(a) + sanitize(b)` for any split that
//! keeps characters whole, so parallel chunks reassemble into exactly the text
//! a single serial pass produces.

/// Text substituted for every literal `\t`.
pub const TAB_REPLACEMENT: &str = "____";

/// Pure chunk-to-chunk transform.
pub trait Sanitizer: Send + Sync {
    /// Return the normalized form of `chunk`.
    fn sanitize(&self, chunk: &str) -> String;
}

/// Any `Fn(&str) -> String` is a sanitizer.
impl<F> Sanitizer for F
where
    F: Fn(&str) -> String + Send + Sync,
{
    fn sanitize(&self, chunk: &str) -> String {
        self(chunk)
    }
}

/// Lowercases text and replaces tabs with four underscores.
///
/// ```
/// use textbeam::sanitizer::{Sanitizer, TabLowercase};
///
/// assert_eq!(TabLowercase.sanitize("Hello\tWorld"), "hello____world");
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct TabLowercase;

impl Sanitizer for TabLowercase {
    fn sanitize(&self, chunk: &str) -> String {
        if chunk.is_ascii() {
            return sanitize_ascii(chunk);
        }
        let mut out = String::with_capacity(chunk.len());
        for c in chunk.chars() {
            if c == '\t' {
                out.push_str(TAB_REPLACEMENT);
            } else {
                out.extend(c.to_lowercase());
            }
        }
        out
    }
}

#[inline]
fn sanitize_ascii(chunk: &str) -> String {
    let tabs = chunk.bytes().filter(|&b| b == b'\t').count();
    let mut out = String::with_capacity(chunk.len() + tabs * (TAB_REPLACEMENT.len() - 1));
    for b in chunk.bytes() {
        if b == b'\t' {
            out.push_str(TAB_REPLACEMENT);
        } else {
            out.push(b.to_ascii_lowercase() as char);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_tabs() {
        assert_eq!(TabLowercase.sanitize("Hello\tWorld"), "hello____world");
        assert_eq!(TabLowercase.sanitize("123\t456"), "123____456");
        assert_eq!(TabLowercase.sanitize("\t\t"), "________");
        assert_eq!(TabLowercase.sanitize(""), "");
    }

    #[test]
    fn non_ascii_lowercasing() {
        assert_eq!(TabLowercase.sanitize("ÄÖÜ\tСЛОВО"), "äöü____слово");
        // Per-character: capital sigma always maps to σ, never to the final form.
        assert_eq!(TabLowercase.sanitize("ΟΔΟΣ"), "οδοσ");
    }

    #[test]
    fn idempotent() {
        for s in ["Hello\tWorld", "MiXeD\t\tCase ÆØÅ", "İstanbul", "", "\n\r\t "] {
            let once = TabLowercase.sanitize(s);
            assert_eq!(TabLowercase.sanitize(&once), once, "input {s:?}");
        }
    }

    #[test]
    fn distributes_over_concatenation() {
        let text = "Grüße\tAUS Köln\tΣΟΦΙΑ";
        let whole = TabLowercase.sanitize(text);
        for (split, _) in text.char_indices() {
            let (a, b) = text.split_at(split);
            let joined = TabLowercase.sanitize(a) + &TabLowercase.sanitize(b);
            assert_eq!(joined, whole, "split at {split}");
        }
    }

    #[test]
    fn closures_are_sanitizers() {
        let upper = |s: &str| s.to_uppercase();
        assert_eq!(upper.sanitize("abc"), "ABC");
    }
}
