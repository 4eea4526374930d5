//! Credential scrubbing for captured output.

use std::borrow::Cow;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

/// Fixed mask substituted for the secret, independent of its length.
pub const MASK: &str = "********************";

/// Replaces every literal occurrence of the session secret with [`MASK`].
///
/// Matching is a plain substring search: any text equal to the secret is
/// masked whether or not it was actually the credential.
#[derive(Default)]
pub struct Redactor {
    secret: Option<SecretString>,
}

impl Redactor {
    /// A redactor for `secret`. An empty secret disables redaction.
    pub fn new(secret: Option<SecretString>) -> Self {
        let secret = secret.filter(|s| !s.expose_secret().is_empty());
        Self { secret }
    }

    /// Whether a secret is held.
    pub fn is_active(&self) -> bool {
        self.secret.is_some()
    }

    /// Scrub the secret from `text`.
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        match &self.secret {
            Some(secret) if text.contains(secret.expose_secret()) => {
                Cow::Owned(text.replace(secret.expose_secret(), MASK))
            }
            _ => Cow::Borrowed(text),
        }
    }

    /// Scrub the secret from one read of a stream.
    ///
    /// `held` carries text between reads. It is prepended to `text`, and on
    /// return holds the tail of the result that could still be the start of
    /// the secret. The returned text includes that tail; callers release all
    /// but the last `held.len()` bytes until a later read settles it.
    pub fn redact_stream(&self, held: &mut String, text: &str) -> String {
        held.push_str(text);
        let redacted = self.redact(held).into_owned();
        let keep = self.partial_len(&redacted);
        held.clear();
        held.push_str(&redacted[redacted.len() - keep..]);
        redacted
    }

    /// Length of the longest proper prefix of the secret that ends `text`.
    fn partial_len(&self, text: &str) -> usize {
        let Some(secret) = self.secret() else {
            return 0;
        };
        (1..secret.len())
            .rev()
            .filter(|&n| secret.is_char_boundary(n))
            .find(|&n| text.ends_with(&secret[..n]))
            .unwrap_or(0)
    }

    /// The secret itself, for answering a password prompt.
    pub(crate) fn secret(&self) -> Option<&str> {
        self.secret.as_ref().map(|s| s.expose_secret())
    }
}

impl fmt::Debug for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Redactor")
            .field("active", &self.is_active())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor(secret: &str) -> Redactor {
        Redactor::new(Some(SecretString::from(secret.to_string())))
    }

    #[test]
    fn test_mask_is_twenty_asterisks() {
        assert_eq!(MASK.len(), 20);
        assert!(MASK.chars().all(|c| c == '*'));
    }

    #[test]
    fn test_redacts_secret_in_chunk() {
        let r = redactor("Sup3rSecret!");
        assert_eq!(
            r.redact("Enter Sup3rSecret! now"),
            "Enter ******************** now"
        );
    }

    #[test]
    fn test_mask_length_independent_of_secret() {
        let r = redactor("a-very-long-secret-that-exceeds-twenty-characters");
        assert_eq!(
            r.redact("[a-very-long-secret-that-exceeds-twenty-characters]"),
            format!("[{}]", MASK)
        );
        assert_eq!(redactor("pw").redact("pw"), MASK);
    }

    #[test]
    fn test_every_occurrence_replaced() {
        let r = redactor("abc");
        assert_eq!(r.redact("abc xabcx abc"), format!("{MASK} x{MASK}x {MASK}"));
    }

    #[test]
    fn test_untouched_without_secret() {
        let text = "firepower# ";
        assert!(matches!(Redactor::default().redact(text), Cow::Borrowed(_)));
        assert!(matches!(redactor("zzz").redact(text), Cow::Borrowed(_)));
    }

    #[test]
    fn test_stream_holds_back_partial_secret() {
        let r = redactor("Sup3rSecret!");
        let mut held = String::new();

        assert_eq!(r.redact_stream(&mut held, "echo Sup3r"), "echo Sup3r");
        assert_eq!(held, "Sup3r");

        let text = r.redact_stream(&mut held, "Secret!\nfw# ");
        assert_eq!(text, format!("{MASK}\nfw# "));
        assert!(held.is_empty());
    }

    #[test]
    fn test_stream_releases_fragment_that_is_not_secret() {
        let r = redactor("Sup3rSecret!");
        let mut held = String::new();

        r.redact_stream(&mut held, "Sup");
        assert_eq!(held, "Sup");
        assert_eq!(r.redact_stream(&mut held, "per\n"), "Supper\n");
        assert!(held.is_empty());
    }

    #[test]
    fn test_stream_without_secret_holds_nothing() {
        let mut held = String::new();
        let text = Redactor::default().redact_stream(&mut held, "firepower# ");
        assert_eq!(text, "firepower# ");
        assert!(held.is_empty());
    }

    #[test]
    fn test_empty_secret_disables_redaction() {
        let r = redactor("");
        assert!(!r.is_active());
        assert_eq!(r.redact("firepower# "), "firepower# ");
    }
}
