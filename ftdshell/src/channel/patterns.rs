//! Expect patterns and prompt helpers.
//!
//! Every pattern is compiled case-insensitive and multi-line, so `$` anchors
//! at the end of any line of the searched text, not only the last one.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

/// Default prompt pattern: a line ending in `$`, `>` or `#` followed by at
/// most one whitespace character.
pub const DEFAULT_PROMPT: &str = r"(?:[$>#][\s]?)$";

/// Expect pattern for `enable` and `sudo su`: a password prompt or a `#` prompt.
pub const PASSWORD_OR_PRIVILEGED: &str = r"([Pp]assword:\s)|(?:#[\s]?)$";

/// Output check deciding whether a password must be answered.
pub const PASSWORD_PROMPT: &str = r"[Pp]assword: $";

/// Output check for an unprivileged `>` prompt, after which `enable` is needed.
pub const UNPRIVILEGED_PROMPT: &str = r"(?:>[\s]?$)";

/// Output check run after `expert`.
///
/// The unescaped `$` is an end-of-line anchor, so this matches any output;
/// `sudo su` is always attempted.
pub const EXPERT_SHELL: &str = r"(?:$[\s]?$)";

/// Compile `pattern` with the engine's matching flags.
pub fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
}

fn constant(pattern: &str) -> Regex {
    compile(pattern).expect("built-in pattern must compile")
}

pub(crate) static DEFAULT_PROMPT_RE: Lazy<Regex> = Lazy::new(|| constant(DEFAULT_PROMPT));
pub(crate) static PASSWORD_OR_PRIVILEGED_RE: Lazy<Regex> =
    Lazy::new(|| constant(PASSWORD_OR_PRIVILEGED));
pub(crate) static PASSWORD_PROMPT_RE: Lazy<Regex> = Lazy::new(|| constant(PASSWORD_PROMPT));
pub(crate) static UNPRIVILEGED_PROMPT_RE: Lazy<Regex> =
    Lazy::new(|| constant(UNPRIVILEGED_PROMPT));
pub(crate) static EXPERT_SHELL_RE: Lazy<Regex> = Lazy::new(|| constant(EXPERT_SHELL));

/// The final line of `output`, ignoring one trailing line terminator.
///
/// `"show\r\nfw# "` yields `"fw# "`; `"a\n\n"` yields `""`.
pub fn last_line(output: &str) -> &str {
    let trimmed = output
        .strip_suffix("\r\n")
        .or_else(|| output.strip_suffix('\n'))
        .or_else(|| output.strip_suffix('\r'))
        .unwrap_or(output);
    trimmed.rsplit(['\n', '\r']).next().unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompt_matches_common_prompts() {
        let re = &*DEFAULT_PROMPT_RE;
        assert!(re.is_match("device> "));
        assert!(re.is_match("firepower#"));
        assert!(re.is_match("[admin@fw ~]$ "));
        assert!(re.is_match("show version\r\nCisco Firepower\nfw> "));
        assert!(!re.is_match("no prompt here"));
        assert!(!re.is_match("fw>  "));
    }

    #[test]
    fn test_default_prompt_matches_any_line() {
        // multi-line: an earlier prompt line counts
        assert!(DEFAULT_PROMPT_RE.is_match("fw>\nstill booting"));
    }

    #[test]
    fn test_password_patterns() {
        assert!(PASSWORD_OR_PRIVILEGED_RE.is_match("Password: "));
        assert!(PASSWORD_OR_PRIVILEGED_RE.is_match("firepower# "));
        assert!(PASSWORD_PROMPT_RE.is_match("enable\r\nPassword: "));
        assert!(PASSWORD_PROMPT_RE.is_match("PASSWORD: "));
        assert!(!PASSWORD_PROMPT_RE.is_match("firepower# "));
    }

    #[test]
    fn test_unprivileged_prompt() {
        assert!(UNPRIVILEGED_PROMPT_RE.is_match("firepower> "));
        assert!(!UNPRIVILEGED_PROMPT_RE.is_match("firepower# "));
    }

    #[test]
    fn test_expert_shell_check_always_matches() {
        assert!(EXPERT_SHELL_RE.is_match("admin@firepower:~$ "));
        assert!(EXPERT_SHELL_RE.is_match("anything at all"));
        assert!(EXPERT_SHELL_RE.is_match(""));
    }

    #[test]
    fn test_compile_applies_flags() {
        let re = compile(r"^router#\s?$").unwrap();
        assert!(re.is_match("banner\nROUTER# "));
        assert!(compile("(unclosed").is_err());
    }

    #[test]
    fn test_last_line() {
        assert_eq!(last_line("show\r\nfw# "), "fw# ");
        assert_eq!(last_line("fw# "), "fw# ");
        assert_eq!(last_line("abc\n"), "abc");
        assert_eq!(last_line("abc\r\n"), "abc");
        assert_eq!(last_line("a\n\n"), "");
        assert_eq!(last_line(""), "");
    }
}
