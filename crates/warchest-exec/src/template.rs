//! Positional `%s` substitution for command templates.

/// Substitute each `%s` in `template` with the next argument.
///
/// Placeholders without a matching argument are left in place; surplus
/// arguments are ignored.
pub fn render(template: &str, args: &[&str]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;

    while let Some(pos) = rest.find("%s") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("%s"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

/// Remove one pair of matching quotes wrapping the whole command.
///
/// Templates are often stored quoted (`'near validators current'`) so the
/// shell receives the inner text.
pub fn strip_wrapping_quotes(command: &str) -> &str {
    let trimmed = command.trim();
    for quote in ['\'', '"'] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_in_order() {
        let cmd = render("near call %s %s {\"amount\": \"%s\"} --accountId %s", &[
            "pool.betanet",
            "stake",
            "100",
            "alice.betanet",
        ]);
        assert_eq!(
            cmd,
            "near call pool.betanet stake {\"amount\": \"100\"} --accountId alice.betanet"
        );
    }

    #[test]
    fn render_without_placeholders() {
        assert_eq!(render("near validators current", &["unused"]), "near validators current");
    }

    #[test]
    fn render_keeps_unmatched_placeholders() {
        assert_eq!(render("ping %s %s", &["pool"]), "ping pool %s");
    }

    #[test]
    fn strip_single_and_double_quotes() {
        assert_eq!(strip_wrapping_quotes("'echo hi'"), "echo hi");
        assert_eq!(strip_wrapping_quotes("\"echo hi\""), "echo hi");
    }

    #[test]
    fn strip_leaves_unquoted_and_mismatched() {
        assert_eq!(strip_wrapping_quotes("echo hi"), "echo hi");
        assert_eq!(strip_wrapping_quotes("'echo hi\""), "'echo hi\"");
        assert_eq!(strip_wrapping_quotes("'"), "'");
    }
}
