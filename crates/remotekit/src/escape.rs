//! Shell escaping for commands embedded in a double-quoted ssh argument

/// Escape a command for embedding inside `"..."` on a shell command line.
///
/// - `"`, `'`, `\` and `$` get a leading backslash
/// - each newline becomes `'\n'`, so the newline itself ends up single-quoted
/// - an empty input becomes `''` rather than disappearing
pub fn shell_escape(s: &str) -> String {
    if s.is_empty() {
        return "''".to_string();
    }

    let mut out = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        match c {
            '"' | '\'' | '\\' | '$' => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("'\n'"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escapes_special_characters() {
        assert_eq!(shell_escape(r#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(shell_escape("it's"), r"it\'s");
        assert_eq!(shell_escape(r"a\b"), r"a\\b");
        assert_eq!(shell_escape("$HOME"), r"\$HOME");
    }

    #[test]
    fn test_newlines_become_quoted() {
        assert_eq!(shell_escape("a\nb"), "a'\n'b");
    }

    #[test]
    fn test_empty_is_explicit() {
        assert_eq!(shell_escape(""), "''");
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(shell_escape("apt-get install -y git"), "apt-get install -y git");
    }

    #[cfg(unix)]
    fn shell_eval(escaped: &str) -> String {
        let script = format!("printf '%s' {escaped}");
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .unwrap();
        String::from_utf8(output.stdout).unwrap()
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_evaluation_restores_input() {
        let original = "a\"b'c\\d$e\nf";
        assert_eq!(shell_eval(&shell_escape(original)), original);
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_evaluation_of_empty_is_empty_argument() {
        let script = format!("set -- {}; echo $#", shell_escape(""));
        let output = std::process::Command::new("sh")
            .arg("-c")
            .arg(script)
            .output()
            .unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "1");
    }
}
