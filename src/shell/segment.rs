//! Compound command splitting.
//!
//! Splits a command line on top-level control operators (`&&`, `||`, `;`,
//! `|`, `&`, newline). Single and double quotes are honored so an operator
//! inside a quoted argument does not split; nothing else of the shell
//! grammar is. Subshells, heredocs and `$(...)` are left inside their
//! segment, where the classifier treats them conservatively.

#[derive(Clone, Copy, PartialEq)]
enum Quote {
    None,
    Single,
    Double,
}

/// Split `command` into trimmed, non-empty segments.
pub fn split_segments(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut quote = Quote::None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        let prev = i.checked_sub(1).map(|p| chars[p]);

        match quote {
            Quote::Single => {
                if c == '\'' {
                    quote = Quote::None;
                }
                current.push(c);
                i += 1;
                continue;
            }
            Quote::Double => {
                if c == '\\' {
                    current.push(c);
                    if let Some(n) = next {
                        current.push(n);
                    }
                    i += 2;
                    continue;
                }
                if c == '"' {
                    quote = Quote::None;
                }
                current.push(c);
                i += 1;
                continue;
            }
            Quote::None => {}
        }

        match c {
            '\\' => {
                current.push(c);
                if let Some(n) = next {
                    current.push(n);
                }
                i += 2;
            }
            '\'' => {
                quote = Quote::Single;
                current.push(c);
                i += 1;
            }
            '"' => {
                quote = Quote::Double;
                current.push(c);
                i += 1;
            }
            ';' | '\n' => {
                push_segment(&mut segments, &mut current);
                i += 1;
            }
            '&' => {
                if next == Some('&') {
                    push_segment(&mut segments, &mut current);
                    i += 2;
                } else if matches!(prev, Some('>') | Some('<')) || next == Some('>') {
                    // `2>&1`, `<&0`, `&>file`
                    current.push(c);
                    i += 1;
                } else {
                    push_segment(&mut segments, &mut current);
                    i += 1;
                }
            }
            '|' => {
                if next == Some('|') {
                    push_segment(&mut segments, &mut current);
                    i += 2;
                } else if prev == Some('>') {
                    // `>|` clobber redirect
                    current.push(c);
                    i += 1;
                } else if next == Some('&') {
                    push_segment(&mut segments, &mut current);
                    i += 2;
                } else {
                    push_segment(&mut segments, &mut current);
                    i += 1;
                }
            }
            _ => {
                current.push(c);
                i += 1;
            }
        }
    }

    push_segment(&mut segments, &mut current);
    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_command() {
        assert_eq!(split_segments("ls -la"), vec!["ls -la"]);
    }

    #[test]
    fn test_control_operators() {
        assert_eq!(
            split_segments("echo hi && curl http://x || true; pwd"),
            vec!["echo hi", "curl http://x", "true", "pwd"]
        );
    }

    #[test]
    fn test_pipes_and_background() {
        assert_eq!(
            split_segments("cat a | grep b & sleep 1"),
            vec!["cat a", "grep b", "sleep 1"]
        );
        assert_eq!(split_segments("make |& tee log"), vec!["make", "tee log"]);
    }

    #[test]
    fn test_newlines_split() {
        assert_eq!(split_segments("cd /tmp\nls\n\n"), vec!["cd /tmp", "ls"]);
    }

    #[test]
    fn test_redirects_not_split() {
        assert_eq!(
            split_segments("cargo test 2>&1 && echo done"),
            vec!["cargo test 2>&1", "echo done"]
        );
        assert_eq!(split_segments("make &>build.log"), vec!["make &>build.log"]);
        assert_eq!(split_segments("echo x >| out"), vec!["echo x >| out"]);
    }

    #[test]
    fn test_quotes_protect_operators() {
        assert_eq!(
            split_segments(r#"echo "a && b" ; echo 'c | d'"#),
            vec![r#"echo "a && b""#, "echo 'c | d'"]
        );
    }

    #[test]
    fn test_escaped_operator() {
        assert_eq!(split_segments(r"echo a \; b"), vec![r"echo a \; b"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(split_segments("").is_empty());
        assert!(split_segments("  ;; && ").is_empty());
    }
}
