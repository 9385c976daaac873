//! Structured view of a single shell segment.
//!
//! A segment is tokenized into words (quotes stripped, whitespace split),
//! leading `NAME=value` assignments are skipped, output redirections are
//! pulled out, and the rest becomes `Command { name, args, .. }`.

/// One parsed segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Final path component of the program word (`/usr/bin/git` → `git`).
    pub name: String,
    /// Program word as written.
    pub program: String,
    /// Argument words in order, redirections removed.
    pub args: Vec<String>,
    /// Output redirection targets (`> out.txt` → `out.txt`).
    pub redirects: Vec<String>,
    /// The raw segment contained `$(`, backticks, `<(` or `>(`.
    pub has_substitution: bool,
}

impl Command {
    /// Parse a segment. Returns `None` if nothing but assignments remain.
    pub fn parse(segment: &str) -> Option<Self> {
        let has_substitution = contains_substitution(segment);
        let words = tokenize(segment);

        let mut words = words.into_iter().skip_while(|w| is_assignment(w));

        let program = words.next()?;
        let name = program
            .rsplit('/')
            .next()
            .unwrap_or(program.as_str())
            .to_string();

        let mut args = Vec::new();
        let mut redirects = Vec::new();
        while let Some(word) = words.next() {
            match split_redirect(&word) {
                Some(Redirect::Output(target)) => {
                    let target = if target.is_empty() {
                        words.next().unwrap_or_default()
                    } else {
                        target
                    };
                    if !is_benign_target(&target) {
                        redirects.push(target);
                    }
                }
                Some(Redirect::Input(target)) => {
                    if target.is_empty() {
                        words.next();
                    }
                }
                None => args.push(word),
            }
        }

        Some(Self {
            name,
            program,
            args,
            redirects,
            has_substitution,
        })
    }

    /// Words starting with `-` (before any `--`).
    pub fn flags(&self) -> impl Iterator<Item = &str> {
        self.args
            .iter()
            .take_while(|a| a.as_str() != "--")
            .filter(|a| is_flag(a))
            .map(String::as_str)
    }

    /// Non-flag words, in order. Everything after `--` counts as an operand.
    pub fn operands(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut after_dashdash = false;
        for arg in &self.args {
            if !after_dashdash && arg == "--" {
                after_dashdash = true;
                continue;
            }
            if after_dashdash || !is_flag(arg) {
                out.push(arg.as_str());
            }
        }
        out
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags().any(|f| f == flag)
    }

    /// Whether any flag is one of `candidates`, or a `--name=value` form of one.
    pub fn has_any_flag(&self, candidates: &[&str]) -> bool {
        self.flags().any(|f| {
            let bare = f.split('=').next().unwrap_or(f);
            candidates.contains(&bare)
        })
    }

    /// Whether a short-flag cluster (`-rf`) or long flag sets `short`/`long`.
    pub fn has_short_or_long(&self, short: char, long: &str) -> bool {
        self.flags().any(|f| {
            if let Some(name) = f.strip_prefix("--") {
                name == long
            } else {
                f[1..].contains(short)
            }
        })
    }
}

enum Redirect {
    Output(String),
    Input(String),
}

fn is_flag(word: &str) -> bool {
    word.len() > 1 && word.starts_with('-')
}

fn is_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Recognize `>`, `>>`, `>|`, `N>`, `N>>`, `&>`, `&>>`, `<`, `N<`.
fn split_redirect(word: &str) -> Option<Redirect> {
    let rest = word.trim_start_matches(|c: char| c.is_ascii_digit());
    let rest = rest.strip_prefix('&').filter(|r| r.starts_with('>')).unwrap_or(rest);

    if let Some(after) = rest.strip_prefix('>') {
        let target = after.trim_start_matches(['>', '|']);
        return Some(Redirect::Output(target.to_string()));
    }
    if let Some(after) = rest.strip_prefix('<') {
        if after.starts_with('<') || after.starts_with('(') {
            // heredoc / process substitution: not a file read
            return None;
        }
        return Some(Redirect::Input(after.to_string()));
    }
    None
}

/// Redirect targets that never write to a real file.
fn is_benign_target(target: &str) -> bool {
    target.starts_with('&')
        || matches!(target, "/dev/null" | "/dev/stdout" | "/dev/stderr" | "/dev/tty")
}

/// Whether `segment` runs a substitution.
///
/// `$(` and backticks count outside single quotes, double-quoted text
/// included. `<(` and `>(` only count unquoted.
pub fn contains_substitution(segment: &str) -> bool {
    let chars: Vec<char> = segment.chars().collect();
    let mut quote: Option<char> = None;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => {
                i += 2;
                continue;
            }
            (_, '`') => return true,
            (_, '$') if next == Some('(') => return true,
            (Some('"'), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, '<') | (None, '>') if next == Some('(') => return true,
            (None, _) => {}
        }
        i += 1;
    }
    false
}

/// Whitespace tokenizer that strips quotes. Backslash escapes the next char.
fn tokenize(segment: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = segment.chars();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some('"') if c == '\\' => {
                if let Some(n) = chars.next() {
                    current.push(n);
                }
            }
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_word = true;
                }
                '\\' => {
                    if let Some(n) = chars.next() {
                        current.push(n);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    current.push(c);
                    in_word = true;
                }
            },
        }
    }
    if in_word {
        words.push(current);
    }
    words
}
