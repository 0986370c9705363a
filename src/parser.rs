//! Command-line tokenizing and flag parsing.
//!
//! Only syntax is handled here. Whether a subcommand exists or a flag makes
//! sense is decided by the executor.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// How runs of whitespace between tokens are treated.
///
/// The policy is chosen once per session and applies to every line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhitespacePolicy {
    /// Consecutive whitespace collapses into one separator.
    #[default]
    Lenient,
    /// Consecutive unquoted whitespace inside the line is rejected.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    UnterminatedQuote { quote: char },
    /// 1-based character column of the second whitespace character.
    ConsecutiveWhitespace { column: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => write!(f, "error: empty command"),
            ParseError::UnterminatedQuote { quote } => {
                write!(f, "error: unterminated quote ({}) in command", quote)
            }
            ParseError::ConsecutiveWhitespace { column } => write!(
                f,
                "error: unexpected extra whitespace at column {} (separate words with a single space)",
                column
            ),
        }
    }
}

impl std::error::Error for ParseError {}

/// Value attached to a flag: either an explicit value or a bare switch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    Value(String),
    Switch,
}

impl FlagValue {
    pub fn as_value(&self) -> Option<&str> {
        match self {
            FlagValue::Value(v) => Some(v),
            FlagValue::Switch => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub subcommand: Option<String>,
    pub args: Vec<String>,
    pub flags: BTreeMap<String, FlagValue>,
}

impl ParsedCommand {
    pub fn is_git(&self) -> bool {
        self.command == "git"
    }

    pub fn flag(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    /// First flag present among `names`, in the order given.
    pub fn any_flag(&self, names: &[&str]) -> Option<&FlagValue> {
        names.iter().find_map(|name| self.flags.get(*name))
    }

    pub fn has_flag(&self, name: &str) -> bool {
        self.flags.contains_key(name)
    }
}

#[derive(Debug)]
struct Token {
    text: String,
    /// The token opened with a quote, so a leading '-' is content.
    quoted: bool,
}

impl Token {
    fn is_flag_like(&self) -> bool {
        !self.quoted && self.text.len() > 1 && self.text.starts_with('-')
    }
}

/// Parse one line of terminal input.
pub fn parse(input: &str, policy: WhitespacePolicy) -> Result<ParsedCommand, ParseError> {
    let tokens = tokenize(input, policy)?;
    let mut tokens = tokens.into_iter();
    let command = match tokens.next() {
        Some(token) => token.text.to_lowercase(),
        None => return Err(ParseError::Empty),
    };

    if command != "git" {
        return Ok(ParsedCommand {
            command,
            subcommand: None,
            args: tokens.map(|t| t.text).collect(),
            flags: BTreeMap::new(),
        });
    }

    let subcommand = tokens.next().map(|t| t.text.to_lowercase());
    let (args, flags) = scan_arguments(tokens.collect());

    Ok(ParsedCommand {
        command,
        subcommand,
        args,
        flags,
    })
}

fn scan_arguments(tokens: Vec<Token>) -> (Vec<String>, BTreeMap<String, FlagValue>) {
    let mut args = Vec::new();
    let mut flags = BTreeMap::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if token.quoted {
            args.push(token.text);
            continue;
        }

        let name = if let Some(long) = token.text.strip_prefix("--") {
            if long.is_empty() {
                args.push(token.text);
                continue;
            }
            if let Some((name, value)) = long.split_once('=') {
                flags.insert(name.to_string(), FlagValue::Value(value.to_string()));
                continue;
            }
            long.to_string()
        } else if token.text.starts_with('-') && token.text.chars().count() == 2 {
            token.text[1..].to_string()
        } else {
            args.push(token.text);
            continue;
        };

        let value = match iter.peek() {
            Some(next) if !next.is_flag_like() => iter
                .next()
                .map(|t| FlagValue::Value(t.text))
                .unwrap_or(FlagValue::Switch),
            _ => FlagValue::Switch,
        };
        flags.insert(name, value);
    }

    (args, flags)
}

fn tokenize(input: &str, policy: WhitespacePolicy) -> Result<Vec<Token>, ParseError> {
    let leading = input.chars().take_while(|c| c.is_whitespace()).count();
    let trimmed = input.trim();

    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quoted = false;
    let mut quote: Option<char> = None;
    let mut previous_was_space = false;

    for (i, ch) in trimmed.chars().enumerate() {
        if let Some(open) = quote {
            if ch == open {
                quote = None;
            } else {
                current.push(ch);
            }
            continue;
        }

        match ch {
            '"' | '\'' => {
                quote = Some(ch);
                if !in_token {
                    quoted = true;
                }
                in_token = true;
                previous_was_space = false;
            }
            c if c.is_whitespace() => {
                if previous_was_space && policy == WhitespacePolicy::Strict {
                    return Err(ParseError::ConsecutiveWhitespace {
                        column: leading + i + 1,
                    });
                }
                previous_was_space = true;
                if in_token {
                    tokens.push(Token {
                        text: std::mem::take(&mut current),
                        quoted,
                    });
                    in_token = false;
                    quoted = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
                previous_was_space = false;
            }
        }
    }

    if let Some(open) = quote {
        return Err(ParseError::UnterminatedQuote { quote: open });
    }
    if in_token {
        tokens.push(Token {
            text: current,
            quoted,
        });
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lenient(input: &str) -> ParsedCommand {
        parse(input, WhitespacePolicy::Lenient).expect("parse ok")
    }

    #[test]
    fn test_rejects_empty_input() {
        assert_eq!(
            parse("   ", WhitespacePolicy::Lenient),
            Err(ParseError::Empty)
        );
    }

    #[test]
    fn test_system_command_keeps_dashes_as_args() {
        let cmd = lenient("touch -x README.md");
        assert_eq!(cmd.command, "touch");
        assert_eq!(cmd.subcommand, None);
        assert_eq!(cmd.args, vec!["-x", "README.md"]);
        assert!(cmd.flags.is_empty());
    }

    #[test]
    fn test_git_subcommand_is_lowercased() {
        let cmd = lenient("GIT Status");
        assert!(cmd.is_git());
        assert_eq!(cmd.subcommand.as_deref(), Some("status"));
    }

    #[test]
    fn test_bare_git_has_no_subcommand() {
        let cmd = lenient("git");
        assert!(cmd.is_git());
        assert_eq!(cmd.subcommand, None);
    }

    #[test]
    fn test_short_flag_consumes_quoted_value() {
        let cmd = lenient(r#"git commit -m "Initial commit""#);
        assert_eq!(
            cmd.flag("m"),
            Some(&FlagValue::Value("Initial commit".to_string()))
        );
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn test_short_flag_without_value_is_switch() {
        let cmd = lenient("git checkout -b");
        assert_eq!(cmd.flag("b"), Some(&FlagValue::Switch));
    }

    #[test]
    fn test_short_flag_does_not_consume_following_flag() {
        let cmd = lenient("git log -n --oneline");
        assert_eq!(cmd.flag("n"), Some(&FlagValue::Switch));
        assert_eq!(cmd.flag("oneline"), Some(&FlagValue::Switch));
    }

    #[test]
    fn test_long_flag_with_equals() {
        let cmd = lenient("git commit --message=fix=typo");
        assert_eq!(
            cmd.flag("message"),
            Some(&FlagValue::Value("fix=typo".to_string()))
        );
    }

    #[test]
    fn test_long_flag_with_equals_and_quoted_value() {
        let cmd = lenient(r#"git commit --message="a b""#);
        assert_eq!(cmd.flag("message").and_then(|v| v.as_value()), Some("a b"));
        assert!(cmd.args.is_empty());

        let cmd = lenient("git commit --message='x'");
        assert_eq!(cmd.flag("message").and_then(|v| v.as_value()), Some("x"));
    }

    #[test]
    fn test_quoted_token_with_equals_stays_positional() {
        let cmd = lenient(r#"git add "--message=x""#);
        assert_eq!(cmd.args, vec!["--message=x"]);
        assert!(cmd.flags.is_empty());
    }

    #[test]
    fn test_long_flag_consumes_next_token() {
        let cmd = lenient("git commit --message wip");
        assert_eq!(cmd.flag("message").and_then(|v| v.as_value()), Some("wip"));
    }

    #[test]
    fn test_multi_letter_single_dash_is_positional() {
        let cmd = lenient("git commit -am");
        assert_eq!(cmd.args, vec!["-am"]);
        assert!(cmd.flags.is_empty());
    }

    #[test]
    fn test_quoted_dash_value_is_not_a_flag() {
        let cmd = lenient(r#"git commit -m "-wip""#);
        assert_eq!(cmd.flag("m").and_then(|v| v.as_value()), Some("-wip"));
    }

    #[test]
    fn test_positional_and_flags_mixed() {
        let cmd = lenient("git add . --verbose");
        assert_eq!(cmd.args, vec!["."]);
        assert!(cmd.has_flag("verbose"));
    }

    #[test]
    fn test_lenient_collapses_whitespace() {
        assert_eq!(lenient("git   add    a.txt"), lenient("git add a.txt"));
    }

    #[test]
    fn test_strict_accepts_single_spaces_and_trims_edges() {
        let cmd = parse("  git add a.txt  ", WhitespacePolicy::Strict).expect("parse ok");
        assert_eq!(cmd.args, vec!["a.txt"]);
    }

    #[test]
    fn test_strict_rejects_consecutive_whitespace() {
        assert_eq!(
            parse("git  status", WhitespacePolicy::Strict),
            Err(ParseError::ConsecutiveWhitespace { column: 5 })
        );
    }

    #[test]
    fn test_strict_ignores_whitespace_inside_quotes() {
        let cmd = parse(r#"git commit -m "two  spaces""#, WhitespacePolicy::Strict)
            .expect("parse ok");
        assert_eq!(
            cmd.flag("m").and_then(|v| v.as_value()),
            Some("two  spaces")
        );
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(
            parse("git commit -m 'oops", WhitespacePolicy::Lenient),
            Err(ParseError::UnterminatedQuote { quote: '\'' })
        );
    }

    #[test]
    fn test_any_flag_prefers_first_name() {
        let cmd = lenient("git commit --message long -m short");
        assert_eq!(
            cmd.any_flag(&["m", "message"]).and_then(|v| v.as_value()),
            Some("short")
        );
    }
}
