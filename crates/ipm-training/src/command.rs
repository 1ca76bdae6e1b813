//! Structured shell commands.
//!
//! Every external invocation is assembled as a [`ShellCommand`] value and only
//! flattened into a `sh -c` string by the runner at execution time.

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Operator(&'static str),
}

/// A program, its arguments, and optional pipe / redirect operators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    tokens: Vec<Token>,
}

impl ShellCommand {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self { tokens: vec![Token::Word(program.into())] }
    }

    /// Shorthand for a program given as a filesystem path.
    #[must_use]
    pub fn from_path(program: &Path) -> Self {
        Self::new(program.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.tokens.push(Token::Word(arg.into()));
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tokens.extend(args.into_iter().map(|a| Token::Word(a.into())));
        self
    }

    /// Embed another command as a single argument (e.g. a streaming mapper).
    #[must_use]
    pub fn nested(self, command: &ShellCommand) -> Self {
        self.arg(command.to_shell_string())
    }

    /// `self | next`
    #[must_use]
    pub fn pipe(mut self, next: ShellCommand) -> Self {
        self.tokens.push(Token::Operator("|"));
        self.tokens.extend(next.tokens);
        self
    }

    /// `self > path`
    #[must_use]
    pub fn redirect_stdout(mut self, path: &Path) -> Self {
        self.tokens.push(Token::Operator(">"));
        self.tokens.push(Token::Word(path.to_string_lossy().into_owned()));
        self
    }

    #[must_use]
    pub fn program(&self) -> &str {
        match self.tokens.first() {
            Some(Token::Word(w)) => w,
            _ => "",
        }
    }

    /// Plain words in order, operators excluded.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Word(w) => Some(w.as_str()),
            Token::Operator(_) => None,
        })
    }

    /// The word following the first occurrence of `flag`, if any.
    #[must_use]
    pub fn value_of(&self, flag: &str) -> Option<&str> {
        let mut words = self.words();
        while let Some(word) = words.next() {
            if word == flag {
                return words.next();
            }
        }
        None
    }

    #[must_use]
    pub fn has_word(&self, word: &str) -> bool {
        self.words().any(|w| w == word)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.program().trim().is_empty()
    }

    #[must_use]
    pub fn to_shell_string(&self) -> String {
        self.tokens
            .iter()
            .map(|t| match t {
                Token::Word(w) => quote(w),
                Token::Operator(op) => Cow::Borrowed(*op),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_shell_string())
    }
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ',' | '@' | '%' | '+')
}

/// Single-quote `word` for POSIX `sh` unless it is made only of safe characters.
#[must_use]
pub fn quote(word: &str) -> Cow<'_, str> {
    if !word.is_empty() && word.chars().all(is_safe) {
        return Cow::Borrowed(word);
    }
    Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
}
