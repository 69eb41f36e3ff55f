//! Lexer for tokenizing Onigmo patterns
//!
//! This module provides a tokenizer that converts an Onigmo pattern string
//! into a stream of tokens for parsing. Escapes that need no further
//! interpretation are emitted pre-rendered for JavaScript as
//! [`Token::Escaped`], so `\e` arrives as `\x1B`.
//!
//! The lexer tracks extended mode (`x`) itself: whitespace and `#` comments
//! are skipped while it is on, and `(?x)` / `(?x:...)` switch it the same
//! way Onigmo scopes options, until the enclosing group closes.

use std::fmt;

use crate::ast::{Anchor, Backreference, CharacterType, Flag};
use crate::error::{Error, LexerErrorKind, Result, Span};

/// Option letters accepted in `(?imx-imx)`
const OPTION_LETTERS: &str = "imxadu";

/// A token in an Onigmo pattern
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A literal character
    Literal(char),
    /// An escape already rendered for JavaScript (e.g., `\.`, `\x1B`, `\n`)
    Escaped(String),
    /// Dot `.`
    Dot,
    /// Pipe `|`
    Pipe,
    /// Caret `^` (line start)
    Caret,
    /// Dollar `$` (line end)
    Dollar,
    /// Star `*`
    Star,
    /// Plus `+`
    Plus,
    /// Question `?`
    Question,
    /// Counted repetition `{n}`, `{n,}`, `{,m}`, `{n,m}`
    Repetition { min: u32, max: Option<u32> },
    /// Capturing group opener `(`
    LeftParen,
    /// Non-capturing group opener `(?:`
    NonCapturing,
    /// Named group opener `(?<name>` or `(?'name'`
    NamedGroupStart(String),
    /// `(?=`
    Lookahead,
    /// `(?!`
    NegativeLookahead,
    /// `(?<=`
    Lookbehind,
    /// `(?<!`
    NegativeLookbehind,
    /// `(?>`
    Atomic,
    /// `(?~`
    Absent,
    /// Option group opener `(?on-off:`
    OptionGroup { on: String, off: String },
    /// Inline option switch `(?on-off)`
    OptionSwitch { on: String, off: String },
    /// Right parenthesis `)`
    RightParen,
    /// Character class opener `[` or `[^`
    ClassOpen { negated: bool },
    /// Character class closer `]`
    ClassClose,
    /// POSIX bracket `[:name:]` or `[:^name:]`
    Posix { name: String, negated: bool },
    /// Character type shorthand (`\d`, `\h`, `\R`, ...)
    CharType(CharacterType),
    /// Anchor escape (`\A`, `\z`, `\b`, ...)
    Anchor(Anchor),
    /// Backreference or subexpression call
    Backref(Backreference),
    /// `\K`
    Keep,
    /// End of input
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Literal(c) => write!(f, "literal `{}`", c),
            Token::Escaped(text) => write!(f, "escape `{}`", text),
            Token::Dot => write!(f, "`.`"),
            Token::Pipe => write!(f, "`|`"),
            Token::Caret => write!(f, "`^`"),
            Token::Dollar => write!(f, "`$`"),
            Token::Star => write!(f, "`*`"),
            Token::Plus => write!(f, "`+`"),
            Token::Question => write!(f, "`?`"),
            Token::Repetition { min, max } => match max {
                Some(max) => write!(f, "repetition `{{{},{}}}`", min, max),
                None => write!(f, "repetition `{{{},}}`", min),
            },
            Token::LeftParen => write!(f, "`(`"),
            Token::NonCapturing => write!(f, "`(?:`"),
            Token::NamedGroupStart(name) => write!(f, "named group `{}`", name),
            Token::Lookahead => write!(f, "`(?=`"),
            Token::NegativeLookahead => write!(f, "`(?!`"),
            Token::Lookbehind => write!(f, "`(?<=`"),
            Token::NegativeLookbehind => write!(f, "`(?<!`"),
            Token::Atomic => write!(f, "`(?>`"),
            Token::Absent => write!(f, "`(?~`"),
            Token::OptionGroup { on, off } => write!(f, "option group `(?{}-{}:`", on, off),
            Token::OptionSwitch { on, off } => write!(f, "option switch `(?{}-{})`", on, off),
            Token::RightParen => write!(f, "`)`"),
            Token::ClassOpen { negated: false } => write!(f, "`[`"),
            Token::ClassOpen { negated: true } => write!(f, "`[^`"),
            Token::ClassClose => write!(f, "`]`"),
            Token::Posix { name, negated } => {
                write!(f, "POSIX class `[:{}{}:]`", if *negated { "^" } else { "" }, name)
            }
            Token::CharType(ct) => write!(f, "shorthand `{}`", ct.to_regex_string()),
            Token::Anchor(anchor) => write!(f, "anchor `{}`", anchor.to_regex_string()),
            Token::Backref(backref) => write!(f, "backref `{}`", backref.to_source_string()),
            Token::Keep => write!(f, "`\\K`"),
            Token::Eof => write!(f, "EOF"),
        }
    }
}

/// Lexer for tokenizing Onigmo patterns
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    /// Extended mode in effect
    extended: bool,
    /// Extended mode to restore when each open group closes
    group_modes: Vec<bool>,
    /// Nesting depth of character classes
    class_depth: usize,
    /// Just after `[` or `[^`, where `]` is literal
    class_start: bool,
}

impl Lexer {
    /// Create a new lexer for the given input string
    pub fn new(input: &str) -> Self {
        Lexer {
            chars: input.chars().collect(),
            position: 0,
            extended: false,
            group_modes: Vec::new(),
            class_depth: 0,
            class_start: false,
        }
    }

    /// Start in extended mode (the `x` option of the whole pattern)
    pub fn with_extended(mut self, extended: bool) -> Self {
        self.extended = extended;
        self
    }

    /// Current position, in characters
    pub fn position(&self) -> usize {
        self.position
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.position).copied()
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.current()?;
        self.position += 1;
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.current() == Some(expected) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, position: usize, kind: LexerErrorKind) -> Error {
        Error::Lexer { position, kind }
    }

    /// Get the next token and its span
    pub fn next_token(&mut self) -> Result<(Token, Span)> {
        if self.class_depth > 0 {
            let start = self.position;
            let token = self.class_token()?;
            return Ok((token, Span::new(start, self.position)));
        }

        self.skip_ignored()?;
        let start = self.position;
        let token = self.pattern_token(start)?;
        Ok((token, Span::new(start, self.position)))
    }

    /// Skip `(?#...)` comments, and whitespace and `#` comments in extended mode
    fn skip_ignored(&mut self) -> Result<()> {
        loop {
            match self.current() {
                Some('(') if self.peek(1) == Some('?') && self.peek(2) == Some('#') => {
                    let start = self.position;
                    self.position += 3;
                    loop {
                        match self.advance() {
                            Some(')') => break,
                            Some(_) => {}
                            None => return Err(self.error(start, LexerErrorKind::UnclosedGroup)),
                        }
                    }
                }
                Some(c) if self.extended && c.is_whitespace() => {
                    self.position += 1;
                }
                Some('#') if self.extended => {
                    while let Some(c) = self.advance() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn pattern_token(&mut self, start: usize) -> Result<Token> {
        let Some(c) = self.advance() else {
            return Ok(Token::Eof);
        };
        let token = match c {
            '\\' => self.read_escape(start)?,
            '(' => self.read_group_opener(start)?,
            ')' => {
                if let Some(extended) = self.group_modes.pop() {
                    self.extended = extended;
                }
                Token::RightParen
            }
            '[' => self.open_class(),
            '.' => Token::Dot,
            '|' => Token::Pipe,
            '^' => Token::Caret,
            '$' => Token::Dollar,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Question,
            '{' => self.read_repetition().unwrap_or(Token::Literal('{')),
            other => Token::Literal(other),
        };
        Ok(token)
    }

    fn open_class(&mut self) -> Token {
        self.class_depth += 1;
        self.class_start = true;
        let negated = self.eat('^');
        Token::ClassOpen { negated }
    }

    /// Read `{n}`, `{n,}`, `{,m}` or `{n,m}` after the `{`
    ///
    /// Anything else leaves the position untouched so `{` reads as a literal.
    fn read_repetition(&mut self) -> Option<Token> {
        let restore = self.position;
        let min = self.read_decimal();
        let token = if self.eat(',') {
            let max = self.read_decimal();
            if min.is_none() && max.is_none() {
                None
            } else {
                Some(Token::Repetition {
                    min: min.unwrap_or(0),
                    max,
                })
            }
        } else {
            min.map(|n| Token::Repetition { min: n, max: Some(n) })
        };
        if token.is_some() && self.eat('}') {
            return token;
        }
        self.position = restore;
        None
    }

    fn read_decimal(&mut self) -> Option<u32> {
        let start = self.position;
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.position += 1;
        }
        let digits: String = self.chars[start..self.position].iter().collect();
        digits.parse().ok()
    }

    fn read_group_opener(&mut self, start: usize) -> Result<Token> {
        if !self.eat('?') {
            self.group_modes.push(self.extended);
            return Ok(Token::LeftParen);
        }

        let token = match self.advance() {
            Some(':') => Token::NonCapturing,
            Some('=') => Token::Lookahead,
            Some('!') => Token::NegativeLookahead,
            Some('>') => Token::Atomic,
            Some('~') => Token::Absent,
            Some('<') if self.eat('=') => Token::Lookbehind,
            Some('<') if self.eat('!') => Token::NegativeLookbehind,
            Some('<') => Token::NamedGroupStart(self.read_group_name('>', start)?),
            Some('\'') => Token::NamedGroupStart(self.read_group_name('\'', start)?),
            Some(c) if c == '-' || OPTION_LETTERS.contains(c) => {
                self.position -= 1;
                return self.read_options(start);
            }
            Some(c) => return Err(self.error(start, LexerErrorKind::UndefinedGroupOption(c))),
            None => return Err(self.error(start, LexerErrorKind::UnclosedGroup)),
        };
        self.group_modes.push(self.extended);
        Ok(token)
    }

    fn read_group_name(&mut self, terminator: char, start: usize) -> Result<String> {
        let mut name = String::new();
        loop {
            match self.advance() {
                Some(c) if c == terminator => break,
                Some(c) => name.push(c),
                None => return Err(self.error(start, LexerErrorKind::UnclosedGroup)),
            }
        }
        let valid = name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if !valid {
            return Err(self.error(start, LexerErrorKind::InvalidGroupName(name)));
        }
        Ok(name)
    }

    /// Read `on-off` followed by `)` or `:`
    fn read_options(&mut self, start: usize) -> Result<Token> {
        let mut on = String::new();
        let mut off = String::new();
        let mut disabling = false;
        loop {
            match self.advance() {
                Some('-') if !disabling => disabling = true,
                Some(c) if OPTION_LETTERS.contains(c) => {
                    if disabling { off.push(c) } else { on.push(c) }
                }
                Some(')') => {
                    self.apply_extended(&on, &off);
                    return Ok(Token::OptionSwitch { on, off });
                }
                Some(':') => {
                    self.group_modes.push(self.extended);
                    self.apply_extended(&on, &off);
                    return Ok(Token::OptionGroup { on, off });
                }
                Some(c) => return Err(self.error(start, LexerErrorKind::UndefinedGroupOption(c))),
                None => return Err(self.error(start, LexerErrorKind::UnclosedGroup)),
            }
        }
    }

    fn apply_extended(&mut self, on: &str, off: &str) {
        let extended = Flag::Extended.as_char();
        if on.contains(extended) {
            self.extended = true;
        }
        if off.contains(extended) {
            self.extended = false;
        }
    }

    /// Read an escape outside a character class (backslash already consumed)
    fn read_escape(&mut self, start: usize) -> Result<Token> {
        let Some(c) = self.advance() else {
            return Err(self.error(start, LexerErrorKind::TrailingBackslash));
        };
        let token = match c {
            'A' => Token::Anchor(Anchor::StringStart),
            'z' => Token::Anchor(Anchor::StringEnd),
            'Z' => Token::Anchor(Anchor::StringEndBeforeNewline),
            'b' => Token::Anchor(Anchor::WordBoundary),
            'B' => Token::Anchor(Anchor::NonWordBoundary),
            'G' => Token::Anchor(Anchor::MatchStart),
            'K' => Token::Keep,
            'R' => Token::CharType(CharacterType::Linebreak),
            'X' => Token::CharType(CharacterType::Grapheme),
            'k' => self.read_reference(start)?,
            'g' => self.read_call(start)?,
            '1'..='9' => {
                self.position -= 1;
                let number = self.read_decimal().unwrap_or(0);
                Token::Backref(Backreference::Number(number))
            }
            _ => self.read_common_escape(c, start)?,
        };
        Ok(token)
    }

    /// Escapes that mean the same inside and outside a class
    fn read_common_escape(&mut self, c: char, start: usize) -> Result<Token> {
        let token = match c {
            'd' | 'D' => Token::CharType(CharacterType::Digit {
                negated: c.is_uppercase(),
            }),
            'w' | 'W' => Token::CharType(CharacterType::Word {
                negated: c.is_uppercase(),
            }),
            's' | 'S' => Token::CharType(CharacterType::Space {
                negated: c.is_uppercase(),
            }),
            'h' | 'H' => Token::CharType(CharacterType::HexDigit {
                negated: c.is_uppercase(),
            }),
            'p' | 'P' => self.read_property(c, start)?,
            'n' | 't' | 'r' | 'f' | 'v' => Token::Escaped(format!("\\{}", c)),
            'a' => Token::Escaped("\\x07".to_string()),
            'e' => Token::Escaped("\\x1B".to_string()),
            '0' => {
                let value = self.read_radix(8, 2).unwrap_or(0);
                Token::Escaped(format!("\\x{:02X}", value))
            }
            'x' => self.read_hex_escape(start)?,
            'u' => match self.read_radix(16, 4) {
                Some(value) if self.position >= start + 6 => Token::Escaped(format!("\\u{:04X}", value)),
                _ => return Err(self.error(start, LexerErrorKind::InvalidEscape('u'))),
            },
            'c' => match self.advance() {
                Some(letter) if letter.is_ascii_alphabetic() => {
                    Token::Escaped(format!("\\c{}", letter.to_ascii_uppercase()))
                }
                _ => return Err(self.error(start, LexerErrorKind::InvalidEscape('c'))),
            },
            c if c.is_ascii_alphanumeric() => {
                return Err(self.error(start, LexerErrorKind::InvalidEscape(c)));
            }
            c if "\\^$.*+?()[]{}|/".contains(c) => Token::Escaped(format!("\\{}", c)),
            c => Token::Literal(c),
        };
        Ok(token)
    }

    /// `\xHH` or `\x{H...}`
    fn read_hex_escape(&mut self, start: usize) -> Result<Token> {
        let value = if self.eat('{') {
            let value = self.read_radix(16, 8);
            if !self.eat('}') {
                return Err(self.error(start, LexerErrorKind::InvalidEscape('x')));
            }
            value
        } else {
            self.read_radix(16, 2)
        };
        let value = value.ok_or_else(|| self.error(start, LexerErrorKind::InvalidEscape('x')))?;
        let token = match value {
            0..=0xFF => Token::Escaped(format!("\\x{:02X}", value)),
            0x100..=0xFFFF => Token::Escaped(format!("\\u{:04X}", value)),
            _ => match char::from_u32(value) {
                Some(c) => Token::Literal(c),
                None => return Err(self.error(start, LexerErrorKind::InvalidEscape('x'))),
            },
        };
        Ok(token)
    }

    /// Read up to `max_digits` digits in `radix`
    fn read_radix(&mut self, radix: u32, max_digits: usize) -> Option<u32> {
        let mut value: Option<u32> = None;
        for _ in 0..max_digits {
            let Some(digit) = self.current().and_then(|c| c.to_digit(radix)) else {
                break;
            };
            self.position += 1;
            value = Some(value.unwrap_or(0) * radix + digit);
        }
        value
    }

    /// `\p{Name}`, `\p{^Name}` and `\P{Name}` have no JavaScript form without
    /// the `u` flag; they become unknown character types
    fn read_property(&mut self, letter: char, start: usize) -> Result<Token> {
        if !self.eat('{') {
            return Err(self.error(start, LexerErrorKind::InvalidEscape(letter)));
        }
        let mut raw = format!("\\{}{{", letter);
        loop {
            match self.advance() {
                Some('}') => break,
                Some(c) => raw.push(c),
                None => return Err(self.error(start, LexerErrorKind::InvalidEscape(letter))),
            }
        }
        raw.push('}');
        Ok(Token::CharType(CharacterType::Unknown(raw)))
    }

    /// `\k<name>`, `\k<1>`, `\k<-1>` (and the `'...'` forms)
    fn read_reference(&mut self, start: usize) -> Result<Token> {
        let content = self.read_reference_body('k', start)?;
        let backref = match content.parse::<i32>() {
            Ok(n) if n < 0 => Backreference::Relative(n),
            Ok(n) if n > 0 && !content.starts_with('+') => Backreference::Number(n as u32),
            Ok(_) => return Err(self.error(start, LexerErrorKind::InvalidGroupName(content))),
            Err(_) => {
                self.validate_name(&content, start)?;
                Backreference::Named(content)
            }
        };
        Ok(Token::Backref(backref))
    }

    /// `\g<name>`, `\g<1>`, `\g<-1>` (and the `'...'` forms)
    fn read_call(&mut self, start: usize) -> Result<Token> {
        let content = self.read_reference_body('g', start)?;
        if content.parse::<i32>().is_err() {
            self.validate_name(&content, start)?;
        }
        Ok(Token::Backref(Backreference::Call(content)))
    }

    fn read_reference_body(&mut self, letter: char, start: usize) -> Result<String> {
        let terminator = match self.advance() {
            Some('<') => '>',
            Some('\'') => '\'',
            _ => return Err(self.error(start, LexerErrorKind::InvalidEscape(letter))),
        };
        let mut content = String::new();
        loop {
            match self.advance() {
                Some(c) if c == terminator => return Ok(content),
                Some(c) => content.push(c),
                None => return Err(self.error(start, LexerErrorKind::InvalidEscape(letter))),
            }
        }
    }

    fn validate_name(&self, name: &str, start: usize) -> Result<()> {
        let valid = name.chars().next().is_some_and(|c| c.is_alphabetic() || c == '_')
            && name.chars().all(|c| c.is_alphanumeric() || c == '_');
        if valid {
            Ok(())
        } else {
            Err(self.error(start, LexerErrorKind::InvalidGroupName(name.to_string())))
        }
    }

    /// Next token inside a character class
    fn class_token(&mut self) -> Result<Token> {
        let start = self.position;
        let at_start = std::mem::replace(&mut self.class_start, false);
        let Some(c) = self.advance() else {
            return Err(self.error(start, LexerErrorKind::UnclosedCharacterClass));
        };

        let token = match c {
            ']' if !at_start => {
                self.class_depth -= 1;
                Token::ClassClose
            }
            '[' if self.current() == Some(':') => match self.read_posix() {
                Some(token) => token,
                None => self.open_class(),
            },
            '[' => self.open_class(),
            '&' if self.current() == Some('&') => {
                return Err(self.error(start, LexerErrorKind::ClassIntersection));
            }
            '\\' => self.read_class_escape(start)?,
            c => Token::Literal(c),
        };
        Ok(token)
    }

    /// Read `:name:]` or `:^name:]` after the `[`
    fn read_posix(&mut self) -> Option<Token> {
        let restore = self.position;
        self.position += 1;
        let negated = self.eat('^');
        let mut name = String::new();
        while let Some(c) = self.current().filter(|c| c.is_ascii_alphabetic()) {
            name.push(c);
            self.position += 1;
        }
        if !name.is_empty() && self.eat(':') && self.eat(']') {
            return Some(Token::Posix { name, negated });
        }
        self.position = restore;
        None
    }

    fn read_class_escape(&mut self, start: usize) -> Result<Token> {
        let Some(c) = self.advance() else {
            return Err(self.error(start, LexerErrorKind::TrailingBackslash));
        };
        match c {
            'b' => Ok(Token::Escaped("\\x08".to_string())),
            'R' => Ok(Token::CharType(CharacterType::Linebreak)),
            'X' => Ok(Token::CharType(CharacterType::Grapheme)),
            '1'..='7' => {
                self.position -= 1;
                let value = self.read_radix(8, 3).unwrap_or(0);
                Ok(Token::Escaped(format!("\\x{:02X}", value)))
            }
            '-' => Ok(Token::Escaped("\\-".to_string())),
            _ => self.read_common_escape(c, start),
        }
    }

    /// Tokenize the entire input, ending with [`Token::Eof`]
    pub fn tokenize(&mut self) -> Result<Vec<(Token, Span)>> {
        let mut tokens = Vec::new();
        loop {
            let (token, span) = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push((token, span));
            if done {
                return Ok(tokens);
            }
        }
    }
}
