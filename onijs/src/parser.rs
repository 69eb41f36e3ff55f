//! Parser for Onigmo patterns
//!
//! This module provides a recursive descent parser that converts
//! tokens into the syntax tree of [`crate::ast`].
//!
//! Grammar (in order of precedence, lowest to highest):
//!   pattern     := alternation
//!   alternation := sequence ( '|' sequence )*
//!   sequence    := quantified*
//!   quantified  := atom quantifier*
//!   quantifier  := ( '*' | '+' | '?' ) ( '?' | '+' )? | '{n,m}' '?'?
//!   atom        := literal | escape | '.' | '^' | '$' | type | anchor
//!                | backref | '\K' | switch | group | set
//!   group       := opener alternation ')'
//!   set         := '[' '^'? set_item* ']'
//!   set_item    := char | char '-' char | type | posix | set
//!
//! Adjacent literals are merged into a single [`Node::Literal`]; a
//! quantifier only ever applies to the last character before it.

use crate::ast::{
    Anchor, Greediness, Group, GroupKind, Node, OptionSwitch, Quantifier, Set, SetItem,
    SwitchKind,
};
use crate::error::{Error, ParseError, Result, Span};
use crate::lexer::{Lexer, Token};

/// Default limit on group and set nesting
pub const DEFAULT_MAX_NESTING: usize = 128;

/// Options for [`parse_with`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Start in extended mode, as if the pattern had the `x` option
    pub extended: bool,
    /// Maximum nesting of groups, sets and chained quantifiers
    pub max_nesting: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            extended: false,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

/// Parser for Onigmo patterns
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    current_span: Span,
    depth: usize,
    max_nesting: usize,
}

impl Parser {
    /// Create a new parser for the given input string
    pub fn new(input: &str) -> Result<Self> {
        Parser::with_options(input, &ParseOptions::default())
    }

    /// Create a parser with explicit options
    pub fn with_options(input: &str, options: &ParseOptions) -> Result<Self> {
        let mut lexer = Lexer::new(input).with_extended(options.extended);
        let (current_token, current_span) = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            current_span,
            depth: 0,
            max_nesting: options.max_nesting,
        })
    }

    /// Advance to the next token
    fn advance(&mut self) -> Result<()> {
        let (token, span) = self.lexer.next_token()?;
        self.current_token = token;
        self.current_span = span;
        Ok(())
    }

    /// Expect a specific token, error if not found
    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.current_token == expected {
            self.advance()
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    fn unexpected(&self, expected: &str) -> Error {
        let found = if self.current_token == Token::Eof {
            self.current_token.to_string()
        } else {
            format!("{} at position {}", self.current_token, self.current_span.start)
        };
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found,
        }
        .into()
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_nesting {
            return Err(ParseError::NestingTooDeep(self.max_nesting).into());
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    /// Parse the entire input and return the tree
    pub fn parse(&mut self) -> Result<Node> {
        let node = self.parse_alternation()?;

        // Ensure we've consumed all tokens
        if self.current_token != Token::Eof {
            return Err(self.unexpected("EOF"));
        }

        Ok(node)
    }

    /// alternation := sequence ( '|' sequence )*
    fn parse_alternation(&mut self) -> Result<Node> {
        let mut branches = vec![self.parse_sequence()?];
        while self.current_token == Token::Pipe {
            self.advance()?;
            branches.push(self.parse_sequence()?);
        }
        Ok(Node::alternation(branches))
    }

    /// sequence := quantified*
    fn parse_sequence(&mut self) -> Result<Node> {
        let mut items: Vec<Node> = Vec::new();
        while !self.is_sequence_end() {
            let node = self.parse_quantified()?;
            match (items.last_mut(), node) {
                (Some(Node::Literal(previous)), Node::Literal(text)) => previous.push_str(&text),
                (_, node) => items.push(node),
            }
        }
        Ok(Node::sequence(items))
    }

    fn is_sequence_end(&self) -> bool {
        matches!(
            self.current_token,
            Token::Eof | Token::Pipe | Token::RightParen
        )
    }

    /// quantified := atom quantifier*
    ///
    /// Every chained quantifier wraps the node once more, so it counts as a
    /// nesting level.
    fn parse_quantified(&mut self) -> Result<Node> {
        let mut node = self.parse_atom()?;
        let mut chained = 0;
        while let Some(quantifier) = self.parse_quantifier()? {
            self.enter()?;
            chained += 1;
            node = Node::quantified(node, quantifier);
        }
        self.depth -= chained;
        Ok(node)
    }

    fn parse_quantifier(&mut self) -> Result<Option<Quantifier>> {
        let (min, max, counted) = match self.current_token {
            Token::Star => (0, None, false),
            Token::Plus => (1, None, false),
            Token::Question => (0, Some(1), false),
            Token::Repetition { min, max } => (min, max, true),
            _ => return Ok(None),
        };
        if let Some(max) = max
            && min > max
        {
            return Err(ParseError::InvalidQuantifier(format!("{{{},{}}}", min, max)).into());
        }
        self.advance()?;

        // `{n,m}+` is a second quantifier, not a possessive suffix
        let greediness = match self.current_token {
            Token::Question => Greediness::Lazy,
            Token::Plus if !counted => Greediness::Possessive,
            _ => Greediness::Greedy,
        };
        if greediness != Greediness::Greedy {
            self.advance()?;
        }
        Ok(Some(Quantifier::new(min, max, greediness)))
    }

    fn parse_atom(&mut self) -> Result<Node> {
        let node = match self.current_token.clone() {
            Token::Literal(c) => Node::literal(escape_literal(c)),
            Token::Escaped(text) => Node::literal(text),
            Token::Dot => Node::dot(),
            Token::Caret => Node::Anchor(Anchor::LineStart),
            Token::Dollar => Node::Anchor(Anchor::LineEnd),
            Token::CharType(ct) => Node::CharacterType(ct),
            Token::Anchor(anchor) => Node::Anchor(anchor),
            Token::Backref(backref) => Node::Backreference(backref),
            Token::Keep => Node::unknown_meta("\\K"),
            Token::OptionSwitch { on, off } => Node::inline_switch(&on, &off),
            Token::LeftParen => return self.parse_group(GroupKind::Capturing, None),
            Token::NonCapturing => return self.parse_group(GroupKind::NonCapturing, None),
            Token::NamedGroupStart(name) => return self.parse_group(GroupKind::Named(name), None),
            Token::Lookahead => return self.parse_group(GroupKind::Lookahead, None),
            Token::NegativeLookahead => return self.parse_group(GroupKind::NegativeLookahead, None),
            Token::Lookbehind => return self.parse_group(GroupKind::Lookbehind, None),
            Token::NegativeLookbehind => {
                return self.parse_group(GroupKind::NegativeLookbehind, None);
            }
            Token::Atomic => return self.parse_group(GroupKind::Atomic, None),
            Token::Absent => return self.parse_group(GroupKind::Absent, None),
            Token::OptionGroup { on, off } => {
                let switch = OptionSwitch::from_letters(&on, &off, SwitchKind::GroupScoped);
                return self.parse_group(GroupKind::NonCapturing, Some(switch));
            }
            Token::ClassOpen { negated } => return Ok(Node::Set(self.parse_set(negated)?)),
            Token::Star | Token::Plus | Token::Question | Token::Repetition { .. } => {
                return Err(ParseError::NothingToRepeat.into());
            }
            Token::Eof => return Err(ParseError::UnexpectedEof.into()),
            Token::Pipe
            | Token::RightParen
            | Token::ClassClose
            | Token::Posix { .. } => return Err(self.unexpected("an expression")),
        };
        self.advance()?;
        Ok(node)
    }

    /// group := opener alternation ')'
    fn parse_group(&mut self, kind: GroupKind, options: Option<OptionSwitch>) -> Result<Node> {
        self.enter()?;
        self.advance()?;
        let body = self.parse_alternation()?;
        self.expect(Token::RightParen)?;
        self.leave();

        Ok(Node::Group(Group {
            kind,
            body: Box::new(body),
            options,
        }))
    }

    /// set := '[' '^'? set_item* ']'
    fn parse_set(&mut self, negated: bool) -> Result<Set> {
        self.enter()?;
        self.advance()?;
        let mut items = Vec::new();
        loop {
            match self.current_token.clone() {
                Token::ClassClose => break,
                Token::Literal(c) => {
                    self.advance()?;
                    items.extend(self.parse_set_char(escape_class_char(c), Some(c))?);
                }
                Token::Escaped(text) => {
                    self.advance()?;
                    items.extend(self.parse_set_char(text, None)?);
                }
                Token::CharType(ct) => {
                    self.advance()?;
                    items.push(SetItem::CharacterType(ct));
                }
                Token::Posix { name, negated } => {
                    self.advance()?;
                    items.push(SetItem::Posix { name, negated });
                }
                Token::ClassOpen { negated } => {
                    items.push(SetItem::Nested(self.parse_set(negated)?));
                }
                Token::Eof => return Err(ParseError::UnexpectedEof.into()),
                _ => return Err(self.unexpected("a set member")),
            }
        }
        self.advance()?;
        self.leave();
        Ok(Set { negated, items })
    }

    /// A set character, possibly the start of a range
    ///
    /// `raw` is the unescaped character when the token was a plain literal.
    fn parse_set_char(&mut self, text: String, raw: Option<char>) -> Result<Vec<SetItem>> {
        if self.current_token != Token::Literal('-') {
            return Ok(vec![SetItem::Char(text)]);
        }
        self.advance()?;

        let (end_text, end_raw) = match self.current_token.clone() {
            Token::Literal(c) => (escape_class_char(c), Some(c)),
            Token::Escaped(end) => (end, None),
            // `a-]` and `a-\d`: the hyphen is literal
            _ => {
                return Ok(vec![SetItem::Char(text), SetItem::Char("\\-".to_string())]);
            }
        };
        if let (Some(start), Some(end)) = (raw, end_raw)
            && start > end
        {
            return Err(ParseError::EmptyRange { start, end }.into());
        }
        self.advance()?;
        Ok(vec![SetItem::Range(text, end_text)])
    }
}

/// Escape a literal character for use outside a set
fn escape_literal(c: char) -> String {
    match c {
        '\\' | '^' | '$' | '.' | '*' | '+' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '|' => {
            format!("\\{}", c)
        }
        c => escape_control(c),
    }
}

/// Escape a literal character for use inside a set
fn escape_class_char(c: char) -> String {
    match c {
        '\\' | ']' | '[' | '^' | '-' => format!("\\{}", c),
        c => escape_control(c),
    }
}

fn escape_control(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\r' => "\\r".to_string(),
        '\t' => "\\t".to_string(),
        c if c.is_control() && (c as u32) <= 0xFF => format!("\\x{:02X}", c as u32),
        c => c.to_string(),
    }
}

/// Parse a pattern with default options
pub fn parse(input: &str) -> Result<Node> {
    parse_with(input, &ParseOptions::default())
}

/// Parse a pattern with explicit options
pub fn parse_with(input: &str, options: &ParseOptions) -> Result<Node> {
    let mut parser = Parser::with_options(input, options)?;
    parser.parse()
}
