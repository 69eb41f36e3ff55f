//! Syntax tree for Onigmo patterns
//!
//! This module defines the node types the converter walks. The tree is a
//! closed set of categories:
//! - Literals, sequences and the empty pattern
//! - Meta elements (dot, alternation, option switches)
//! - Groups (capturing, named, option-scoped, lookaround, atomic, absent)
//! - Quantifiers, character types, anchors, backreferences and sets
//!
//! `Node::to_source_string` renders a node back in Onigmo syntax. It is used
//! to point diagnostics at the construct they describe.

use std::fmt;

/// A node in the pattern tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Empty expression (matches empty string)
    Empty,

    /// Literal text, already escaped for the target dialect
    Literal(String),

    /// A sequence of nodes (concatenation)
    Sequence(Vec<Node>),

    /// Dot, alternation and option switches
    Meta(Meta),

    /// Any grouping construct
    Group(Group),

    /// Quantified expression (e.g., a*, a+?, a{3,5})
    Quantified(Quantified),

    /// Character type shorthand (\d, \w, \h, ...)
    CharacterType(CharacterType),

    /// Zero-width assertion (^, \A, \b, ...)
    Anchor(Anchor),

    /// Backreference or subexpression call
    Backreference(Backreference),

    /// A bracketed character set
    Set(Set),
}

/// Meta elements
#[derive(Debug, Clone, PartialEq)]
pub enum Meta {
    /// The universal matcher `.`
    Dot,

    /// Alternation (e.g., a|b|c); branch order is significant
    Alternation(Vec<Node>),

    /// An option toggle such as `(?m)` or the switch of `(?m:...)`
    OptionSwitch(OptionSwitch),

    /// A meta element without a known conversion, carrying its raw subtype
    Unknown(String),
}

impl Meta {
    /// Convert meta element to source syntax
    pub fn to_source_string(&self) -> String {
        match self {
            Meta::Dot => ".".to_string(),
            Meta::Alternation(branches) => {
                let parts: Vec<_> = branches.iter().map(|b| b.to_source_string()).collect();
                parts.join("|")
            }
            Meta::OptionSwitch(switch) => switch.to_source_string(),
            Meta::Unknown(raw) => raw.clone(),
        }
    }
}

/// A matching-mode flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flag {
    /// `m`: dot matches line terminators
    DotAll,
    /// `i`: case-insensitive matching
    IgnoreCase,
    /// `x`: extended syntax (whitespace and comments ignored)
    Extended,
    /// Any other option letter
    Other(char),
}

impl Flag {
    /// Map an Onigmo option letter to a flag
    pub fn from_char(c: char) -> Self {
        match c {
            'm' => Flag::DotAll,
            'i' => Flag::IgnoreCase,
            'x' => Flag::Extended,
            other => Flag::Other(other),
        }
    }

    /// The Onigmo option letter
    pub fn as_char(&self) -> char {
        match self {
            Flag::DotAll => 'm',
            Flag::IgnoreCase => 'i',
            Flag::Extended => 'x',
            Flag::Other(c) => *c,
        }
    }
}

/// Where an option switch takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    /// `(?m:...)`: only inside the owning group, undone on exit
    GroupScoped,
    /// `(?m)`: from here to the end of the enclosing group
    InlinePersistent,
}

/// An option switch: flags turned on, flags turned off
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSwitch {
    /// Flags enabled by the switch
    pub enabled: Vec<Flag>,
    /// Flags disabled by the switch
    pub disabled: Vec<Flag>,
    /// Scoping behaviour
    pub kind: SwitchKind,
}

impl OptionSwitch {
    /// Create a switch from enabled and disabled flags
    pub fn new(enabled: Vec<Flag>, disabled: Vec<Flag>, kind: SwitchKind) -> Self {
        OptionSwitch {
            enabled,
            disabled,
            kind,
        }
    }

    /// Parse the `on-off` letters of `(?on-off)`
    pub fn from_letters(on: &str, off: &str, kind: SwitchKind) -> Self {
        OptionSwitch {
            enabled: on.chars().map(Flag::from_char).collect(),
            disabled: off.chars().map(Flag::from_char).collect(),
            kind,
        }
    }

    /// Convert switch to source syntax
    pub fn to_source_string(&self) -> String {
        match self.kind {
            SwitchKind::InlinePersistent => format!("(?{})", self.letters()),
            SwitchKind::GroupScoped => format!("(?{}:)", self.letters()),
        }
    }

    fn letters(&self) -> String {
        let mut out: String = self.enabled.iter().map(Flag::as_char).collect();
        if !self.disabled.is_empty() {
            out.push('-');
            out.extend(self.disabled.iter().map(Flag::as_char));
        }
        out
    }
}

/// The kind of a grouping construct
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKind {
    /// `(...)`
    Capturing,
    /// `(?:...)`, and option groups `(?m:...)`
    NonCapturing,
    /// `(?<name>...)`
    Named(String),
    /// `(?>...)`
    Atomic,
    /// `(?=...)`
    Lookahead,
    /// `(?!...)`
    NegativeLookahead,
    /// `(?<=...)`
    Lookbehind,
    /// `(?<!...)`
    NegativeLookbehind,
    /// `(?~...)`
    Absent,
}

/// A group with an optional local option switch
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// The kind of group
    pub kind: GroupKind,
    /// The pattern inside the group
    pub body: Box<Node>,
    /// Options confined to `body`
    pub options: Option<OptionSwitch>,
}

impl Group {
    /// Whether the group captures in the source dialect
    pub fn is_capturing(&self) -> bool {
        matches!(self.kind, GroupKind::Capturing | GroupKind::Named(_))
    }

    /// Convert group to source syntax
    pub fn to_source_string(&self) -> String {
        let opener = match (&self.kind, &self.options) {
            (GroupKind::NonCapturing, Some(switch)) => format!("(?{}:", switch.letters()),
            (GroupKind::Capturing, _) => "(".to_string(),
            (GroupKind::NonCapturing, None) => "(?:".to_string(),
            (GroupKind::Named(name), _) => format!("(?<{}>", name),
            (GroupKind::Atomic, _) => "(?>".to_string(),
            (GroupKind::Lookahead, _) => "(?=".to_string(),
            (GroupKind::NegativeLookahead, _) => "(?!".to_string(),
            (GroupKind::Lookbehind, _) => "(?<=".to_string(),
            (GroupKind::NegativeLookbehind, _) => "(?<!".to_string(),
            (GroupKind::Absent, _) => "(?~".to_string(),
        };
        format!("{}{})", opener, self.body.to_source_string())
    }
}

/// A node with a quantifier applied
#[derive(Debug, Clone, PartialEq)]
pub struct Quantified {
    /// The node being quantified
    pub node: Box<Node>,
    /// The quantifier
    pub quantifier: Quantifier,
}

impl Quantified {
    /// Convert quantified node to source syntax
    pub fn to_source_string(&self) -> String {
        let needs_parens = matches!(
            self.node.as_ref(),
            Node::Meta(Meta::Alternation(_)) | Node::Sequence(_)
        );
        let operand = if needs_parens {
            format!("(?:{})", self.node.to_source_string())
        } else {
            self.node.to_source_string()
        };
        format!("{}{}", operand, self.quantifier.to_regex_string())
    }
}

/// How a quantifier consumes input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Greediness {
    /// Default
    Greedy,
    /// `?` suffix
    Lazy,
    /// `+` suffix
    Possessive,
}

/// A repetition count with its greediness
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantifier {
    /// Minimum repetitions
    pub min: u32,
    /// Maximum repetitions, unbounded if `None`
    pub max: Option<u32>,
    /// Greedy, lazy or possessive
    pub greediness: Greediness,
}

impl Quantifier {
    /// Create a quantifier
    pub fn new(min: u32, max: Option<u32>, greediness: Greediness) -> Self {
        Quantifier {
            min,
            max,
            greediness,
        }
    }

    /// `*`
    pub fn zero_or_more() -> Self {
        Quantifier::new(0, None, Greediness::Greedy)
    }

    /// `+`
    pub fn one_or_more() -> Self {
        Quantifier::new(1, None, Greediness::Greedy)
    }

    /// `?`
    pub fn optional() -> Self {
        Quantifier::new(0, Some(1), Greediness::Greedy)
    }

    /// Same counts with a different greediness
    pub fn with_greediness(self, greediness: Greediness) -> Self {
        Quantifier { greediness, ..self }
    }

    /// The count part (`*`, `{2,5}`, ...) without any suffix
    pub fn count_string(&self) -> String {
        match (self.min, self.max) {
            (0, None) => "*".to_string(),
            (1, None) => "+".to_string(),
            (0, Some(1)) => "?".to_string(),
            (n, None) => format!("{{{},}}", n),
            (n, Some(m)) if n == m => format!("{{{}}}", n),
            (n, Some(m)) => format!("{{{},{}}}", n, m),
        }
    }

    /// Convert quantifier to source syntax
    fn to_regex_string(self) -> String {
        let suffix = match self.greediness {
            Greediness::Greedy => "",
            Greediness::Lazy => "?",
            Greediness::Possessive => "+",
        };
        format!("{}{}", self.count_string(), suffix)
    }
}

/// Character type shorthands
#[derive(Debug, Clone, PartialEq)]
pub enum CharacterType {
    /// `\d` / `\D`
    Digit { negated: bool },
    /// `\w` / `\W`
    Word { negated: bool },
    /// `\s` / `\S`
    Space { negated: bool },
    /// `\h` / `\H` (hex digit)
    HexDigit { negated: bool },
    /// `\R` (generic line break)
    Linebreak,
    /// `\X` (extended grapheme cluster)
    Grapheme,
    /// A type without a known conversion
    Unknown(String),
}

impl CharacterType {
    /// Convert character type to source syntax
    pub fn to_regex_string(&self) -> String {
        let letter = |lower: char, negated: bool| {
            if negated {
                format!("\\{}", lower.to_ascii_uppercase())
            } else {
                format!("\\{}", lower)
            }
        };
        match self {
            CharacterType::Digit { negated } => letter('d', *negated),
            CharacterType::Word { negated } => letter('w', *negated),
            CharacterType::Space { negated } => letter('s', *negated),
            CharacterType::HexDigit { negated } => letter('h', *negated),
            CharacterType::Linebreak => "\\R".to_string(),
            CharacterType::Grapheme => "\\X".to_string(),
            CharacterType::Unknown(raw) => raw.clone(),
        }
    }
}

/// Zero-width assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// `^`
    LineStart,
    /// `$`
    LineEnd,
    /// `\A`
    StringStart,
    /// `\z`
    StringEnd,
    /// `\Z`
    StringEndBeforeNewline,
    /// `\b`
    WordBoundary,
    /// `\B`
    NonWordBoundary,
    /// `\G`
    MatchStart,
}

impl Anchor {
    /// Convert anchor to source syntax
    pub fn to_regex_string(self) -> &'static str {
        match self {
            Anchor::LineStart => "^",
            Anchor::LineEnd => "$",
            Anchor::StringStart => "\\A",
            Anchor::StringEnd => "\\z",
            Anchor::StringEndBeforeNewline => "\\Z",
            Anchor::WordBoundary => "\\b",
            Anchor::NonWordBoundary => "\\B",
            Anchor::MatchStart => "\\G",
        }
    }
}

/// References to earlier groups
#[derive(Debug, Clone, PartialEq)]
pub enum Backreference {
    /// `\1`, `\k<1>`
    Number(u32),
    /// `\k<name>`
    Named(String),
    /// `\k<-1>`: negative offset from the reference
    Relative(i32),
    /// `\g<name>`: subexpression call
    Call(String),
}

impl Backreference {
    /// Convert backreference to source syntax
    pub fn to_source_string(&self) -> String {
        match self {
            Backreference::Number(n) => format!("\\{}", n),
            Backreference::Named(name) => format!("\\k<{}>", name),
            Backreference::Relative(n) => format!("\\k<{}>", n),
            Backreference::Call(name) => format!("\\g<{}>", name),
        }
    }
}

/// A bracketed character set `[...]`
#[derive(Debug, Clone, PartialEq)]
pub struct Set {
    /// Whether the set is negated `[^...]`
    pub negated: bool,
    /// The items in the set
    pub items: Vec<SetItem>,
}

/// An item inside a character set
#[derive(Debug, Clone, PartialEq)]
pub enum SetItem {
    /// A single character, already escaped for the target dialect
    Char(String),
    /// A range (e.g., a-z)
    Range(String, String),
    /// A character type shorthand
    CharacterType(CharacterType),
    /// A POSIX bracket `[:alpha:]` or `[:^alpha:]`
    Posix { name: String, negated: bool },
    /// A nested set `[a[bc]]`
    Nested(Set),
}

impl Set {
    /// Convert set to source syntax
    pub fn to_regex_string(&self) -> String {
        let mut result = String::new();
        result.push('[');
        if self.negated {
            result.push('^');
        }
        for item in &self.items {
            result.push_str(&item.to_regex_string());
        }
        result.push(']');
        result
    }
}

impl SetItem {
    /// Convert set item to source syntax
    pub fn to_regex_string(&self) -> String {
        match self {
            SetItem::Char(c) => c.clone(),
            SetItem::Range(start, end) => format!("{}-{}", start, end),
            SetItem::CharacterType(ct) => ct.to_regex_string(),
            SetItem::Posix { name, negated } => {
                format!("[:{}{}:]", if *negated { "^" } else { "" }, name)
            }
            SetItem::Nested(set) => set.to_regex_string(),
        }
    }
}

impl Node {
    /// Create a literal node
    pub fn literal(text: impl Into<String>) -> Self {
        Node::Literal(text.into())
    }

    /// Create a dot node
    pub fn dot() -> Self {
        Node::Meta(Meta::Dot)
    }

    /// Create an unknown meta node
    pub fn unknown_meta(subtype: impl Into<String>) -> Self {
        Node::Meta(Meta::Unknown(subtype.into()))
    }

    /// Create an inline option switch `(?on-off)`
    pub fn inline_switch(on: &str, off: &str) -> Self {
        Node::Meta(Meta::OptionSwitch(OptionSwitch::from_letters(
            on,
            off,
            SwitchKind::InlinePersistent,
        )))
    }

    /// Create a sequence from a vector of nodes
    pub fn sequence(nodes: Vec<Node>) -> Self {
        match nodes.len() {
            0 => Node::Empty,
            1 => nodes.into_iter().next().unwrap_or(Node::Empty),
            _ => Node::Sequence(nodes),
        }
    }

    /// Create an alternation from a vector of branches
    pub fn alternation(branches: Vec<Node>) -> Self {
        match branches.len() {
            0 => Node::Empty,
            1 => branches.into_iter().next().unwrap_or(Node::Empty),
            _ => Node::Meta(Meta::Alternation(branches)),
        }
    }

    /// Create a group of the given kind
    pub fn group_of(kind: GroupKind, body: Node) -> Self {
        Node::Group(Group {
            kind,
            body: Box::new(body),
            options: None,
        })
    }

    /// Create a capturing group
    pub fn group(body: Node) -> Self {
        Node::group_of(GroupKind::Capturing, body)
    }

    /// Create a non-capturing group
    pub fn non_capturing_group(body: Node) -> Self {
        Node::group_of(GroupKind::NonCapturing, body)
    }

    /// Create a named group
    pub fn named_group(name: impl Into<String>, body: Node) -> Self {
        Node::group_of(GroupKind::Named(name.into()), body)
    }

    /// Create an option group `(?on-off:body)`
    pub fn option_group(on: &str, off: &str, body: Node) -> Self {
        Node::Group(Group {
            kind: GroupKind::NonCapturing,
            body: Box::new(body),
            options: Some(OptionSwitch::from_letters(on, off, SwitchKind::GroupScoped)),
        })
    }

    /// Create a quantified node
    pub fn quantified(node: Node, quantifier: Quantifier) -> Self {
        Node::Quantified(Quantified {
            node: Box::new(node),
            quantifier,
        })
    }

    /// Short name of the node's category, for logging
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Empty => "empty",
            Node::Literal(_) => "literal",
            Node::Sequence(_) => "sequence",
            Node::Meta(_) => "meta",
            Node::Group(_) => "group",
            Node::Quantified(_) => "quantifier",
            Node::CharacterType(_) => "character type",
            Node::Anchor(_) => "anchor",
            Node::Backreference(_) => "backreference",
            Node::Set(_) => "set",
        }
    }

    /// Render the node back in Onigmo syntax
    pub fn to_source_string(&self) -> String {
        match self {
            Node::Empty => String::new(),
            Node::Literal(text) => text.clone(),
            Node::Sequence(nodes) => nodes.iter().map(|n| n.to_source_string()).collect(),
            Node::Meta(meta) => meta.to_source_string(),
            Node::Group(group) => group.to_source_string(),
            Node::Quantified(quantified) => quantified.to_source_string(),
            Node::CharacterType(ct) => ct.to_regex_string(),
            Node::Anchor(anchor) => anchor.to_regex_string().to_string(),
            Node::Backreference(backref) => backref.to_source_string(),
            Node::Set(set) => set.to_regex_string(),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_source_string())
    }
}
