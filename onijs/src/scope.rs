//! Option scopes
//!
//! A [`Scope`] is an immutable snapshot of the active mode flags. The
//! converter keeps a [`ScopeStack`] with one frame for the root and one per
//! group it is inside, so a group's local switch is undone when the group is
//! left. Inline switches such as `(?m)` replace the top frame instead.

use crate::ast::{Flag, OptionSwitch};
use crate::error::ConvertError;

/// Mode flags in effect at a point in the tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    /// Dot matches line terminators (Onigmo `m`)
    pub dot_all: bool,
    /// Case-insensitive matching (`i`)
    pub ignore_case: bool,
    /// Extended syntax (`x`)
    pub extended: bool,
}

/// A flag a switch asked for that the scope could not honour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RejectedFlag {
    pub flag: Flag,
    /// The value the switch asked for
    pub enable: bool,
}

impl Scope {
    /// Parse top-level options from a string like "mix"
    ///
    /// Unknown letters are ignored here; the transpiler reports them.
    pub fn from_letters(flags: &str) -> Self {
        let mut scope = Scope::default();
        for c in flags.chars() {
            match Flag::from_char(c) {
                Flag::DotAll => scope.dot_all = true,
                Flag::IgnoreCase => scope.ignore_case = true,
                Flag::Extended => scope.extended = true,
                Flag::Other(_) => {}
            }
        }
        scope
    }

    /// Derive the scope produced by `switch`.
    ///
    /// Enabled flags are applied first, then disabled ones, so a flag named
    /// in both sets ends up disabled. Case-insensitivity can only be set for
    /// a whole JavaScript pattern, so a switch that would change it is
    /// rejected, as is any flag outside `m`, `i` and `x`. Rejected flags
    /// leave the scope untouched.
    pub fn apply(&self, switch: &OptionSwitch) -> (Scope, Vec<RejectedFlag>) {
        let mut next = *self;
        let mut rejected = Vec::new();

        let updates = switch
            .enabled
            .iter()
            .map(|flag| (*flag, true))
            .chain(switch.disabled.iter().map(|flag| (*flag, false)));

        for (flag, enable) in updates {
            match flag {
                Flag::DotAll => next.dot_all = enable,
                Flag::Extended => next.extended = enable,
                Flag::IgnoreCase if self.ignore_case == enable => {}
                Flag::IgnoreCase | Flag::Other(_) => {
                    rejected.push(RejectedFlag { flag, enable });
                }
            }
        }

        (next, rejected)
    }
}

/// Stack of scopes, one frame per entered group plus the root
#[derive(Debug, Clone)]
pub struct ScopeStack {
    frames: Vec<Scope>,
}

impl ScopeStack {
    /// Create a stack holding only the root scope
    pub fn new(root: Scope) -> Self {
        ScopeStack { frames: vec![root] }
    }

    /// The scope in effect right now
    pub fn current(&self) -> Scope {
        // The root frame is never popped, see `pop`.
        self.frames.last().copied().unwrap_or_default()
    }

    /// Number of frames above the root
    pub fn depth(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// Enter a group: push the current scope, modified by the group's switch
    pub fn push(&mut self, switch: Option<&OptionSwitch>) -> (Scope, Vec<RejectedFlag>) {
        let (scope, rejected) = match switch {
            Some(switch) => self.current().apply(switch),
            None => (self.current(), Vec::new()),
        };
        self.frames.push(scope);
        (scope, rejected)
    }

    /// Leave a group, returning the scope that was active inside it
    pub fn pop(&mut self) -> Result<Scope, ConvertError> {
        if self.frames.len() <= 1 {
            return Err(ConvertError::ScopeUnderflow);
        }
        self.frames.pop().ok_or(ConvertError::ScopeUnderflow)
    }

    /// Apply an inline switch to the top frame for the rest of the group
    pub fn apply_inline(&mut self, switch: &OptionSwitch) -> (Scope, Vec<RejectedFlag>) {
        let (scope, rejected) = self.current().apply(switch);
        self.restore(scope);
        (scope, rejected)
    }

    /// Overwrite the top frame, used to undo inline switches of a branch
    pub fn restore(&mut self, scope: Scope) {
        if let Some(top) = self.frames.last_mut() {
            *top = scope;
        }
    }
}
