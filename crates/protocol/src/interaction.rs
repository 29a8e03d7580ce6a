//! Click interaction matching for item mechanics.
//!
//! A click event is configured with two tokens, a phase (`left`, `right`,
//! `all`) and a target (`air`, `block`, `all`). They expand into the set of
//! concrete interactions the mechanic reacts to.

use std::collections::BTreeSet;

/// Concrete interaction reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Interaction {
    LeftClickAir,
    LeftClickBlock,
    RightClickAir,
    RightClickBlock,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickPhase {
    Left,
    Right,
    All,
}

impl ClickPhase {
    pub fn parse(token: &str) -> Option<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickTarget {
    Air,
    Block,
    All,
}

impl ClickTarget {
    /// Anything other than `block` or `all` means air.
    pub fn parse(token: &str) -> Self {
        match token.trim().to_ascii_lowercase().as_str() {
            "block" => Self::Block,
            "all" => Self::All,
            _ => Self::Air,
        }
    }
}

/// Expands a phase/target pair into concrete interactions.
pub fn expand_clicks(phase: ClickPhase, target: ClickTarget) -> BTreeSet<Interaction> {
    let phases: &[bool] = match phase {
        ClickPhase::Left => &[false],
        ClickPhase::Right => &[true],
        ClickPhase::All => &[true, false],
    };
    let (air, block) = match target {
        ClickTarget::Air => (true, false),
        ClickTarget::Block => (false, true),
        ClickTarget::All => (true, true),
    };

    let mut set = BTreeSet::new();
    for &right in phases {
        if air {
            set.insert(if right {
                Interaction::RightClickAir
            } else {
                Interaction::LeftClickAir
            });
        }
        if block {
            set.insert(if right {
                Interaction::RightClickBlock
            } else {
                Interaction::LeftClickBlock
            });
        }
    }
    set
}

/// Matches host interactions against a configured click event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClickMatcher {
    interactions: BTreeSet<Interaction>,
}

impl ClickMatcher {
    /// Builds a matcher from raw tokens. An unknown phase matches nothing.
    pub fn from_tokens(phase: &str, target: &str) -> Self {
        let interactions = match ClickPhase::parse(phase) {
            Some(phase) => expand_clicks(phase, ClickTarget::parse(target)),
            None => BTreeSet::new(),
        };
        Self { interactions }
    }

    pub fn matches(&self, interaction: Interaction) -> bool {
        self.interactions.contains(&interaction)
    }

    pub fn interactions(&self) -> &BTreeSet<Interaction> {
        &self.interactions
    }
}
