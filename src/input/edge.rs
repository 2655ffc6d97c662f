//! Level-to-edge conversion
//!
//! Polled devices report which buttons are held *now*. Two consecutive
//! samples are diffed here to derive press/release transitions.

use std::collections::BTreeSet;

/// Set of currently held button identifiers
///
/// Ordered so that diffs come out in a stable order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonStateSet<B: Ord> {
    held: BTreeSet<B>,
}

impl<B: Ord> Default for ButtonStateSet<B> {
    fn default() -> Self {
        Self {
            held: BTreeSet::new(),
        }
    }
}

impl<B: Ord + Copy> ButtonStateSet<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is the button held in this sample?
    pub fn contains(&self, button: B) -> bool {
        self.held.contains(&button)
    }

    /// Copy of this sample with `button` held
    #[must_use]
    pub fn with(&self, button: B) -> Self {
        let mut held = self.held.clone();
        held.insert(button);
        Self { held }
    }

    /// Copy of this sample with `button` released
    #[must_use]
    pub fn without(&self, button: B) -> Self {
        let mut held = self.held.clone();
        held.remove(&button);
        Self { held }
    }

    pub fn iter(&self) -> impl Iterator<Item = B> + '_ {
        self.held.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    pub fn len(&self) -> usize {
        self.held.len()
    }
}

impl<B: Ord> FromIterator<B> for ButtonStateSet<B> {
    fn from_iter<I: IntoIterator<Item = B>>(iter: I) -> Self {
        Self {
            held: iter.into_iter().collect(),
        }
    }
}

/// Single button transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonChange<B> {
    pub id: B,
    pub pressed: bool,
}

/// Whether a source's releases are reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleasePolicy {
    /// Emit both presses and releases (gamepads)
    Report,
    /// Emit presses only (pointer clicks)
    PressOnly,
}

/// Diff two samples into edges
///
/// Presses come first in ascending id order, then releases in ascending id
/// order. With no previous sample only presses are produced.
pub fn diff<B: Ord + Copy>(
    previous: Option<&ButtonStateSet<B>>,
    current: &ButtonStateSet<B>,
    policy: ReleasePolicy,
) -> Vec<ButtonChange<B>> {
    let Some(previous) = previous else {
        return current
            .iter()
            .map(|id| ButtonChange { id, pressed: true })
            .collect();
    };

    let mut changes: Vec<ButtonChange<B>> = current
        .held
        .difference(&previous.held)
        .map(|&id| ButtonChange { id, pressed: true })
        .collect();

    if policy == ReleasePolicy::Report {
        changes.extend(
            previous
                .held
                .difference(&current.held)
                .map(|&id| ButtonChange { id, pressed: false }),
        );
    }

    changes
}
