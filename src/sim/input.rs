//! Raw key state and the spin alternation rule

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Keys the simulation understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    Up,
    Down,
    Left,
    Right,
    /// "J"
    SpinLeft,
    /// "K"
    SpinRight,
}

/// One of the two alternating spin keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinKey {
    Left,
    Right,
}

impl Key {
    pub fn spin(self) -> Option<SpinKey> {
        match self {
            Key::SpinLeft => Some(SpinKey::Left),
            Key::SpinRight => Some(SpinKey::Right),
            _ => None,
        }
    }
}

/// Keys currently held down
#[derive(Debug, Clone, Default)]
pub struct KeyState {
    held: BTreeSet<Key>,
}

impl KeyState {
    /// Record a key-down; returns false for auto-repeat of a held key
    pub fn press(&mut self, key: Key) -> bool {
        self.held.insert(key)
    }

    pub fn release(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    /// Unit movement direction from the held arrow keys (screen space, +y down)
    pub fn movement(&self) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if self.is_held(Key::Up) {
            dir.y -= 1.0;
        }
        if self.is_held(Key::Down) {
            dir.y += 1.0;
        }
        if self.is_held(Key::Left) {
            dir.x -= 1.0;
        }
        if self.is_held(Key::Right) {
            dir.x += 1.0;
        }
        dir.normalize_or_zero()
    }
}

/// Rejects a spin press identical to the previously accepted one
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpinGate {
    last: Option<SpinKey>,
}

impl SpinGate {
    pub fn accept(&mut self, key: SpinKey) -> bool {
        if self.last == Some(key) {
            return false;
        }
        self.last = Some(key);
        true
    }

    pub fn last(&self) -> Option<SpinKey> {
        self.last
    }
}
