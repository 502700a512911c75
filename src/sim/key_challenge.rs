//! Post-trace "perfect execution" key window
//!
//! A strong attack trace opens a short window in which one designated key
//! must be pressed. The verdict feeds the outcome resolver.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::consts::{KEY_CHALLENGE_KEYS, KEY_CHALLENGE_THRESHOLD};

/// Key-window verdict as seen by the outcome resolver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyBonus {
    /// Accuracy was too low for a window to open
    #[default]
    NotOffered,
    /// Right key inside the window
    Perfect,
    /// Wrong key: fumble
    Fumbled,
    /// Window expired
    TooSlow,
}

/// Whether a trace at `accuracy` earns a key window
pub fn qualifies(accuracy: u8) -> bool {
    accuracy > KEY_CHALLENGE_THRESHOLD
}

/// An open key window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyChallenge {
    required: char,
    remaining_ms: u32,
    verdict: Option<KeyBonus>,
}

impl KeyChallenge {
    /// Open a window with a random key from the challenge set
    pub fn open<R: Rng + ?Sized>(rng: &mut R, window_ms: u32) -> Self {
        let required = KEY_CHALLENGE_KEYS[rng.random_range(0..KEY_CHALLENGE_KEYS.len())];
        Self::with_key(required, window_ms)
    }

    pub fn with_key(required: char, window_ms: u32) -> Self {
        log::debug!("Key challenge opened: {}", required);
        Self {
            required: required.to_ascii_uppercase(),
            remaining_ms: window_ms,
            verdict: None,
        }
    }

    pub fn required_key(&self) -> char {
        self.required
    }

    pub fn remaining_ms(&self) -> u32 {
        self.remaining_ms
    }

    pub fn verdict(&self) -> Option<KeyBonus> {
        self.verdict
    }

    /// Press a key (case-insensitive). Inert once decided.
    pub fn press(&mut self, key: char) -> Option<KeyBonus> {
        if self.verdict.is_some() {
            return None;
        }
        let verdict = if key.to_ascii_uppercase() == self.required {
            KeyBonus::Perfect
        } else {
            KeyBonus::Fumbled
        };
        self.verdict = Some(verdict);
        Some(verdict)
    }

    /// Press a key by its browser name (`KeyboardEvent.key`). Only a
    /// single-character name can match; "Escape", "Shift" and the like fumble.
    pub fn press_named(&mut self, name: &str) -> Option<KeyBonus> {
        let mut chars = name.chars();
        match (chars.next(), chars.next()) {
            (Some(key), None) => self.press(key),
            _ => {
                if self.verdict.is_some() {
                    return None;
                }
                log::debug!("Named key `{}` fumbles the challenge", name);
                self.verdict = Some(KeyBonus::Fumbled);
                self.verdict
            }
        }
    }

    /// Run the window down. Returns `TooSlow` on the call that expires it.
    pub fn advance_ms(&mut self, ms: u32) -> Option<KeyBonus> {
        if self.verdict.is_some() {
            return None;
        }
        self.remaining_ms = self.remaining_ms.saturating_sub(ms);
        if self.remaining_ms == 0 {
            self.verdict = Some(KeyBonus::TooSlow);
            return self.verdict;
        }
        None
    }
}
