//! Secure gate for routes flagged `secure`.
//!
//! Unlocking is physical: the client asks for an unlock, then the user
//! presses the configured key sequence on the keyboard within the unlock
//! window.
//!
//! 1. Client sends `secure unlock` → gate enters `Unlocking`
//! 2. Host firmware forwards key events via [`SecureGate::on_key`]
//! 3. Final key of the sequence → `Unlocked`
//! 4. Idle timeout, unlock timeout or `secure lock` → `Locked`
//!
//! All timing uses wrapping millisecond arithmetic supplied by the caller,
//! so the gate itself has no clock.

use log::{debug, info, warn};

use crate::config::{KeyPosition, MAX_UNLOCK_KEYS, SecureConfig};

use super::codec::ResponseFlags;

/// Lock state as reported on the wire by the secure status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SecureStatus {
    Locked = 0,
    Unlocking = 1,
    Unlocked = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SecureState {
    /// Gate not armed: every secure route is permitted.
    Disabled,
    Locked,
    Unlocking { started_ms: u32, progress: usize },
    Unlocked { last_activity_ms: u32 },
}

/// Tracks whether secure routes may run.
#[derive(Debug, Clone)]
pub struct SecureGate {
    state: SecureState,
    sequence: heapless::Vec<KeyPosition, MAX_UNLOCK_KEYS>,
    unlock_timeout_ms: u32,
    idle_timeout_ms: u32,
}

impl SecureGate {
    pub fn new(config: &SecureConfig) -> Self {
        Self {
            state: if config.enabled {
                SecureState::Locked
            } else {
                SecureState::Disabled
            },
            sequence: config.unlock_sequence.clone(),
            unlock_timeout_ms: config.unlock_timeout_ms,
            idle_timeout_ms: config.idle_timeout_ms,
        }
    }

    /// Wire status. A disabled gate reports `Unlocked`.
    pub fn status(&self) -> SecureStatus {
        match self.state {
            SecureState::Locked => SecureStatus::Locked,
            SecureState::Unlocking { .. } => SecureStatus::Unlocking,
            SecureState::Disabled | SecureState::Unlocked { .. } => SecureStatus::Unlocked,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state != SecureState::Disabled
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(
            self.state,
            SecureState::Disabled | SecureState::Unlocked { .. }
        )
    }

    /// Open the unlock window. Already unlocked stays unlocked; a second
    /// request while unlocking restarts the window and the sequence.
    pub fn begin_unlock(&mut self, now_ms: u32) {
        match self.state {
            SecureState::Locked | SecureState::Unlocking { .. } => {
                info!("secure: unlock requested");
                self.state = SecureState::Unlocking {
                    started_ms: now_ms,
                    progress: 0,
                };
            }
            SecureState::Disabled | SecureState::Unlocked { .. } => {}
        }
    }

    pub fn lock(&mut self) {
        if self.is_enabled() {
            if self.state != SecureState::Locked {
                info!("secure: locked");
            }
            self.state = SecureState::Locked;
        }
    }

    /// Feed a key event from the matrix scanner.
    ///
    /// Returns `true` when this press completed the unlock sequence. Keys
    /// must arrive in sequence order. A stray press falls back to the
    /// longest part of the sequence it still completes, so `[A, A, B]`
    /// unlocks after `A A A B`.
    pub fn on_key(&mut self, pos: KeyPosition, pressed: bool, now_ms: u32) -> bool {
        self.tick(now_ms);
        let SecureState::Unlocking { started_ms, progress } = self.state else {
            return false;
        };
        if !pressed {
            return false;
        }

        let matched = progress;
        let progress = self.advance(matched, pos);
        if progress <= matched {
            debug!("secure: key {:?} out of sequence, progress {} -> {}", pos, matched, progress);
        }

        if progress >= self.sequence.len() {
            info!("secure: unlocked");
            self.state = SecureState::Unlocked {
                last_activity_ms: now_ms,
            };
            return true;
        }

        self.state = SecureState::Unlocking {
            started_ms,
            progress,
        };
        false
    }

    /// Expire the unlock window or the idle timer.
    pub fn tick(&mut self, now_ms: u32) {
        match self.state {
            SecureState::Unlocking { started_ms, .. }
                if now_ms.wrapping_sub(started_ms) >= self.unlock_timeout_ms =>
            {
                warn!("secure: unlock window expired");
                self.state = SecureState::Locked;
            }
            SecureState::Unlocked { last_activity_ms }
                if self.idle_timeout_ms != 0
                    && now_ms.wrapping_sub(last_activity_ms) >= self.idle_timeout_ms =>
            {
                info!("secure: idle timeout, relocking");
                self.state = SecureState::Locked;
            }
            _ => {}
        }
    }

    /// Refresh the idle timer after a secure route ran.
    pub fn touch(&mut self, now_ms: u32) {
        if let SecureState::Unlocked { last_activity_ms } = &mut self.state {
            *last_activity_ms = now_ms;
        }
    }

    /// Gate check used by dispatch: expire timers, then permit if
    /// unlocked (refreshing activity).
    pub fn permits(&mut self, now_ms: u32) -> bool {
        self.tick(now_ms);
        if self.is_unlocked() {
            self.touch(now_ms);
            true
        } else {
            false
        }
    }

    /// Lock-state bits OR-ed into every response while the gate is armed.
    /// Length of the longest sequence prefix that ends with `pos`, given
    /// that the first `progress` keys were the last ones pressed.
    fn advance(&self, progress: usize, pos: KeyPosition) -> usize {
        let seq = self.sequence.as_slice();
        let recent = &seq[..progress.min(seq.len())];
        (1..=recent.len() + 1)
            .rev()
            .find(|&k| {
                seq.get(k - 1) == Some(&pos) && seq[..k - 1] == recent[recent.len() + 1 - k..]
            })
            .unwrap_or(0)
    }

    pub fn response_flags(&self) -> ResponseFlags {
        match self.state {
            SecureState::Unlocking { .. } => ResponseFlags::UNLOCK_IN_PROGRESS,
            SecureState::Unlocked { .. } => ResponseFlags::UNLOCKED,
            SecureState::Disabled | SecureState::Locked => ResponseFlags::empty(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────
