// SPDX-License-Identifier: GPL-3.0-only

//! Wrap-around position into a published inventory.

/// Navigation direction for cursor commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Case-insensitive parse of a command verb. Anything outside
    /// {"forward", "backward"} is rejected.
    pub fn parse(verb: &str) -> Option<Self> {
        if verb.eq_ignore_ascii_case("forward") {
            Some(Direction::Forward)
        } else if verb.eq_ignore_ascii_case("backward") {
            Some(Direction::Backward)
        } else {
            None
        }
    }
}

/// Integer position with wrap-around stepping.
///
/// `-1` is the empty sentinel: it is forced whenever the inventory is
/// empty and reads as out-of-bounds everywhere. Stepping uses true
/// mathematical modulo, so backward from 0 lands on `count - 1`, never
/// on a negative index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCursor {
    position: i32,
}

impl Default for IndexCursor {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexCursor {
    pub const EMPTY: i32 = -1;

    pub fn new() -> Self {
        Self {
            position: Self::EMPTY,
        }
    }

    pub fn at(position: i32) -> Self {
        Self { position }
    }

    pub fn position(&self) -> i32 {
        self.position
    }

    pub fn set(&mut self, position: i32) {
        self.position = position;
    }

    pub fn in_bounds(&self, count: usize) -> bool {
        self.position >= 0 && (self.position as usize) < count
    }

    /// Step one position in `dir`, wrapping around `count`. With an
    /// empty inventory the cursor stays at the sentinel.
    pub fn step(&mut self, dir: Direction, count: usize) {
        if count == 0 {
            self.position = Self::EMPTY;
            return;
        }
        let delta: i64 = match dir {
            Direction::Forward => 1,
            Direction::Backward => -1,
        };
        // i64 so a position at the i32 limits cannot overflow the step.
        self.position = (i64::from(self.position) + delta).rem_euclid(count as i64) as i32;
    }

    /// Re-validate against a freshly published inventory: force the
    /// sentinel when it is empty, clamp to the last valid index when
    /// the inventory shrank past the current position.
    pub fn apply_count(&mut self, count: usize) {
        if count == 0 {
            self.position = Self::EMPTY;
        } else if self.position >= count as i32 {
            self.position = count as i32 - 1;
        }
    }
}
