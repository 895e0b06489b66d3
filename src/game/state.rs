use serde::{Deserialize, Serialize};

use super::action::Direction;

/// A grid-aligned position, in position units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Move position by delta
    pub fn moved_by(&self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// Move position `step` units in a direction
    pub fn moved_in_direction(&self, direction: Direction, step: i32) -> Self {
        let (dx, dy) = direction.delta();
        self.moved_by(dx * step, dy * step)
    }

    /// True when both per-axis distances are within `tolerance`
    pub fn near(&self, other: Position, tolerance: i32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// A segmented actor: the player's snake or the AI opponent.
///
/// The head is stored apart from the body; `body[0]` is the segment
/// nearest the head.
#[derive(Debug, Clone, PartialEq)]
pub struct Snake {
    head: Position,
    body: Vec<Position>,
    direction: Direction,
    pending_growth: bool,
    step: i32,
}

impl Snake {
    /// Create a snake with its head at `head`, heading right, with two
    /// trailing segments to its left
    pub fn new(head: Position, step: i32) -> Self {
        Self::with_direction(head, Direction::Right, 2, step)
    }

    /// Create a snake with `segments` body segments trailing behind the head
    pub fn with_direction(
        head: Position,
        direction: Direction,
        segments: usize,
        step: i32,
    ) -> Self {
        let mut body = Vec::with_capacity(segments);
        let mut prev = head;
        for _ in 0..segments {
            prev = prev.moved_in_direction(direction, -step);
            body.push(prev);
        }

        Self {
            head,
            body,
            direction,
            pending_growth: false,
            step,
        }
    }

    pub fn head(&self) -> Position {
        self.head
    }

    /// Body segments, excluding the head
    pub fn body(&self) -> &[Position] {
        &self.body
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_growing(&self) -> bool {
        self.pending_growth
    }

    /// Total length, head included
    pub fn len(&self) -> usize {
        self.body.len() + 1
    }

    /// Never true: the head always remains
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Head followed by every body segment
    pub fn points(&self) -> impl Iterator<Item = Position> + '_ {
        std::iter::once(self.head).chain(self.body.iter().copied())
    }

    /// Check if the head or any body segment is at `pos`
    pub fn contains(&self, pos: Position) -> bool {
        self.head == pos || self.body.contains(&pos)
    }

    /// Advance one cell.
    ///
    /// The old head becomes `body[0]`; the tail is dropped unless growth was
    /// queued, in which case the flag is consumed and the length grows by one.
    pub fn move_forward(&mut self) {
        self.body.insert(0, self.head);
        if self.pending_growth {
            self.pending_growth = false;
        } else {
            self.body.pop();
        }
        self.head = self.head.moved_in_direction(self.direction, self.step);
    }

    /// Change direction; only perpendicular turns are accepted.
    ///
    /// Returns whether the turn was applied.
    pub fn turn(&mut self, direction: Direction) -> bool {
        if direction.axis() != self.direction.axis() {
            self.direction = direction;
            true
        } else {
            false
        }
    }

    /// Change direction unconditionally
    pub fn force_turn(&mut self, direction: Direction) {
        self.direction = direction;
    }

    /// Append a segment at the current tail
    pub fn add_segment(&mut self) {
        let tail = self.body.last().copied().unwrap_or(self.head);
        self.body.push(tail);
    }

    /// Queue one segment of growth for the next move
    pub fn grow(&mut self) {
        self.pending_growth = true;
    }

    pub fn cancel_grow(&mut self) {
        self.pending_growth = false;
    }

    /// Remove up to `amount` trailing segments; the head always remains.
    ///
    /// Returns the number of segments removed.
    pub fn shrink(&mut self, amount: usize) -> usize {
        let removed = amount.min(self.body.len());
        self.body.truncate(self.body.len() - removed);
        removed
    }

    /// Clamp every point into the given bounds
    pub fn clamp_into(&mut self, clamp: impl Fn(Position) -> Position) {
        self.head = clamp(self.head);
        for segment in &mut self.body {
            *segment = clamp(*segment);
        }
    }

    #[cfg(test)]
    pub(crate) fn from_parts(
        head: Position,
        body: Vec<Position>,
        direction: Direction,
        step: i32,
    ) -> Self {
        Self {
            head,
            body,
            direction,
            pending_growth: false,
            step,
        }
    }
}
