//! Display-order planning for reorderable lists.
//!
//! Banners, featured categories, featured products and product images all keep
//! a dense `display_order` starting at 1. The functions here never touch the
//! database: they take the current `(id, order)` slots and return the
//! assignments to write, in the order they must be applied. Swaps always park
//! the displaced row at [`PARKED_ORDER`] first, so applying a plan row by row
//! never holds two rows at the same position.

use std::str::FromStr;

/// Temporary position for a row that is being moved out of the way.
pub const PARKED_ORDER: i32 = -1;

/// Most featured categories the storefront shows at once.
pub const MAX_FEATURED_CATEGORIES: i64 = 6;

/// A row's position in an ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot<I> {
    pub id: I,
    pub display_order: i32,
}

impl<I> Slot<I> {
    /// Create a slot.
    pub const fn new(id: I, display_order: i32) -> Self {
        Self { id, display_order }
    }
}

/// Errors from planning a reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ReorderError {
    /// The item to move is not part of the list.
    #[error("item is not part of the ordered list")]
    UnknownItem,
}

/// One-step move direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(format!("invalid direction: {s}")),
        }
    }
}

/// Position for a row appended to a list whose highest position is `max`.
#[must_use]
pub fn next_display_order(max: Option<i32>) -> i32 {
    max.map_or(1, |max| max.saturating_add(1))
}

/// Plan a one-step move of `id` towards the top (`Up`) or bottom (`Down`).
///
/// The neighbour is found by exact position match. Moving the first item up
/// or the last item down yields an empty plan.
///
/// # Errors
///
/// Returns [`ReorderError::UnknownItem`] if `id` is not in `slots`.
pub fn plan_step<I>(
    slots: &[Slot<I>],
    id: I,
    direction: Direction,
) -> Result<Vec<Slot<I>>, ReorderError>
where
    I: Copy + PartialEq,
{
    let current = find(slots, id)?;
    let target = match direction {
        Direction::Up => current.display_order - 1,
        Direction::Down => current.display_order + 1,
    };
    if target < 1 {
        return Ok(Vec::new());
    }

    Ok(slots
        .iter()
        .find(|slot| slot.display_order == target && slot.id != id)
        .map(|neighbour| swap(current, *neighbour))
        .unwrap_or_default())
}

/// Plan moving `id` to an explicit position.
///
/// If another row already holds `target`, that row takes the vacated position.
/// Moving to the current position yields an empty plan.
///
/// # Errors
///
/// Returns [`ReorderError::UnknownItem`] if `id` is not in `slots`.
pub fn plan_move_to<I>(slots: &[Slot<I>], id: I, target: i32) -> Result<Vec<Slot<I>>, ReorderError>
where
    I: Copy + PartialEq,
{
    let current = find(slots, id)?;
    if current.display_order == target {
        return Ok(Vec::new());
    }

    let conflict = slots
        .iter()
        .find(|slot| slot.display_order == target && slot.id != id);

    Ok(match conflict {
        Some(other) => swap(current, *other),
        None => vec![Slot::new(id, target)],
    })
}

/// Plan closing the gap left by removing the row at `removed_order`.
///
/// Every later row moves up by one; assignments are ordered lowest first so
/// each row lands on a position that is already free.
#[must_use]
pub fn plan_close_gap<I: Copy>(slots: &[Slot<I>], removed_order: i32) -> Vec<Slot<I>> {
    let mut later: Vec<Slot<I>> = slots
        .iter()
        .filter(|slot| slot.display_order > removed_order)
        .copied()
        .collect();
    later.sort_by_key(|slot| slot.display_order);
    later
        .into_iter()
        .map(|slot| Slot::new(slot.id, slot.display_order - 1))
        .collect()
}

/// Positions for an explicit ordering: the first id gets 1, the next 2, and
/// so on.
#[must_use]
pub fn plan_sequence<I: Copy>(ids: &[I]) -> Vec<Slot<I>> {
    ids.iter()
        .zip(1_i32..)
        .map(|(id, order)| Slot::new(*id, order))
        .collect()
}

fn find<I: Copy + PartialEq>(slots: &[Slot<I>], id: I) -> Result<Slot<I>, ReorderError> {
    slots
        .iter()
        .find(|slot| slot.id == id)
        .copied()
        .ok_or(ReorderError::UnknownItem)
}

fn swap<I: Copy>(moving: Slot<I>, displaced: Slot<I>) -> Vec<Slot<I>> {
    vec![
        Slot::new(displaced.id, PARKED_ORDER),
        Slot::new(moving.id, displaced.display_order),
        Slot::new(displaced.id, moving.display_order),
    ]
}
