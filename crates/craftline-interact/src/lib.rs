//! Block targeting, timed breaking, and placement.

pub mod breaking;
pub mod placement;
pub mod raycast;

pub use breaking::{BlockBreaker, BreakEvent, BreakState, BreakTarget, CancelReason};
pub use placement::{place_block, placement_cell};
pub use raycast::{MAX_REACH, RAY_STEP, RaycastHit, ViewRay, raycast};
