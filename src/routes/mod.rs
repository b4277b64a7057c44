/// Router Module Index
///
/// Routing split by who authorizes the request. The request gate wraps all of
/// them; these modules only decide which handler answers.

/// Routes reachable without any session: health, login shells.
pub mod public;

/// Resource API under `/api`. Excluded from the gate; each endpoint applies
/// its own policy.
pub mod api;

/// Admin namespace pages. Passed through by the gate and guarded inside the
/// handler by the elevated session guard.
pub mod admin;
