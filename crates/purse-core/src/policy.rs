//! Business policy for subscription cancellations.
//!
//! A cancellation notice for a subscription does not end it by itself: the store
//! sends its own expiration event when the period runs out. Only cancellations
//! made through store support take effect immediately.

use crate::events::CancelReason;

/// What to do with a subscription cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancellationAction {
    /// Expire the active subscription now.
    ExpireNow,
    /// Accept the notice and wait for the store's expiration event.
    AwaitExpiration,
}

/// Cancel reasons with a non-default action. Unlisted reasons await expiration.
pub const CANCELLATION_POLICY: &[(CancelReason, CancellationAction)] =
    &[(CancelReason::CustomerSupport, CancellationAction::ExpireNow)];

/// Look up the action for a cancellation with the given reason.
#[must_use]
pub fn cancellation_action(reason: Option<CancelReason>) -> CancellationAction {
    reason
        .and_then(|reason| {
            CANCELLATION_POLICY
                .iter()
                .find(|(listed, _)| *listed == reason)
                .map(|(_, action)| *action)
        })
        .unwrap_or(CancellationAction::AwaitExpiration)
}
