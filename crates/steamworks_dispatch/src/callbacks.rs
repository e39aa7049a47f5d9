//! # Callback Registry
//!
//! One optional slot per supported event kind. An empty slot means the
//! application is not interested: records of that kind are released without
//! being decoded.

use std::fmt;

use crossbeam_channel::{Sender, TrySendError};
use steamworks_bridge::{EResult, EventKind, SteamId};

use crate::decoder::{DecodedEvent, UserStatsReceived};

/// Handler for stats-received notifications: `(game id, result, user)`.
pub type UserStatsReceivedFn = Box<dyn FnMut(u64, EResult, SteamId)>;

/// Application callbacks, invoked on the thread that drains the queue.
///
/// ## Usage
///
/// ```rust,ignore
/// let callbacks = Callbacks::new().on_user_stats_received(|game_id, result, user| {
///     if result.is_ok() {
///         println!("stats for {user} in {game_id}");
///     }
/// });
/// ```
#[derive(Default)]
pub struct Callbacks {
    user_stats_received: Option<UserStatsReceivedFn>,
}

impl Callbacks {
    /// A registry with every slot empty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the stats-received slot.
    #[must_use]
    pub fn on_user_stats_received<F>(mut self, callback: F) -> Self
    where
        F: FnMut(u64, EResult, SteamId) + 'static,
    {
        self.user_stats_received = Some(Box::new(callback));
        self
    }

    /// Replaces the stats-received slot, returning the previous handler.
    pub fn set_user_stats_received(
        &mut self,
        callback: Option<UserStatsReceivedFn>,
    ) -> Option<UserStatsReceivedFn> {
        std::mem::replace(&mut self.user_stats_received, callback)
    }

    /// A registry that pushes every supported event into `sender`.
    ///
    /// Events that do not fit (full or disconnected channel) are dropped
    /// with a warning; dispatch keeps going.
    #[must_use]
    pub fn forwarding(sender: Sender<DecodedEvent>) -> Self {
        Self::new().on_user_stats_received(move |game_id, result, user| {
            forward(
                &sender,
                DecodedEvent::UserStatsReceived(UserStatsReceived {
                    game_id,
                    result,
                    user,
                }),
            );
        })
    }

    /// Whether a handler is registered for `kind`.
    #[must_use]
    pub fn handles(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::USER_STATS_RECEIVED => self.user_stats_received.is_some(),
            _ => false,
        }
    }

    /// Invokes the slot matching `event`. Returns false if it is empty.
    pub(crate) fn invoke(&mut self, event: DecodedEvent) -> bool {
        match event {
            DecodedEvent::UserStatsReceived(stats) => match self.user_stats_received.as_mut() {
                Some(callback) => {
                    callback(stats.game_id, stats.result, stats.user);
                    true
                }
                None => false,
            },
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("user_stats_received", &self.user_stats_received.is_some())
            .finish()
    }
}

fn forward(sender: &Sender<DecodedEvent>, event: DecodedEvent) {
    match sender.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(event)) => {
            tracing::warn!(kind = %event.kind(), "event channel full, dropping event");
        }
        Err(TrySendError::Disconnected(event)) => {
            tracing::warn!(kind = %event.kind(), "event channel closed, dropping event");
        }
    }
}
