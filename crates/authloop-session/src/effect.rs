//! Side effects requested by the model.
//!
//! The model never performs I/O. Each call to [`present`](crate::present)
//! returns a list of effects in the order they were decided; the worker
//! runs them fire-and-forget and feeds completions back as actions.

use std::time::Duration;

use authloop_protocol::{
    AuthChanging, AuthInfo, AuthRequest, BusMessage, ProtocolError, UserId, topics,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Subscribe to the inbound topics. Emitted once, on the first run.
    Subscribe,
    /// Send a request to the remote authority.
    Request(AuthRequest),
    /// Publish on the message bus.
    Publish(Publication),
    /// Write the resolved identity to the persistent store.
    RememberUserId(Option<UserId>),
    /// Dispatch [`Action::AuthChanged`](crate::Action::AuthChanged) after
    /// the delay.
    ScheduleSettle(Duration),
}

/// An outbound bus message, before encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum Publication {
    AuthChanging(AuthChanging),
    AuthUserId(Option<UserId>),
    SiblingBroadcast(AuthInfo),
    /// The current auth info, published on every render.
    Auth(AuthInfo),
}

impl Publication {
    pub fn topic(&self) -> &'static str {
        match self {
            Self::AuthChanging(_) => topics::AUTH_CHANGING,
            Self::AuthUserId(_) => topics::AUTH_USER_ID,
            Self::SiblingBroadcast(_) => topics::SIBLING_BROADCAST,
            Self::Auth(_) => topics::AUTH,
        }
    }

    pub fn to_message(&self) -> Result<BusMessage, ProtocolError> {
        let topic = self.topic();
        match self {
            Self::AuthChanging(changing) => BusMessage::new(topic, changing),
            Self::AuthUserId(user_id) => BusMessage::new(topic, user_id),
            Self::SiblingBroadcast(auth) | Self::Auth(auth) => BusMessage::new(topic, auth),
        }
    }
}
