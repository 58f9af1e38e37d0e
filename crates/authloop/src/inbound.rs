//! Inbound bus messages → actions.
//!
//! The worker subscribes to every topic in [`topics::INBOUND`] and feeds
//! each message through [`translate`]. A payload of the wrong shape is a
//! [`ProtocolError`]; the forwarder logs it and moves on.

use authloop_protocol::{ActivityEvent, BusMessage, LogoffRequest, ProtocolError, topics};
use authloop_session::Action;

/// Maps one inbound message to an action.
///
/// Returns `Ok(None)` for messages that are valid but don't call for an
/// action (an inactive-user activity event).
pub(crate) fn translate(message: &BusMessage) -> Result<Option<Action>, ProtocolError> {
    let action = match message.topic.as_str() {
        topics::STORE_USER_ID_CHANGED => Action::SetUserId(message.decode()?),
        topics::SIBLING_SYNC => Action::Sync(message.decode()?),
        topics::LOGON => Action::Logon(message.decode()?),
        topics::LOGON_FORM => Action::LogonForm(message.decode()?),
        topics::LOGOFF if message.payload.is_null() => Action::Logoff(LogoffRequest::default()),
        topics::LOGOFF => Action::Logoff(message.decode()?),
        topics::RECENT_ACTIVITY => {
            let event: ActivityEvent = message.decode()?;
            if !event.is_active {
                return Ok(None);
            }
            Action::KeepAlive
        }
        other => {
            return Err(ProtocolError::InvalidMessage(format!(
                "no inbound route for topic {other}"
            )));
        }
    };
    Ok(Some(action))
}
