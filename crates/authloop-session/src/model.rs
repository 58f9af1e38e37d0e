//! The session model: the only writer of the [`SessionSnapshot`].
//!
//! [`present`] folds one [`Proposal`] into the snapshot by walking a fixed,
//! ordered list of rules. Each rule checks its own guard and, if it fires,
//! mutates the snapshot and queues effects. The rules don't know about each
//! other; ordering alone decides what a combined proposal does.
//!
//! After the rules, [`render`] publishes the current auth info, whether or
//! not anything changed.
//!
//! # Transitions
//!
//! Status changes go through [`state_change`], which also emits the effects
//! tied to entering a status:
//!
//! | entering        | effects                                               |
//! |-----------------|-------------------------------------------------------|
//! | `auth_changing` | publish `auth-changing`, schedule the settle event    |
//! | `auth_known`    | publish `auth-user-id`, remember the id, sibling sync |
//! | anything else   | none                                                  |

use std::time::Duration;

use authloop_protocol::{AuthChanging, AuthRequest, UserId};
use tracing::{debug, info};

use crate::action::{Action, AuthFailure, Proposal};
use crate::effect::{Effect, Publication};
use crate::snapshot::SessionSnapshot;
use crate::status::AuthStatus;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// How long `auth_changing` lasts before settling in `auth_known`.
    pub settle_delay: Duration,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            settle_delay: Self::DEFAULT_SETTLE_DELAY,
        }
    }
}

impl ModelConfig {
    pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(20);
}

// ---------------------------------------------------------------------------
// present
// ---------------------------------------------------------------------------

/// State shared by the rules during one `present` call.
struct Step<'a> {
    snapshot: &'a mut SessionSnapshot,
    proposal: &'a Proposal,
    config: &'a ModelConfig,
    /// The snapshot was in `start` when this call began.
    first_run: bool,
    /// The identity held before this update (after seeding).
    previous_user_id: Option<UserId>,
    effects: Vec<Effect>,
}

impl Step<'_> {
    fn transition(&mut self, target: AuthStatus) {
        state_change(self.snapshot, target, self.config, &mut self.effects);
    }

    fn issue(&mut self, request: AuthRequest) {
        if request.command().is_check() {
            self.snapshot.checks_in_flight += 1;
        }
        self.effects.push(Effect::Request(request));
    }
}

/// A rule returns `true` if it fired.
type Rule = fn(&mut Step<'_>) -> bool;

const RULES: [(&str, Rule); 9] = [
    ("first_run", first_run),
    ("identity_check", identity_check),
    ("periodic_check", periodic_check),
    ("logon", logon),
    ("logoff", logoff),
    ("remote_answer", remote_answer),
    ("remote_error", remote_error),
    ("change_settle", change_settle),
    ("keep_alive", keep_alive),
];

/// Fold `proposal` into `snapshot` and return the effects to run, in order.
///
/// Always ends with a [`Publication::Auth`] of the current auth info.
pub fn present(
    snapshot: &mut SessionSnapshot,
    proposal: &Proposal,
    config: &ModelConfig,
) -> Vec<Effect> {
    if snapshot.is_start() {
        if let Some(remembered) = proposal.remembered_user_id {
            snapshot.auth.user_id = remembered;
        }
    }
    if proposal.completed.is_some_and(|c| c.is_check()) {
        snapshot.checks_in_flight = snapshot.checks_in_flight.saturating_sub(1);
    }

    let mut step = Step {
        first_run: snapshot.is_start(),
        previous_user_id: snapshot.auth.user_id,
        snapshot,
        proposal,
        config,
        effects: Vec::new(),
    };

    for (name, rule) in RULES {
        if rule(&mut step) {
            debug!(rule = name, status = %step.snapshot.status, "rule fired");
        }
    }

    let Step {
        snapshot,
        mut effects,
        ..
    } = step;
    render(snapshot, &mut effects);
    effects
}

/// Shorthand for `present(snapshot, &action.into_proposal(), config)`.
pub fn dispatch(
    snapshot: &mut SessionSnapshot,
    action: Action,
    config: &ModelConfig,
) -> Vec<Effect> {
    debug!(action = action.name(), status = %snapshot.status, "dispatch");
    present(snapshot, &action.into_proposal(), config)
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn first_run(step: &mut Step<'_>) -> bool {
    if !step.first_run {
        return false;
    }
    step.effects.push(Effect::Subscribe);
    true
}

fn identity_check(step: &mut Step<'_>) -> bool {
    let changed = matches!(
        step.proposal.user_id,
        Some(user_id) if user_id != step.snapshot.auth.user_id
    );
    if !step.first_run && !changed {
        return false;
    }
    step.transition(AuthStatus::AuthUnknown);
    step.issue(AuthRequest::Status);
    true
}

fn periodic_check(step: &mut Step<'_>) -> bool {
    if !step.proposal.is_auth_check {
        return false;
    }
    let snapshot = &step.snapshot;
    // `is_auth_known` also holds mid-logon once an ok answer is cached, so
    // the status itself decides whether a logon or logoff is still pending.
    if snapshot.status.is_awaiting_answer() {
        debug!(status = %snapshot.status, "answer pending, skipping check");
        return false;
    }
    if !snapshot.is_auth_known() && !snapshot.is_auth_error() {
        return false;
    }
    if snapshot.checks_in_flight > 0 {
        debug!(
            in_flight = snapshot.checks_in_flight,
            "check already in flight, skipping"
        );
        return false;
    }

    let request = if snapshot.pending_keep_alive && snapshot.auth.is_authenticated {
        AuthRequest::Refresh
    } else {
        AuthRequest::Status
    };
    step.snapshot.pending_keep_alive = false;
    step.issue(request);
    true
}

fn logon(step: &mut Step<'_>) -> bool {
    let proposal = step.proposal;
    let Some(credentials) = &proposal.logon else {
        return false;
    };
    step.snapshot.last_error = None;
    step.snapshot.onauth = proposal.onauth.clone();
    step.transition(AuthStatus::Authenticating);
    step.issue(AuthRequest::Logon(credentials.clone()));
    true
}

fn logoff(step: &mut Step<'_>) -> bool {
    if !step.proposal.logoff {
        return false;
    }
    step.snapshot.last_error = None;
    step.snapshot.onauth = step.proposal.onauth.clone();
    step.transition(AuthStatus::Authenticating);
    step.issue(AuthRequest::Logoff);
    true
}

fn remote_answer(step: &mut Step<'_>) -> bool {
    let Some(response) = &step.proposal.auth_response else {
        return false;
    };
    step.snapshot.auth = response.clone().into_info();
    if step.snapshot.auth.user_id == step.previous_user_id {
        step.transition(AuthStatus::AuthKnown);
    } else {
        step.transition(AuthStatus::AuthChanging);
    }
    true
}

fn remote_error(step: &mut Step<'_>) -> bool {
    if !step.proposal.is_auth_error {
        return false;
    }
    let failure = step
        .proposal
        .error
        .clone()
        .unwrap_or_else(|| AuthFailure::rejected(None));

    // Rejections only count while an answer is awaited; a transport failure
    // also counts after the fact, so a failed periodic check surfaces.
    let status = step.snapshot.status;
    let applies = status.is_awaiting_answer()
        || (failure.is_transport()
            && matches!(status, AuthStatus::AuthKnown | AuthStatus::AuthError));
    if !applies {
        debug!(%status, %failure, "stale error ignored");
        return false;
    }

    step.snapshot.last_error = Some(failure);
    step.transition(AuthStatus::AuthError);
    true
}

fn change_settle(step: &mut Step<'_>) -> bool {
    if !step.proposal.is_auth_changed || !step.snapshot.is_auth_changing() {
        return false;
    }
    step.transition(AuthStatus::AuthKnown);
    true
}

fn keep_alive(step: &mut Step<'_>) -> bool {
    if !step.proposal.is_keep_alive {
        return false;
    }
    step.snapshot.pending_keep_alive = true;
    true
}

// ---------------------------------------------------------------------------
// Transition driver
// ---------------------------------------------------------------------------

/// Move `snapshot` to `target`, queueing the effects of entering it.
///
/// Does nothing if the snapshot is already in `target`.
pub fn state_change(
    snapshot: &mut SessionSnapshot,
    target: AuthStatus,
    config: &ModelConfig,
    effects: &mut Vec<Effect>,
) {
    if snapshot.status == target {
        return;
    }

    match target {
        AuthStatus::AuthChanging => {
            effects.push(Effect::Publish(Publication::AuthChanging(AuthChanging {
                onauth: snapshot.onauth.clone(),
                auth: snapshot.auth.clone(),
            })));
            effects.push(Effect::ScheduleSettle(config.settle_delay));
        }
        AuthStatus::AuthKnown => {
            let user_id = snapshot.auth.user_id;
            effects.push(Effect::Publish(Publication::AuthUserId(user_id)));
            effects.push(Effect::RememberUserId(user_id));
            effects.push(Effect::Publish(Publication::SiblingBroadcast(
                snapshot.auth.clone(),
            )));
        }
        _ => {}
    }

    info!(from = %snapshot.status, to = %target, user_id = ?snapshot.auth.user_id, "auth status changed");
    snapshot.status = target;
}

// ---------------------------------------------------------------------------
// Render
// ---------------------------------------------------------------------------

/// Publish the current auth info and run [`next_action`].
pub fn render(snapshot: &SessionSnapshot, effects: &mut Vec<Effect>) {
    effects.push(Effect::Publish(Publication::Auth(snapshot.auth.clone())));
    effects.extend(next_action(snapshot));
}

/// Follow-up effects decided purely from the rendered snapshot. None today.
pub fn next_action(_snapshot: &SessionSnapshot) -> Vec<Effect> {
    Vec::new()
}
