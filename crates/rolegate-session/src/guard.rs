// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Route access gating.
//!
//! Each protected view declares an optional required role and asks its guard
//! what to do with the current session snapshot. The guard classifies the
//! snapshot and, through [`RouteAccessGuard::check`], makes the redirect
//! decision at most once per session epoch: re-entrant evaluation for an
//! unchanged session is a hold, not a second redirect. The epoch comparison
//! is atomic, replacing the racy "is redirecting" boolean this logic is
//! usually built with.

use std::sync::atomic::{AtomicU64, Ordering};

use rolegate_core::Role;

use crate::config::EntryPoints;
use crate::session::Session;

/// Sentinel for "no epoch decided yet".
const UNDECIDED: u64 = u64::MAX;

// =============================================================================
// Guard Decision
// =============================================================================

/// What a protected view should do with the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session is still initializing: render a pending placeholder and
    /// never redirect.
    Pending,
    /// Render the protected content.
    Allow,
    /// Navigate to the given route.
    Redirect(String),
    /// A decision was already made for this session; keep the current view.
    Settled,
}

impl GuardDecision {
    /// Returns `true` if this decision is a redirect.
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardDecision::Redirect(_))
    }

    /// Returns the redirect target, if any.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            GuardDecision::Redirect(target) => Some(target),
            _ => None,
        }
    }
}

// =============================================================================
// Route Access Guard
// =============================================================================

/// Gate for one protected view.
///
/// One guard instance exists per view mount; the instance scopes the
/// once-per-session redirect bookkeeping.
#[derive(Debug)]
pub struct RouteAccessGuard {
    required_role: Option<Role>,
    entry_points: EntryPoints,
    last_decided: AtomicU64,
}

impl RouteAccessGuard {
    /// Creates a guard with no role requirement: any authenticated session
    /// may render.
    pub fn new(entry_points: EntryPoints) -> Self {
        Self {
            required_role: None,
            entry_points,
            last_decided: AtomicU64::new(UNDECIDED),
        }
    }

    /// Requires a specific role to render.
    pub fn with_required_role(mut self, role: Role) -> Self {
        self.required_role = Some(role);
        self
    }

    /// Returns the required role, if any.
    pub fn required_role(&self) -> Option<Role> {
        self.required_role
    }

    /// Classifies a session snapshot without touching the once-per-epoch
    /// bookkeeping. Never returns [`GuardDecision::Settled`].
    pub fn evaluate(&self, session: &Session) -> GuardDecision {
        if session.is_initializing() {
            return GuardDecision::Pending;
        }

        if session.is_unauthenticated() {
            return GuardDecision::Redirect(self.entry_points.sign_in.clone());
        }

        match (self.required_role, session.role()) {
            (Some(required), Some(actual)) if actual != required => {
                // Send the actor to its own entry point, not the sign-in page.
                GuardDecision::Redirect(self.entry_points.home_for(actual).to_string())
            }
            (Some(_), None) => {
                // A role is required but the session has none; the sign-in
                // entry point is the only safe fallback.
                GuardDecision::Redirect(self.entry_points.sign_in.clone())
            }
            _ => GuardDecision::Allow,
        }
    }

    /// Decides what to do with a session snapshot, at most once per epoch.
    ///
    /// The first call for a given epoch returns the classification; later
    /// calls for the same epoch return [`GuardDecision::Settled`] so
    /// re-renders never re-issue a redirect. An initializing session never
    /// consumes its epoch: the real decision still fires once the first
    /// identity event lands.
    pub fn check(&self, session: &Session) -> GuardDecision {
        if session.is_initializing() {
            return GuardDecision::Pending;
        }

        let previous = self.last_decided.swap(session.epoch(), Ordering::SeqCst);
        if previous == session.epoch() {
            return GuardDecision::Settled;
        }

        self.evaluate(session)
    }
}

// =============================================================================
// Tests
// =============================================================================
