//! The subscription check run on every client portal navigation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::config::GateOptions;
use crate::console;
use crate::errors::GateError;
use crate::navigation::BrowserNavigator;
use crate::routes::RouteTable;
use crate::structs::account::ClientAccount;
use crate::structs::client::Client;
use crate::structs::SubscriptionStatus;

/// Source of the viewer's bearer token.
pub trait TokenStore: Send + Sync {
    fn token(&self) -> Option<String>;
}

impl<F> TokenStore for F
where
    F: Fn() -> Option<String> + Send + Sync,
{
    fn token(&self) -> Option<String> {
        self()
    }
}

/// Looks up the account record behind a bearer token.
pub trait AccountApi: Send + Sync {
    fn fetch_account(&self, token: &str) -> Result<ClientAccount, GateError>;
}

/// Moves the viewer to another portal route.
///
/// Called while the gate holds its state lock. Implementations must not call
/// back into the same `SubscriptionCheck`; `is_current` is the one exception.
pub trait Navigator: Send + Sync {
    fn redirect(&self, route: &str) -> Result<(), GateError>;
}

impl<F> Navigator for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect(&self, route: &str) -> Result<(), GateError> {
        self(route);
        Ok(())
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Why the viewer was sent away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No token, or the account lookup failed for any reason.
    Unauthenticated,
    /// Signed in, but the subscription is not serviceable.
    AccessLapsed,
}

impl Denial {
    pub fn route<'a>(&self, routes: &'a RouteTable) -> &'a str {
        match self {
            Denial::Unauthenticated => routes.login_route(),
            Denial::AccessLapsed => routes.upgrade_route(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckPhase {
    /// Waiting on the account API.
    Loading,
    /// Public route. Nothing was checked.
    Bypassed,
    /// The viewer may stay on the route.
    Resolved,
    Redirected(Denial),
    /// A newer navigation started before this check finished. Its result was dropped.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateState {
    pub phase: CheckPhase,
    pub status: SubscriptionStatus,
}

impl GateState {
    fn loading() -> Self {
        Self {
            phase: CheckPhase::Loading,
            status: SubscriptionStatus::loading(),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.phase == CheckPhase::Loading
    }

    pub fn redirect(&self) -> Option<Denial> {
        match self.phase {
            CheckPhase::Redirected(denial) => Some(denial),
            _ => None,
        }
    }
}

pub type CheckOutcome = GateState;

/// Identifies one navigation. Stale once a newer navigation begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationTicket(u64);

/// Guards protected portal routes.
pub struct SubscriptionCheck {
    routes: RouteTable,
    tokens: Box<dyn TokenStore>,
    api: Box<dyn AccountApi>,
    navigator: Box<dyn Navigator>,
    clock: Box<dyn Clock>,
    debug: bool,
    navigation: AtomicU64,
    state: RwLock<GateState>,
}

impl std::fmt::Debug for SubscriptionCheck {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionCheck")
            .field("routes", &self.routes)
            .field("debug", &self.debug)
            .field("navigation", &self.navigation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SubscriptionCheck {
    pub fn new(
        routes: RouteTable,
        tokens: impl TokenStore + 'static,
        api: impl AccountApi + 'static,
        navigator: impl Navigator + 'static,
    ) -> Self {
        Self {
            routes,
            tokens: Box::new(tokens),
            api: Box::new(api),
            navigator: Box::new(navigator),
            clock: Box::new(SystemClock),
            debug: false,
            navigation: AtomicU64::new(0),
            state: RwLock::new(GateState::loading()),
        }
    }

    /// Builds a gate that checks against the platform API and redirects in the browser.
    pub fn from_options(
        options: &GateOptions,
        tokens: impl TokenStore + 'static,
    ) -> Result<Self, GateError> {
        options.validate()?;
        let client = Client::new(options.client_options())?;
        let navigator = BrowserNavigator::new(options.portal_base_url.clone());

        Ok(Self::new(options.route_table(), tokens, client, navigator).with_debug(options.debug))
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Print `[GATE]` lines to stdout.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Latest state of the most recent navigation.
    pub fn state(&self) -> GateState {
        match self.state.read() {
            Ok(state) => state.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn status(&self) -> SubscriptionStatus {
        self.state().status
    }

    pub fn is_loading(&self) -> bool {
        self.state().is_loading()
    }

    /// Starts a new navigation, invalidating every earlier ticket.
    pub fn begin_navigation(&self) -> NavigationTicket {
        let mut guard = self.write_state();
        let ticket = NavigationTicket(self.navigation.fetch_add(1, Ordering::SeqCst) + 1);
        *guard = GateState::loading();
        ticket
    }

    /// The viewer left the guarded route. In-flight checks will not redirect.
    pub fn navigate_away(&self) {
        let _guard = self.write_state();
        self.navigation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: NavigationTicket) -> bool {
        self.navigation.load(Ordering::SeqCst) == ticket.0
    }

    /// Runs the check for a navigation to `path`.
    pub fn check(&self, path: &str) -> CheckOutcome {
        let ticket = self.begin_navigation();
        self.evaluate(path, ticket)
    }

    /// Runs the check for `path` under an already issued ticket.
    pub fn evaluate(&self, path: &str, ticket: NavigationTicket) -> CheckOutcome {
        if self.routes.is_public(path) {
            debug!(path, "public route, skipping subscription check");
            return self.finish(
                path,
                ticket,
                CheckPhase::Bypassed,
                SubscriptionStatus::loading(),
            );
        }

        let token = match self.tokens.token().filter(|token| !token.trim().is_empty()) {
            Some(token) => token,
            None => {
                let reason = GateError::MissingToken.to_string();
                return self.deny(
                    path,
                    ticket,
                    Denial::Unauthenticated,
                    SubscriptionStatus::loading(),
                    &reason,
                );
            }
        };

        console::status(self.debug, "Checking subscription...");

        let account = match self.api.fetch_account(token.trim()) {
            Ok(account) => account,
            Err(err) => {
                let reason = err.to_string();
                return self.deny(
                    path,
                    ticket,
                    Denial::Unauthenticated,
                    SubscriptionStatus::loading(),
                    &reason,
                );
            }
        };

        let now = self.clock.now();
        let status = SubscriptionStatus::from_account(&account, now);

        if status.needs_upgrade(now) && !self.routes.is_upgrade_route(path) {
            let reason = format!("Subscription is {}.", status.status);
            return self.deny(path, ticket, Denial::AccessLapsed, status, &reason);
        }

        debug!(
            path,
            status = %status.status,
            days_remaining = ?status.days_remaining,
            "subscription check resolved"
        );
        console::status(self.debug, &format!("Subscription is {}.", status.status));

        self.finish(path, ticket, CheckPhase::Resolved, status)
    }

    fn deny(
        &self,
        path: &str,
        ticket: NavigationTicket,
        denial: Denial,
        status: SubscriptionStatus,
        reason: &str,
    ) -> CheckOutcome {
        let state = GateState {
            phase: CheckPhase::Redirected(denial),
            status,
        };

        // The redirect runs under the state lock so no navigation can start between
        // the ticket check and the navigator call.
        let _guard = match self.publish(path, ticket, state.clone()) {
            Ok(guard) => guard,
            Err(superseded) => return superseded,
        };

        let target = denial.route(&self.routes);
        warn!(path, route = target, ?denial, reason, "subscription check denied access");
        console::redirect(self.debug, reason, target);

        if let Err(err) = self.navigator.redirect(target) {
            warn!(route = target, error = %err, "redirect failed");
        }

        state
    }

    /// Publishes the result of a check unless a newer navigation replaced it.
    fn finish(
        &self,
        path: &str,
        ticket: NavigationTicket,
        phase: CheckPhase,
        status: SubscriptionStatus,
    ) -> CheckOutcome {
        let state = GateState { phase, status };
        match self.publish(path, ticket, state.clone()) {
            Ok(_) => state,
            Err(superseded) => superseded,
        }
    }

    /// Stores `state` if `ticket` is still current and hands back the held lock.
    fn publish(
        &self,
        path: &str,
        ticket: NavigationTicket,
        state: GateState,
    ) -> Result<RwLockWriteGuard<'_, GateState>, GateState> {
        let mut guard = self.write_state();
        if !self.is_current(ticket) {
            debug!(path, "navigation changed during subscription check, dropping result");
            return Err(GateState {
                phase: CheckPhase::Superseded,
                status: state.status,
            });
        }

        *guard = state;
        Ok(guard)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, GateState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
