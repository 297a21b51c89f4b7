//! Declarative route policy for the client portal.
//!
//! Each rule ties a path prefix to an [`Access`] level. The longest matching
//! prefix decides; paths no rule covers are protected.

pub const LOGIN_ROUTE: &str = "/client/login";
pub const SIGNUP_ROUTE: &str = "/client/signup";
pub const UPGRADE_ROUTE: &str = "/client/upgrade";
pub const SET_PASSWORD_ROUTE: &str = "/client/set-password";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Rendered without any subscription check.
    Public,
    /// Requires a signed-in client with a serviceable subscription.
    Protected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: String,
    pub access: Access,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    login_route: String,
    upgrade_route: String,
    rules: Vec<RouteRule>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::client_portal()
    }
}

impl RouteTable {
    /// A table with only the login and upgrade routes public.
    pub fn new(login_route: &str, upgrade_route: &str) -> Self {
        let login_route = normalize(login_route);
        let upgrade_route = normalize(upgrade_route);

        let rules = vec![
            RouteRule {
                prefix: login_route.clone(),
                access: Access::Public,
            },
            RouteRule {
                prefix: upgrade_route.clone(),
                access: Access::Public,
            },
        ];

        Self {
            login_route,
            upgrade_route,
            rules,
        }
    }

    /// The default client portal layout.
    pub fn client_portal() -> Self {
        Self::new(LOGIN_ROUTE, UPGRADE_ROUTE)
            .public(SIGNUP_ROUTE)
            .public(SET_PASSWORD_ROUTE)
    }

    pub fn public(self, prefix: &str) -> Self {
        self.rule(prefix, Access::Public)
    }

    pub fn protected(self, prefix: &str) -> Self {
        self.rule(prefix, Access::Protected)
    }

    /// Adds or replaces the rule for `prefix`. The login and upgrade routes stay public.
    pub fn rule(mut self, prefix: &str, access: Access) -> Self {
        let prefix = normalize(prefix);
        if prefix == self.login_route || prefix == self.upgrade_route {
            return self;
        }

        self.rules.retain(|rule| rule.prefix != prefix);
        self.rules.push(RouteRule { prefix, access });
        self
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    pub fn upgrade_route(&self) -> &str {
        &self.upgrade_route
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }

    pub fn access(&self, path: &str) -> Access {
        let path = strip_query(path);

        self.rules
            .iter()
            .filter(|rule| matches_prefix(path, &rule.prefix))
            .max_by_key(|rule| rule.prefix.len())
            .map(|rule| rule.access)
            .unwrap_or(Access::Protected)
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.access(path) == Access::Public
    }

    pub fn is_upgrade_route(&self, path: &str) -> bool {
        matches_prefix(strip_query(path), &self.upgrade_route)
    }
}

fn normalize(route: &str) -> String {
    let trimmed = route.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn strip_query(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    &path[..end]
}

/// Prefix match on segment boundaries.
fn matches_prefix(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
