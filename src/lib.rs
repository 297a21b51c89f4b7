//! Subscription gate for the client portal.
//!
//! Before a protected portal route renders, [`SubscriptionCheck::check`] reads
//! the viewer's bearer token, asks the platform API for the account's
//! subscription and either lets the viewer through or redirects them to the
//! login or upgrade route. Every failure sends the viewer to login.

pub mod config;
mod console;
pub mod errors;
pub mod gate;
pub mod navigation;
pub mod routes;
pub mod storage;
pub mod structs;

pub use config::GateOptions;
pub use errors::GateError;
pub use gate::{
    AccountApi, CheckOutcome, CheckPhase, Clock, Denial, FixedClock, GateState, NavigationTicket,
    Navigator, SubscriptionCheck, SystemClock, TokenStore,
};
pub use navigation::BrowserNavigator;
pub use routes::{Access, RouteRule, RouteTable};
pub use storage::{EnvTokenStore, FileTokenStore, MemoryTokenStore};
pub use structs::account::{ClientAccount, MeResponse};
pub use structs::client::{Client, ClientOptions};
pub use structs::{SubscriptionState, SubscriptionStatus};
