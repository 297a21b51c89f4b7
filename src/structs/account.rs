use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::SubscriptionState;

/// Body of `GET /api/client/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    pub client: ClientAccount,
}

/// Account record of the signed-in client. Fields the gate does not use are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientAccount {
    pub subscription_status: SubscriptionState,
    /// End of the trial period. Null outside of trials.
    #[serde(default)]
    pub trial_ends_at: Option<DateTime<Utc>>,
    /// The subscribed tier, if any.
    #[serde(default)]
    pub plan_type: Option<String>,
}
