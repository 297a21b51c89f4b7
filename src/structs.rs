use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

pub mod account;
pub mod client;

use account::ClientAccount;

/// Subscription status string returned by the account API.
///
/// The set of values is owned by the server. Anything this crate does not
/// recognise is kept verbatim in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionState {
    /// Local placeholder while the account check is in flight. A server-sent
    /// `"loading"` decodes as `Unknown`.
    Loading,
    Trial,
    Active,
    TrialExpired,
    Canceled,
    PastDue,
    Unknown(String),
}

impl SubscriptionState {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Loading => "loading",
            Self::Trial => "trial",
            Self::Active => "active",
            Self::TrialExpired => "trial_expired",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
            Self::Unknown(value) => value,
        }
    }

    /// States that always require an upgrade, whatever the trial end date says.
    pub fn is_lapsed(&self) -> bool {
        matches!(self, Self::TrialExpired | Self::Canceled | Self::PastDue)
    }
}

impl From<String> for SubscriptionState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "trial" => Self::Trial,
            "active" => Self::Active,
            "trial_expired" => Self::TrialExpired,
            "canceled" => Self::Canceled,
            "past_due" => Self::PastDue,
            _ => Self::Unknown(value),
        }
    }
}

impl From<&str> for SubscriptionState {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SubscriptionState> for String {
    fn from(state: SubscriptionState) -> Self {
        state.as_str().to_string()
    }
}

impl std::fmt::Display for SubscriptionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access state of the current viewer. Created fresh for every check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionStatus {
    pub status: SubscriptionState,
    /// Owned by the server, read-only here.
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub plan_type: Option<String>,
    /// Whole days left in the trial, rounded up. Negative once the trial is over.
    /// Only set while `status` is `trial`.
    pub days_remaining: Option<i64>,
}

impl Default for SubscriptionStatus {
    fn default() -> Self {
        Self::loading()
    }
}

impl SubscriptionStatus {
    pub fn loading() -> Self {
        Self {
            status: SubscriptionState::Loading,
            trial_ends_at: None,
            plan_type: None,
            days_remaining: None,
        }
    }

    /// Derives the viewer's status from the account record at `now`.
    pub fn from_account(account: &ClientAccount, now: DateTime<Utc>) -> Self {
        let days_remaining = match (&account.subscription_status, account.trial_ends_at) {
            (SubscriptionState::Trial, Some(ends_at)) => Some(days_until(ends_at, now)),
            _ => None,
        };

        Self {
            status: account.subscription_status.clone(),
            trial_ends_at: account.trial_ends_at,
            plan_type: account.plan_type.clone(),
            days_remaining,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == SubscriptionState::Loading
    }

    pub fn is_trial(&self) -> bool {
        self.status == SubscriptionState::Trial
    }

    /// Whether the viewer has to go through the upgrade flow before using the portal.
    pub fn needs_upgrade(&self, now: DateTime<Utc>) -> bool {
        let trial_over = self.is_trial() && self.trial_ends_at.is_some_and(|ends_at| ends_at < now);
        trial_over || self.status.is_lapsed()
    }
}

/// Ceiling of the day difference between `ends_at` and `now`.
pub fn days_until(ends_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let delta = ends_at - now;
    // num_days truncates toward zero, which is already the ceiling below zero.
    let days = delta.num_days();
    if delta > Duration::days(days) {
        days + 1
    } else {
        days
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn account(status: &str, ends_at: Option<DateTime<Utc>>) -> ClientAccount {
        ClientAccount {
            subscription_status: status.into(),
            trial_ends_at: ends_at,
            plan_type: Some("starter".to_string()),
        }
    }

    #[test]
    fn parses_known_and_unknown_states() {
        assert_eq!(SubscriptionState::from("past_due"), SubscriptionState::PastDue);
        assert_eq!(
            SubscriptionState::from("paused"),
            SubscriptionState::Unknown("paused".to_string())
        );
        assert_eq!(SubscriptionState::from("paused").as_str(), "paused");

        let json = serde_json::to_string(&SubscriptionState::TrialExpired).unwrap();
        assert_eq!(json, "\"trial_expired\"");
    }

    #[test]
    fn days_remaining_rounds_up() {
        assert_eq!(days_until(now() + Duration::hours(1), now()), 1);
        assert_eq!(days_until(now() + Duration::days(3), now()), 3);
        assert_eq!(days_until(now() + Duration::days(3) + Duration::minutes(1), now()), 4);
        assert_eq!(days_until(now(), now()), 0);
        assert_eq!(days_until(now() + Duration::microseconds(500), now()), 1);
        assert_eq!(days_until(now() + Duration::nanoseconds(1), now()), 1);
        assert_eq!(days_until(now() + Duration::days(2), now()), 2);
        assert_eq!(days_until(now() - Duration::hours(36), now()), -1);
    }

    #[test]
    fn trial_ending_within_a_millisecond_still_has_a_day() {
        let status = SubscriptionStatus::from_account(
            &account("trial", Some(now() + Duration::microseconds(500))),
            now(),
        );
        assert_eq!(status.days_remaining, Some(1));
        assert!(!status.needs_upgrade(now()));
    }

    #[test]
    fn server_cannot_send_the_loading_placeholder() {
        assert_eq!(
            SubscriptionState::from("loading"),
            SubscriptionState::Unknown("loading".to_string())
        );

        let status = SubscriptionStatus::from_account(&account("loading", None), now());
        assert!(!status.is_loading());
        assert!(!status.needs_upgrade(now()));
    }

    #[test]
    fn status_json_uses_camel_case() {
        let status = SubscriptionStatus::from_account(
            &account("trial", Some(now() + Duration::days(3))),
            now(),
        );

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "trial");
        assert_eq!(json["daysRemaining"], 3);
        assert_eq!(json["planType"], "starter");
        assert_eq!(json["trialEndsAt"], "2026-10-17T12:00:00Z");

        let back: SubscriptionStatus = serde_json::from_value(json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn days_remaining_goes_negative_after_expiry() {
        let status = SubscriptionStatus::from_account(
            &account("trial", Some(now() - Duration::days(2))),
            now(),
        );
        assert_eq!(status.days_remaining, Some(-2));
        assert!(status.needs_upgrade(now()));

        // Half a day past the end still rounds up to zero.
        assert_eq!(days_until(now() - Duration::hours(12), now()), 0);
    }

    #[test]
    fn days_remaining_only_for_trials() {
        let ends_at = Some(now() + Duration::days(5));

        let active = SubscriptionStatus::from_account(&account("active", ends_at), now());
        assert_eq!(active.days_remaining, None);
        assert_eq!(active.trial_ends_at, ends_at);

        let trial_without_end = SubscriptionStatus::from_account(&account("trial", None), now());
        assert_eq!(trial_without_end.days_remaining, None);
        assert!(!trial_without_end.needs_upgrade(now()));
    }

    #[test]
    fn upgrade_decision() {
        let future = Some(now() + Duration::days(1));
        let past = Some(now() - Duration::seconds(1));

        let cases = [
            ("active", None, false),
            ("active", past, false),
            ("trial", future, false),
            ("trial", past, true),
            ("trial", Some(now()), false),
            ("trial_expired", future, true),
            ("canceled", None, true),
            ("past_due", future, true),
            ("paused", past, false),
        ];

        for (state, ends_at, expected) in cases {
            let status = SubscriptionStatus::from_account(&account(state, ends_at), now());
            assert_eq!(status.needs_upgrade(now()), expected, "{state} {ends_at:?}");
        }
    }

    #[test]
    fn loading_is_the_default() {
        let status = SubscriptionStatus::default();
        assert!(status.is_loading());
        assert!(!status.needs_upgrade(now()));
        assert_eq!(status.days_remaining, None);
    }
}
