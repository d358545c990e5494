//! # Checks
//!
//! Pure policy predicates over the caller, the channel and the settings
//! store. They know nothing about serenity; the dispatcher gathers the
//! inputs (permissions, privileged users, cooldown record) up front.
//!
//! - **Version**: 1.2.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Administrator composed from its parts with `Any`
//! - 1.1.0: Cooldown check backed by the `user_cooldown` table
//! - 1.0.0: Administrator, channel allow-list and test-channel checks

use chrono::{Duration as ChronoDuration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::settings::Settings;

/// Who invoked a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: u64,
    /// Holds the platform's administrator permission in this guild
    pub is_platform_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelRef {
    pub id: u64,
}

/// Everything a predicate may look at besides caller and channel
#[derive(Debug, Clone, Copy)]
pub struct PolicyScope<'a> {
    pub settings: &'a Settings,
    /// Users from the `primary_users` table
    pub primary_users: &'a HashSet<u64>,
    /// When the caller last ran a cooldown-gated command
    pub last_used: Option<NaiveDateTime>,
    pub now: NaiveDateTime,
}

pub trait Predicate: Send + Sync {
    fn name(&self) -> &'static str;

    fn check(&self, caller: &Caller, channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool;
}

/// Platform administrator, or a member of the privileged user set
pub fn is_administrator(caller: &Caller, scope: &PolicyScope<'_>) -> bool {
    caller.is_platform_admin || is_privileged(caller, scope)
}

/// Listed in `managements.vips` or the `primary_users` table
pub fn is_privileged(caller: &Caller, scope: &PolicyScope<'_>) -> bool {
    scope.settings.managements.vips.contains(&caller.id) || scope.primary_users.contains(&caller.id)
}

pub fn is_available_channel(channel: &ChannelRef, settings: &Settings) -> bool {
    settings.checks.channel.contains(&channel.id)
}

pub fn is_test_channel(channel: &ChannelRef, settings: &Settings) -> bool {
    settings.checks.test_channel.contains(&channel.id)
}

/// No record, or the configured cooldown has fully elapsed since it
pub fn is_off_cooldown(scope: &PolicyScope<'_>) -> bool {
    let Some(last) = scope.last_used else {
        return true;
    };
    let cooldown = scope
        .settings
        .managements
        .cooldown_duration()
        .and_then(|d| ChronoDuration::from_std(d).ok());
    match cooldown.and_then(|d| last.checked_add_signed(d)) {
        Some(until) => scope.now >= until,
        // Out-of-range cooldowns never expire
        None => false,
    }
}

pub struct PlatformAdmin;
pub struct Privileged;
pub struct AvailableChannel;
pub struct TestChannel;
pub struct Cooldown;

/// `administrator`: the platform role, or a privileged user
pub fn administrator() -> Any {
    Any(vec![Box::new(PlatformAdmin), Box::new(Privileged)])
}

impl Predicate for PlatformAdmin {
    fn name(&self) -> &'static str {
        "platform_admin"
    }

    fn check(&self, caller: &Caller, _channel: &ChannelRef, _scope: &PolicyScope<'_>) -> bool {
        caller.is_platform_admin
    }
}

impl Predicate for Privileged {
    fn name(&self) -> &'static str {
        "privileged"
    }

    fn check(&self, caller: &Caller, _channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool {
        is_privileged(caller, scope)
    }
}

impl Predicate for AvailableChannel {
    fn name(&self) -> &'static str {
        "available_channel"
    }

    fn check(&self, _caller: &Caller, channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool {
        is_available_channel(channel, scope.settings)
    }
}

impl Predicate for TestChannel {
    fn name(&self) -> &'static str {
        "test_channel"
    }

    fn check(&self, _caller: &Caller, channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool {
        is_test_channel(channel, scope.settings)
    }
}

impl Predicate for Cooldown {
    fn name(&self) -> &'static str {
        "cooldown"
    }

    fn check(&self, _caller: &Caller, _channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool {
        is_off_cooldown(scope)
    }
}

/// Passes when every inner predicate passes
pub struct All(pub Vec<Box<dyn Predicate>>);

/// Passes when at least one inner predicate passes
pub struct Any(pub Vec<Box<dyn Predicate>>);

impl Predicate for All {
    fn name(&self) -> &'static str {
        "all"
    }

    fn check(&self, caller: &Caller, channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool {
        self.0.iter().all(|p| p.check(caller, channel, scope))
    }
}

impl Predicate for Any {
    fn name(&self) -> &'static str {
        "any"
    }

    fn check(&self, caller: &Caller, channel: &ChannelRef, scope: &PolicyScope<'_>) -> bool {
        self.0.iter().any(|p| p.check(caller, channel, scope))
    }
}

/// Checks a command may opt into from its settings entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    Administrator,
    AvailableChannel,
    TestChannel,
    Cooldown,
}

impl CheckName {
    pub fn predicate(self) -> Box<dyn Predicate> {
        match self {
            CheckName::Administrator => Box::new(administrator()),
            CheckName::AvailableChannel => Box::new(AvailableChannel),
            CheckName::TestChannel => Box::new(TestChannel),
            CheckName::Cooldown => Box::new(Cooldown),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CheckName::Administrator => "administrator",
            CheckName::AvailableChannel => "available_channel",
            CheckName::TestChannel => "test_channel",
            CheckName::Cooldown => "cooldown",
        }
    }

    /// Notice shown to a caller this check turned away
    pub fn denial_message(self) -> &'static str {
        match self {
            CheckName::Administrator => "🔒 This command is restricted to administrators.",
            CheckName::AvailableChannel => "🚫 This command is not available in this channel.",
            CheckName::TestChannel => "🧪 This command only runs in test channels.",
            CheckName::Cooldown => "⏳ You are on cooldown, try again later.",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every check in `checks` as one predicate
pub fn all_of(checks: &[CheckName]) -> All {
    All(checks.iter().map(|check| check.predicate()).collect())
}

/// The first check in `checks` that turns the caller away
pub fn first_failing(
    checks: &[CheckName],
    caller: &Caller,
    channel: &ChannelRef,
    scope: &PolicyScope<'_>,
) -> Option<CheckName> {
    checks
        .iter()
        .copied()
        .find(|check| !check.predicate().check(caller, channel, scope))
}

/// Preconditions applied to every command under `settings`.
///
/// A pre-release bot (major version 0) only answers in test channels.
pub fn global_gate(settings: &Settings) -> Vec<CheckName> {
    if settings.general.is_prerelease() {
        vec![CheckName::TestChannel]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn scope<'a>(settings: &'a Settings, primary: &'a HashSet<u64>) -> PolicyScope<'a> {
        PolicyScope {
            settings,
            primary_users: primary,
            last_used: None,
            now: at(12, 0, 0),
        }
    }

    const MEMBER: Caller = Caller {
        id: 7,
        is_platform_admin: false,
    };
    const CHANNEL: ChannelRef = ChannelRef { id: 100 };

    #[test]
    fn test_privileged_user_is_administrator_without_role() {
        let mut settings = Settings::default();
        let primary = HashSet::new();
        assert!(!is_administrator(&MEMBER, &scope(&settings, &primary)));

        settings.managements.vips = vec![7];
        assert!(is_administrator(&MEMBER, &scope(&settings, &primary)));

        let settings = Settings::default();
        let primary: HashSet<u64> = [7].into_iter().collect();
        assert!(is_administrator(&MEMBER, &scope(&settings, &primary)));
    }

    #[test]
    fn test_platform_admin_is_administrator() {
        let settings = Settings::default();
        let primary = HashSet::new();
        let admin = Caller {
            id: 1,
            is_platform_admin: true,
        };
        let s = scope(&settings, &primary);
        assert!(CheckName::Administrator.predicate().check(&admin, &CHANNEL, &s));
        assert!(!CheckName::Administrator.predicate().check(&MEMBER, &CHANNEL, &s));
    }

    #[test]
    fn test_administrator_predicate_matches_function() {
        let mut settings = Settings::default();
        settings.managements.vips = vec![7];
        let primary: HashSet<u64> = [8].into_iter().collect();
        let s = scope(&settings, &primary);
        let predicate = administrator();

        for id in [7, 8, 9] {
            let caller = Caller {
                id,
                is_platform_admin: false,
            };
            assert_eq!(predicate.check(&caller, &CHANNEL, &s), is_administrator(&caller, &s));
        }
    }

    #[test]
    fn test_huge_cooldown_never_expires() {
        let mut settings = Settings::default();
        settings.managements.cooldown = [u64::MAX, 0, 0];
        let primary = HashSet::new();
        let mut s = scope(&settings, &primary);
        s.last_used = Some(at(0, 0, 0));
        assert!(!is_off_cooldown(&s));
    }

    #[test]
    fn test_available_channel_is_exact_membership() {
        let mut settings = Settings::default();
        settings.checks.channel = vec![100, 200];
        assert!(is_available_channel(&ChannelRef { id: 100 }, &settings));
        assert!(is_available_channel(&ChannelRef { id: 200 }, &settings));
        assert!(!is_available_channel(&ChannelRef { id: 10 }, &settings));
        assert!(!is_available_channel(&ChannelRef { id: 1000 }, &settings));
    }

    #[test]
    fn test_global_gate_depends_on_major_version() {
        let mut settings = Settings::default();
        settings.general.version = [0, 3, 1];
        assert_eq!(global_gate(&settings), vec![CheckName::TestChannel]);

        settings.general.version = [1, 0, 0];
        assert!(global_gate(&settings).is_empty());
    }

    #[test]
    fn test_cooldown_windows() {
        let mut settings = Settings::default();
        settings.managements.cooldown = [0, 10, 0];
        let primary = HashSet::new();

        let mut s = scope(&settings, &primary);
        assert!(is_off_cooldown(&s), "no record means allowed");

        s.last_used = Some(at(11, 55, 0));
        assert!(!is_off_cooldown(&s), "five minutes into a ten minute cooldown");

        s.last_used = Some(at(11, 50, 0));
        assert!(is_off_cooldown(&s), "exactly elapsed");

        s.last_used = Some(at(9, 0, 0));
        assert!(is_off_cooldown(&s));
    }

    #[test]
    fn test_all_and_any_compose() {
        let mut settings = Settings::default();
        settings.checks.channel = vec![100];
        let primary = HashSet::new();
        let s = scope(&settings, &primary);

        let both = All(vec![Box::new(AvailableChannel), Box::new(administrator())]);
        let either = Any(vec![Box::new(AvailableChannel), Box::new(administrator())]);
        assert!(!both.check(&MEMBER, &CHANNEL, &s));
        assert!(either.check(&MEMBER, &CHANNEL, &s));
        assert!(All(vec![]).check(&MEMBER, &CHANNEL, &s));
        assert!(!Any(vec![]).check(&MEMBER, &CHANNEL, &s));
    }

    #[test]
    fn test_first_failing_reports_in_order() {
        let settings = Settings::default();
        let primary = HashSet::new();
        let s = scope(&settings, &primary);
        let checks = [CheckName::Cooldown, CheckName::AvailableChannel, CheckName::Administrator];
        assert_eq!(
            first_failing(&checks, &MEMBER, &CHANNEL, &s),
            Some(CheckName::AvailableChannel)
        );
        assert_eq!(first_failing(&[], &MEMBER, &CHANNEL, &s), None);
    }

    #[test]
    fn test_check_names_parse_snake_case() {
        let names: Vec<CheckName> =
            serde_yaml::from_str("[administrator, available_channel, test_channel, cooldown]")
                .unwrap();
        assert_eq!(names.len(), 4);
        assert_eq!(names[1].to_string(), "available_channel");
        assert_eq!(names[1].predicate().name(), "available_channel");
    }
}
