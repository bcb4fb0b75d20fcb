// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Alarm severity and status values and the rules for combining them.
//!
//! A record carries one [`Alarm`]: a [`Severity`] and an [`AlarmStatus`] naming
//! the condition that raised it. When two alarms meet, [`AlarmPolicy::merge`]
//! keeps the more severe one. Equal severities are decided by the policy's
//! status priority table, so merging is commutative and idempotent for any
//! table.
//!
//! ```rust
//! use softrec::alarm::{Alarm, AlarmPolicy, AlarmStatus, Severity};
//!
//! let policy = AlarmPolicy::default();
//! let a = Alarm::new(Severity::Minor, AlarmStatus::Scan);
//! let b = Alarm::new(Severity::Major, AlarmStatus::Link);
//! assert_eq!(policy.merge(a, b), b);
//! assert_eq!(policy.merge(b, a), b);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alarm severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    NoAlarm,
    Minor,
    Major,
    Invalid,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::NoAlarm,
        Severity::Minor,
        Severity::Major,
        Severity::Invalid,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::NoAlarm => "NO_ALARM",
            Severity::Minor => "MINOR",
            Severity::Major => "MAJOR",
            Severity::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown alarm severity '{}'", s))
    }
}

/// Alarm status, the condition that raised an alarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    #[default]
    NoAlarm,
    Read,
    Write,
    Hihi,
    High,
    Lolo,
    Low,
    State,
    Cos,
    Comm,
    Timeout,
    Hwlimit,
    Calc,
    Scan,
    Link,
    Soft,
    BadSub,
    Udf,
    Disable,
    Simm,
    ReadAccess,
    WriteAccess,
}

impl AlarmStatus {
    /// Every status in declaration order. This is also the default priority.
    pub const ALL: [AlarmStatus; 22] = [
        AlarmStatus::NoAlarm,
        AlarmStatus::Read,
        AlarmStatus::Write,
        AlarmStatus::Hihi,
        AlarmStatus::High,
        AlarmStatus::Lolo,
        AlarmStatus::Low,
        AlarmStatus::State,
        AlarmStatus::Cos,
        AlarmStatus::Comm,
        AlarmStatus::Timeout,
        AlarmStatus::Hwlimit,
        AlarmStatus::Calc,
        AlarmStatus::Scan,
        AlarmStatus::Link,
        AlarmStatus::Soft,
        AlarmStatus::BadSub,
        AlarmStatus::Udf,
        AlarmStatus::Disable,
        AlarmStatus::Simm,
        AlarmStatus::ReadAccess,
        AlarmStatus::WriteAccess,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AlarmStatus::NoAlarm => "NO_ALARM",
            AlarmStatus::Read => "READ",
            AlarmStatus::Write => "WRITE",
            AlarmStatus::Hihi => "HIHI",
            AlarmStatus::High => "HIGH",
            AlarmStatus::Lolo => "LOLO",
            AlarmStatus::Low => "LOW",
            AlarmStatus::State => "STATE",
            AlarmStatus::Cos => "COS",
            AlarmStatus::Comm => "COMM",
            AlarmStatus::Timeout => "TIMEOUT",
            AlarmStatus::Hwlimit => "HWLIMIT",
            AlarmStatus::Calc => "CALC",
            AlarmStatus::Scan => "SCAN",
            AlarmStatus::Link => "LINK",
            AlarmStatus::Soft => "SOFT",
            AlarmStatus::BadSub => "BAD_SUB",
            AlarmStatus::Udf => "UDF",
            AlarmStatus::Disable => "DISABLE",
            AlarmStatus::Simm => "SIMM",
            AlarmStatus::ReadAccess => "READ_ACCESS",
            AlarmStatus::WriteAccess => "WRITE_ACCESS",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlarmStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlarmStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown alarm status '{}'", s))
    }
}

/// A severity and status pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Alarm {
    pub severity: Severity,
    pub status: AlarmStatus,
}

impl Alarm {
    pub const NONE: Alarm = Alarm {
        severity: Severity::NoAlarm,
        status: AlarmStatus::NoAlarm,
    };

    /// State of a record that has never been given a value.
    pub const UNDEFINED: Alarm = Alarm {
        severity: Severity::Invalid,
        status: AlarmStatus::Udf,
    };

    pub const fn new(severity: Severity, status: AlarmStatus) -> Self {
        Self { severity, status }
    }

    pub fn is_alarm(&self) -> bool {
        self.severity != Severity::NoAlarm
    }
}

impl fmt::Display for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.severity, self.status)
    }
}

/// Decides which of two alarms survives a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlarmPolicy {
    // rank[status as usize]; lower rank wins a severity tie
    rank: [u8; 22],
}

impl Default for AlarmPolicy {
    fn default() -> Self {
        Self::from_priority(&[])
    }
}

impl AlarmPolicy {
    /// Builds a policy whose tie-break prefers `priority` in the order given.
    ///
    /// Statuses not listed follow the listed ones, in declaration order.
    /// Repeated entries keep their first position.
    pub fn from_priority(priority: &[AlarmStatus]) -> Self {
        let mut rank = [u8::MAX; 22];
        let mut next = 0u8;
        for status in priority.iter().copied().chain(AlarmStatus::ALL) {
            let slot = &mut rank[status.index()];
            if *slot == u8::MAX {
                *slot = next;
                next += 1;
            }
        }
        Self { rank }
    }

    /// Statuses from highest to lowest tie-break priority.
    pub fn priority(&self) -> Vec<AlarmStatus> {
        let mut statuses = AlarmStatus::ALL.to_vec();
        statuses.sort_by_key(|s| self.rank[s.index()]);
        statuses
    }

    /// Higher severity wins. On equal severity the higher-priority status wins.
    pub fn merge(&self, a: Alarm, b: Alarm) -> Alarm {
        match a.severity.cmp(&b.severity) {
            std::cmp::Ordering::Greater => a,
            std::cmp::Ordering::Less => b,
            std::cmp::Ordering::Equal => {
                if self.rank[a.status.index()] <= self.rank[b.status.index()] {
                    a
                } else {
                    b
                }
            }
        }
    }
}
