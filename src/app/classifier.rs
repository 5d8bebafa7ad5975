//! Inactivity classification of directory users
//!
//! Users are sorted into three buckets based on the time elapsed since their
//! last authentication. The two inactivity buckets overlap on purpose: a user
//! idle for 200 days is idle for at least 90 days as well. Users who never
//! authenticated land only in [`InactivityBucket::NeverAuthenticated`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::app::models::UserRecord;
use crate::constants::inactivity;

/// Classification bucket for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InactivityBucket {
    /// Last authentication timestamp is zero
    NeverAuthenticated,
    /// No login for at least 90 days
    Inactive90,
    /// No login for at least 180 days
    Inactive180,
}

impl InactivityBucket {
    /// All buckets in reporting order
    pub const ALL: [InactivityBucket; 3] = [
        InactivityBucket::NeverAuthenticated,
        InactivityBucket::Inactive90,
        InactivityBucket::Inactive180,
    ];

    /// Human readable label used in summaries
    pub fn label(&self) -> &'static str {
        match self {
            Self::NeverAuthenticated => "Never logged in",
            Self::Inactive90 => "Not logged in the last 90 days",
            Self::Inactive180 => "Not logged in the last 180 days",
        }
    }

    /// Trace line header used when a user is put into this bucket
    fn trace_header(&self) -> &'static str {
        match self {
            Self::NeverAuthenticated => "USER NEVER LOGGED IN",
            Self::Inactive90 => "USER DIDNT LOG FOR 90 DAYS",
            Self::Inactive180 => "USER DIDNT LOG FOR 180 DAYS",
        }
    }
}

impl fmt::Display for InactivityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = match self {
            Self::NeverAuthenticated => "none",
            Self::Inactive90 => "three_months",
            Self::Inactive180 => "six_months",
        };
        write!(f, "{}", key)
    }
}

/// Usernames per bucket, each list in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSet {
    buckets: BTreeMap<InactivityBucket, Vec<String>>,
}

impl BucketSet {
    /// Create an empty bucket set with all buckets present
    pub fn new() -> Self {
        let buckets = InactivityBucket::ALL
            .iter()
            .map(|bucket| (*bucket, Vec::new()))
            .collect();
        Self { buckets }
    }

    /// Classify one user against `now` and record it in every matching bucket
    ///
    /// Returns the buckets the user was added to.
    pub fn insert_user(&mut self, user: &UserRecord, now: DateTime<Utc>) -> Vec<InactivityBucket> {
        let matched = buckets_for(user, now);
        for bucket in &matched {
            self.buckets
                .entry(*bucket)
                .or_default()
                .push(user.name.clone());
            trace_classified(user, *bucket);
        }
        matched
    }

    /// Usernames in a bucket
    pub fn get(&self, bucket: InactivityBucket) -> &[String] {
        self.buckets
            .get(&bucket)
            .map(|names| names.as_slice())
            .unwrap_or(&[])
    }

    /// Number of users in a bucket
    pub fn count(&self, bucket: InactivityBucket) -> usize {
        self.get(bucket).len()
    }

    /// Append another bucket set, keeping discovery order
    pub fn extend(&mut self, other: BucketSet) {
        for (bucket, names) in other.buckets {
            self.buckets.entry(bucket).or_default().extend(names);
        }
    }
}

/// Classify a sequence of users against a fixed point in time
pub fn classify<'a, I>(users: I, now: DateTime<Utc>) -> BucketSet
where
    I: IntoIterator<Item = &'a UserRecord>,
{
    let mut set = BucketSet::new();
    for user in users {
        set.insert_user(user, now);
    }
    set
}

/// Buckets a single user belongs to at `now`
pub fn buckets_for(user: &UserRecord, now: DateTime<Utc>) -> Vec<InactivityBucket> {
    if user.never_authenticated() {
        return vec![InactivityBucket::NeverAuthenticated];
    }

    let last_auth = user.last_authentication_secs();
    let mut matched = Vec::with_capacity(2);

    if is_before(last_auth, now - Duration::days(inactivity::SIX_MONTHS_DAYS)) {
        matched.push(InactivityBucket::Inactive180);
    }
    if is_before(last_auth, now - Duration::days(inactivity::THREE_MONTHS_DAYS)) {
        matched.push(InactivityBucket::Inactive90);
    }

    matched
}

fn is_before(epoch_secs: u64, cutoff: DateTime<Utc>) -> bool {
    // A cutoff before 1970 cannot be preceded by an unsigned timestamp
    u64::try_from(cutoff.timestamp())
        .map(|cutoff_secs| epoch_secs < cutoff_secs)
        .unwrap_or(false)
}

fn trace_classified(user: &UserRecord, bucket: InactivityBucket) {
    if tracing::enabled!(tracing::Level::TRACE) {
        let pretty = serde_json::to_string_pretty(user).unwrap_or_else(|_| user.name.clone());
        tracing::trace!("{}: \n {}", bucket.trace_header(), pretty);
    }
}
