//! Common utilities for integration tests
//!
//! This module provides:
//! - A simulated node that runs whole experiments on a virtual clock
//! - Named deployment scenarios
//! - Assertion helpers over delivered reports

#![allow(dead_code)]

pub mod harness;
pub mod scenarios;

use sleepguard_core::{PendingReportKind, Report, Timestamp};

/// Reports of one kind, in delivery order
pub fn reports_of(reports: &[Report], kind: PendingReportKind) -> Vec<Report> {
    reports.iter().copied().filter(|r| r.kind == kind).collect()
}

/// Send times of one kind, in delivery order
pub fn sent_times(reports: &[Report], kind: PendingReportKind) -> Vec<Timestamp> {
    reports_of(reports, kind).iter().map(|r| r.sent_at).collect()
}

/// Offset of `t` from `start` in whole seconds
pub fn offset_secs(start: Timestamp, t: Timestamp) -> u64 {
    t.as_secs() - start.as_secs()
}

/// Assert that no two reports went out closer than `min_gap_secs`
pub fn assert_min_spacing(reports: &[Report], min_gap_secs: u64) {
    let mut times: Vec<u64> = reports.iter().map(|r| r.sent_at.as_millis()).collect();
    times.sort_unstable();
    for pair in times.windows(2) {
        assert!(
            pair[1] - pair[0] >= min_gap_secs * 1_000,
            "reports at {} ms and {} ms are closer than {} s",
            pair[0],
            pair[1],
            min_gap_secs
        );
    }
}
