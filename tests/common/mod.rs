#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use library_lending_tracker::clock::ManualClock;
use library_lending_tracker::db::Database;
use library_lending_tracker::patrons::{AllowListRegistry, CardNumberRegistry, PatronRegistry};
use library_lending_tracker::{LendingPolicy, Library};
use tempfile::TempDir;

/// A library backed by a throwaway on-disk database. Keep the `TempDir`
/// alive for as long as the library is used.
pub struct TestLibrary {
    pub library: Library,
    pub clock: Arc<ManualClock>,
    _dir: TempDir,
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 10, 0, 0).unwrap()
}

pub fn with_registry(patrons: Arc<dyn PatronRegistry>) -> TestLibrary {
    let dir = tempfile::tempdir().expect("temp dir");
    let db = Database::open(dir.path().join("library.sqlite")).expect("open database");
    let clock = Arc::new(ManualClock::new(start()));
    let library = Library::new(db, patrons, LendingPolicy::default(), clock.clone());
    TestLibrary {
        library,
        clock,
        _dir: dir,
    }
}

/// Recognizes the named patrons used across the scenarios.
pub fn named_patrons() -> TestLibrary {
    with_registry(Arc::new(AllowListRegistry::new([
        "P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8",
    ])))
}

/// Recognizes six-digit library card numbers.
pub fn card_patrons() -> TestLibrary {
    with_registry(Arc::new(CardNumberRegistry::default()))
}
