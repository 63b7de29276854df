mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use anyhow::Result;
use chrono::Duration;
use library_lending_tracker::LibraryError;

use common::{named_patrons, start};

#[test]
fn last_copy_goes_to_exactly_one_patron() -> Result<()> {
    let t = Arc::new(named_patrons());
    let book = t.library.add_book("Dune", "Herbert", "1234567890123", 1)?;
    let patrons = ["P1", "P2", "P3", "P4", "P5", "P6", "P7", "P8"];
    let barrier = Arc::new(Barrier::new(patrons.len()));

    let handles: Vec<_> = patrons
        .into_iter()
        .map(|patron| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                t.library.borrow_book(patron, book.id, start())
            })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        match handle.join().expect("borrower thread panicked") {
            Ok(_) => granted += 1,
            Err(LibraryError::NoCopiesAvailable { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(granted, 1);
    assert_eq!(t.library.get_book(book.id)?.available_copies, 0);
    Ok(())
}

#[test]
fn one_patron_racing_cannot_pass_the_limit() -> Result<()> {
    let t = Arc::new(named_patrons());
    let mut ids = Vec::new();
    for i in 0..10 {
        let book = t
            .library
            .add_book(&format!("Book {i}"), "Author", &format!("97800000000{i:02}"), 1)?;
        ids.push(book.id);
    }
    let barrier = Arc::new(Barrier::new(ids.len()));

    let handles: Vec<_> = ids
        .iter()
        .copied()
        .map(|book_id| {
            let t = Arc::clone(&t);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                t.library.borrow_book("P1", book_id, start())
            })
        })
        .collect();

    let mut granted = 0;
    for handle in handles {
        match handle.join().expect("borrower thread panicked") {
            Ok(_) => granted += 1,
            Err(LibraryError::BorrowLimitExceeded { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(granted, 5);
    let report = t.library.patron_status_report("P1", start())?;
    assert_eq!(report.currently_borrowed_count, 5);

    let lent: u32 = ids
        .iter()
        .map(|id| t.library.get_book(*id).map(|b| b.total_copies - b.available_copies))
        .sum::<library_lending_tracker::Result<u32>>()?;
    assert_eq!(lent, 5);
    Ok(())
}

#[test]
fn mixed_traffic_keeps_copy_counts_consistent() -> Result<()> {
    let t = Arc::new(named_patrons());
    let book = t.library.add_book("Dune", "Herbert", "1234567890123", 3)?;
    let patrons = ["P1", "P2", "P3", "P4", "P5", "P6"];

    let handles: Vec<_> = patrons
        .into_iter()
        .map(|patron| {
            let t = Arc::clone(&t);
            thread::spawn(move || {
                for day in 0..10 {
                    let now = start() + Duration::days(day);
                    let _ = t.library.borrow_book(patron, book.id, now);
                    let _ = t.library.return_book(patron, book.id, now + Duration::hours(1));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("worker thread panicked");
    }

    let book = t.library.get_book(book.id)?;
    let outstanding: usize = patrons
        .iter()
        .map(|p| {
            t.library
                .patron_status_report(p, start() + Duration::days(11))
                .map(|r| r.currently_borrowed_count)
        })
        .sum::<library_lending_tracker::Result<usize>>()?;
    assert_eq!(book.available_copies as usize + outstanding, book.total_copies as usize);
    Ok(())
}
