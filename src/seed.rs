use crate::catalog::Catalog;
use crate::error::Result;

/// Starter catalog inserted the first time the tracker runs against an empty
/// database.
const SAMPLE_BOOKS: &[(&str, &str, &str, i64)] = &[
    ("The Great Gatsby", "F. Scott Fitzgerald", "9780743273565", 3),
    ("To Kill a Mockingbird", "Harper Lee", "9780061120084", 2),
    ("1984", "George Orwell", "9780451524935", 1),
    ("Moby Dick", "Herman Melville", "9781503280786", 1),
    ("War and Peace", "Leo Tolstoy", "9780199232765", 1),
    ("Pride and Prejudice", "Jane Austen", "9780141439518", 1),
    ("The Odyssey", "Homer", "9780140268867", 1),
];

/// Seed the sample catalog if no book exists yet. Returns how many books were
/// inserted.
pub fn seed_if_empty(catalog: &Catalog<'_>) -> Result<usize> {
    if !catalog.is_empty()? {
        return Ok(0);
    }

    for (title, author, isbn, copies) in SAMPLE_BOOKS {
        catalog.add(title, author, isbn, *copies)?;
    }
    tracing::info!("seeded empty catalog with {} sample books", SAMPLE_BOOKS.len());
    Ok(SAMPLE_BOOKS.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[test]
    fn seeds_only_once() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("seed.sqlite")).unwrap();
        let conn = db.connect().unwrap();
        let catalog = Catalog::new(&conn);

        assert_eq!(seed_if_empty(&catalog).unwrap(), SAMPLE_BOOKS.len());
        assert_eq!(seed_if_empty(&catalog).unwrap(), 0);
        let books = catalog.list().unwrap();
        assert_eq!(books.len(), SAMPLE_BOOKS.len());
        assert!(books.iter().all(|b| b.available_copies == b.total_copies));
    }
}
