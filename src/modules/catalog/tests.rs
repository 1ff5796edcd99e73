use super::*;
use rstest::{fixture, rstest};
use serde_json::json;

/// Clock frozen at one instant, so ids come out as 1000, 1001, ...
struct FrozenClock(u64);

impl Clock for FrozenClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}

#[fixture]
fn catalog() -> Catalog {
    Catalog::with_clock(FrozenClock(1_000))
}

/// Dune and 1984, with Dune borrowed by Bob.
#[fixture]
fn lent(mut catalog: Catalog) -> (Catalog, BookId, BookId) {
    let dune = catalog.add_book("Dune", "Herbert");
    let nineteen = catalog.add_book("1984", "Orwell");
    catalog.borrow_book(dune, "Bob");
    (catalog, dune, nineteen)
}

fn titles(record: &UserRecord) -> Vec<&str> {
    record.borrowed_books().collect()
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(25)]
fn add_book_grows_collection_with_distinct_ids(mut catalog: Catalog, #[case] count: usize) {
    let ids: Vec<_> = (0..count)
        .map(|n| catalog.add_book(format!("Title {n}"), "Author"))
        .collect();

    assert_eq!(catalog.books().len(), count);
    let unique: HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), count);
    assert!(catalog.books().iter().all(|book| !book.is_borrowed()));
    catalog.check_invariants().unwrap();
}

#[test]
fn system_clock_ids_are_strictly_increasing() {
    let mut catalog = Catalog::new();
    let ids: Vec<_> = (0..50).map(|_| catalog.add_book("t", "a")).collect();
    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
}

#[rstest]
fn add_book_accepts_empty_strings(mut catalog: Catalog) {
    let id = catalog.add_book("", "");
    let book = catalog.book(id).unwrap();
    assert_eq!(book.title, "");
    assert_eq!(book.author, "");
}

#[rstest]
fn borrow_then_return_scenario(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, nineteen) = lent;

    assert_eq!(catalog.book(dune).unwrap().borrowed_by(), Some("Bob"));
    assert_eq!(catalog.book(nineteen).unwrap().borrowed_by(), None);
    assert_eq!(catalog.user_records().len(), 1);
    let bob = catalog.user_record("Bob").unwrap();
    assert_eq!(bob.name(), "Bob");
    assert_eq!(titles(bob), vec!["Dune"]);
    catalog.check_invariants().unwrap();

    let outcome = catalog.return_book(dune);
    assert_eq!(
        outcome,
        ReturnOutcome::Returned {
            book_id: dune,
            from: "Bob".to_string()
        }
    );
    assert_eq!(catalog.book(dune).unwrap().status, BorrowStatus::Available);
    assert!(titles(catalog.user_record("Bob").unwrap()).is_empty());
    catalog.check_invariants().unwrap();
}

#[rstest]
fn snapshot_matches_expected_shape(lent: (Catalog, BookId, BookId)) {
    let (catalog, _, _) = lent;
    let snapshot = serde_json::to_value(catalog.snapshot()).unwrap();

    assert_eq!(
        snapshot,
        json!({
            "books": [
                {"id": 1000, "title": "Dune", "author": "Herbert", "status": "borrowed", "by": "Bob"},
                {"id": 1001, "title": "1984", "author": "Orwell", "status": "available"}
            ],
            "userRecords": [{"name": "Bob", "borrowedBooks": ["Dune"]}],
            "mode": {"mode": "unfiltered"},
            "displayed": [
                {"id": 1000, "title": "Dune", "author": "Herbert", "status": "borrowed", "by": "Bob"},
                {"id": 1001, "title": "1984", "author": "Orwell", "status": "available"}
            ]
        })
    );
}

#[rstest]
fn borrow_appends_to_existing_record_once(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, _, nineteen) = lent;

    assert_eq!(
        catalog.borrow_book(nineteen, "Bob"),
        BorrowOutcome::Borrowed { book_id: nineteen }
    );
    assert_eq!(titles(catalog.user_record("Bob").unwrap()), vec!["Dune", "1984"]);
    assert_eq!(catalog.user_records().len(), 1);
    catalog.check_invariants().unwrap();
}

#[rstest]
fn borrowing_a_held_book_again_is_a_no_op(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, _) = lent;

    assert_eq!(catalog.borrow_book(dune, "Bob"), BorrowOutcome::AlreadyHeld);
    assert_eq!(titles(catalog.user_record("Bob").unwrap()), vec!["Dune"]);
}

#[rstest]
fn borrowing_a_lent_book_transfers_it(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, _) = lent;

    assert_eq!(
        catalog.borrow_book(dune, "Alice"),
        BorrowOutcome::Transferred {
            book_id: dune,
            from: "Bob".to_string()
        }
    );
    assert_eq!(catalog.book(dune).unwrap().borrowed_by(), Some("Alice"));
    assert!(titles(catalog.user_record("Bob").unwrap()).is_empty());
    assert_eq!(titles(catalog.user_record("Alice").unwrap()), vec!["Dune"]);
    catalog.check_invariants().unwrap();
}

#[rstest]
fn borrow_with_unknown_id_records_nothing(mut catalog: Catalog) {
    catalog.add_book("Dune", "Herbert");

    assert_eq!(
        catalog.borrow_book(BookId::new(42), "Bob"),
        BorrowOutcome::Unknown
    );
    assert!(catalog.user_records().is_empty());
    assert!(catalog.books().iter().all(|book| !book.is_borrowed()));
}

#[rstest]
fn return_of_unknown_or_available_book_changes_nothing(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, _, nineteen) = lent;
    let before = serde_json::to_value(catalog.snapshot()).unwrap();

    assert_eq!(catalog.return_book(BookId::new(7)), ReturnOutcome::Unknown);
    assert_eq!(catalog.return_book(nineteen), ReturnOutcome::NotBorrowed);
    assert_eq!(serde_json::to_value(catalog.snapshot()).unwrap(), before);
}

#[rstest]
fn return_only_releases_the_returned_copy(mut catalog: Catalog) {
    let first = catalog.add_book("Dune", "Herbert");
    let second = catalog.add_book("Dune", "Herbert");
    catalog.borrow_book(first, "Ann");
    catalog.borrow_book(second, "Bob");

    catalog.return_book(first);

    assert!(titles(catalog.user_record("Ann").unwrap()).is_empty());
    assert_eq!(titles(catalog.user_record("Bob").unwrap()), vec!["Dune"]);
    catalog.check_invariants().unwrap();
}

#[rstest]
fn records_persist_after_everything_is_returned(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, _) = lent;
    catalog.return_book(dune);

    let bob = catalog.user_record("Bob").unwrap();
    assert_eq!(bob.borrowed_count(), 0);
    assert_eq!(catalog.user_records().len(), 1);
}

#[rstest]
fn delete_removes_book_from_every_view(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, nineteen) = lent;

    let outcome = catalog.delete_book(nineteen);
    assert!(matches!(
        outcome,
        DeleteOutcome::Deleted { ref book, released_from: None } if book.id == nineteen
    ));

    assert!(catalog.book(nineteen).is_none());
    assert!(catalog.search_books("").iter().all(|b| b.id != nineteen));
    assert!(catalog.displayed().iter().all(|b| b.id != nineteen));
    assert_eq!(catalog.borrow_book(nineteen, "Ann"), BorrowOutcome::Unknown);
    assert_eq!(catalog.return_book(nineteen), ReturnOutcome::Unknown);
    assert_eq!(catalog.delete_book(nineteen), DeleteOutcome::Unknown);
    assert!(catalog.user_record("Ann").is_none());
    assert_eq!(catalog.book(dune).unwrap().borrowed_by(), Some("Bob"));
}

#[rstest]
fn deleting_a_borrowed_book_releases_it(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, _) = lent;

    let outcome = catalog.delete_book(dune);
    assert!(matches!(
        outcome,
        DeleteOutcome::Deleted { released_from: Some(ref user), .. } if user == "Bob"
    ));
    assert!(titles(catalog.user_record("Bob").unwrap()).is_empty());
    catalog.check_invariants().unwrap();
}

#[rstest]
#[case("orw", vec!["1984"])]
#[case("ORW", vec!["1984"])]
#[case("du", vec!["Dune"])]
#[case("", vec!["Dune", "1984"])]
#[case("tolkien", vec![])]
fn search_matches_title_or_author(
    lent: (Catalog, BookId, BookId),
    #[case] query: &str,
    #[case] expected: Vec<&str>,
) {
    let (catalog, _, _) = lent;
    let found: Vec<_> = catalog
        .search_books(query)
        .into_iter()
        .map(|book| book.title)
        .collect();
    assert_eq!(found, expected);
}

#[rstest]
fn search_does_not_change_mode(lent: (Catalog, BookId, BookId)) {
    let (catalog, _, _) = lent;
    catalog.search_books("orw");
    assert_eq!(catalog.mode(), &SearchMode::Unfiltered);
}

#[rstest]
fn no_match_search_is_distinct_from_no_search(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, _, _) = lent;

    assert!(catalog.apply_search("tolkien").is_empty());
    assert_eq!(catalog.mode().query(), Some("tolkien"));
    assert!(catalog.displayed().is_empty());

    catalog.clear_search();
    assert_eq!(catalog.mode(), &SearchMode::Unfiltered);
    assert_eq!(catalog.displayed().len(), 2);
}

#[rstest]
fn empty_query_enters_results_mode_with_everything(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, _, _) = lent;

    assert_eq!(catalog.apply_search("").len(), 2);
    assert!(catalog.mode().is_filtered());
}

#[rstest]
fn filtered_view_follows_later_changes(lent: (Catalog, BookId, BookId)) {
    let (mut catalog, dune, _) = lent;
    catalog.apply_search("dune");

    catalog.return_book(dune);
    assert_eq!(catalog.displayed()[0].status, BorrowStatus::Available);

    let another = catalog.add_book("Dune Messiah", "Herbert");
    assert_eq!(catalog.displayed().len(), 2);

    catalog.delete_book(dune);
    let shown: Vec<_> = catalog.displayed().iter().map(|b| b.id).collect();
    assert_eq!(shown, vec![another]);
}

#[test]
fn from_settings_seeds_books_in_order() {
    let settings = CatalogSettings {
        seed: vec![
            libris_kernel::settings::SeedBook {
                title: "Dune".to_string(),
                author: "Herbert".to_string(),
            },
            libris_kernel::settings::SeedBook {
                title: "1984".to_string(),
                author: "Orwell".to_string(),
            },
        ],
    };

    let catalog = Catalog::from_settings(&settings);
    let titles: Vec<_> = catalog.books().iter().map(|b| b.title.as_str()).collect();
    assert_eq!(titles, vec!["Dune", "1984"]);
    catalog.check_invariants().unwrap();
}

#[rstest]
fn long_mixed_sequence_keeps_invariants(mut catalog: Catalog) {
    let users = ["Ann", "Bob", "Cy"];
    let mut ids = Vec::new();
    for round in 0..30u64 {
        ids.push(catalog.add_book(format!("Book {}", round % 7), "Anon"));
        let pick = ids[(round as usize * 5) % ids.len()];
        match round % 4 {
            0 | 1 => {
                catalog.borrow_book(pick, users[round as usize % users.len()]);
            }
            2 => {
                catalog.return_book(pick);
            }
            _ => {
                catalog.delete_book(pick);
            }
        }
        catalog.check_invariants().unwrap();
    }
}
