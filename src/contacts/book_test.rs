// Tests for ContactBook
// Test cases:
// - Phone validation: separators, leading plus, length bounds, letters
// - Idempotent add on identical (name, phone)
// - Insertion order is preserved
// - Remove and not-found handling
// - Contacts persist across reload
// - Invalid or duplicate saved entries are dropped on load

use super::*;
use tempfile::TempDir;

#[test]
fn test_normalize_strips_separators() {
    assert_eq!(normalize_phone_number("(555) 123-4567").unwrap(), "5551234567");
    assert_eq!(normalize_phone_number("555.123.4567").unwrap(), "5551234567");
}

#[test]
fn test_normalize_keeps_leading_plus() {
    assert_eq!(normalize_phone_number("+44 20 7946 0958").unwrap(), "+442079460958");
}

#[test]
fn test_normalize_rejects_bad_numbers() {
    for raw in ["", "   ", "12345", "1234567890123456", "555-CALL-NOW", "++5551234567", "55512+34567"] {
        assert!(
            matches!(normalize_phone_number(raw), Err(ContactError::InvalidPhoneNumber(_))),
            "expected {:?} to be rejected",
            raw
        );
    }
}

#[test]
fn test_add_rejects_invalid_phone_number() {
    let mut book = ContactBook::new();
    let result = book.add("Alice", "not a number");
    assert_eq!(
        result,
        Err(ContactError::InvalidPhoneNumber("not a number".to_string()))
    );
    assert!(book.is_empty());
}

#[test]
fn test_add_rejects_blank_name() {
    let mut book = ContactBook::new();
    assert_eq!(book.add("  ", "5551234567"), Err(ContactError::EmptyName));
}

#[test]
fn test_add_same_contact_twice_yields_one_contact() {
    let mut book = ContactBook::new();

    let first = book.add("Alice", "555-123-4567").unwrap();
    let second = book.add(" Alice ", "5551234567").unwrap();

    assert_eq!(first, second);
    assert_eq!(book.len(), 1);
}

#[test]
fn test_same_number_different_name_is_a_new_contact() {
    let mut book = ContactBook::new();
    book.add("Alice", "5551234567").unwrap();
    book.add("Mom", "5551234567").unwrap();
    assert_eq!(book.len(), 2);
}

#[test]
fn test_list_preserves_insertion_order() {
    let mut book = ContactBook::new();
    book.add("Alice", "5550000001").unwrap();
    book.add("Bob", "5550000002").unwrap();
    book.add("Carol", "5550000003").unwrap();

    let names: Vec<String> = book.list().into_iter().map(|c| c.display_name).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
}

#[test]
fn test_remove_contact() {
    let mut book = ContactBook::new();
    let alice = book.add("Alice", "5550000001").unwrap();
    let bob = book.add("Bob", "5550000002").unwrap();

    let removed = book.remove(&alice.id).unwrap();

    assert_eq!(removed, alice);
    assert!(book.get(&alice.id).is_none());
    assert_eq!(book.list(), vec![bob]);
}

#[test]
fn test_remove_nonexistent_returns_error() {
    let mut book = ContactBook::new();
    assert!(matches!(book.remove("missing"), Err(ContactError::NotFound(_))));
}

#[test]
fn test_contacts_persist_across_reload() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("contacts.json");

    let alice_id = {
        let mut book = ContactBook::with_path(path.clone()).unwrap();
        let alice = book.add("Alice", "5550000001").unwrap();
        book.add("Bob", "5550000002").unwrap();
        alice.id
    };

    let reloaded = ContactBook::with_path(path).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.list()[0].id, alice_id);
    assert_eq!(reloaded.get(&alice_id).unwrap().phone_number, "5550000001");
}

#[test]
fn test_load_drops_invalid_saved_entries() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("contacts.json");
    std::fs::write(
        &path,
        r#"[
            {"id":"x","displayName":"","phoneNumber":"call me"},
            {"id":"x","displayName":"B","phoneNumber":""},
            {"id":"","displayName":"C","phoneNumber":"5550000003"},
            {"id":"a","displayName":"Alice","phoneNumber":"(555) 000-0001"}
        ]"#,
    )
    .unwrap();

    let book = ContactBook::with_path(path).unwrap();

    assert_eq!(
        book.list(),
        vec![Contact {
            id: "a".to_string(),
            display_name: "Alice".to_string(),
            phone_number: "5550000001".to_string(),
        }]
    );
}

#[test]
fn test_load_keeps_first_of_duplicate_ids() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("contacts.json");
    std::fs::write(
        &path,
        r#"[
            {"id":"a","displayName":"Alice","phoneNumber":"5550000001"},
            {"id":"a","displayName":"Bob","phoneNumber":"5550000002"},
            {"id":"b","displayName":" Bob ","phoneNumber":"+1 555 000 0002"}
        ]"#,
    )
    .unwrap();

    let book = ContactBook::with_path(path).unwrap();

    assert_eq!(book.len(), 2);
    assert_eq!(book.get("a").unwrap().display_name, "Alice");
    let bob = book.get("b").unwrap();
    assert_eq!(bob.display_name, "Bob");
    assert_eq!(bob.phone_number, "+15550000002");
}
