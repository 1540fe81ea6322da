// Emergency contact book
// Source of delivery targets for alert notifications

mod book;

pub use book::{normalize_phone_number, Contact, ContactBook, ContactError};
