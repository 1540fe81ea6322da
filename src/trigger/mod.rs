// Trigger phrase module
// Holds the single spoken phrase that starts an alert

mod store;

pub use store::{TriggerError, TriggerPhrase, TriggerStore};
