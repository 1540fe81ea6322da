// Alert events and their history
// One AlertEvent per detected trigger, from creation to final delivery outcome

mod event;
mod history;

pub use event::{AlertEvent, AlertId, AlertState, DeliveryStatus, DeliverySummary};
pub use history::AlertHistory;
