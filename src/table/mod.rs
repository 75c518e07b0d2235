//! The editable table: edit buffer, diff baseline, validation state,
//! sequential save and confirmed deletes.

pub mod confirm;
pub mod editable;
pub mod notify;
pub mod row;
pub mod view;

pub use confirm::{ConfirmDecision, ConfirmPrompt, Confirmer, FixedConfirmer, TimedConfirmer};
pub use editable::{DeleteOutcome, EditableTable, SaveOutcome, TableStatus};
pub use notify::{Notification, NotificationLevel, Notifications};
pub use row::{RowKey, RowState};
pub use view::{ActionOutcome, RowView, TableAction, TableView};
