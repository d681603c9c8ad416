mod controller;
mod navigation;
mod persister;
mod progress;
mod state;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use controller::SessionController;
pub use navigation::NavigationTracker;
pub use persister::ResultPersister;
pub use progress::SessionProgress;
pub use state::{GenerateOutcome, PersistenceStatus, SessionState, SkipReason, SubmissionReceipt};
