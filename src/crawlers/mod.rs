pub mod decision;
pub mod driver;
pub mod listing;
pub mod navigation;
pub mod recovery;
pub mod session;
pub mod web;

pub use decision::{Decision, DecisionSource, RoundSummary, ScriptedDecisions, StdinDecisions};
pub use driver::run_session;
pub use listing::{ListingCrawler, RoundOutcome};
pub use navigation::NavigationEngine;
pub use recovery::RecoveryController;
pub use session::DocumentSession;
pub use web::WebDriverSession;
