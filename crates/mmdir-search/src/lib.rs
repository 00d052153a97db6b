//! View-driven query orchestration for the monastery directory.
//!
//! A [`SearchSession`] owns all mutable orchestration state for one map: the
//! planner's last query position, the in-flight cancellation token, the
//! viewport cache and the last good result set. Map "view settled" events
//! are debounced by [`run_settle_loop`] and fed to
//! [`SearchSession::on_view_settled`].

pub mod cache;
pub mod debounce;
pub mod driver;
pub mod error;
pub mod map;
pub mod planner;
pub mod session;
pub mod state;

pub use cache::ViewportCache;
pub use debounce::next_settled;
pub use driver::run_settle_loop;
pub use error::{ErrorKind, SearchError};
pub use map::{MapView, Viewport};
pub use planner::{PlanDecision, Planner};
pub use session::{NationwideOutcome, ResultSource, SearchSession, SessionConfig, ViewOutcome};
pub use state::QueryState;
