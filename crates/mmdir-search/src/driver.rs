//! Event loop tying map settle events to a [`SearchSession`].

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::debounce::next_settled;
use crate::session::{SearchSession, ViewOutcome};

/// Debounces `settles` and runs each settled view on its own task.
///
/// A new settle cancels the previous query inside the session, so tasks may
/// finish out of order; superseded outcomes are dropped here and never reach
/// `outcomes`. Returns once `settles` is closed and every task has finished.
pub async fn run_settle_loop(
    session: Arc<SearchSession>,
    mut settles: mpsc::Receiver<()>,
    name: Option<String>,
    outcomes: mpsc::UnboundedSender<ViewOutcome>,
) {
    let quiet = session.config().debounce;
    let name: Option<Arc<str>> = name.map(Arc::from);
    let mut tasks = JoinSet::new();

    while next_settled(&mut settles, quiet).await.is_some() {
        let session = Arc::clone(&session);
        let name = name.clone();
        let outcomes = outcomes.clone();
        tasks.spawn(async move {
            let outcome = session.on_view_settled(name.as_deref()).await;
            if matches!(outcome, ViewOutcome::Superseded) {
                tracing::debug!("dropping superseded view outcome");
                return;
            }
            // The receiver going away only means nobody is rendering any more.
            let _ = outcomes.send(outcome);
        });
        // Reap finished tasks so the set does not grow for long sessions.
        while tasks.try_join_next().is_some() {}
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(err) = joined {
            tracing::error!(error = %err, "view-settled task panicked");
        }
    }
}
