use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;

use tracing::{debug, error};

use crate::api::{CommentApi, Ticket, execute};
use crate::event::AppEvent;

/// Runs API tickets off the UI thread and posts each outcome back onto the
/// event channel. In-flight requests are never cancelled.
pub struct ApiWorker {
    api: Arc<dyn CommentApi>,
    tx: Sender<AppEvent>,
}

impl ApiWorker {
    pub fn new(api: Arc<dyn CommentApi>, tx: Sender<AppEvent>) -> Self {
        Self { api, tx }
    }

    pub fn dispatch(&self, ticket: Ticket) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        thread::spawn(move || {
            debug!(generation = ticket.generation, request = ?ticket.request, "dispatching");
            let outcome = execute(api.as_ref(), &ticket);
            if let Err(ref err) = outcome {
                error!(generation = ticket.generation, %err, "api request failed");
            }
            let _ = tx.send(AppEvent::Api(ticket.generation, outcome));
        });
    }
}
