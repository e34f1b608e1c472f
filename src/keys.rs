use crate::app::App;
use crate::state::messages::{FetchReason, NetworkRequest};
use chrono::Utc;
use crossterm::event::KeyCode::Char;
use crossterm::event::{KeyEvent, KeyModifiers};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};

/// Returns true when the user asked to quit.
pub async fn handle_key_bindings(
    key_event: KeyEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> bool {
    let mut guard = app.lock().await;

    match (key_event.code, key_event.modifiers) {
        (Char('q'), _) | (Char('c'), KeyModifiers::CONTROL) => return true,

        (Char('r'), _) => {
            drop(guard);
            let _ = network_requests
                .send(NetworkRequest::FetchDeadline { reason: FetchReason::Manual })
                .await;
        }
        (Char('a'), _) => guard.toggle_auto_refresh(Utc::now()),

        // Global
        (Char('f'), _) => guard.toggle_full_screen(),
        (Char('"'), _) => guard.toggle_show_logs(),

        _ => {}
    }

    false
}
