use std::sync::Mutex;

use shuttle_core::ui::UiThread;
use tokio::runtime::Handle;

use crate::error::MarkerError;

static UI_THREAD: Mutex<Option<UiThread>> = Mutex::new(None);

/// Handle to the process-wide marker thread, started on first use.
pub(crate) fn ui_handle() -> Result<Handle, MarkerError> {
    let mut guard = UI_THREAD
        .lock()
        .map_err(|_| MarkerError::Unavailable("ui thread lock poisoned".to_owned()))?;

    if let Some(thread) = guard.as_ref() {
        return Ok(thread.handle());
    }

    let thread = UiThread::start("shuttle-markers")?;
    let handle = thread.handle();
    *guard = Some(thread);

    Ok(handle)
}
