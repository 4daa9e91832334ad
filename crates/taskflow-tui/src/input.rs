//! Background key listener.
//!
//! Raw mode swallows SIGINT, so Ctrl+C arrives as a key event. The listener
//! forwards it (and `q` / `Esc`) to the interrupt module, where the second
//! press force-exits.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use taskflow_core::core::interrupt;

/// Poll timeout; bounds how long `stop` waits for the thread.
pub const POLL_DURATION: Duration = Duration::from_millis(100);

pub fn is_cancel_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Esc => true,
        _ => false,
    }
}

pub struct KeyListener {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl KeyListener {
    /// # Errors
    /// Returns an error if the thread cannot be spawned.
    pub fn spawn() -> Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("taskflow-keys".to_string())
            .spawn(move || listen(&flag))
            .context("spawn key listener")?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn listen(stop: &AtomicBool) {
    while !stop.load(Ordering::SeqCst) {
        match event::poll(POLL_DURATION) {
            Ok(false) => {}
            Ok(true) => match event::read() {
                Ok(Event::Key(key)) if is_cancel_key(&key) => {
                    tracing::debug!(?key.code, "cancel key pressed");
                    interrupt::trigger_ctrl_c();
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::debug!(%err, "key listener stopped");
                    return;
                }
            },
            Err(err) => {
                tracing::debug!(%err, "key listener stopped");
                return;
            }
        }
    }
}
