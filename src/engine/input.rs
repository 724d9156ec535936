use crate::browser;
use anyhow::Result;
use futures::channel::mpsc::{unbounded, UnboundedReceiver};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use web_sys::KeyboardEvent;

/// Raw keyboard events, queued by the DOM listeners and drained once per frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPress {
    KeyDown(String),
    KeyUp(String),
}

/// Pressed / released state for the one key the game listens to.
///
/// Key-repeat rule: a second key-down without a key-up in between (what the OS
/// sends while a key is held) flips the state to *released*. Holding the key
/// therefore only counts until the first repeat arrives.
#[derive(Debug, Clone)]
pub struct InputTracker {
    code: String,
    pressed: bool,
    repeat_count: u32,
}

impl InputTracker {
    pub fn new(code: &str) -> Self {
        InputTracker {
            code: code.to_string(),
            pressed: false,
            repeat_count: 0,
        }
    }

    pub fn tracks(&self, code: &str) -> bool {
        self.code == code
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Returns `true` when the event belonged to the tracked key
    pub fn key_down(&mut self, code: &str) -> bool {
        if !self.tracks(code) {
            return false;
        }
        self.pressed = self.repeat_count == 0;
        self.repeat_count = self.repeat_count.saturating_add(1);
        true
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        if !self.tracks(code) {
            return false;
        }
        self.repeat_count = 0;
        self.pressed = false;
        true
    }

    pub fn process(&mut self, event: &KeyPress) -> bool {
        match event {
            KeyPress::KeyDown(code) => self.key_down(code),
            KeyPress::KeyUp(code) => self.key_up(code),
        }
    }
}

/// Installs document level key listeners and returns the queue they feed.
///
/// Default browser handling is suppressed for `tracked_code` only (space would
/// otherwise scroll the page).
pub fn prepare_input(tracked_code: &str) -> Result<UnboundedReceiver<KeyPress>> {
    let (keydown_sender, keyevent_receiver) = unbounded();
    let keydown_sender = Rc::new(RefCell::new(keydown_sender));
    let keyup_sender = keydown_sender.clone();

    let down_code = tracked_code.to_string();
    let onkeydown = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        if event.code() == down_code {
            event.prevent_default();
        }
        let _ = keydown_sender
            .borrow_mut()
            .start_send(KeyPress::KeyDown(event.code()));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let up_code = tracked_code.to_string();
    let onkeyup = browser::closure_wrap(Box::new(move |event: KeyboardEvent| {
        if event.code() == up_code {
            event.prevent_default();
        }
        let _ = keyup_sender
            .borrow_mut()
            .start_send(KeyPress::KeyUp(event.code()));
    }) as Box<dyn FnMut(KeyboardEvent)>);

    let document = browser::document()?;
    document.set_onkeydown(Some(onkeydown.as_ref().unchecked_ref()));
    document.set_onkeyup(Some(onkeyup.as_ref().unchecked_ref()));
    // listeners live for the whole page
    onkeydown.forget();
    onkeyup.forget();

    Ok(keyevent_receiver)
}

/// Moves every queued event into the tracker
pub fn drain_input(receiver: &mut UnboundedReceiver<KeyPress>, tracker: &mut InputTracker) {
    while let Ok(event) = receiver.try_recv() {
        tracker.process(&event);
    }
}
