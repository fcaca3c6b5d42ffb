//! Input translation
//!
//! Raw device signals (key down, pointer press) become one abstract
//! "activate" event. A binding fires once per physical press: held-key
//! auto-repeat is suppressed. Hover mode swaps the momentary binding for
//! a toggle binding; the two are never attached at the same time.

use crate::consts::*;

/// True when a key event addresses the logical key, matching either the
/// physical `Key<X>` code or the produced key value (covers Space, whose
/// code is not `Key `-prefixed).
pub fn key_matches(code: &str, key: &str, wanted: &str) -> bool {
    let wanted_code = format!("Key{}", wanted.to_uppercase());
    code == wanted_code || key == wanted
}

/// Full key-down accept decision: matching key, not an auto-repeat
pub fn accepts_key_event(code: &str, key: &str, repeat: bool, wanted: &str) -> bool {
    !repeat && key_matches(code, key, wanted)
}

/// Detects the hover-unlock sequence: a burst of pointer presses inside
/// a rolling time window.
#[derive(Debug, Clone)]
pub struct CheatDetector {
    required: u32,
    window_ms: f64,
    count: u32,
    last_press_ms: f64,
}

impl Default for CheatDetector {
    fn default() -> Self {
        Self::new(CHEAT_PRESSES, CHEAT_WINDOW_MS)
    }
}

impl CheatDetector {
    pub fn new(required: u32, window_ms: f64) -> Self {
        Self {
            required,
            window_ms,
            count: 0,
            last_press_ms: 0.0,
        }
    }

    /// Record one press; returns true when the sequence completes.
    /// The counter resets when the window lapses and after activation.
    pub fn register_press(&mut self, now_ms: f64) -> bool {
        if now_ms - self.last_press_ms > self.window_ms {
            self.count = 0;
        }
        self.count += 1;
        self.last_press_ms = now_ms;

        if self.count >= self.required {
            self.count = 0;
            return true;
        }
        false
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm::ActivateBinding;

#[cfg(target_arch = "wasm32")]
mod wasm {
    use std::rc::Rc;

    use anyhow::{Result, anyhow};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::closure::Closure;
    use web_sys::{Document, KeyboardEvent, PointerEvent};

    use super::accepts_key_event;

    /// Live listeners for one activation binding. Dropping the binding
    /// (or calling `unbind`) detaches both listeners.
    pub struct ActivateBinding {
        key_closure: Option<Closure<dyn FnMut(KeyboardEvent)>>,
        pointer_closure: Option<Closure<dyn FnMut(PointerEvent)>>,
    }

    impl ActivateBinding {
        /// Fire `on_activate` on a key-down matching `key` or any
        /// pointer press, once per physical press.
        pub fn bind(key: &str, on_activate: impl Fn() + 'static) -> Result<Self> {
            let document = document()?;
            let on_activate = Rc::new(on_activate);

            let wanted = key.to_string();
            let key_activate = on_activate.clone();
            let key_closure = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
                if accepts_key_event(&event.code(), &event.key(), event.repeat(), &wanted) {
                    event.prevent_default();
                    key_activate();
                }
            });
            document
                .add_event_listener_with_callback("keydown", key_closure.as_ref().unchecked_ref())
                .map_err(|err| anyhow!("keydown listener failed: {:?}", err))?;

            let pointer_closure =
                Closure::<dyn FnMut(PointerEvent)>::new(move |_event: PointerEvent| {
                    on_activate();
                });
            document
                .add_event_listener_with_callback(
                    "pointerdown",
                    pointer_closure.as_ref().unchecked_ref(),
                )
                .map_err(|err| anyhow!("pointerdown listener failed: {:?}", err))?;

            Ok(Self {
                key_closure: Some(key_closure),
                pointer_closure: Some(pointer_closure),
            })
        }

        /// Toggle variant for hover mode. Attaches nothing when the mode
        /// flag is off, so a disabled variant can never double-handle a
        /// press alongside the momentary binding.
        pub fn bind_hover(
            key: &str,
            hover_mode: bool,
            on_toggle: impl Fn() + 'static,
        ) -> Result<Option<Self>> {
            if !hover_mode {
                return Ok(None);
            }
            Self::bind(key, on_toggle).map(Some)
        }

        /// Detach all listeners. Safe to call repeatedly.
        pub fn unbind(&mut self) {
            let Ok(document) = document() else {
                return;
            };
            if let Some(closure) = self.key_closure.take() {
                let _ = document.remove_event_listener_with_callback(
                    "keydown",
                    closure.as_ref().unchecked_ref(),
                );
            }
            if let Some(closure) = self.pointer_closure.take() {
                let _ = document.remove_event_listener_with_callback(
                    "pointerdown",
                    closure.as_ref().unchecked_ref(),
                );
            }
        }
    }

    impl Drop for ActivateBinding {
        fn drop(&mut self) {
            self.unbind();
        }
    }

    fn document() -> Result<Document> {
        web_sys::window()
            .ok_or_else(|| anyhow!("no window"))?
            .document()
            .ok_or_else(|| anyhow!("no document"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_matches_code_or_value() {
        assert!(key_matches("KeyJ", "j", "j"));
        assert!(key_matches("KeyJ", "J", "j"));
        assert!(!key_matches("KeyK", "k", "j"));

        // Space has no Key-prefixed code; the key value matches
        assert!(key_matches("Space", " ", " "));
    }

    #[test]
    fn test_held_key_repeat_suppressed() {
        assert!(accepts_key_event("Space", " ", false, " "));
        assert!(!accepts_key_event("Space", " ", true, " "));
    }

    #[test]
    fn test_cheat_sequence_within_window() {
        let mut detector = CheatDetector::new(3, 2000.0);
        assert!(!detector.register_press(100.0));
        assert!(!detector.register_press(600.0));
        assert!(detector.register_press(1200.0));
    }

    #[test]
    fn test_cheat_sequence_resets_when_window_lapses() {
        let mut detector = CheatDetector::new(3, 2000.0);
        assert!(!detector.register_press(0.0));
        assert!(!detector.register_press(500.0));

        // Too late: count restarts at this press
        assert!(!detector.register_press(3000.0));
        assert!(!detector.register_press(3500.0));
        assert!(detector.register_press(4000.0));
    }

    #[test]
    fn test_cheat_resets_after_activation() {
        let mut detector = CheatDetector::new(2, 2000.0);
        assert!(!detector.register_press(0.0));
        assert!(detector.register_press(100.0));

        // Fresh sequence required after firing
        assert!(!detector.register_press(200.0));
        assert!(detector.register_press(300.0));
    }
}
