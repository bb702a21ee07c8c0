//! Signals shared with the host application.
//!
//! The host owns two flags: `loaded` (assets are in, the loader may show
//! its terminal state) and `ready` (the user chose to enter, the loader
//! unmounts). Going the other way the loader only emits pointer-style
//! requests, fire-and-forget.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use winit::window::{CursorIcon, Window};

#[derive(Debug, Default)]
struct Flags {
    loaded: AtomicBool,
    ready: AtomicBool,
}

/// Cloneable handle to the load/ready flags.
///
/// Safe to set from a loading thread while the render loop reads it.
#[derive(Debug, Clone, Default)]
pub struct LoadSignal {
    flags: Arc<Flags>,
}

impl LoadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assets finished loading.
    pub fn mark_loaded(&self) {
        self.flags.loaded.store(true, Ordering::Release);
    }

    /// The user asked to enter. Ignored until loading has finished.
    ///
    /// Returns whether the flag is now set.
    pub fn mark_ready(&self) -> bool {
        if !self.is_loaded() {
            return false;
        }
        self.flags.ready.store(true, Ordering::Release);
        true
    }

    pub fn is_loaded(&self) -> bool {
        self.flags.loaded.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.flags.ready.load(Ordering::Acquire)
    }
}

/// Pointer style the loader would like the host to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PointerStyle {
    #[default]
    Default,
    /// Over an interactive control.
    Hover,
}

/// Receives pointer-style requests. No reply is expected.
pub trait HoverSink {
    fn request_pointer(&self, style: PointerStyle);
}

impl HoverSink for Window {
    fn request_pointer(&self, style: PointerStyle) {
        let icon = match style {
            PointerStyle::Default => CursorIcon::Default,
            PointerStyle::Hover => CursorIcon::Pointer,
        };
        self.set_cursor(icon);
    }
}

/// Forwards a pointer style only when it changes.
#[derive(Debug, Default)]
pub struct HoverState {
    current: PointerStyle,
}

impl HoverState {
    pub fn current(&self) -> PointerStyle {
        self.current
    }

    /// Send `style` to `sink` if it differs from the last one sent.
    pub fn set<S: HoverSink + ?Sized>(&mut self, style: PointerStyle, sink: &S) -> bool {
        if style == self.current {
            return false;
        }
        self.current = style;
        sink.request_pointer(style);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder(RefCell<Vec<PointerStyle>>);

    impl HoverSink for Recorder {
        fn request_pointer(&self, style: PointerStyle) {
            self.0.borrow_mut().push(style);
        }
    }

    #[test]
    fn test_ready_requires_loaded() {
        let signal = LoadSignal::new();
        assert!(!signal.mark_ready());
        assert!(!signal.is_ready());

        let host = signal.clone();
        host.mark_loaded();
        assert!(signal.is_loaded());
        assert!(signal.mark_ready());
        assert!(host.is_ready());
    }

    #[test]
    fn test_hover_requests_only_on_change() {
        let sink = Recorder::default();
        let mut hover = HoverState::default();
        assert!(!hover.set(PointerStyle::Default, &sink));
        assert!(hover.set(PointerStyle::Hover, &sink));
        assert!(!hover.set(PointerStyle::Hover, &sink));
        assert!(hover.set(PointerStyle::Default, &sink));
        assert_eq!(*sink.0.borrow(), vec![PointerStyle::Hover, PointerStyle::Default]);
    }
}
