//! Navigator: LIFO stack of modal screens.
//!
//! The bottom entry is the root screen and is never popped. Input always goes
//! to the top entry; every screen below it is suspended until the ones above
//! close. On close the newly exposed screen is refreshed from `AppState`, so
//! values changed by the closed screen show up immediately.

use ratatui::crossterm::event::KeyEvent;
use ratatui::layout::{Position, Rect};
use tracing::debug;

use crate::app_state::AppState;
use crate::screen::Screen;

pub struct Navigator<S: Screen> {
    stack: Vec<S>,
}

impl<S: Screen> Navigator<S> {
    pub fn new(root: S) -> Self {
        Self { stack: vec![root] }
    }

    /// Push `screen`; the current top is suspended.
    pub fn open(&mut self, screen: S) {
        debug!("navigator: open {} (depth {})", screen.title(), self.stack.len() + 1);
        self.stack.push(screen);
    }

    /// Pop the active screen and refresh the one beneath. The root stays put
    /// and `None` is returned.
    pub fn close(&mut self, state: &AppState) -> Option<S> {
        if self.stack.len() <= 1 {
            return None;
        }
        let closed = self.stack.pop();
        let depth = self.stack.len();
        if let Some(top) = self.stack.last_mut() {
            top.refresh(state);
            debug!("navigator: back to {} (depth {})", top.title(), depth);
        }
        closed
    }

    pub fn active(&self) -> &S {
        // The root is never popped, so the stack is never empty.
        &self.stack[self.stack.len() - 1]
    }

    pub fn active_mut(&mut self) -> &mut S {
        let top = self.stack.len() - 1;
        &mut self.stack[top]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Tag under `pos` on the active screen.
    pub fn dispatch(&self, pos: Position) -> Option<S::Tag> {
        self.active().hit_test(pos)
    }

    pub fn dispatch_key(&mut self, key: KeyEvent) -> Option<S::Tag> {
        self.active_mut().handle_key(key)
    }

    /// Lay out every screen; the suspended ones are still drawn underneath.
    pub fn layout(&mut self, area: Rect) {
        for screen in &mut self.stack {
            screen.layout(area);
        }
    }

    /// Bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = &S> {
        self.stack.iter()
    }
}
