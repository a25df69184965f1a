//! Navigation stack

use crate::flow::route::{can_transition, Route, Screen};
use crate::{Result, VoiceCheckError};
use tracing::debug;

/// Stack of open routes; the bottom entry is always `Home`
#[derive(Debug, Clone)]
pub struct Navigator {
    stack: Vec<Route>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            stack: vec![Route::Home],
        }
    }

    pub fn current(&self) -> &Route {
        // The stack never drops below its root
        &self.stack[self.stack.len() - 1]
    }

    pub fn screen(&self) -> Screen {
        self.current().screen()
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn can_go_back(&self) -> bool {
        self.stack.len() > 1
    }

    /// Check an edge without taking it
    pub fn ensure_allowed(&self, to: Screen) -> Result<()> {
        let from = self.screen();
        if can_transition(from, to) {
            Ok(())
        } else {
            Err(VoiceCheckError::Navigation(format!(
                "Cannot go from {} to {}",
                from, to
            )))
        }
    }

    pub fn navigate(&mut self, route: Route) -> Result<&Route> {
        self.ensure_allowed(route.screen())?;
        debug!("Navigate {} -> {}", self.screen(), route.screen());
        self.stack.push(route);
        Ok(self.current())
    }

    pub fn back(&mut self) -> Result<&Route> {
        if !self.can_go_back() {
            return Err(VoiceCheckError::Navigation(
                "Already at the first screen".into(),
            ));
        }
        if let Some(left) = self.stack.pop() {
            debug!("Back from {} to {}", left.screen(), self.screen());
        }
        Ok(self.current())
    }

    /// Drop everything above `Home`
    pub fn reset(&mut self) {
        self.stack.truncate(1);
    }
}
