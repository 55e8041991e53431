mod terminal;

pub use terminal::{ run_terminal, ERROR_NOTICE };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Settings,
}

/// Screen stack. The chat screen at the bottom is never popped.
#[derive(Debug)]
pub struct Navigator {
    stack: Vec<Screen>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self { stack: vec![Screen::Chat] }
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn forward(&mut self, screen: Screen) {
        if self.current() != screen {
            self.stack.push(screen);
        }
    }

    /// Returns false when already at the root screen.
    pub fn back(&mut self) -> bool {
        if self.stack.len() > 1 {
            self.stack.pop();
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Screen {
        self.stack.last().copied().unwrap_or(Screen::Chat)
    }
}
