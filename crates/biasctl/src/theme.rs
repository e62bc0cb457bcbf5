//! Console presentation
//!
//! All colouring goes through a `Theme` value handed to the engine, so the
//! engine's decisions never depend on whether colour is on.

use owo_colors::OwoColorize;
use std::io::IsTerminal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    color: bool,
}

impl Theme {
    /// Colour when configured, stdout is a terminal and NO_COLOR is unset
    pub fn auto(configured: bool) -> Self {
        if configured && std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal() {
            Self::colored()
        } else {
            Self::plain()
        }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    pub fn colored() -> Self {
        Self { color: true }
    }

    pub fn uses_color(&self) -> bool {
        self.color
    }

    /// `[?] text` - operator prompt
    pub fn question(&self, text: &str) -> String {
        if self.color {
            format!("{} {}", "[?]".yellow().bold(), text.blue().bold())
        } else {
            format!("[?] {}", text)
        }
    }

    /// `[*] text` - status line
    pub fn info(&self, text: &str) -> String {
        if self.color {
            format!("{} {}", "[*]".yellow().bold(), text.magenta().bold())
        } else {
            format!("[*] {}", text)
        }
    }

    /// `[!] text` - recoverable failure
    pub fn error(&self, text: &str) -> String {
        if self.color {
            format!("{} {}", "[!]".yellow().bold(), text.red().bold())
        } else {
            format!("[!] {}", text)
        }
    }

    pub fn menu_item(&self, key: usize, label: &str) -> String {
        if self.color {
            format!("  {} {}", format!("{})", key).yellow().bold(), label)
        } else {
            format!("  {}) {}", key, label)
        }
    }

    pub fn banner(&self, text: &str) -> String {
        if self.color {
            text.cyan().bold().to_string()
        } else {
            text.to_string()
        }
    }

    pub fn verdict(&self, text: &str) -> String {
        if self.color {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::plain()
    }
}
