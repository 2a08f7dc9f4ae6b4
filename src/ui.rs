//! Terminal output
//!
//! Thin printing layer over `println!` with crossterm styling, gated on
//! terminal detection so piped output stays plain. Commands own the
//! wording; this module owns color and layout.

use crossterm::style::Stylize;
use is_terminal::IsTerminal;

/// Styled printer for command output
#[derive(Debug, Clone, Copy)]
pub struct Printer {
    color: bool,
    pub verbose: bool,
}

impl Printer {
    pub fn new(verbose: bool) -> Self {
        Self {
            color: supports_color(),
            verbose,
        }
    }

    /// Uncolored, quiet printer; used when output is piped and in tests
    pub fn plain() -> Self {
        Self {
            color: false,
            verbose: false,
        }
    }

    /// Command banner, e.g. `📦 convoy plan`
    pub fn banner(&self, text: &str) {
        if self.color {
            println!("📦 {}", text.bold());
        } else {
            println!("📦 {text}");
        }
    }

    /// Section header before a phase of work
    pub fn phase(&self, text: &str) {
        if self.color {
            println!("\n{}", text.bold());
        } else {
            println!("\n{text}");
        }
    }

    pub fn success(&self, text: &str) {
        if self.color {
            println!("  {} {text}", "✓".green());
        } else {
            println!("  ✓ {text}");
        }
    }

    pub fn failure(&self, text: &str) {
        if self.color {
            println!("  {} {text}", "✗".red());
        } else {
            println!("  ✗ {text}");
        }
    }

    pub fn warning(&self, text: &str) {
        if self.color {
            println!("  {} {}", "⚠".yellow(), text);
        } else {
            println!("  ⚠ {text}");
        }
    }

    /// Skipped or secondary line, dimmed
    pub fn dimmed(&self, text: &str) {
        if self.color {
            println!("  {}", text.to_string().dim());
        } else {
            println!("  {text}");
        }
    }

    /// Plain indented line
    pub fn detail(&self, text: &str) {
        println!("  {text}");
    }

    /// Captured step output, indented one level deeper
    pub fn output_block(&self, output: &str) {
        for line in output.lines() {
            println!("    {line}");
        }
    }

    pub fn summary(&self, text: &str) {
        println!("\n{text}");
    }

    pub fn blank(&self) {
        println!();
    }
}

fn supports_color() -> bool {
    std::io::stdout().is_terminal()
        && std::env::var_os("NO_COLOR").is_none()
        && std::env::var("TERM").map(|t| t != "dumb").unwrap_or(true)
}
