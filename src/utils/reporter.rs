use colored::Colorize;

/// Sink for run progress messages. Every stage receives one instead of
/// printing directly, so stages can be exercised silently in tests.
pub trait Reporter {
    /// Start of a numbered workflow stage.
    fn step(&self, message: &str);

    /// A completed action.
    fn success(&self, message: &str);

    /// A recoverable problem the user should know about.
    fn warn(&self, message: &str);

    /// Diagnostic output, shown only in verbose mode.
    fn detail(&self, message: &str);
}

/// Colored terminal output.
pub struct ConsoleReporter {
    verbose: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Reporter for ConsoleReporter {
    fn step(&self, message: &str) {
        println!("\n{}", message.yellow());
    }

    fn success(&self, message: &str) {
        println!("{}", format!("✓ {message}").green());
    }

    fn warn(&self, message: &str) {
        println!("{}", format!("⚠ {message}").red());
    }

    fn detail(&self, message: &str) {
        if self.verbose {
            println!("   {}", message.dimmed());
        }
    }
}
