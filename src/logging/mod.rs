//! Logging and output control
//!
//! [`Logger`] controls the verbosity of registry-side diagnostics. The
//! resolver itself stays silent; user-facing reporting belongs to the
//! driving tool.

/// Logger responsible for all user-visible output
#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
        }
    }

    pub fn verbose(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("📝 {}", message);
        }
    }

    /// Fine-grained diagnostics, only in verbose mode
    pub fn detail(&self, message: &str) {
        if self.verbose && !self.quiet {
            println!("   {}", message);
        }
    }

    /// Information message
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Warning message
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  {}", message);
        }
    }

    /// Error message, always printed
    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}
