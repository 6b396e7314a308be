use crate::format_error;

use super::errors::{Error, Severity};

/// Exit status a driver uses after a critical report.
pub const CRITICAL_EXIT_CODE: i32 = 2;

/// Collects the warnings raised while generating one compilation unit.
///
/// Critical errors are not collected: they are returned as `Err` and the
/// caller hands them to [`Diagnostics::critical`] for rendering.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Error>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { warnings: vec![] }
    }

    pub fn warning(&mut self, warning: Error) {
        debug_assert_eq!(warning.get_severity(), Severity::Warning);
        log::warn!("{} ({})", warning, warning.get_tip());
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Error] {
        &self.warnings
    }

    /// Renders a critical error against its source and logs it.
    ///
    /// Returns the rendered report so the driver can print it before exiting
    /// with [`CRITICAL_EXIT_CODE`].
    pub fn critical(&self, error: &Error, source: &str) -> String {
        let report = format_error(error, source);
        log::error!("{}", report);
        report
    }
}
