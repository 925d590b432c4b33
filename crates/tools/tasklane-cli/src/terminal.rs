//! Terminal implementations of the client's notification and navigation hooks.

use console::{Term, style};
use tasklane_http::{Navigator, Notification, NotificationLevel, Notifier, Route};
use tracing::debug;

/// Prints notifications to stderr so they never mix with command output.
pub struct TerminalNotifier {
    term: Term,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_notification(notification: &Notification) -> String {
    match notification.level {
        NotificationLevel::Success => {
            format!("{} {}", style("✓").green().bold(), notification.message)
        }
        NotificationLevel::Error => {
            format!("{} {}", style("✗").red().bold(), style(&notification.message).red())
        }
    }
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        // A closed stderr leaves nowhere to report to.
        let _ = self.term.write_line(&format_notification(&notification));
    }
}

/// There is no screen to switch to, so a forced route becomes a hint.
pub struct TerminalNavigator {
    term: Term,
}

impl TerminalNavigator {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
        }
    }
}

impl Default for TerminalNavigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, route: Route) {
        match route {
            Route::Login => {
                let _ = self.term.write_line(&format!(
                    "{} Your session has expired. Run {} to sign in again.",
                    style("!").yellow().bold(),
                    style("tasklane login").cyan()
                ));
            }
            Route::Dashboard => debug!("Dashboard route has no terminal equivalent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text() {
        let success = format_notification(&Notification::success("Task created"));
        assert_eq!(console::strip_ansi_codes(&success), "✓ Task created");

        let error = format_notification(&Notification::error("Task not found"));
        assert_eq!(console::strip_ansi_codes(&error), "✗ Task not found");
    }
}
