//! Terminal rendering of stage visuals, the start control and notifications.

use pipesim_ci::{
    Notification, NotificationSink, Severity, StageDisplay, StageId, StageStatus, StartControl,
};
use tracing::debug;

/// Stream the live board is written to.
///
/// Machine-readable reports own stdout, so the board moves to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Board {
    #[default]
    Stdout,
    Stderr,
}

impl Board {
    pub fn for_report(json_report: bool) -> Self {
        if json_report {
            Board::Stderr
        } else {
            Board::Stdout
        }
    }

    fn emit(self, line: &str) {
        match self {
            Board::Stdout => println!("{}", line),
            Board::Stderr => eprintln!("{}", line),
        }
    }
}

/// Prints one line per stage update.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    board: Board,
}

impl TerminalDisplay {
    pub fn new(board: Board) -> Self {
        Self { board }
    }
}

impl StageDisplay for TerminalDisplay {
    fn set_stage_visual(&self, stage: &StageId, status: StageStatus) {
        self.board.emit(&render_stage_line(stage, status));
    }

    fn set_start_control(&self, control: StartControl) {
        self.board.emit(&render_control_line(&control));
    }
}

/// Prints notifications as toast-style lines.
#[derive(Debug, Default)]
pub struct TerminalSink {
    board: Board,
}

impl TerminalSink {
    pub fn new(board: Board) -> Self {
        Self { board }
    }
}

impl NotificationSink for TerminalSink {
    fn show(&self, notification: &Notification) {
        self.board.emit(&render_notification(notification));
    }

    fn retract(&self, notification: &Notification) {
        debug!(message = %notification.message, "notification dismissed");
    }
}

pub fn render_stage_line(stage: &StageId, status: StageStatus) -> String {
    format!("  {:<12} {}", stage.as_str(), status.label())
}

pub fn render_control_line(control: &StartControl) -> String {
    let state = if control.enabled { "enabled" } else { "disabled" };
    format!("[{}] ({})", control.label, state)
}

pub fn render_notification(notification: &Notification) -> String {
    let icon = match notification.severity {
        Severity::Info => "ℹ",
        Severity::Success => "✓",
        Severity::Error => "✗",
    };
    format!("{} {}", icon, notification.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_stage_line() {
        let id = StageId::new("build").unwrap();
        assert_eq!(
            render_stage_line(&id, StageStatus::Running),
            "  build        Running..."
        );
    }

    #[test]
    fn test_render_control_line() {
        assert_eq!(
            render_control_line(&StartControl::running()),
            "[Running...] (disabled)"
        );
        assert_eq!(
            render_control_line(&StartControl::idle()),
            "[Run Pipeline] (enabled)"
        );
    }

    #[test]
    fn test_json_report_moves_board_to_stderr() {
        assert_eq!(Board::for_report(true), Board::Stderr);
        assert_eq!(Board::for_report(false), Board::Stdout);
        assert_eq!(TerminalDisplay::default().board, Board::Stdout);
        assert_eq!(TerminalSink::new(Board::Stderr).board, Board::Stderr);
    }

    #[test]
    fn test_render_notification() {
        let n = Notification::new("Pipeline failed at test stage", Severity::Error);
        assert_eq!(render_notification(&n), "✗ Pipeline failed at test stage");
    }
}
