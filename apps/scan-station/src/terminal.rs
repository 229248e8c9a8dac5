//! Terminal implementation of [`ScanUi`].
//!
//! Confirmations are answered on stdin. While one is pending the stdin
//! reader hands the next line to it instead of the scanner channel.
//!
//! Lines starting with `:` are selection commands:
//!
//! ```text
//!   :select <id>   select only this student
//!   :toggle <id>   add or remove a student
//!   :all           select every student
//!   :clear         select nobody
//! ```

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use escs_core::{SelectMode, SelectionContext, Student};
use escs_scan::{ScanUi, SelectionCommand, Severity};

#[derive(Debug, Default)]
struct SlotState {
    sender: Option<oneshot::Sender<bool>>,
    /// Set once stdin has ended. No prompt can be answered after that.
    closed: bool,
}

/// Slot for the answer to the confirmation currently on screen.
#[derive(Debug, Clone, Default)]
pub struct ConfirmSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl ConfirmSlot {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Opens a prompt. `None` once input has ended.
    fn open(&self) -> Option<oneshot::Receiver<bool>> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }

        let (tx, rx) = oneshot::channel();
        if state.sender.replace(tx).is_some() {
            warn!("Replacing an unanswered confirmation");
        }
        Some(rx)
    }

    /// Delivers a stdin line to a waiting confirmation.
    ///
    /// Returns `false` if nothing was waiting, in which case the line is a scan.
    pub fn answer(&self, line: &str) -> bool {
        let sender = self.lock().sender.take();
        match sender {
            Some(tx) => {
                let yes = matches!(line.trim().to_lowercase().as_str(), "y" | "yes");
                // The engine may have given up on the answer; nothing to do then.
                let _ = tx.send(yes);
                true
            }
            None => false,
        }
    }

    /// Input ended. An open prompt reads as "no" and later prompts are refused.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.sender.take();
    }
}

/// Parses a `:` command line.
///
/// `Ok(None)` means the line is not a command and should be scanned.
pub fn parse_command(line: &str) -> Result<Option<SelectionCommand>, String> {
    let Some(rest) = line.trim().strip_prefix(':') else {
        return Ok(None);
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or("");
    let arg = parts.next();

    let command = match (name, arg) {
        ("select", Some(id)) => SelectionCommand::Select {
            id: id.to_string(),
            mode: SelectMode::Replace,
        },
        ("toggle", Some(id)) => SelectionCommand::Select {
            id: id.to_string(),
            mode: SelectMode::Toggle,
        },
        ("all", None) => SelectionCommand::SelectAll,
        ("clear", None) => SelectionCommand::Clear,
        _ => return Err(format!("Unknown command: {}", line.trim())),
    };
    Ok(Some(command))
}

pub struct TerminalUi {
    confirms: ConfirmSlot,
}

impl TerminalUi {
    pub fn new(confirms: ConfirmSlot) -> Self {
        TerminalUi { confirms }
    }
}

#[async_trait]
impl ScanUi for TerminalUi {
    async fn confirm(&self, title: &str, message: &str) -> bool {
        let Some(rx) = self.confirms.open() else {
            debug!(title, "Input closed; confirmation declined");
            return false;
        };

        println!();
        println!("── {} ──", title);
        println!("{}", message);
        println!("[y/N] ");

        rx.await.unwrap_or(false)
    }

    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => eprintln!("! {}", message),
            Severity::Success | Severity::Info => println!("{}", message),
        }
    }

    fn selection_changed(&self, selection: &SelectionContext) {
        match selection.single_selected() {
            Some(id) => println!("Active student: {}", id),
            None if selection.count() == 0 => println!("No student selected"),
            None => println!("{} students selected", selection.count()),
        }
    }

    fn render(&self, students: &[Student], selection: &SelectionContext) {
        println!();
        println!("{:<3}{:<10}{:<32}{}", "", "ID", "NAME", "BOOKS");
        for student in students {
            let marker = if selection.contains(&student.id) { "*" } else { "" };
            println!(
                "{:<3}{:<10}{:<32}{}",
                marker,
                student.id,
                student.name,
                student.books.len()
            );
            if selection.contains(&student.id) {
                for book in &student.books {
                    println!("{:<13}- {} ({})", "", book.display_title(), book.author);
                }
            }
        }
        println!();
    }

    fn offer_catalog_entry(&self, code: &str) {
        println!(
            "  {} is not in the catalog. Add it so the next checkout gets a real title.",
            code
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_routes_line_to_open_prompt() {
        let slot = ConfirmSlot::new();
        assert!(!slot.answer("y"));

        let mut rx = slot.open().unwrap();
        assert!(slot.answer(" Yes "));
        assert!(rx.try_recv().unwrap());

        let mut rx = slot.open().unwrap();
        assert!(slot.answer("9780441013593"));
        assert!(!rx.try_recv().unwrap());
        assert!(!slot.answer("y"));
    }

    #[tokio::test]
    async fn test_confirm_after_input_closed_declines() {
        let slot = ConfirmSlot::new();
        slot.close();

        let ui = TerminalUi::new(slot.clone());
        assert!(!ui.confirm("Check In Book", "Check in: Dune?").await);
        assert!(!slot.answer("y"));
    }

    #[tokio::test]
    async fn test_close_declines_open_prompt() {
        let slot = ConfirmSlot::new();
        let ui = Arc::new(TerminalUi::new(slot.clone()));

        let waiting = tokio::spawn({
            let ui = ui.clone();
            async move { ui.confirm("Check In Book", "Check in: Dune?").await }
        });
        while slot.lock().sender.is_none() {
            tokio::task::yield_now().await;
        }
        slot.close();

        assert!(!waiting.await.unwrap());
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("9780441013593"), Ok(None));
        assert_eq!(
            parse_command(":toggle 12345678"),
            Ok(Some(SelectionCommand::Select {
                id: "12345678".to_string(),
                mode: SelectMode::Toggle,
            }))
        );
        assert_eq!(
            parse_command(" :select 87654321 "),
            Ok(Some(SelectionCommand::Select {
                id: "87654321".to_string(),
                mode: SelectMode::Replace,
            }))
        );
        assert_eq!(parse_command(":all"), Ok(Some(SelectionCommand::SelectAll)));
        assert_eq!(parse_command(":clear"), Ok(Some(SelectionCommand::Clear)));
        assert!(parse_command(":select").is_err());
        assert!(parse_command(":frobnicate").is_err());
    }
}
