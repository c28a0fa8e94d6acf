// SPDX-License-Identifier: CEPL-1.0
//! Driver diagnostics as message passing.
//!
//! The driver invokes its debug callback on whatever thread it likes. The
//! callback only pushes onto a [`DiagnosticsSink`]; the owning thread drains
//! the paired [`DiagnosticsReceiver`] at safe points and decides what an
//! operator gets to see.

use std::fmt;
use std::sync::mpsc;

use bitflags::bitflags;

/// Ordered least to most severe.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash)]
pub enum Severity {
    Verbose,
    Info,
    Warning,
    Error,
}

impl Severity {
    /// Warnings and errors reach the log; the rest is received and dropped.
    pub fn is_operator_visible(self) -> bool {
        self >= Severity::Warning
    }
}

bitflags! {
    /// Bit values follow `VkDebugUtilsMessageTypeFlagBitsEXT`.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct MessageCategory: u32 {
        const GENERAL = 0x1;
        const VALIDATION = 0x2;
        const PERFORMANCE = 0x4;
        const DEVICE_ADDRESS_BINDING = 0x8;
    }
}

impl fmt::Display for MessageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("{}");
        }
        f.write_str("{ ")?;
        for (i, (name, _)) in self.iter_names().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            f.write_str(name)?;
        }
        f.write_str(" }")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub severity: Severity,
    pub category: MessageCategory,
    pub text: String,
}

/// Sending half, cloned into the driver callback's user data.
#[derive(Debug, Clone)]
pub struct DiagnosticsSink {
    tx: mpsc::Sender<DiagnosticMessage>,
}

impl DiagnosticsSink {
    /// Never blocks. A message sent after the receiver is gone is dropped.
    pub fn push(&self, message: DiagnosticMessage) {
        let _ = self.tx.send(message);
    }
}

#[derive(Debug)]
pub struct DiagnosticsReceiver {
    rx: mpsc::Receiver<DiagnosticMessage>,
}

impl DiagnosticsReceiver {
    /// Empties the queue, logging operator-visible messages. Everything
    /// drained is handed back so callers can look at suppressed severities.
    pub fn drain(&self) -> Vec<DiagnosticMessage> {
        let drained: Vec<DiagnosticMessage> = self.rx.try_iter().collect();
        for msg in drained.iter().filter(|m| m.severity.is_operator_visible()) {
            if msg.severity == Severity::Error {
                tracing::error!(
                    target: "validation",
                    "validation layer: type {} msg: {}",
                    msg.category,
                    msg.text
                );
            } else {
                tracing::warn!(
                    target: "validation",
                    "validation layer: type {} msg: {}",
                    msg.category,
                    msg.text
                );
            }
        }
        drained
    }
}

pub fn channel() -> (DiagnosticsSink, DiagnosticsReceiver) {
    let (tx, rx) = mpsc::channel();
    (DiagnosticsSink { tx }, DiagnosticsReceiver { rx })
}
