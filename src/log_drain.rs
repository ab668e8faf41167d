//! Log output.
//!
//! Drains a bus's log streams into any `core::fmt::Write` sink. On target
//! this is usually a configured [`SerialPort`](crate::usart::SerialPort),
//! called from the main loop. Never call it from the SERCOM interrupt.
//!
//! Format: `[timestamp_us] LEVEL: message\r\n`

use core::fmt::{self, Write};

use crate::logging::{BusLogs, LogEntry};

/// Write one entry.
pub fn write_entry<W: Write>(sink: &mut W, entry: &LogEntry) -> fmt::Result {
    write!(
        sink,
        "[{:10}] {}: {}\r\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.text()
    )
}

/// Drain both streams, interrupt stream first.
///
/// Reports dropped counts once and resets them. Returns the number of
/// entries written; stops at the first sink error.
pub fn drain_logs<W: Write, const N: usize>(logs: &BusLogs<N>, sink: &mut W) -> Result<usize, fmt::Error> {
    let mut written = 0;

    while let Some(entry) = logs.interrupt.drain() {
        write_entry(sink, &entry)?;
        written += 1;
    }

    while let Some(entry) = logs.foreground.drain() {
        write_entry(sink, &entry)?;
        written += 1;
    }

    let isr_dropped = logs.interrupt.dropped();
    let fg_dropped = logs.foreground.dropped();
    if isr_dropped > 0 || fg_dropped > 0 {
        write!(sink, "[WARN] Dropped: ISR={}, FG={}\r\n", isr_dropped, fg_dropped)?;
        logs.interrupt.reset_dropped();
        logs.foreground.reset_dropped();
    }

    Ok(written)
}
