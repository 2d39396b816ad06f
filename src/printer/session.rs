//! Per-response printer state
//!
//! ```text
//! UNSTARTED --begin/first row--> STREAMING --end--> FINISHED
//! ```
//!
//! The cap is global to the response. Rows past the cap are dropped; the
//! first dropped row flips the truncation flag.

use std::fmt;

/// In-band status of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// At least one row, not truncated
    Success,
    /// Rows stopped at the cap
    Truncated,
    /// Query ran, nothing matched
    NoResults,
    /// Request rejected before any row was produced
    Error,
}

impl ResultCode {
    pub fn code(&self) -> i32 {
        match self {
            ResultCode::Success => 1,
            ResultCode::Truncated => 2,
            ResultCode::NoResults => -2,
            ResultCode::Error => -1,
        }
    }

    /// Envelope message; errors carry their own text instead.
    pub fn message(&self) -> &'static str {
        match self {
            ResultCode::Success => "success",
            ResultCode::Truncated => "too many results, data truncated",
            ResultCode::NoResults => "no results",
            ResultCode::Error => "error",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Lifecycle position of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unstarted,
    Streaming,
    Finished,
}

/// What happened to an offered row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// Written to the output
    Emitted,
    /// First row past the cap; the session is now truncated
    Truncated,
    /// Past the cap and already truncated
    Dropped,
}

/// Count, cap and truncation for one response
#[derive(Debug, Clone)]
pub struct PrinterSession {
    state: SessionState,
    count: usize,
    cap: usize,
    truncated: bool,
}

impl PrinterSession {
    pub fn new(cap: usize) -> Self {
        Self {
            state: SessionState::Unstarted,
            count: 0,
            cap,
            truncated: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    pub fn remaining_budget(&self) -> usize {
        self.cap.saturating_sub(self.count)
    }

    /// Moves to STREAMING. Returns true only on the first call.
    pub(crate) fn start(&mut self) -> bool {
        if self.state == SessionState::Unstarted {
            self.state = SessionState::Streaming;
            true
        } else {
            false
        }
    }

    /// Decides whether the next row is emitted, counting it if so.
    pub(crate) fn admit(&mut self) -> RowOutcome {
        if self.count < self.cap {
            self.count += 1;
            RowOutcome::Emitted
        } else if !self.truncated {
            self.truncated = true;
            RowOutcome::Truncated
        } else {
            RowOutcome::Dropped
        }
    }

    pub(crate) fn finish(&mut self) -> ResultCode {
        self.state = SessionState::Finished;
        self.result_code()
    }

    /// Code the session would end with now.
    pub fn result_code(&self) -> ResultCode {
        if self.truncated {
            ResultCode::Truncated
        } else if self.count == 0 {
            ResultCode::NoResults
        } else {
            ResultCode::Success
        }
    }
}
