/// Liveness of an instance as reported by the process supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessProbe {
    /// The supervisor reports the program as running.
    pub active: bool,
    /// Process id, when the supervisor printed one and the program is running.
    pub pid: Option<u32>,
}

impl ProcessProbe {
    pub fn active(pid: Option<u32>) -> Self {
        Self { active: true, pid }
    }

    pub fn inactive() -> Self {
        Self::default()
    }
}

/// Result of asking the supervisor to start an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started {
        pid: Option<u32>,
    },
    /// The command failed, timed out or did not print the expected marker.
    Failed {
        message: String,
        exit_code: Option<i32>,
    },
}

/// Result of asking the supervisor to stop an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped {
        pid: Option<u32>,
    },
    Failed {
        message: String,
        exit_code: Option<i32>,
    },
}

/// Process id as shown to humans: `-1` when unknown.
#[inline]
pub fn display_pid(pid: Option<u32>) -> i64 {
    pid.map(i64::from).unwrap_or(-1)
}
