//! Interpretation of zdaemon's human-readable output.

use jobmon_model::{ProcessProbe, StartOutcome, StopOutcome};

use crate::runner::CommandOutput;

pub const RUNNING_MARKER: &str = "program running";
pub const STARTED_MARKER: &str = "daemon process started";
pub const STOPPED_MARKER: &str = "daemon process stopped";

/// First `pid=<digits>` in `output`.
pub fn extract_pid(output: &str) -> Option<u32> {
    output.match_indices("pid=").find_map(|(at, tag)| {
        let rest = &output[at + tag.len()..];
        let end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        rest[..end].parse().ok()
    })
}

/// Active only if the command succeeded and reported the program as running.
pub fn probe(out: &CommandOutput) -> ProcessProbe {
    if out.succeeded && out.output.contains(RUNNING_MARKER) {
        ProcessProbe::active(extract_pid(&out.output))
    } else {
        ProcessProbe::inactive()
    }
}

pub fn start_outcome(out: &CommandOutput) -> StartOutcome {
    if out.succeeded && out.output.contains(STARTED_MARKER) {
        StartOutcome::Started {
            pid: extract_pid(&out.output),
        }
    } else {
        StartOutcome::Failed {
            message: diagnostic(out),
            exit_code: Some(out.exit_code),
        }
    }
}

pub fn stop_outcome(out: &CommandOutput) -> StopOutcome {
    if out.succeeded && out.output.contains(STOPPED_MARKER) {
        StopOutcome::Stopped {
            pid: extract_pid(&out.output),
        }
    } else {
        StopOutcome::Failed {
            message: diagnostic(out),
            exit_code: Some(out.exit_code),
        }
    }
}

/// Raw supervisor output for operators; falls back to the exit code when silent.
fn diagnostic(out: &CommandOutput) -> String {
    let text = out.output.trim();
    if text.is_empty() {
        format!("supervisor exited with code {} and no output", out.exit_code)
    } else {
        text.to_string()
    }
}
