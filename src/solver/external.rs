//! External solver process.
//!
//! Spawns the solver, echoes its standard output to the log line by line and
//! picks up the timing and cost lines it prints. The decision itself is read
//! from the status file only; neither the exit code nor stdout affect it.

use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::LazyLock;
use std::thread;

use log::{debug, info, warn};
use regex::Regex;

use super::{
    resolve_executable, validate_executable, BinaryError, EmbeddingOutcome, EmbeddingSolver,
    SolverError, SolverRequest,
};

/// Compiled patterns for the solver's report lines
struct ReportPatterns {
    /// Match: "Run successfully completed in 1.234 seconds"
    solve_time: Regex,
    /// Match: "Cost = 1234.000000"
    cost: Regex,
}

impl ReportPatterns {
    fn new() -> Self {
        Self {
            solve_time: Regex::new(r"completed in\s+([0-9]+(?:\.[0-9]+)?)\s+seconds")
                .expect("Invalid solve_time regex"),
            cost: Regex::new(r"^\s*Cost\s*=\s*(-?[0-9]+(?:\.[0-9]+)?)")
                .expect("Invalid cost regex"),
        }
    }
}

static PATTERNS: LazyLock<ReportPatterns> = LazyLock::new(ReportPatterns::new);

/// Figures scraped from the solver's standard output
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolverReport {
    pub solve_time_secs: Option<f64>,
    pub cost: Option<f64>,
    pub stdout_lines: usize,
}

impl SolverReport {
    /// Record one line of solver output
    pub fn scan_line(&mut self, line: &str) {
        self.stdout_lines += 1;

        if let Some(caps) = PATTERNS.solve_time.captures(line) {
            self.solve_time_secs = caps.get(1).and_then(|m| m.as_str().parse().ok());
        }
        if let Some(caps) = PATTERNS.cost.captures(line) {
            self.cost = caps.get(1).and_then(|m| m.as_str().parse().ok());
        }
    }
}

/// Gateway to a solver executable
#[derive(Debug, Clone)]
pub struct ExternalSolver {
    executable: PathBuf,
}

impl ExternalSolver {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Resolve `name_or_path` and build a gateway for it.
    ///
    /// A missing or non-executable solver is only warned about here; each
    /// arrival reports the launch failure on its own.
    pub fn resolve(name_or_path: &str) -> Result<Self, BinaryError> {
        let executable = resolve_executable(name_or_path)?;
        if let Err(e) = validate_executable(&executable) {
            warn!("{}; every arrival will be rejected", e);
        }
        Ok(Self::new(executable))
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}

/// Log every line of solver output and scan it into `report`.
///
/// Lines need not be valid UTF-8. The pipe is read to EOF even after a read
/// error, since closing it early would kill the solver before it writes its
/// status file.
fn echo_output<R: BufRead>(mut reader: R, vn_id: &str, report: &mut SolverReport) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']);
                info!(target: "solver", "{}", line);
                report.scan_line(line);
            }
            Err(e) => {
                warn!("Failed to read solver output for {}: {}", vn_id, e);
                if let Err(e) = io::copy(&mut reader, &mut io::sink()) {
                    warn!("Failed to drain solver output for {}: {}", vn_id, e);
                }
                break;
            }
        }
    }
}

impl EmbeddingSolver for ExternalSolver {
    fn invoke(&mut self, request: &SolverRequest) -> Result<EmbeddingOutcome, SolverError> {
        let args = request.args();
        debug!("Invoking {:?} {}", self.executable, args.join(" "));

        let mut child = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SolverError::Launch {
                executable: self.executable.clone(),
                source,
            })?;

        // Drain stderr concurrently so a chatty solver cannot block on a full pipe
        let stderr_reader = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = String::new();
                let _ = stderr.read_to_string(&mut buf);
                buf
            })
        });

        let mut report = SolverReport::default();
        if let Some(stdout) = child.stdout.take() {
            echo_output(BufReader::new(stdout), &request.vn_id, &mut report);
        }

        let exit = child.wait().map_err(|source| SolverError::Wait {
            executable: self.executable.clone(),
            source,
        })?;

        if let Some(handle) = stderr_reader {
            let stderr = handle.join().unwrap_or_default();
            for line in stderr.lines() {
                debug!(target: "solver", "stderr: {}", line);
            }
        }

        if !exit.success() {
            warn!("Solver exited with {} for {}", exit, request.vn_id);
        }

        Ok(EmbeddingOutcome::from_status_file(request, report))
    }
}
