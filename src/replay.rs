// Replay module for analyzing recorded sessions and debugging decision-making
//
// This module provides functionality to:
// 1. Parse JSONL session logs written by the debug logger
// 2. Feed every recorded event through a fresh engine controller
// 3. Compare recorded vs replayed moves
// 4. Generate a summary report

use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use crate::config::Config;
use crate::debug_logger::{LogEntry, SessionEvent};
use crate::engine::{EngineController, Outbox, TickOutcome};
use crate::types::Direction;

/// Result of replaying a single state update
#[derive(Debug, Clone)]
pub struct ReplayResult {
    /// 1-based line number in the log
    pub line: usize,
    pub recorded_move: Option<Direction>,
    pub replayed_move: Option<Direction>,
    pub matches: bool,
    pub computation_time_us: u128,
}

/// Statistics for a complete replay session
#[derive(Debug, Default)]
pub struct ReplayStats {
    pub total_ticks: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub match_rate: f64,
}

/// Replay engine for analyzing session logs
pub struct ReplayEngine {
    config: Config,
    verbose: bool,
}

impl ReplayEngine {
    /// Creates a new replay engine with the given configuration
    pub fn new(config: Config, verbose: bool) -> Self {
        ReplayEngine { config, verbose }
    }

    /// Loads all log entries from a JSONL file
    pub fn load_log_file<P: AsRef<Path>>(&self, log_path: P) -> Result<Vec<LogEntry>, String> {
        let file =
            File::open(log_path.as_ref()).map_err(|e| format!("Failed to open log file: {}", e))?;

        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| format!("Failed to read line {}: {}", line_num + 1, e))?;

            if line.trim().is_empty() {
                continue;
            }

            let entry: LogEntry = serde_json::from_str(&line)
                .map_err(|e| format!("Failed to parse JSON on line {}: {}", line_num + 1, e))?;

            entries.push(entry);
        }

        info!("Loaded {} log entries", entries.len());
        Ok(entries)
    }

    /// Replays a whole session log in order.
    ///
    /// Every event is applied to one controller so traces accumulate exactly
    /// as they did live. Events the engine rejects are reported and skipped.
    pub fn replay_all(&self, entries: &[LogEntry]) -> Vec<ReplayResult> {
        let mut engine = EngineController::new(self.config.clone(), Outbox::new());
        let mut results = Vec::new();

        for (idx, entry) in entries.iter().enumerate() {
            let line = idx + 1;
            let start_time = Instant::now();
            let applied = engine.apply(&entry.event).map(|outcome| {
                if let SessionEvent::State { chosen_move, .. } = &entry.event {
                    let replayed_move = match outcome {
                        Some(TickOutcome::Moved(dir)) => Some(dir),
                        _ => None,
                    };
                    let result = ReplayResult {
                        line,
                        recorded_move: *chosen_move,
                        replayed_move,
                        matches: *chosen_move == replayed_move,
                        computation_time_us: start_time.elapsed().as_micros(),
                    };
                    self.report_tick(&result);
                    results.push(result);
                }
            });

            if let Err(e) = applied {
                warn!("Line {}: engine rejected event: {}", line, e);
            }
            engine.transport_mut().drain();
        }

        results
    }

    fn report_tick(&self, result: &ReplayResult) {
        if !self.verbose {
            return;
        }
        let name = |d: Option<Direction>| d.map(|d| d.as_str()).unwrap_or("none");
        if result.matches {
            info!(
                "Line {}: ✓ MATCH - {} ({}µs)",
                result.line,
                name(result.replayed_move),
                result.computation_time_us
            );
        } else {
            warn!(
                "Line {}: ✗ MISMATCH - Recorded: {}, Replayed: {} ({}µs)",
                result.line,
                name(result.recorded_move),
                name(result.replayed_move),
                result.computation_time_us
            );
        }
    }

    /// Generates statistics from replay results
    pub fn generate_stats(&self, results: &[ReplayResult]) -> ReplayStats {
        let total_ticks = results.len();
        let matches = results.iter().filter(|r| r.matches).count();
        let mismatches = total_ticks - matches;
        let match_rate = if total_ticks > 0 {
            (matches as f64 / total_ticks as f64) * 100.0
        } else {
            0.0
        };

        ReplayStats {
            total_ticks,
            matches,
            mismatches,
            match_rate,
        }
    }

    /// Prints a detailed report of replay results
    pub fn print_report(&self, results: &[ReplayResult]) {
        let stats = self.generate_stats(results);

        println!("\n═══════════════════════════════════════════════════════════");
        println!("                    REPLAY REPORT");
        println!("═══════════════════════════════════════════════════════════");
        println!("Total Ticks:    {}", stats.total_ticks);
        println!("Matches:        {} ({:.1}%)", stats.matches, stats.match_rate);
        println!("Mismatches:     {}", stats.mismatches);
        println!("═══════════════════════════════════════════════════════════\n");

        if !results.is_empty() {
            let avg_time: f64 = results
                .iter()
                .map(|r| r.computation_time_us as f64)
                .sum::<f64>()
                / results.len() as f64;
            println!("Average Tick Time:   {:.1}µs\n", avg_time);
        }

        let mismatches: Vec<_> = results.iter().filter(|r| !r.matches).collect();
        if !mismatches.is_empty() {
            println!("═══════════════════════════════════════════════════════════");
            println!("                  DETAILED MISMATCHES");
            println!("═══════════════════════════════════════════════════════════");

            for result in mismatches {
                println!(
                    "Line {}: {:?} → {:?} ({}µs)",
                    result.line,
                    result.recorded_move,
                    result.replayed_move,
                    result.computation_time_us
                );
            }
            println!();
        }
    }
}
