//! Relay statistics.

use std::time::Duration;

use outputs::AgentReport;

use super::input::InputStats;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RelayStats {
    /// Input line counters
    pub input: InputStats,

    /// Final per-output stats, in configuration order
    pub outputs: AgentReport,

    /// Total duration of the run
    pub duration: Duration,

    /// Stopped by a signal rather than end of input
    pub interrupted: bool,
}

impl RelayStats {
    /// Metrics delivered, summed over all outputs
    pub fn total_written(&self) -> u64 {
        self.outputs.iter().map(|(_, s)| s.metrics_written).sum()
    }

    /// Metrics lost to buffer overflow, summed over all outputs
    pub fn total_dropped(&self) -> u64 {
        self.outputs.iter().map(|(_, s)| s.total_dropped()).sum()
    }

    /// Input metrics accepted per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.input.metrics_accepted as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                     Relay Statistics                         ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Lines read: {}", self.input.lines_read);
        println!("   ├─ Metrics accepted: {}", self.input.metrics_accepted);
        println!("   ├─ Lines rejected: {}", self.input.lines_rejected);
        println!("   ├─ Throughput: {:.2} metrics/s", self.throughput());
        println!("   └─ Stopped by signal: {}", self.interrupted);

        for (name, stats) in &self.outputs {
            println!("\n📤 Output '{}'", name);
            for line in stats.to_string().lines() {
                println!("   {}", line);
            }
        }

        println!();
    }
}
