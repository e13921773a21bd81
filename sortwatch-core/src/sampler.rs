// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Host resource sampling.
//!
//! A [`HostSampler`] owns an ordered chain of [`ResourceProbe`] backends chosen
//! at startup. Each reading asks the probes in order and takes the first
//! answer; when every probe declines, the reading is zero. Sampling never
//! fails and never mutates OS state.

use std::fmt;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

/// Which probe chain to build at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerStrategy {
    /// Native probe, then the platform's external command.
    #[default]
    Auto,
    /// Native probe only.
    Native,
    /// External command only.
    Command,
    /// No probes; every reading is zero.
    None,
}

impl fmt::Display for SamplerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplerStrategy::Auto => write!(f, "auto"),
            SamplerStrategy::Native => write!(f, "native"),
            SamplerStrategy::Command => write!(f, "command"),
            SamplerStrategy::None => write!(f, "none"),
        }
    }
}

/// One source of OS readings. Every method may decline with `None`.
pub trait ResourceProbe: Send + Sync + fmt::Debug {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Resident memory of this process, in bytes.
    fn process_memory(&self) -> Option<u64> {
        None
    }

    /// One-minute load average scaled to a percentage.
    fn load_percent(&self) -> Option<f64> {
        None
    }

    /// Host-wide CPU utilization percentage.
    fn cpu_utilization(&self) -> Option<f64> {
        None
    }

    /// Host-wide memory utilization percentage.
    fn memory_utilization(&self) -> Option<f64> {
        None
    }
}

/// Host-wide utilization at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HostLoad {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

/// Process-level reading used around a measured section.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResourceSnapshot {
    pub memory_bytes: u64,
    pub load_percent: f64,
}

/// Probe backed by `sysinfo`.
pub struct NativeProbe {
    system: Mutex<System>,
    pid: Option<Pid>,
}

impl NativeProbe {
    pub fn new() -> Self {
        let mut system = System::new();
        // CPU usage is computed between two refreshes; prime the first one.
        system.refresh_cpu();

        Self {
            system: Mutex::new(system),
            pid: sysinfo::get_current_pid().ok(),
        }
    }
}

impl Default for NativeProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NativeProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeProbe").field("pid", &self.pid).finish()
    }
}

impl ResourceProbe for NativeProbe {
    fn name(&self) -> &'static str {
        "native"
    }

    fn process_memory(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        if !system.refresh_process(pid) {
            return None;
        }
        system.process(pid).map(|process| process.memory())
    }

    fn load_percent(&self) -> Option<f64> {
        // sysinfo reports zeros on Windows, which has no load average.
        if cfg!(target_os = "windows") {
            return None;
        }
        Some(System::load_average().one * 100.0)
    }

    fn cpu_utilization(&self) -> Option<f64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_cpu();
        if system.cpus().is_empty() {
            return None;
        }
        Some(f64::from(system.global_cpu_info().cpu_usage()))
    }

    fn memory_utilization(&self) -> Option<f64> {
        let mut system = self.system.lock().ok()?;
        system.refresh_memory();
        let total = system.total_memory();
        if total == 0 {
            return None;
        }
        Some(system.used_memory() as f64 / total as f64 * 100.0)
    }
}

/// Probe that shells out to a load-reporting command.
///
/// Understands `uptime` style output (`load average: 0.52, ...`) and
/// `wmic cpu get loadpercentage` style output (header line, then a number).
#[derive(Debug, Clone)]
pub struct CommandProbe {
    program: String,
    args: Vec<String>,
}

impl CommandProbe {
    /// Build from `[program, args...]`. Returns None for an empty command.
    pub fn new(command: &[String]) -> Option<Self> {
        let (program, args) = command.split_first()?;
        if program.trim().is_empty() {
            return None;
        }
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }

    /// The platform's usual load query.
    pub fn platform_default() -> Self {
        let command: &[&str] = if cfg!(target_os = "windows") {
            &["wmic", "cpu", "get", "loadpercentage"]
        } else {
            &["uptime"]
        };
        Self {
            program: command[0].to_string(),
            args: command[1..].iter().map(|s| s.to_string()).collect(),
        }
    }

    fn run(&self) -> Option<String> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .ok()?;
        if !output.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl ResourceProbe for CommandProbe {
    fn name(&self) -> &'static str {
        "command"
    }

    fn load_percent(&self) -> Option<f64> {
        parse_load_percentage(&self.run()?)
    }

    fn cpu_utilization(&self) -> Option<f64> {
        self.load_percent()
    }
}

/// Extract a load percentage from command output.
pub fn parse_load_percentage(output: &str) -> Option<f64> {
    if let Some(pos) = output.find("load average") {
        let tail = &output[pos..];
        let values = &tail[tail.find(':')? + 1..];
        let first = values
            .split(|c: char| c == ',' || c.is_whitespace())
            .find(|s| !s.is_empty())?;
        return first.parse::<f64>().ok().map(|load| load * 100.0);
    }

    output
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .find_map(|token| token.parse::<f64>().ok())
}

/// Ordered probe chain shared by the instrumentation wrapper and the
/// telemetry recorder. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HostSampler {
    probes: Arc<Vec<Box<dyn ResourceProbe>>>,
}

impl HostSampler {
    /// Build a sampler from an explicit probe chain.
    pub fn new(probes: Vec<Box<dyn ResourceProbe>>) -> Self {
        Self {
            probes: Arc::new(probes),
        }
    }

    /// Sampler with no probes. Every reading is zero.
    pub fn unavailable() -> Self {
        Self::new(Vec::new())
    }

    /// Build the chain for a configured strategy.
    ///
    /// `command` overrides the platform default for the command probe.
    pub fn from_strategy(strategy: SamplerStrategy, command: Option<&[String]>) -> Self {
        let command_probe = || -> Box<dyn ResourceProbe> {
            match command.and_then(CommandProbe::new) {
                Some(probe) => Box::new(probe),
                None => Box::new(CommandProbe::platform_default()),
            }
        };

        let probes: Vec<Box<dyn ResourceProbe>> = match strategy {
            SamplerStrategy::Auto => vec![Box::new(NativeProbe::new()), command_probe()],
            SamplerStrategy::Native => vec![Box::new(NativeProbe::new())],
            SamplerStrategy::Command => vec![command_probe()],
            SamplerStrategy::None => Vec::new(),
        };

        tracing::debug!(
            strategy = %strategy,
            probes = ?probes.iter().map(|p| p.name()).collect::<Vec<_>>(),
            "Host sampler configured"
        );

        Self::new(probes)
    }

    /// Names of the probes in chain order.
    pub fn probe_names(&self) -> Vec<&'static str> {
        self.probes.iter().map(|p| p.name()).collect()
    }

    fn first<R>(&self, read: impl Fn(&dyn ResourceProbe) -> Option<R>) -> Option<R> {
        self.probes.iter().find_map(|probe| read(probe.as_ref()))
    }

    /// Process memory footprint in bytes, or 0.
    pub fn process_memory(&self) -> u64 {
        self.first(|p| p.process_memory()).unwrap_or(0)
    }

    /// Load-average snapshot as a percentage, or 0.
    pub fn load_percent(&self) -> f64 {
        self.first(|p| p.load_percent()).unwrap_or(0.0)
    }

    /// Host CPU and memory utilization, each 0 when unavailable.
    pub fn host_load(&self) -> HostLoad {
        HostLoad {
            cpu_percent: self.first(|p| p.cpu_utilization()).unwrap_or(0.0),
            memory_percent: self.first(|p| p.memory_utilization()).unwrap_or(0.0),
        }
    }

    /// Process memory and load taken together.
    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            memory_bytes: self.process_memory(),
            load_percent: self.load_percent(),
        }
    }
}

impl Default for HostSampler {
    fn default() -> Self {
        Self::from_strategy(SamplerStrategy::Auto, None)
    }
}
