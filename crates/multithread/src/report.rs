// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{collections::HashMap, time::Duration};

/// One finished job.
#[derive(Debug, Clone)]
pub struct TrackDuration {
    pub name: String,
    pub duration: Duration,
}

impl TrackDuration {
    pub fn new(name: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            duration,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct MultithreadReport {
    events: Vec<TrackDuration>,
}

impl MultithreadReport {
    pub fn track(&mut self, msg: TrackDuration) {
        self.events.push(msg);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn to_report(&self) -> FlattenedReport {
        let mut total_durations: HashMap<String, Duration> = HashMap::new();
        let mut runs: HashMap<String, u64> = HashMap::new();

        for event in &self.events {
            *runs.entry(event.name.clone()).or_insert(0) += 1;
            *total_durations.entry(event.name.clone()).or_default() += event.duration;
        }

        let avg_dur = total_durations
            .into_iter()
            .map(|(name, total)| {
                let count = runs[&name];
                let avg = Duration::from_nanos((total.as_nanos() / count as u128) as u64);
                (name, avg)
            })
            .collect();

        FlattenedReport { avg_dur, runs }
    }
}

/// Average duration and run count per job name.
#[derive(Debug)]
pub struct FlattenedReport {
    avg_dur: HashMap<String, Duration>,
    runs: HashMap<String, u64>,
}

impl FlattenedReport {
    pub fn average(&self, name: &str) -> Option<Duration> {
        self.avg_dur.get(name).copied()
    }

    pub fn runs(&self, name: &str) -> u64 {
        self.runs.get(name).copied().unwrap_or(0)
    }
}

impl std::fmt::Display for FlattenedReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:<30} {:>15} {:>10}", "Job", "Avg Duration", "Runs")?;
        writeln!(f, "{}", "-".repeat(57))?;

        let mut entries: Vec<_> = self.avg_dur.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        for (name, avg_dur) in entries {
            writeln!(f, "{:<30} {:>15?} {:>10}", name, avg_dur, self.runs(name))?;
        }

        Ok(())
    }
}
