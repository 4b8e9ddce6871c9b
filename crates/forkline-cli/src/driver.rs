//! Runs a [`Scenario`] against a fork forest and summarizes the result.

use std::fmt;

use anyhow::{Result, bail};
use forkline_core::{
    DiscreteTimeline, Forest, ForkId, Instant, LocalPosition, Timeline, Timestamped,
};
use tracing::{debug, info};

use crate::config::{Prediction, Scenario};

/// One-dimensional state of a body in uniform motion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct State {
    pub position: f64,
    pub velocity: f64,
}

impl State {
    fn advance(self, seconds: f64) -> Self {
        Self {
            position: self.position + self.velocity * seconds,
            velocity: self.velocity,
        }
    }
}

pub type Trajectory = DiscreteTimeline<State>;

/// Summary of one surviving trajectory.
#[derive(Debug, Clone)]
pub struct TrajectoryReport {
    pub name: String,
    pub id: ForkId,
    pub is_root: bool,
    pub fork_time: Option<Instant>,
    pub samples: usize,
    pub first: Option<Timestamped<State>>,
    pub last: Option<Timestamped<State>>,
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    pub trajectories: Vec<TrajectoryReport>,
    pub pruned: Vec<String>,
    pub trimmed: usize,
}

impl Report {
    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&TrajectoryReport> {
        self.trajectories.iter().find(|t| t.name == name)
    }
}

pub fn run(scenario: &Scenario) -> Result<Report> {
    let mut forest = Forest::<Trajectory>::new();
    let history = sample_history(&mut forest, scenario);

    let mut predictions = Vec::with_capacity(scenario.predictions.len());
    for prediction in &scenario.predictions {
        let id = fork_prediction(&mut forest, history, prediction)?;
        predictions.push((prediction.name.clone(), id));
    }

    let mut report = Report::default();
    if let Some(cutoff) = scenario.prune_after {
        forest.delete_all_forks_after(history, cutoff);
        predictions.retain(|(name, id)| {
            let kept = forest.contains(*id);
            if !kept {
                info!(%name, %cutoff, "pruned prediction");
                report.pruned.push(name.clone());
            }
            kept
        });
    }

    if scenario.detach_first
        && let Some((name, id)) = predictions.first()
    {
        detach(&mut forest, *id);
        info!(%name, "detached prediction");
    }

    if let Some(cutoff) = scenario.trim_before {
        report.trimmed = trim_history(&mut forest, history, cutoff)?;
    }

    let named = std::iter::once(("history".to_string(), history)).chain(predictions);
    for (name, id) in named {
        report.trajectories.push(summarize(&forest, name, id));
    }
    Ok(report)
}

fn sample_history(forest: &mut Forest<Trajectory>, scenario: &Scenario) -> ForkId {
    let sampling = &scenario.history;
    let initial = State {
        position: sampling.position,
        velocity: sampling.velocity,
    };
    let samples = (0..sampling.count).map(|i| {
        let elapsed = sampling.step * i as f64;
        Timestamped::new(sampling.start.plus_seconds(elapsed), initial.advance(elapsed))
    });
    let history = forest.new_root_with(Trajectory::from_samples(samples));
    info!(samples = sampling.count, start = %sampling.start, "sampled history");
    history
}

fn fork_prediction(
    forest: &mut Forest<Trajectory>,
    history: ForkId,
    prediction: &Prediction,
) -> Result<ForkId> {
    let timeline = forest.timeline(history);
    let index = match timeline.find(prediction.fork_at) {
        Some(index) => index,
        None => match timeline.lower_bound(prediction.fork_at).checked_sub(1) {
            Some(index) => index,
            None => bail!(
                "prediction {:?} forks at {}, before the history starts",
                prediction.name,
                prediction.fork_at
            ),
        },
    };

    let id = forest.fork(history, LocalPosition::Index(index));
    let point = forest.fork_point(id);
    let mut time = point.time();
    let mut state = point.sample().value;
    state.velocity += prediction.delta_v;

    for _ in 0..prediction.count {
        state = state.advance(prediction.step);
        time = time.plus_seconds(prediction.step);
        forest.push_back(id, Timestamped::new(time, state));
    }
    debug!(name = %prediction.name, ?id, fork = ?forest.fork_time(id), "forked prediction");
    Ok(id)
}

/// Copy the fork point into `id` and make it a root.
fn detach(forest: &mut Forest<Trajectory>, id: ForkId) {
    let copied_begin = *forest.fork_point(id).sample();
    forest.push_front(id, copied_begin);
    forest.detach_fork_with_copied_begin(id);
}

/// Drop history samples before `cutoff`, returning how many went.
fn trim_history(forest: &mut Forest<Trajectory>, history: ForkId, cutoff: Instant) -> Result<usize> {
    let blocking = forest.count_forks_at_or_before(history, cutoff);
    if blocking > 0 {
        bail!("cannot trim history before {cutoff}: {blocking} prediction(s) fork at or before it");
    }
    forest.check_no_forks_before(history, cutoff);

    let mut trimmed = 0;
    while forest
        .timeline(history)
        .first_time()
        .is_some_and(|first| first < cutoff)
    {
        forest.pop_front(history);
        trimmed += 1;
    }
    info!(trimmed, %cutoff, "trimmed history");
    Ok(trimmed)
}

fn summarize(forest: &Forest<Trajectory>, name: String, id: ForkId) -> TrajectoryReport {
    let mut samples = forest.samples(id);
    let first = samples.next().copied();
    let last = samples.next_back().copied().or(first);
    TrajectoryReport {
        name,
        id,
        is_root: forest.is_root(id),
        fork_time: forest.fork_time(id),
        samples: forest.effective_len(id),
        first,
        last,
    }
}

impl fmt::Display for TrajectoryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<12} {} ", self.name, self.id.short())?;
        match self.fork_time {
            Some(fork) if !self.is_root => write!(f, "fork@{fork:<12}")?,
            _ => write!(f, "{:<17}", "root")?,
        }
        write!(f, " samples={:<4}", self.samples)?;
        if let (Some(first), Some(last)) = (&self.first, &self.last) {
            write!(
                f,
                " {} .. {}  x={:.1} v={:.2}",
                first.time, last.time, last.value.position, last.value.velocity
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for trajectory in &self.trajectories {
            writeln!(f, "{trajectory}")?;
        }
        if !self.pruned.is_empty() {
            writeln!(f, "pruned: {}", self.pruned.join(", "))?;
        }
        if self.trimmed > 0 {
            writeln!(f, "trimmed {} history sample(s)", self.trimmed)?;
        }
        Ok(())
    }
}
