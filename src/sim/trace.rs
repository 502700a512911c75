//! Continuous trace scorer
//!
//! Judges a freehand pointer path against an ordered waypoint list:
//! - a waypoint is captured when a sample lands inside the capture radius
//! - realtime accuracy follows the local drawing direction
//! - final accuracy measures how close the whole path stays to the shape

use std::collections::VecDeque;

use serde::Serialize;

use super::countdown::{Countdown, TerminalCause};
use super::geometry::{Surface, angle_between_deg, distance, distance_to_polyline};
use super::pattern::{PatternError, TracePattern};
use crate::Point;
use crate::consts::*;

/// A waypoint captured by a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WaypointHit {
    pub index: usize,
    /// Sample landed very close to the waypoint (feedback only)
    pub critical: bool,
}

/// What a single sample did to the session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SampleFeedback {
    pub waypoint_hit: Option<WaypointHit>,
    /// Final accuracy, set on the sample that captured the last waypoint
    pub completed: Option<u8>,
    pub realtime_accuracy: u8,
}

/// One attempt at tracing a pattern
#[derive(Debug, Clone)]
pub struct TraceSession {
    pattern: TracePattern,
    surface: Surface,
    /// Most recent samples, oldest first
    captured: VecDeque<Point>,
    waypoint_index: usize,
    countdown: Countdown,
    pointer_down: bool,
    realtime_accuracy: u8,
    final_accuracy: Option<u8>,
}

impl TraceSession {
    /// Start an attempt. Invalid patterns never produce a session.
    pub fn begin(pattern: TracePattern, surface: Surface) -> Result<Self, PatternError> {
        pattern.validate()?;
        log::info!(
            "Trace started: {} ({} waypoints, {}s)",
            pattern.name,
            pattern.points.len(),
            pattern.time_limit
        );
        Ok(Self {
            countdown: Countdown::new(pattern.time_limit),
            pattern,
            surface,
            captured: VecDeque::with_capacity(MAX_CAPTURED_SAMPLES + 1),
            waypoint_index: 0,
            pointer_down: false,
            realtime_accuracy: 100,
            final_accuracy: None,
        })
    }

    pub fn pattern(&self) -> &TracePattern {
        &self.pattern
    }

    pub fn captured_path(&self) -> impl Iterator<Item = &Point> {
        self.captured.iter()
    }

    pub fn captured_len(&self) -> usize {
        self.captured.len()
    }

    pub fn current_waypoint_index(&self) -> usize {
        self.waypoint_index
    }

    pub fn time_remaining(&self) -> u32 {
        self.countdown.remaining()
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }

    pub fn is_completed(&self) -> bool {
        self.countdown.cause() == Some(TerminalCause::Completed)
    }

    pub fn is_timed_out(&self) -> bool {
        self.countdown.cause() == Some(TerminalCause::TimedOut)
    }

    pub fn is_terminal(&self) -> bool {
        self.countdown.is_resolved()
    }

    pub fn terminal_cause(&self) -> Option<TerminalCause> {
        self.countdown.cause()
    }

    /// Last realtime accuracy (for the path colour)
    pub fn last_realtime_accuracy(&self) -> u8 {
        self.realtime_accuracy
    }

    /// Final accuracy, available once completed
    pub fn final_result(&self) -> Option<u8> {
        self.final_accuracy
    }

    /// Waypoint `index` mapped onto this session's surface
    pub fn waypoint(&self, index: usize) -> Option<Point> {
        self.pattern
            .points
            .get(index)
            .map(|p| self.surface.place(*p))
    }

    fn waypoints(&self) -> Vec<Point> {
        self.pattern.points.iter().map(|p| self.surface.place(*p)).collect()
    }

    /// Pointer pressed: a new stroke replaces the captured path
    pub fn pointer_down(&mut self, point: Point) {
        if self.is_terminal() {
            return;
        }
        self.pointer_down = true;
        self.captured.clear();
        self.captured.push_back(point);
    }

    /// Pointer moved: only strokes in progress feed the scorer
    pub fn pointer_move(&mut self, point: Point) -> SampleFeedback {
        if !self.pointer_down {
            return SampleFeedback {
                realtime_accuracy: self.realtime_accuracy,
                ..Default::default()
            };
        }
        self.add_sample(point)
    }

    /// Pointer released: ends capture, never resolves the attempt
    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    /// Feed one pointer sample
    pub fn add_sample(&mut self, point: Point) -> SampleFeedback {
        if self.is_terminal() {
            log::debug!("Sample after trace resolved ignored ({:?})", self.terminal_cause());
            return SampleFeedback {
                realtime_accuracy: self.realtime_accuracy,
                ..Default::default()
            };
        }

        self.captured.push_back(point);
        while self.captured.len() > MAX_CAPTURED_SAMPLES {
            self.captured.pop_front();
        }

        self.realtime_accuracy = self.realtime_accuracy();
        let mut feedback = SampleFeedback {
            realtime_accuracy: self.realtime_accuracy,
            ..Default::default()
        };

        let Some(target) = self.waypoint(self.waypoint_index) else {
            return feedback;
        };
        let dist = distance(point, target);
        if dist < self.surface.scale_distance(CAPTURE_RADIUS) {
            let hit = WaypointHit {
                index: self.waypoint_index,
                critical: dist < self.surface.scale_distance(CRITICAL_HIT_RADIUS),
            };
            self.waypoint_index += 1;
            log::debug!("Waypoint {} hit (d={:.1})", hit.index, dist);
            feedback.waypoint_hit = Some(hit);

            if self.waypoint_index == self.pattern.points.len()
                && self.countdown.resolve(TerminalCause::Completed)
            {
                let accuracy = self.final_accuracy();
                self.final_accuracy = Some(accuracy);
                self.pointer_down = false;
                feedback.completed = Some(accuracy);
                log::info!("Trace completed: {} at {}%", self.pattern.name, accuracy);
            }
        }
        feedback
    }

    /// Directional-deviation heuristic over the most recent samples
    ///
    /// Optimistic (100) until enough samples exist and a waypoint has been
    /// reached, or when no movement carries direction information.
    pub fn realtime_accuracy(&self) -> u8 {
        let n = self.captured.len();
        let idx = self.waypoint_index;
        if n < REALTIME_MIN_SAMPLES || idx == 0 || idx >= self.pattern.points.len() {
            return 100;
        }
        let ideal = self.pattern.points[idx] - self.pattern.points[idx - 1];
        if ideal.length_squared() == 0.0 {
            return 100;
        }

        let recent: Vec<Point> = self
            .captured
            .iter()
            .skip(n.saturating_sub(REALTIME_WINDOW))
            .copied()
            .collect();

        let mut total = 0.0;
        let mut valid = 0usize;
        for pair in recent.windows(2) {
            let actual = pair[1] - pair[0];
            if actual.length_squared() == 0.0 {
                continue;
            }
            total += angle_between_deg(ideal, actual);
            valid += 1;
        }
        if valid == 0 {
            return 100;
        }
        let average = total / valid as f32;
        (100.0 - average / 180.0 * 100.0).clamp(0.0, 100.0).round() as u8
    }

    /// Shape-similarity score of the captured path against the pattern
    ///
    /// Samples the path at a bounded stride and averages each sample's
    /// distance to the pattern outline.
    pub fn final_accuracy(&self) -> u8 {
        let n = self.captured.len();
        if n < 2 {
            return 0;
        }
        let outline = self.waypoints();
        let budget = MAX_EVALUATED_SAMPLES.min(outline.len() * 5).max(1);
        let stride = (n / budget).max(1);

        let mut total = 0.0;
        let mut evaluated = 0usize;
        for p in self
            .captured
            .iter()
            .step_by(stride)
            .take(MAX_EVALUATED_SAMPLES)
        {
            total += distance_to_polyline(*p, &outline);
            evaluated += 1;
        }
        if evaluated == 0 {
            return 0;
        }
        let average = total / evaluated as f32;
        let max_distance = self.surface.scale_distance(MAX_ALLOWABLE_DISTANCE);
        (100.0 - average / max_distance * 100.0)
            .clamp(0.0, 100.0)
            .round() as u8
    }

    /// One second elapsed. Returns true on the tick that times the trace out.
    pub fn tick(&mut self) -> bool {
        let expired = self.countdown.tick();
        if expired {
            self.pointer_down = false;
            log::info!("Trace timed out: {}", self.pattern.name);
        }
        expired
    }

    /// Force a timeout. Ignored once the attempt has resolved.
    pub fn timeout(&mut self) -> bool {
        self.pointer_down = false;
        self.countdown.resolve(TerminalCause::TimedOut)
    }

    /// Player backed out. Ignored once the attempt has resolved.
    pub fn cancel(&mut self) -> bool {
        self.pointer_down = false;
        self.countdown.cancel()
    }
}
