//! Year timeline: which projection year is active, and when it advances.
//!
//! The timeline is the slow clock of the scene. It owns the ordered list of
//! available years, the currently selected year, and the playback state.
//! While playing, it advances one year each time the configured period
//! elapses, wrapping from the last year back to the first, so autoplay is an
//! endless cycle.
//!
//! # Design Principles
//!
//! - The current year is stored as an index into `years`, so it can never
//!   name a year outside the list.
//! - At most one advance happens per [`YearTimeline::tick`], however long
//!   the elapsed interval: a stalled caller never skips years.
//! - A manual [`YearTimeline::select_year`] restarts the period.
//! - Invalid selections are caller bugs and are ignored without changing
//!   state.

use std::time::Duration;

use carbonscape_types::YearLabel;
use tracing::debug;

use crate::config::TimelineConfig;

/// Errors that can occur when building a timeline.
#[derive(Debug, thiserror::Error)]
pub enum TimelineError {
    /// Invalid timeline configuration (e.g. a zero advance period).
    #[error("invalid timeline configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Playback state of the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No years known; every operation is a no-op.
    Idle,
    /// Autoplay is advancing the current year.
    Playing,
    /// Autoplay is suspended; manual selection still works.
    Paused,
}

/// Ordered projection years plus the autoplay clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearTimeline {
    /// Available years in temporal order.
    years: Vec<YearLabel>,

    /// Index of the current year within `years` (meaningless when empty).
    current: usize,

    /// Current playback state.
    state: PlaybackState,

    /// Time between autoplay advances.
    period: Duration,

    /// Time accumulated since the last advance or manual selection.
    since_advance: Duration,

    /// Whether a freshly supplied year list starts playing.
    autoplay: bool,
}

impl YearTimeline {
    /// Create an idle timeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::InvalidConfig`] if the advance period is zero.
    pub fn new(config: &TimelineConfig) -> Result<Self, TimelineError> {
        Self::with_period(config.advance_period(), config.autoplay)
    }

    /// Create an idle timeline from explicit parameters.
    ///
    /// # Errors
    ///
    /// Returns [`TimelineError::InvalidConfig`] if `period` is zero.
    pub fn with_period(period: Duration, autoplay: bool) -> Result<Self, TimelineError> {
        if period.is_zero() {
            return Err(TimelineError::InvalidConfig {
                reason: "advance period must be greater than zero".to_owned(),
            });
        }
        Ok(Self {
            years: Vec::new(),
            current: 0,
            state: PlaybackState::Idle,
            period,
            since_advance: Duration::ZERO,
            autoplay,
        })
    }

    /// Replace the list of available years.
    ///
    /// The current year is kept if it is still present; otherwise the first
    /// year is selected. Leaving `Idle` enters `Playing` (or `Paused` when
    /// autoplay is disabled); an existing `Playing`/`Paused` state is kept.
    /// An empty list returns the timeline to `Idle`.
    pub fn set_years(&mut self, years: impl IntoIterator<Item = YearLabel>) {
        let previous = self.current_year().cloned();
        let mut years: Vec<YearLabel> = years.into_iter().collect();
        years.sort();
        years.dedup();
        self.years = years;

        if self.years.is_empty() {
            self.current = 0;
            self.state = PlaybackState::Idle;
            self.since_advance = Duration::ZERO;
            return;
        }

        self.current = previous
            .and_then(|year| self.position_of(&year))
            .unwrap_or(0);

        if self.state == PlaybackState::Idle {
            self.state = if self.autoplay {
                PlaybackState::Playing
            } else {
                PlaybackState::Paused
            };
            self.since_advance = Duration::ZERO;
        }
    }

    /// Feed elapsed wall-clock time; advance once if the period has passed.
    ///
    /// Returns `true` when the current year changed. No-op while `Idle` or
    /// `Paused`.
    pub fn tick(&mut self, elapsed: Duration) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.since_advance = self.since_advance.saturating_add(elapsed);
        if self.since_advance < self.period {
            return false;
        }
        // Carry the remainder for steady cadence, but never bank a second
        // advance: a long stall still moves exactly one year.
        self.since_advance = self.since_advance.saturating_sub(self.period);
        if self.since_advance >= self.period {
            self.since_advance = Duration::ZERO;
        }
        self.advance().is_some()
    }

    /// Step to the next year, wrapping after the last.
    ///
    /// Returns the new current year, or `None` when `Idle`.
    pub fn advance(&mut self) -> Option<&YearLabel> {
        let len = self.years.len();
        if len == 0 {
            return None;
        }
        self.current = self.current.saturating_add(1).checked_rem(len).unwrap_or(0);
        let year = self.years.get(self.current);
        debug!(year = ?year.map(YearLabel::as_str), "timeline advanced");
        year
    }

    /// Flip between `Playing` and `Paused`. No effect while `Idle`.
    pub const fn toggle_pause(&mut self) {
        self.state = match self.state {
            PlaybackState::Idle => PlaybackState::Idle,
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
        };
    }

    /// Jump to `year` if it is available and restart the period.
    ///
    /// Returns `false` (and changes nothing) for unknown years.
    pub fn select_year(&mut self, year: &YearLabel) -> bool {
        match self.position_of(year) {
            Some(index) => {
                self.current = index;
                self.since_advance = Duration::ZERO;
                true
            }
            None => false,
        }
    }

    /// The currently selected year, if any years are known.
    pub fn current_year(&self) -> Option<&YearLabel> {
        self.years.get(self.current)
    }

    /// Zero-based index of the current year and the number of years.
    ///
    /// Years with an index at or below the current one are "reached".
    pub fn progress(&self) -> Option<(usize, usize)> {
        if self.years.is_empty() {
            None
        } else {
            Some((self.current, self.years.len()))
        }
    }

    /// Available years in temporal order.
    pub fn years(&self) -> &[YearLabel] {
        &self.years
    }

    /// Current playback state.
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Whether autoplay is suspended.
    pub fn is_paused(&self) -> bool {
        self.state == PlaybackState::Paused
    }

    /// Configured advance period.
    pub const fn period(&self) -> Duration {
        self.period
    }

    fn position_of(&self, year: &YearLabel) -> Option<usize> {
        self.years.iter().position(|candidate| candidate == year)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;

    const PERIOD: Duration = Duration::from_secs(4);

    fn labels(years: &[&str]) -> Vec<YearLabel> {
        years.iter().map(|y| YearLabel::from(*y)).collect()
    }

    /// Helper to create a playing timeline over the given years.
    fn make_timeline(years: &[&str]) -> YearTimeline {
        let mut timeline = YearTimeline::with_period(PERIOD, true).unwrap();
        timeline.set_years(labels(years));
        timeline
    }

    fn current(timeline: &YearTimeline) -> &str {
        timeline.current_year().map_or("", YearLabel::as_str)
    }

    #[test]
    fn starts_idle_and_inert() {
        let mut timeline = YearTimeline::new(&TimelineConfig::default()).unwrap();
        assert_eq!(timeline.state(), PlaybackState::Idle);
        assert!(!timeline.tick(Duration::from_secs(60)));
        timeline.toggle_pause();
        assert_eq!(timeline.state(), PlaybackState::Idle);
        assert!(timeline.advance().is_none());
        assert!(timeline.current_year().is_none());
        assert!(timeline.progress().is_none());
    }

    #[test]
    fn supplying_years_starts_playing_at_first_year() {
        let timeline = make_timeline(&["2030", "2025", "2040"]);
        assert_eq!(timeline.state(), PlaybackState::Playing);
        assert_eq!(current(&timeline), "2025");
        assert_eq!(timeline.progress(), Some((0, 3)));
    }

    #[test]
    fn autoplay_disabled_starts_paused() {
        let mut timeline = YearTimeline::with_period(PERIOD, false).unwrap();
        timeline.set_years(labels(&["2025"]));
        assert_eq!(timeline.state(), PlaybackState::Paused);
    }

    #[test]
    fn tick_advances_only_after_full_period() {
        let mut timeline = make_timeline(&["2025", "2030"]);
        assert!(!timeline.tick(Duration::from_millis(3999)));
        assert_eq!(current(&timeline), "2025");
        assert!(timeline.tick(Duration::from_millis(1)));
        assert_eq!(current(&timeline), "2030");
    }

    #[test]
    fn long_stall_advances_exactly_one_year() {
        let mut timeline = make_timeline(&["2025", "2030", "2035"]);
        assert!(timeline.tick(Duration::from_secs(60)));
        assert_eq!(current(&timeline), "2030");
        // No banked second advance.
        assert!(!timeline.tick(Duration::from_millis(10)));
        assert_eq!(current(&timeline), "2030");
    }

    #[test]
    fn n_advances_return_to_start() {
        for n in 1..=6 {
            let years: Vec<String> = (0..n).map(|i| (2025 + i * 5).to_string()).collect();
            let refs: Vec<&str> = years.iter().map(String::as_str).collect();
            let mut timeline = make_timeline(&refs);
            timeline.select_year(&YearLabel::from(refs[n / 2]));
            let start = timeline.current_year().cloned();
            for _ in 0..n {
                assert!(timeline.tick(PERIOD));
            }
            assert_eq!(timeline.current_year().cloned(), start);
        }
    }

    #[test]
    fn wraps_after_last_year() {
        let mut timeline = make_timeline(&["2025", "2030"]);
        timeline.select_year(&YearLabel::from("2030"));
        assert_eq!(timeline.advance().map(YearLabel::as_str), Some("2025"));
    }

    #[test]
    fn paused_tick_never_changes_year() {
        let mut timeline = make_timeline(&["2025", "2030", "2035"]);
        timeline.toggle_pause();
        assert!(timeline.is_paused());
        for _ in 0..10 {
            assert!(!timeline.tick(PERIOD.saturating_mul(3)));
        }
        assert_eq!(current(&timeline), "2025");

        timeline.toggle_pause();
        assert_eq!(timeline.state(), PlaybackState::Playing);
        assert!(timeline.tick(PERIOD));
        assert_eq!(current(&timeline), "2030");
    }

    #[test]
    fn select_year_restarts_period() {
        let mut timeline = make_timeline(&["2025", "2030", "2035"]);
        assert!(!timeline.tick(Duration::from_secs(3)));
        assert!(timeline.select_year(&YearLabel::from("2035")));
        assert!(!timeline.tick(Duration::from_secs(3)));
        assert_eq!(current(&timeline), "2035");
        assert!(timeline.tick(Duration::from_secs(1)));
        assert_eq!(current(&timeline), "2025");
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let mut timeline = make_timeline(&["2025", "2030"]);
        timeline.tick(Duration::from_secs(2));
        let before = timeline.clone();
        assert!(!timeline.select_year(&YearLabel::from("1999")));
        assert_eq!(timeline, before);
    }

    #[test]
    fn paused_timeline_still_accepts_selection() {
        let mut timeline = make_timeline(&["2025", "2030"]);
        timeline.toggle_pause();
        assert!(timeline.select_year(&YearLabel::from("2030")));
        assert_eq!(current(&timeline), "2030");
        assert!(timeline.is_paused());
    }

    #[test]
    fn replacing_years_keeps_current_when_present() {
        let mut timeline = make_timeline(&["2025", "2030", "2035"]);
        timeline.select_year(&YearLabel::from("2030"));
        timeline.set_years(labels(&["2020", "2030"]));
        assert_eq!(current(&timeline), "2030");
        assert_eq!(timeline.progress(), Some((1, 2)));

        timeline.set_years(labels(&["2050", "2060"]));
        assert_eq!(current(&timeline), "2050");
    }

    #[test]
    fn replacing_years_keeps_pause() {
        let mut timeline = make_timeline(&["2025"]);
        timeline.toggle_pause();
        timeline.set_years(labels(&["2025", "2030"]));
        assert!(timeline.is_paused());
    }

    #[test]
    fn empty_year_list_returns_to_idle() {
        let mut timeline = make_timeline(&["2025"]);
        timeline.set_years(Vec::new());
        assert_eq!(timeline.state(), PlaybackState::Idle);
        assert!(timeline.current_year().is_none());
    }

    #[test]
    fn single_year_cycles_onto_itself() {
        let mut timeline = make_timeline(&["2025"]);
        assert!(timeline.tick(PERIOD));
        assert_eq!(current(&timeline), "2025");
    }

    #[test]
    fn zero_period_is_rejected() {
        let result = YearTimeline::with_period(Duration::ZERO, true);
        assert!(result.is_err());
    }
}
