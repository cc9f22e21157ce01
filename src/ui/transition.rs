// Screen transitions and the screen resolver.
// Tracks slide-in/slide-out progress per screen and when each one is mounted.

use std::time::{Duration, Instant};

use crate::store::{NavigationState, ScreenId};

/// Default slide duration.
pub const DEFAULT_TRANSITION: Duration = Duration::from_millis(500);

/// Slide animation for one screen.
///
/// Progress runs from 0 (off-screen right) to 1 (fully shown). Showing mounts
/// immediately; hiding keeps the screen mounted until progress reaches 0.
#[derive(Debug, Clone)]
pub struct ScreenTransition {
    shown: bool,
    mounted: bool,
    from: f32,
    started_at: Instant,
    duration: Duration,
}

impl ScreenTransition {
    pub fn new(shown: bool, now: Instant, duration: Duration) -> Self {
        Self {
            shown,
            mounted: shown,
            from: 0.0,
            started_at: now,
            duration,
        }
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Change the target visibility. Setting the current target again is a no-op.
    pub fn set_shown(&mut self, shown: bool, now: Instant) {
        if shown == self.shown {
            return;
        }
        self.from = self.progress(now);
        self.started_at = now;
        self.shown = shown;
        if shown {
            self.mounted = true;
        }
    }

    /// Advance to `now`, unmounting a hidden screen whose slide-out finished.
    pub fn tick(&mut self, now: Instant) {
        if !self.shown && self.mounted && self.is_finished(now) {
            self.mounted = false;
        }
    }

    /// Current progress in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f32 {
        let target = if self.shown { 1.0 } else { 0.0 };
        if self.duration.is_zero() {
            return target;
        }
        let elapsed = now.saturating_duration_since(self.started_at);
        let t = (elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0);
        self.from + (target - self.from) * t
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) >= self.duration
    }

    /// Horizontal offset for an area `width` cells wide.
    pub fn offset(&self, width: u16, now: Instant) -> u16 {
        let hidden = 1.0 - self.progress(now);
        (hidden * width as f32).round() as u16
    }
}

/// One transition per declared screen, driven by the navigation state.
#[derive(Debug, Clone)]
pub struct ScreenResolver {
    transitions: Vec<(ScreenId, ScreenTransition)>,
    duration: Duration,
}

impl ScreenResolver {
    pub fn new(navigation: &NavigationState, now: Instant, duration: Duration) -> Self {
        let transitions = navigation
            .screens()
            .iter()
            .map(|s| (s.screen, ScreenTransition::new(s.is_pushed, now, duration)))
            .collect();
        Self {
            transitions,
            duration,
        }
    }

    /// Feed each screen's pushed flag into its transition and advance time.
    pub fn sync(&mut self, navigation: &NavigationState, now: Instant) {
        for state in navigation.screens() {
            match self.transitions.iter_mut().find(|(id, _)| *id == state.screen) {
                Some((_, transition)) => transition.set_shown(state.is_pushed, now),
                None => self.transitions.push((
                    state.screen,
                    ScreenTransition::new(state.is_pushed, now, self.duration),
                )),
            }
        }
        for (_, transition) in &mut self.transitions {
            transition.tick(now);
        }
    }

    /// Mounted screens in declaration order (bottom to top).
    pub fn mounted(&self) -> impl Iterator<Item = (ScreenId, &ScreenTransition)> {
        self.transitions
            .iter()
            .filter(|(_, t)| t.is_mounted())
            .map(|(id, t)| (*id, t))
    }

    pub fn is_mounted(&self, screen: ScreenId) -> bool {
        self.transitions
            .iter()
            .any(|(id, t)| *id == screen && t.is_mounted())
    }

    /// Whether any mounted screen is still sliding.
    pub fn is_animating(&self, now: Instant) -> bool {
        self.mounted().any(|(_, t)| !t.is_finished(now))
    }
}
