//! Live location tracking as an explicit state machine.
//!
//! The caller feeds position fixes in; [`step`] returns the next state and
//! what to show. No I/O happens here.

use log::{debug, info};
use serde::Serialize;

use crate::map::Coordinates;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TrackerState {
    pub tracking: bool,
    pub location: Option<Coordinates>,
    pub prev_location: Option<Coordinates>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    Start,
    Stop,
    /// A position report; `None` when the device has no fix yet.
    Fix(Option<Coordinates>),
}

/// What the tracker should display after a step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum TrackerView {
    Idle,
    Fetching,
    Live { location: Coordinates, moved: bool },
    Stopped { last: Option<Coordinates> },
}

/// Advances the tracker by one event.
pub fn step(state: &TrackerState, event: TrackerEvent) -> (TrackerState, TrackerView) {
    let mut next = *state;
    let view = match event {
        TrackerEvent::Start => {
            next.tracking = true;
            match next.location {
                Some(location) => TrackerView::Live { location, moved: false },
                None => TrackerView::Fetching,
            }
        }
        TrackerEvent::Stop => {
            next.tracking = false;
            TrackerView::Stopped { last: next.location }
        }
        TrackerEvent::Fix(_) if !state.tracking => {
            debug!("Ignoring position fix while tracking is stopped");
            match state.location {
                Some(_) => TrackerView::Stopped { last: state.location },
                None => TrackerView::Idle,
            }
        }
        TrackerEvent::Fix(None) => TrackerView::Fetching,
        TrackerEvent::Fix(Some(location)) => {
            let moved = state.prev_location != Some(location);
            if moved {
                info!("Location updated to ({:.6}, {:.6})", location.lat, location.lon);
                next.prev_location = Some(location);
            }
            next.location = Some(location);
            TrackerView::Live { location, moved }
        }
    };
    (next, view)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARADISE: Coordinates = Coordinates { lat: 39.7596, lon: -121.6219 };
    const CHICO: Coordinates = Coordinates { lat: 39.7285, lon: -121.8375 };

    #[test]
    fn test_fixes_ignored_until_started() {
        let (state, view) = step(&TrackerState::default(), TrackerEvent::Fix(Some(PARADISE)));
        assert_eq!(view, TrackerView::Idle);
        assert_eq!(state, TrackerState::default());
    }

    #[test]
    fn test_tracking_session() {
        let (state, view) = step(&TrackerState::default(), TrackerEvent::Start);
        assert!(state.tracking);
        assert_eq!(view, TrackerView::Fetching);

        let (state, view) = step(&state, TrackerEvent::Fix(None));
        assert_eq!(view, TrackerView::Fetching);

        let (state, view) = step(&state, TrackerEvent::Fix(Some(PARADISE)));
        assert_eq!(view, TrackerView::Live { location: PARADISE, moved: true });

        let (state, view) = step(&state, TrackerEvent::Fix(Some(PARADISE)));
        assert_eq!(view, TrackerView::Live { location: PARADISE, moved: false });

        let (state, view) = step(&state, TrackerEvent::Fix(Some(CHICO)));
        assert_eq!(view, TrackerView::Live { location: CHICO, moved: true });
        assert_eq!(state.prev_location, Some(CHICO));

        let (state, view) = step(&state, TrackerEvent::Stop);
        assert!(!state.tracking);
        assert_eq!(view, TrackerView::Stopped { last: Some(CHICO) });

        let (_, view) = step(&state, TrackerEvent::Fix(Some(PARADISE)));
        assert_eq!(view, TrackerView::Stopped { last: Some(CHICO) });
    }

    #[test]
    fn test_restart_resumes_last_location() {
        let state = TrackerState {
            tracking: false,
            location: Some(PARADISE),
            prev_location: Some(PARADISE),
        };
        let (state, view) = step(&state, TrackerEvent::Start);
        assert!(state.tracking);
        assert_eq!(view, TrackerView::Live { location: PARADISE, moved: false });
    }
}
