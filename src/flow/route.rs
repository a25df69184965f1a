//! Screens and the transitions allowed between them

use crate::audio::SelectedAudio;
use crate::upload::DetectionResult;
use std::fmt;

/// Screen kinds, without payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    /// Pick a file or choose a tool
    Home,
    /// Microphone capture
    Recording,
    /// Preview a clip before sending it
    Playback,
    /// Rendered server answer
    Result,
    /// Watermark add / detect / protect
    Watermark,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Screen::Home => "home",
            Screen::Recording => "recording",
            Screen::Playback => "playback",
            Screen::Result => "result",
            Screen::Watermark => "watermark",
        };
        f.write_str(name)
    }
}

/// A screen together with the data it was opened with
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Home,
    Recording,
    Playback(SelectedAudio),
    Result(DetectionResult),
    Watermark,
}

impl Route {
    pub fn screen(&self) -> Screen {
        match self {
            Route::Home => Screen::Home,
            Route::Recording => Screen::Recording,
            Route::Playback(_) => Screen::Playback,
            Route::Result(_) => Screen::Result,
            Route::Watermark => Screen::Watermark,
        }
    }

    pub fn audio(&self) -> Option<&SelectedAudio> {
        match self {
            Route::Playback(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&DetectionResult> {
        match self {
            Route::Result(result) => Some(result),
            _ => None,
        }
    }
}

/// Forward edges of the screen graph. Going back is handled by the stack.
pub fn can_transition(from: Screen, to: Screen) -> bool {
    use Screen::*;

    matches!(
        (from, to),
        (Home, Recording)
            | (Home, Playback)
            | (Home, Watermark)
            | (Recording, Playback)
            | (Recording, Result)
            | (Playback, Result)
            | (Watermark, Result)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_is_a_dead_end() {
        for to in [Screen::Home, Screen::Recording, Screen::Playback, Screen::Watermark, Screen::Result] {
            assert!(!can_transition(Screen::Result, to), "result -> {}", to);
        }
    }

    #[test]
    fn test_home_cannot_jump_to_result() {
        assert!(!can_transition(Screen::Home, Screen::Result));
        assert!(can_transition(Screen::Playback, Screen::Result));
        assert!(can_transition(Screen::Recording, Screen::Playback));
    }
}
