//! Main-player identification (spec §5: "polls window titles every ~10s and
//! calls `set_main_player` on match"). The window-title heuristic itself is
//! platform-specific and out of scope; this is the documented extension
//! point a real detector plugs into.

/// Detects the local player's nickname from some external signal (a window
/// title scan, a UI hook, ...). Polled by the main-player thread at a fixed
/// cadence.
pub trait MainPlayerDetector: Send {
    fn detect(&mut self) -> Option<String>;
}

/// Never resolves a main player. A real implementation would scan the
/// foreground window title the way the original's `WindowTitleDetector`
/// does; that scan is OS-specific (Win32 `GetForegroundWindow` in the
/// source this was ported from) and has no portable Rust equivalent here.
pub struct NullMainPlayerDetector;

impl MainPlayerDetector for NullMainPlayerDetector {
    fn detect(&mut self) -> Option<String> {
        None
    }
}
