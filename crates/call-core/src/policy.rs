//! UI placement policy
//!
//! Decides, for every call state transition, whether to present a
//! full-screen native call UI or the lightweight floating overlay. The
//! decision depends on the call state and the (best-effort) foreground-app
//! context; it is recomputed on every transition and never cached.
//!
//! Rules, in order:
//!
//! 1. Ringing always gets the native incoming screen, for interruption
//!    visibility.
//! 2. An outgoing call placed while this app was foregrounded gets the
//!    native active screen.
//! 3. Without overlay permission, native is the forced fallback.
//! 4. With the user in some other (non-launcher, non-system) app, the
//!    overlay is used.
//! 5. Otherwise native, with the screen kind appropriate for the state.
//!
//! Foreground detection is heuristic; an unknown foreground app falls
//! through to rule 5's native fallback.

use serde::{Deserialize, Serialize};

/// Call state as seen by the UI layer (the raw per-handle states the
/// placement decision switches on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiCallState {
    /// Incoming call ringing.
    Ringing,
    /// Outgoing call being placed.
    Dialing,
    /// Outgoing call connecting.
    Connecting,
    /// Call connected.
    Connected,
    /// Call on hold.
    Holding,
}

/// Which native screen to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScreenKind {
    /// Full-screen incoming call UI.
    Incoming,
    /// Full-screen in-call UI.
    Active,
    /// Full-screen outgoing/dialing UI.
    Outgoing,
}

/// Presentation selected for the current transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiDecision {
    /// Launch a full-screen native call UI.
    NativeScreen(ScreenKind),
    /// Show the floating overlay widget.
    Overlay,
    /// Present nothing for this transition.
    None,
}

/// Best-effort foreground context supplied by the platform probe.
///
/// `foreground_app` is `None` when detection failed; the policy then
/// defaults to native.
#[derive(Debug, Clone, Default)]
pub struct ForegroundContext {
    /// Whether this app is currently foregrounded.
    pub app_in_foreground: bool,
    /// Package/bundle identifier of the current foreground app, if known.
    pub foreground_app: Option<String>,
    /// Whether the foreground app is a system app or a launcher.
    pub foreground_is_system_or_launcher: bool,
    /// Whether the draw-over-other-apps permission is granted.
    pub overlay_permission_granted: bool,
}

/// The native screen kind appropriate for a call state.
pub fn screen_for(state: UiCallState) -> ScreenKind {
    match state {
        UiCallState::Ringing => ScreenKind::Incoming,
        UiCallState::Dialing | UiCallState::Connecting => ScreenKind::Outgoing,
        UiCallState::Connected | UiCallState::Holding => ScreenKind::Active,
    }
}

/// Select the presentation for a call state transition.
pub fn decide(state: UiCallState, ctx: &ForegroundContext) -> UiDecision {
    // Rule 1: incoming calls always get the full-screen treatment.
    if state == UiCallState::Ringing {
        return UiDecision::NativeScreen(ScreenKind::Incoming);
    }

    // Rule 2: outgoing call placed from our own foregrounded app.
    if matches!(state, UiCallState::Dialing | UiCallState::Connecting) && ctx.app_in_foreground {
        return UiDecision::NativeScreen(ScreenKind::Active);
    }

    // Rule 3: native is the forced fallback without overlay permission.
    if !ctx.overlay_permission_granted {
        return UiDecision::NativeScreen(screen_for(state));
    }

    // Rule 4: user is in some other app - float the overlay over it.
    if ctx.foreground_app.is_some()
        && !ctx.app_in_foreground
        && !ctx.foreground_is_system_or_launcher
    {
        return UiDecision::Overlay;
    }

    // Rule 5: home context, our own app, or undeterminable foreground.
    UiDecision::NativeScreen(screen_for(state))
}

/// Heuristic launcher detection by package name.
///
/// Mirrors the vendor launcher list the shipped dialer matches against;
/// a probe can use this to populate
/// [`ForegroundContext::foreground_is_system_or_launcher`].
pub fn is_launcher_package(package: &str) -> bool {
    const KNOWN_LAUNCHERS: &[&str] = &[
        "com.android.launcher3",
        "com.google.android.launcher",
        "com.samsung.android.app.launcher",
        "com.miui.home",
        "com.huawei.android.launcher",
        "com.oppo.launcher",
    ];
    package.contains("launcher") || package.contains("home") || KNOWN_LAUNCHERS.contains(&package)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(in_fg: bool, fg_app: Option<&str>, sys_or_launcher: bool, overlay: bool) -> ForegroundContext {
        ForegroundContext {
            app_in_foreground: in_fg,
            foreground_app: fg_app.map(str::to_string),
            foreground_is_system_or_launcher: sys_or_launcher,
            overlay_permission_granted: overlay,
        }
    }

    #[test]
    fn ringing_always_native_incoming() {
        // Regardless of every other input.
        for in_fg in [true, false] {
            for overlay in [true, false] {
                let decision = decide(
                    UiCallState::Ringing,
                    &ctx(in_fg, Some("com.example.other"), false, overlay),
                );
                assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Incoming));
            }
        }
    }

    #[test]
    fn dialing_from_foreground_app_is_native_active() {
        let decision = decide(UiCallState::Dialing, &ctx(true, None, false, true));
        assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Active));

        let decision = decide(UiCallState::Connecting, &ctx(true, None, false, false));
        assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Active));
    }

    #[test]
    fn missing_overlay_permission_forces_native() {
        let decision = decide(
            UiCallState::Connected,
            &ctx(false, Some("com.example.game"), false, false),
        );
        assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Active));
    }

    #[test]
    fn other_app_foreground_uses_overlay() {
        let decision = decide(
            UiCallState::Connected,
            &ctx(false, Some("com.example.game"), false, true),
        );
        assert_eq!(decision, UiDecision::Overlay);

        let decision = decide(
            UiCallState::Dialing,
            &ctx(false, Some("com.example.game"), false, true),
        );
        assert_eq!(decision, UiDecision::Overlay);
    }

    #[test]
    fn launcher_foreground_stays_native() {
        let decision = decide(
            UiCallState::Connected,
            &ctx(false, Some("com.miui.home"), true, true),
        );
        assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Active));
    }

    #[test]
    fn unknown_foreground_defaults_to_native() {
        let decision = decide(UiCallState::Connected, &ctx(false, None, false, true));
        assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Active));

        let decision = decide(UiCallState::Holding, &ctx(false, None, false, true));
        assert_eq!(decision, UiDecision::NativeScreen(ScreenKind::Active));
    }

    #[test]
    fn screen_kinds_track_state() {
        assert_eq!(screen_for(UiCallState::Ringing), ScreenKind::Incoming);
        assert_eq!(screen_for(UiCallState::Dialing), ScreenKind::Outgoing);
        assert_eq!(screen_for(UiCallState::Holding), ScreenKind::Active);
    }

    #[test]
    fn launcher_heuristics() {
        assert!(is_launcher_package("com.miui.home"));
        assert!(is_launcher_package("org.oddball.launcher"));
        assert!(!is_launcher_package("com.example.game"));
    }
}
