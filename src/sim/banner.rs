//! The single on-screen status message

use std::fmt;

use serde::{Deserialize, Serialize};

use super::modifiers::ModifierKind;
use super::state::TimerEvent;
use super::timer::{TimerId, TimerQueue};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BannerText {
    Modifier(ModifierKind),
    /// Remaining charges
    Immunity(u32),
}

impl fmt::Display for BannerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BannerText::Modifier(kind) => f.write_str(kind.label()),
            BannerText::Immunity(charges) => write!(f, "IMMUNITY x{charges}"),
        }
    }
}

/// Banner state. Transient messages schedule their own hide timer.
#[derive(Debug, Clone, Default)]
pub struct Banner {
    text: Option<BannerText>,
    visible: bool,
    persistent: bool,
    hide_timer: Option<TimerId>,
}

impl Banner {
    pub fn text(&self) -> Option<BannerText> {
        self.text
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Show `text`. Non-persistent messages hide after `duration` seconds.
    ///
    /// Any earlier hide timer is cancelled, so re-showing the same text
    /// restarts its lifetime instead of racing the old timer.
    pub fn show(
        &mut self,
        text: BannerText,
        persistent: bool,
        duration: f32,
        timers: &mut TimerQueue<TimerEvent>,
    ) {
        if let Some(old) = self.hide_timer.take() {
            timers.cancel(old);
        }
        self.text = Some(text);
        self.visible = true;
        self.persistent = persistent;
        if !persistent {
            let hide = TimerEvent::HideBanner(text);
            self.hide_timer = Some(timers.schedule_once(duration as f64, hide));
        }
    }

    /// Clear the banner immediately
    pub fn hide(&mut self, timers: &mut TimerQueue<TimerEvent>) {
        if let Some(old) = self.hide_timer.take() {
            timers.cancel(old);
        }
        self.text = None;
        self.visible = false;
        self.persistent = false;
    }

    /// Hide timer fired: only hide if `text` is still what is displayed
    pub fn expire(&mut self, text: BannerText) {
        self.hide_timer = None;
        if self.text == Some(text) && !self.persistent {
            self.visible = false;
        }
    }

    /// Forget timer handles after the queue was invalidated
    pub(super) fn detach_timers(&mut self) {
        self.hide_timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fire_due(banner: &mut Banner, timers: &mut TimerQueue<TimerEvent>) -> usize {
        let mut fired = 0;
        while let Some(due) = timers.pop_due() {
            if let TimerEvent::HideBanner(text) = due.payload {
                banner.expire(text);
                fired += 1;
            }
        }
        fired
    }

    #[test]
    fn test_transient_hides_after_duration() {
        let mut timers = TimerQueue::new();
        let mut banner = Banner::default();
        let text = BannerText::Modifier(ModifierKind::HalfSpeed);
        banner.show(text, false, 2.0, &mut timers);
        let shown = banner.text().map(|t| t.to_string());
        assert_eq!(shown.as_deref(), Some("HALF SPEED!"));

        timers.advance_to(1.9);
        assert_eq!(fire_due(&mut banner, &mut timers), 0);
        assert!(banner.is_visible());

        timers.advance_to(2.0);
        assert_eq!(fire_due(&mut banner, &mut timers), 1);
        assert!(!banner.is_visible());
    }

    #[test]
    fn test_reshow_same_text_restarts_lifetime() {
        let mut timers = TimerQueue::new();
        let mut banner = Banner::default();
        let text = BannerText::Modifier(ModifierKind::DoubleScore);
        banner.show(text, false, 2.0, &mut timers);
        timers.advance_to(1.5);
        banner.show(text, false, 2.0, &mut timers);
        assert_eq!(timers.len(), 1);

        timers.advance_to(2.0);
        fire_due(&mut banner, &mut timers);
        assert!(banner.is_visible(), "old timer hid the re-shown text");

        timers.advance_to(3.5);
        fire_due(&mut banner, &mut timers);
        assert!(!banner.is_visible());
    }

    #[test]
    fn test_stale_text_is_not_hidden() {
        let mut banner = Banner::default();
        let mut timers = TimerQueue::new();
        let text = BannerText::Modifier(ModifierKind::TripleScore);
        banner.show(text, false, 2.0, &mut timers);
        banner.expire(BannerText::Modifier(ModifierKind::HalfSpeed));
        assert!(banner.is_visible());
    }

    #[test]
    fn test_persistent_never_schedules_hide() {
        let mut timers = TimerQueue::new();
        let mut banner = Banner::default();
        let text = BannerText::Modifier(ModifierKind::HalfSpeed);
        banner.show(text, false, 2.0, &mut timers);
        banner.show(BannerText::Immunity(2), true, 2.0, &mut timers);
        assert!(timers.is_empty());
        assert_eq!(banner.text().unwrap().to_string(), "IMMUNITY x2");
        banner.expire(BannerText::Immunity(2));
        assert!(banner.is_visible());
    }

    #[test]
    fn test_hide_clears_text() {
        let mut timers = TimerQueue::new();
        let mut banner = Banner::default();
        let text = BannerText::Modifier(ModifierKind::SpawnLasers);
        banner.show(text, false, 2.0, &mut timers);
        banner.hide(&mut timers);
        assert!(!banner.is_visible());
        assert_eq!(banner.text(), None);
        assert!(timers.is_empty());
    }
}
