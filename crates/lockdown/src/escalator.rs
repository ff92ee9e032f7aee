//! Attention escalator

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::{LockdownConfig, PlatformEffects};

/// Drives the lockdown effects from an external "check-in due" signal.
///
/// Must be used inside a tokio runtime; activation spawns the repeat timer.
pub struct AttentionEscalator<P: PlatformEffects> {
    platform: Arc<P>,
    config: LockdownConfig,
    active: bool,
    repeat_task: Option<JoinHandle<()>>,
    fullscreen_retry: Option<JoinHandle<()>>,
}

impl<P: PlatformEffects> AttentionEscalator<P> {
    pub fn new(platform: Arc<P>, config: LockdownConfig) -> Self {
        Self {
            platform,
            config,
            active: false,
            repeat_task: None,
            fullscreen_retry: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Any timer still scheduled
    pub fn has_pending_timers(&self) -> bool {
        [&self.repeat_task, &self.fullscreen_retry]
            .into_iter()
            .flatten()
            .any(|task| !task.is_finished())
    }

    /// Follow the outstanding-check-in signal. Repeated values are no-ops.
    pub fn set_active(&mut self, active: bool) {
        if active == self.active {
            return;
        }
        if active {
            self.activate();
        } else {
            self.deactivate();
        }
    }

    /// Platform reports fullscreen was left; re-request after the debounce
    pub fn on_fullscreen_exited(&mut self) {
        if !self.active || !self.platform.capabilities().fullscreen {
            return;
        }
        if let Some(pending) = self.fullscreen_retry.take() {
            pending.abort();
        }

        let platform = Arc::clone(&self.platform);
        let delay = self.config.fullscreen_retry();
        debug!("Fullscreen exited, re-requesting in {:?}", delay);
        self.fullscreen_retry = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !platform.is_fullscreen() {
                platform.request_fullscreen();
            }
        }));
    }

    fn activate(&mut self) {
        self.active = true;
        let caps = self.platform.capabilities();
        info!("Lockdown activated ({:?})", caps);

        if caps.fullscreen && !self.platform.is_fullscreen() {
            self.platform.request_fullscreen();
        }
        if caps.navigation_guard {
            self.platform.set_navigation_guard(true);
        }
        if caps.vibration {
            if !self.config.initial_pattern_ms.is_empty() {
                self.platform.vibrate(&self.config.initial_pattern_ms);
            }
            if !self.config.repeat_pattern_ms.is_empty() {
                self.repeat_task = Some(self.spawn_repeat());
            }
        }
    }

    fn spawn_repeat(&self) -> JoinHandle<()> {
        let platform = Arc::clone(&self.platform);
        let pattern = self.config.repeat_pattern_ms.clone();
        let period = self.config.repeat_interval();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                platform.vibrate(&pattern);
            }
        })
    }

    fn deactivate(&mut self) {
        self.active = false;
        for task in [self.repeat_task.take(), self.fullscreen_retry.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }

        let caps = self.platform.capabilities();
        if caps.vibration {
            self.platform.cancel_vibration();
        }
        if caps.fullscreen && self.platform.is_fullscreen() {
            self.platform.exit_fullscreen();
        }
        if caps.navigation_guard {
            self.platform.set_navigation_guard(false);
        }
        info!("Lockdown deactivated");
    }
}

impl<P: PlatformEffects> Drop for AttentionEscalator<P> {
    fn drop(&mut self) {
        if self.active {
            self.deactivate();
        }
    }
}
