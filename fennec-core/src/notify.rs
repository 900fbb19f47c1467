//! Desktop notification pipeline
//!
//! Threshold-gated, debounced, foreground-aware. Turns shorter than the
//! threshold never notify; queued snippets within the debounce window
//! replace each other so at most one delivery leaves per window; when the
//! terminal is the frontmost application delivery is suppressed entirely.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Maximum notification snippet length in characters.
pub const MAX_SNIPPET_CHARS: usize = 80;

/// Snippet used when the queued message is empty.
pub const EMPTY_SNIPPET: &str = "Response complete";

/// Delivery backend contract: best effort, bounded latency, never raises.
pub trait NotifyBackend: Send + Sync {
    fn is_available(&self) -> bool;
    fn send(&self, title: &str, message: &str, sound: Option<&str>);
}

/// Detects whether the terminal application is currently frontmost.
pub trait ForegroundProbe: Send + Sync {
    fn terminal_is_foreground(&self) -> bool;
}

/// Probe that never reports foreground (never suppresses).
#[derive(Debug, Default)]
pub struct NeverForeground;

impl ForegroundProbe for NeverForeground {
    fn terminal_is_foreground(&self) -> bool {
        false
    }
}

/// Notifier configuration resolved from the `[notifications]` section.
#[derive(Debug, Clone)]
pub struct NotifierOptions {
    pub enabled: bool,
    pub sound: Option<String>,
    pub threshold: Duration,
    pub debounce: Duration,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            sound: Some("default".to_string()),
            threshold: Duration::from_secs(60),
            debounce: Duration::from_secs_f64(5.0),
        }
    }
}

#[derive(Debug, Default)]
struct NotifierState {
    enabled: bool,
    turn_start: Option<Instant>,
    pending: Option<String>,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Debounced, threshold-gated notification dispatcher.
pub struct Notifier {
    title: String,
    sound: Option<String>,
    threshold: Duration,
    debounce: Duration,
    backend: Option<Arc<dyn NotifyBackend>>,
    probe: Arc<dyn ForegroundProbe>,
    state: Mutex<NotifierState>,
}

impl Notifier {
    pub fn new(
        title: impl Into<String>,
        options: NotifierOptions,
        backend: Option<Arc<dyn NotifyBackend>>,
        probe: Arc<dyn ForegroundProbe>,
    ) -> Self {
        Self {
            title: title.into(),
            sound: options.sound,
            threshold: options.threshold,
            debounce: options.debounce,
            backend,
            probe,
            state: Mutex::new(NotifierState {
                enabled: options.enabled,
                ..NotifierState::default()
            }),
        }
    }

    /// Record the start of an agent turn. Queue decisions measure elapsed
    /// time from this point.
    pub fn mark_turn_start(&self) {
        self.state.lock().turn_start = Some(Instant::now());
    }

    /// Toggle delivery at runtime without touching configuration storage.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.lock().enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.state.lock().enabled
    }

    /// Queue a snippet for delivery after the debounce window.
    ///
    /// A subsequent queue within the window replaces the pending snippet and
    /// restarts the timer.
    pub fn queue(self: &Arc<Self>, message: &str) {
        let mut state = self.state.lock();
        if !state.enabled {
            return;
        }
        let Some(backend) = &self.backend else {
            return;
        };
        if !backend.is_available() {
            return;
        }
        let elapsed = state
            .turn_start
            .map(|start| start.elapsed())
            .unwrap_or(Duration::ZERO);
        if elapsed < self.threshold {
            return;
        }

        state.pending = Some(truncate_snippet(message));
        state.generation += 1;
        let generation = state.generation;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }

        let notifier = Arc::clone(self);
        let debounce = self.debounce;
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            notifier.fire(generation);
        }));
    }

    /// Cancel the debounce timer and deliver the pending snippet now.
    pub fn flush(self: &Arc<Self>) {
        let pending = {
            let mut state = self.state.lock();
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            state.generation += 1;
            state.pending.take()
        };
        if let Some(message) = pending {
            self.deliver(message);
        }
    }

    /// Timer expiry path.
    fn fire(self: &Arc<Self>, generation: u64) {
        let pending = {
            let mut state = self.state.lock();
            if state.generation != generation {
                return;
            }
            state.timer = None;
            state.pending.take()
        };
        if let Some(message) = pending {
            self.deliver(message);
        }
    }

    /// Hand delivery to a worker so the cooperative loop never blocks,
    /// not even on the foreground probe. Suppressed when the terminal is
    /// frontmost.
    fn deliver(self: &Arc<Self>, message: String) {
        let Some(backend) = self.backend.clone() else {
            return;
        };
        let probe = Arc::clone(&self.probe);
        let title = self.title.clone();
        let sound = self.sound.clone();
        tokio::spawn(async move {
            if probe.terminal_is_foreground() {
                return;
            }
            backend.send(&title, &message, sound.as_deref());
        });
    }
}

fn truncate_snippet(message: &str) -> String {
    if message.is_empty() {
        return EMPTY_SNIPPET.to_string();
    }
    message.chars().take(MAX_SNIPPET_CHARS).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Default)]
    struct RecordingBackend {
        sent: Mutex<Vec<String>>,
        unavailable: AtomicBool,
    }

    impl NotifyBackend for RecordingBackend {
        fn is_available(&self) -> bool {
            !self.unavailable.load(Ordering::SeqCst)
        }

        fn send(&self, _title: &str, message: &str, _sound: Option<&str>) {
            self.sent.lock().push(message.to_string());
        }
    }

    struct AlwaysForeground;

    impl ForegroundProbe for AlwaysForeground {
        fn terminal_is_foreground(&self) -> bool {
            true
        }
    }

    fn notifier_with(
        threshold: Duration,
        backend: Arc<RecordingBackend>,
        probe: Arc<dyn ForegroundProbe>,
    ) -> Arc<Notifier> {
        Arc::new(Notifier::new(
            "fennec",
            NotifierOptions {
                enabled: true,
                sound: None,
                threshold,
                debounce: Duration::from_secs(5),
            },
            Some(backend),
            probe,
        ))
    }

    async fn settle() {
        // Let spawned delivery tasks run.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_gates_delivery() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = notifier_with(
            Duration::from_secs(60),
            backend.clone(),
            Arc::new(NeverForeground),
        );

        notifier.mark_turn_start();
        tokio::time::advance(Duration::from_secs(10)).await;
        notifier.queue("too early");
        notifier.flush();
        settle().await;

        assert!(backend.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_last_message() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = notifier_with(
            Duration::ZERO,
            backend.clone(),
            Arc::new(NeverForeground),
        );

        notifier.mark_turn_start();
        notifier.queue("A");
        tokio::time::advance(Duration::from_secs(2)).await;
        notifier.queue("B");
        tokio::time::advance(Duration::from_secs(1)).await;
        notifier.flush();
        settle().await;

        assert_eq!(*backend.sent.lock(), vec!["B".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_timer_fires_without_flush() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = notifier_with(
            Duration::ZERO,
            backend.clone(),
            Arc::new(NeverForeground),
        );

        notifier.mark_turn_start();
        notifier.queue("A");
        tokio::time::advance(Duration::from_secs(2)).await;
        notifier.queue("B");
        // Delivery at t = 2 + 5 carries the replacement snippet.
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert_eq!(*backend.sent.lock(), vec!["B".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreground_suppression() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = notifier_with(Duration::ZERO, backend.clone(), Arc::new(AlwaysForeground));

        notifier.mark_turn_start();
        notifier.queue("hidden");
        notifier.flush();
        settle().await;

        assert!(backend.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_and_unavailable_bail() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = notifier_with(
            Duration::ZERO,
            backend.clone(),
            Arc::new(NeverForeground),
        );

        notifier.set_enabled(false);
        notifier.mark_turn_start();
        notifier.queue("while disabled");
        notifier.flush();

        notifier.set_enabled(true);
        backend.unavailable.store(true, Ordering::SeqCst);
        notifier.queue("while unavailable");
        notifier.flush();
        settle().await;

        assert!(backend.sent.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_snippet_truncation_and_empty_default() {
        let backend = Arc::new(RecordingBackend::default());
        let notifier = notifier_with(
            Duration::ZERO,
            backend.clone(),
            Arc::new(NeverForeground),
        );

        notifier.mark_turn_start();
        let long = "x".repeat(200);
        notifier.queue(&long);
        notifier.flush();
        notifier.queue("");
        notifier.flush();
        settle().await;

        let sent = backend.sent.lock();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].chars().count(), MAX_SNIPPET_CHARS);
        assert_eq!(sent[1], EMPTY_SNIPPET);
    }
}
