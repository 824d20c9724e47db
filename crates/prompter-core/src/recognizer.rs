use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_util::sync::CancellationToken;

use vp_tracker::Hypothesis;

use crate::RecognitionError;

pub type RecognitionResult = Result<Hypothesis, RecognitionError>;

/// A streaming speech recognizer.
///
/// Each call to `open` starts one recognition run. Providers end runs on
/// their own (idle timeouts, network hiccups); the supervisor reopens them.
pub trait HypothesisSource: Send + Sync + 'static {
    fn open(&self, language: &str) -> BoxStream<'static, RecognitionResult>;
}

/// Fans one producer out to every open run. Used by hosts whose hypotheses
/// come from somewhere other than an audio pipeline.
#[derive(Clone)]
pub struct BroadcastSource {
    tx: broadcast::Sender<RecognitionResult>,
}

impl BroadcastSource {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns `false` when no run is currently open.
    pub fn push(&self, item: RecognitionResult) -> bool {
        self.tx.send(item).is_ok()
    }
}

impl HypothesisSource for BroadcastSource {
    fn open(&self, _language: &str) -> BoxStream<'static, RecognitionResult> {
        BroadcastStream::new(self.tx.subscribe())
            .filter_map(|item| async move {
                match item {
                    Ok(item) => Some(item),
                    Err(BroadcastStreamRecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "hypotheses_dropped");
                        None
                    }
                }
            })
            .boxed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecognizerState {
    Listening,
    Idle,
    Restarting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognizerEvent {
    Hypothesis(Hypothesis),
    Failed(RecognitionError),
    State(RecognizerState),
}

#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    pub restart_backoff: Duration,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_backoff: Duration::from_millis(250),
        }
    }
}

/// Keeps one recognition run open for as long as the prompter is listening.
///
/// When a run ends on its own the supervisor waits `restart_backoff` and
/// opens a new one. A fatal error ends supervision. Stopping, or dropping
/// the handle, cancels the open run and any pending restart.
pub struct RecognizerSupervisor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl RecognizerSupervisor {
    pub fn spawn(
        source: Arc<dyn HypothesisSource>,
        language: impl Into<String>,
        config: SupervisorConfig,
        on_event: impl Fn(RecognizerEvent) + Send + Sync + 'static,
    ) -> Self {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(supervise(
            source,
            language.into(),
            config,
            on_event,
            cancel.clone(),
        ));
        Self { cancel, handle }
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for RecognizerSupervisor {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn supervise(
    source: Arc<dyn HypothesisSource>,
    language: String,
    config: SupervisorConfig,
    on_event: impl Fn(RecognizerEvent),
    cancel: CancellationToken,
) {
    let mut runs = 0u64;

    loop {
        runs += 1;
        tracing::debug!(language = %language, run = runs, "recognizer_listening");
        on_event(RecognizerEvent::State(RecognizerState::Listening));

        let mut stream = source.open(&language);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                item = stream.next() => match item {
                    Some(Ok(hypothesis)) => on_event(RecognizerEvent::Hypothesis(hypothesis)),
                    Some(Err(error)) => {
                        let fatal = error.is_fatal();
                        tracing::warn!(error = %error, fatal, "recognizer_error");
                        on_event(RecognizerEvent::Failed(error));
                        if fatal {
                            return;
                        }
                    }
                    None => break,
                },
            }
        }
        drop(stream);

        on_event(RecognizerEvent::State(RecognizerState::Idle));
        on_event(RecognizerEvent::State(RecognizerState::Restarting));
        tracing::debug!(run = runs, backoff_ms = config.restart_backoff.as_millis() as u64, "recognizer_restarting");

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(config.restart_backoff) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::mpsc;

    /// Replays one scripted run per `open`, then hangs.
    struct ScriptedSource {
        runs: Mutex<VecDeque<Vec<RecognitionResult>>>,
        opens: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(runs: Vec<Vec<RecognitionResult>>) -> Arc<Self> {
            Arc::new(Self {
                runs: Mutex::new(runs.into()),
                opens: AtomicUsize::new(0),
            })
        }

        fn opens(&self) -> usize {
            self.opens.load(Ordering::SeqCst)
        }
    }

    impl HypothesisSource for ScriptedSource {
        fn open(&self, _language: &str) -> BoxStream<'static, RecognitionResult> {
            self.opens.fetch_add(1, Ordering::SeqCst);
            match self.runs.lock().unwrap().pop_front() {
                Some(items) => futures_util::stream::iter(items).boxed(),
                None => futures_util::stream::pending().boxed(),
            }
        }
    }

    fn spawn(
        source: Arc<ScriptedSource>,
    ) -> (RecognizerSupervisor, mpsc::UnboundedReceiver<RecognizerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let supervisor = RecognizerSupervisor::spawn(
            source,
            "en-US",
            SupervisorConfig::default(),
            move |event| {
                let _ = tx.send(event);
            },
        );
        (supervisor, rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RecognizerEvent>) -> Vec<RecognizerEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn forwards_hypotheses_and_restarts_after_backoff() {
        let source = ScriptedSource::new(vec![vec![
            Ok(Hypothesis::new("hello", false)),
            Ok(Hypothesis::new("hello world", true)),
        ]]);
        let (_supervisor, mut rx) = spawn(source.clone());

        tokio::time::sleep(Duration::from_millis(249)).await;
        assert_eq!(source.opens(), 1);
        assert_eq!(
            drain(&mut rx),
            vec![
                RecognizerEvent::State(RecognizerState::Listening),
                RecognizerEvent::Hypothesis(Hypothesis::new("hello", false)),
                RecognizerEvent::Hypothesis(Hypothesis::new("hello world", true)),
                RecognizerEvent::State(RecognizerState::Idle),
                RecognizerEvent::State(RecognizerState::Restarting),
            ]
        );

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(source.opens(), 2);
        assert_eq!(
            drain(&mut rx),
            vec![RecognizerEvent::State(RecognizerState::Listening)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_backoff_cancels_restart() {
        let source = ScriptedSource::new(vec![vec![]]);
        let (supervisor, _rx) = spawn(source.clone());

        tokio::time::sleep(Duration::from_millis(100)).await;
        supervisor.stop();
        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(source.opens(), 1);
        assert!(supervisor.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn permission_denied_ends_supervision() {
        let source = ScriptedSource::new(vec![vec![Err(RecognitionError::PermissionDenied)]]);
        let (supervisor, mut rx) = spawn(source.clone());

        tokio::time::sleep(Duration::from_millis(1000)).await;

        assert_eq!(source.opens(), 1);
        assert!(supervisor.is_finished());
        assert!(drain(&mut rx).contains(&RecognizerEvent::Failed(RecognitionError::PermissionDenied)));
    }

    #[tokio::test(start_paused = true)]
    async fn provider_errors_keep_the_run_alive() {
        let source = ScriptedSource::new(vec![vec![
            Err(RecognitionError::Provider("network".into())),
            Ok(Hypothesis::new("still here", true)),
        ]]);
        let (_supervisor, mut rx) = spawn(source.clone());

        tokio::time::sleep(Duration::from_millis(10)).await;

        let events = drain(&mut rx);
        assert_eq!(
            events[1],
            RecognizerEvent::Failed(RecognitionError::Provider("network".into()))
        );
        assert_eq!(
            events[2],
            RecognizerEvent::Hypothesis(Hypothesis::new("still here", true))
        );
    }

    #[tokio::test]
    async fn broadcast_source_feeds_open_runs() {
        let source = BroadcastSource::new(8);
        assert!(!source.push(Ok(Hypothesis::new("lost", true))));

        let mut run = source.open("en-US");
        assert!(source.push(Ok(Hypothesis::new("kept", true))));
        assert_eq!(
            run.next().await,
            Some(Ok(Hypothesis::new("kept", true)))
        );
    }
}
