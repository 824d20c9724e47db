use std::sync::Arc;
use std::time::Duration;

use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tokio::sync::{broadcast, mpsc};

use vp_fanout::{FanOut, FanOutConfig, SnapshotSink};
use vp_relay_interface::{Command, Mode, Settings, StateSnapshot};
use vp_tracker::{Hypothesis, PositionChange, Tracker};

use crate::link::{HostLink, HostLinkEvent, LinkConfig};
use crate::recognizer::{HypothesisSource, RecognizerEvent, RecognizerSupervisor, SupervisorConfig};
use crate::{DisplayEvent, PrompterRuntime, RecognitionError, RecognizerState};

const SPEED_STEP: i32 = 5;
const COUNTDOWN_FROM: u32 = 3;

pub type LocalSubscription = (
    Option<Arc<StateSnapshot>>,
    broadcast::Receiver<Arc<StateSnapshot>>,
);

pub enum PrompterMsg {
    SetScript(String),
    UpdateSettings(Settings),
    Hypothesis(Hypothesis),
    Command(Command),
    Start,
    Stop,
    RecognitionFailed(RecognitionError),
    RecognizerState(RecognizerState),
    Link(HostLinkEvent),
    CountdownTick { epoch: u64 },
    GetSnapshot(RpcReplyPort<StateSnapshot>),
    SubscribeLocal(RpcReplyPort<LocalSubscription>),
}

pub struct PrompterArgs {
    pub runtime: Arc<dyn PrompterRuntime>,
    pub script: String,
    pub settings: Settings,
    pub source: Option<Arc<dyn HypothesisSource>>,
    pub relay: Option<LinkConfig>,
    pub fanout: FanOutConfig,
    pub supervisor: SupervisorConfig,
    pub countdown_step: Duration,
}

impl PrompterArgs {
    pub fn new(runtime: Arc<dyn PrompterRuntime>) -> Self {
        Self {
            runtime,
            script: String::new(),
            settings: Settings::default(),
            source: None,
            relay: None,
            fanout: FanOutConfig::default(),
            supervisor: SupervisorConfig::default(),
            countdown_step: Duration::from_millis(900),
        }
    }

    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_source(mut self, source: Arc<dyn HypothesisSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_relay(mut self, relay: LinkConfig) -> Self {
        self.relay = Some(relay);
        self
    }
}

struct Countdown {
    epoch: u64,
    remaining: u32,
}

pub struct PrompterState {
    runtime: Arc<dyn PrompterRuntime>,
    script: String,
    settings: Settings,
    tracker: Tracker,
    running: bool,
    countdown: Option<Countdown>,
    epoch: u64,
    countdown_step: Duration,
    source: Option<Arc<dyn HypothesisSource>>,
    supervisor_config: SupervisorConfig,
    recognizer: Option<RecognizerSupervisor>,
    fanout: FanOut,
    _host_link: Option<HostLink>,
}

impl PrompterState {
    fn snapshot(&self) -> StateSnapshot {
        StateSnapshot::new(
            self.script.clone(),
            self.tracker.current(),
            self.running,
            &self.settings,
        )
    }

    fn publish(&self) {
        self.fanout.publish(self.snapshot());
    }

    fn flush(&self) {
        self.fanout.flush(self.snapshot());
    }

    fn status(&self, status: &str) {
        tracing::debug!(status = %status, "prompter_status");
        self.runtime.emit_status(status);
    }

    fn apply(&self, change: PositionChange) {
        if change.from != change.to {
            self.runtime.emit_display(change.into());
        }
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
        self.runtime.emit_display(DisplayEvent::Running { running });
    }

    fn listening(&self) -> bool {
        self.recognizer.is_some()
    }
}

/// Owns the script, both cursors and the run state of one prompter.
///
/// Everything that can change what the speaker sees goes through this
/// actor's mailbox: recognizer output, local and remote commands, settings
/// and script edits. Each change publishes a fresh snapshot to the fan-out.
pub struct PrompterActor;

impl PrompterActor {
    pub fn name() -> ractor::ActorName {
        "prompter_actor".into()
    }
}

#[ractor::async_trait]
impl Actor for PrompterActor {
    type Msg = PrompterMsg;
    type State = PrompterState;
    type Arguments = PrompterArgs;

    async fn pre_start(
        &self,
        myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        let (remote_sink, host_link) = match args.relay {
            Some(config) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let sink: Arc<dyn SnapshotSink> = Arc::new(tx);
                (Some(sink), Some((config, rx)))
            }
            None => (None, None),
        };

        let fanout = FanOut::spawn(args.fanout, remote_sink);

        let host_link = host_link.map(|(config, rx)| {
            tracing::info!(url = %config.url, "host_link_starting");
            let actor = myself.clone();
            HostLink::spawn(config, rx, fanout.latest(), move |event| {
                let _ = actor.cast(PrompterMsg::Link(event));
            })
        });

        let state = PrompterState {
            runtime: args.runtime,
            tracker: Tracker::new(&args.script),
            script: args.script,
            settings: args.settings,
            running: false,
            countdown: None,
            epoch: 0,
            countdown_step: args.countdown_step,
            source: args.source,
            supervisor_config: args.supervisor,
            recognizer: None,
            fanout,
            _host_link: host_link,
        };
        state.publish();

        Ok(state)
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            PrompterMsg::SetScript(script) => {
                let change = state.tracker.load(&script);
                state.script = script;
                state.apply(change);
                tracing::info!(words = state.tracker.index().len(), "script_loaded");
                state.flush();
            }
            PrompterMsg::UpdateSettings(settings) => update_settings(&myself, state, settings),
            PrompterMsg::Hypothesis(hypothesis) => {
                if !state.listening() {
                    return Ok(());
                }
                if let Some(change) = state.tracker.process(&hypothesis) {
                    state.apply(change);
                    state.publish();
                }
            }
            PrompterMsg::Command(command) => handle_command(&myself, state, command),
            PrompterMsg::Start => start(&myself, state),
            PrompterMsg::Stop => stop(state),
            PrompterMsg::RecognitionFailed(error) => {
                if error.is_fatal() {
                    state.status("Microphone permission denied.");
                    stop(state);
                } else {
                    state.status(&format!("Voice error: {error}"));
                }
            }
            PrompterMsg::RecognizerState(recognizer) => {
                if state.listening() {
                    state
                        .runtime
                        .emit_display(DisplayEvent::Recognizer { state: recognizer });
                }
            }
            PrompterMsg::Link(HostLinkEvent::Command { command }) => {
                tracing::info!(command = %command, "remote_command");
                handle_command(&myself, state, command);
            }
            PrompterMsg::Link(event) => {
                if let HostLinkEvent::Error { message } = &event {
                    state.status(message);
                }
                state.runtime.emit_link(event);
            }
            PrompterMsg::CountdownTick { epoch } => countdown_tick(&myself, state, epoch),
            PrompterMsg::GetSnapshot(reply) => {
                let _ = reply.send(state.snapshot());
            }
            PrompterMsg::SubscribeLocal(reply) => {
                let _ = reply.send(state.fanout.subscribe_local());
            }
        }
        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        if let Some(recognizer) = state.recognizer.take() {
            recognizer.stop();
        }
        tracing::info!("prompter_stopped");
        Ok(())
    }
}

fn handle_command(myself: &ActorRef<PrompterMsg>, state: &mut PrompterState, command: Command) {
    match command {
        Command::StartStop => {
            if state.running {
                stop(state);
            } else {
                start(myself, state);
            }
            return;
        }
        Command::Reset => {
            let change = state.tracker.position_mut().reset();
            state.apply(change);
            state.status("Reset.");
        }
        Command::PrevWord => {
            let target = state.tracker.current().saturating_sub(1);
            move_to(state, target);
        }
        Command::NextWord => {
            let target = state.tracker.current() + 1;
            move_to(state, target);
        }
        Command::PrevSentence => {
            let target = state.tracker.prev_sentence();
            move_to(state, target);
        }
        Command::NextSentence => {
            let target = state.tracker.next_sentence();
            move_to(state, target);
        }
        Command::Slower | Command::Faster => {
            let delta = if command == Command::Slower {
                -SPEED_STEP
            } else {
                SPEED_STEP
            };
            let speed = state.settings.nudge_speed(delta);
            state.status(&format!("Speed: {speed}"));
        }
    }
    state.flush();
}

fn move_to(state: &mut PrompterState, target: usize) {
    let change = state.tracker.position_mut().set_position(target, true);
    state.apply(change);
}

fn start(myself: &ActorRef<PrompterMsg>, state: &mut PrompterState) {
    if state.running {
        return;
    }
    if state.script.trim().is_empty() {
        state.status("Paste a script first.");
        return;
    }
    if state.settings.mode == Mode::Voice && state.source.is_none() {
        state.status("Voice tracking is not available.");
        return;
    }

    state.set_running(true);
    state.epoch += 1;

    if state.settings.countdown {
        state.countdown = Some(Countdown {
            epoch: state.epoch,
            remaining: COUNTDOWN_FROM,
        });
        state.runtime.emit_display(DisplayEvent::Countdown {
            remaining: COUNTDOWN_FROM,
        });
        schedule_tick(myself, state);
        state.flush();
        return;
    }

    begin(myself, state);
}

fn schedule_tick(myself: &ActorRef<PrompterMsg>, state: &PrompterState) {
    let epoch = state.epoch;
    myself.send_after(state.countdown_step, move || PrompterMsg::CountdownTick {
        epoch,
    });
}

fn countdown_tick(myself: &ActorRef<PrompterMsg>, state: &mut PrompterState, epoch: u64) {
    let Some(countdown) = state.countdown.as_mut().filter(|c| c.epoch == epoch) else {
        return;
    };

    countdown.remaining -= 1;
    let remaining = countdown.remaining;
    state
        .runtime
        .emit_display(DisplayEvent::Countdown { remaining });

    if remaining == 0 {
        state.countdown = None;
        begin(myself, state);
    } else {
        schedule_tick(myself, state);
    }
}

/// Actually start following the speaker, after any countdown.
fn begin(myself: &ActorRef<PrompterMsg>, state: &mut PrompterState) {
    match (state.settings.mode, state.source.clone()) {
        (Mode::Voice, Some(source)) => {
            state.tracker.position_mut().commit_current();

            let actor = myself.clone();
            state.recognizer = Some(RecognizerSupervisor::spawn(
                source,
                state.settings.language.clone(),
                state.supervisor_config.clone(),
                move |event| {
                    let msg = match event {
                        RecognizerEvent::Hypothesis(h) => PrompterMsg::Hypothesis(h),
                        RecognizerEvent::Failed(e) => PrompterMsg::RecognitionFailed(e),
                        RecognizerEvent::State(s) => PrompterMsg::RecognizerState(s),
                    };
                    let _ = actor.cast(msg);
                },
            ));
            tracing::info!(language = %state.settings.language, "voice_tracking_started");
            state.status("Listening...");
        }
        (Mode::Voice, None) => {
            state.set_running(false);
            state.status("Voice tracking is not available.");
        }
        (Mode::Auto, _) => {
            tracing::info!(speed = state.settings.scroll_speed, "auto_scroll_started");
            state.status("Auto-scroll running...");
        }
    }
    state.flush();
}

fn stop(state: &mut PrompterState) {
    if !state.running {
        return;
    }

    state.epoch += 1;
    if state.countdown.take().is_some() {
        state
            .runtime
            .emit_display(DisplayEvent::Countdown { remaining: 0 });
    }
    if let Some(recognizer) = state.recognizer.take() {
        recognizer.stop();
    }

    state.set_running(false);
    state.tracker.position_mut().commit_current();
    tracing::info!(position = state.tracker.current(), "prompter_stopped_running");
    state.status("Stopped.");
    state.flush();
}

fn update_settings(myself: &ActorRef<PrompterMsg>, state: &mut PrompterState, settings: Settings) {
    let mode_changed = settings.mode != state.settings.mode;
    let language_changed = settings.language != state.settings.language;
    let was_running = state.running;

    if was_running && mode_changed {
        stop(state);
        state.settings = settings;
        start(myself, state);
    } else if state.listening() && language_changed {
        // Recognizers take the language at open time.
        state.settings = settings;
        state.recognizer = None;
        begin(myself, state);
    } else {
        state.settings = settings;
    }

    state.flush();
}
