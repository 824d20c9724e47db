use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use ractor::{Actor, ActorRef};
use tokio::task::JoinHandle;

use prompter_core::{
    DisplayEvent, HostLinkEvent, LinkConfig, PrompterActor, PrompterArgs, PrompterMsg,
    PrompterRuntime, RemoteController, RemoteEvent, current_snapshot,
};
use vp_relay_interface::{Command, SessionId};

const TIMEOUT: Duration = Duration::from_secs(3);

async fn start_relay() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = vp_relay::router(vp_relay::RelayConfig::default());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

struct ChannelRuntime {
    link: mpsc::UnboundedSender<HostLinkEvent>,
}

impl PrompterRuntime for ChannelRuntime {
    fn emit_display(&self, _event: DisplayEvent) {}

    fn emit_status(&self, _status: &str) {}

    fn emit_link(&self, event: HostLinkEvent) {
        let _ = self.link.send(event);
    }
}

async fn spawn(args: PrompterArgs) -> (ActorRef<PrompterMsg>, JoinHandle<()>) {
    Actor::spawn(None, PrompterActor, args).await.unwrap()
}

async fn wait_for<T, R>(
    rx: &mut mpsc::UnboundedReceiver<T>,
    mut pick: impl FnMut(T) -> Option<R>,
) -> R {
    tokio::time::timeout(TIMEOUT, async {
        loop {
            let item = rx.recv().await.expect("channel closed");
            if let Some(found) = pick(item) {
                return found;
            }
        }
    })
    .await
    .expect("timed out")
}

#[tokio::test]
async fn remote_drives_prompter_through_relay() {
    let addr = start_relay().await;
    let url = format!("ws://{addr}/ws");

    let (link_tx, mut link_rx) = mpsc::unbounded_channel();
    let args = PrompterArgs::new(Arc::new(ChannelRuntime { link: link_tx }))
        .with_script("Good evening everyone. Tonight we talk about tides.")
        .with_relay(LinkConfig::host(&url));
    let (prompter, _handle) = spawn(args).await;

    let session = wait_for(&mut link_rx, |event| match event {
        HostLinkEvent::Session { id } => Some(id),
        _ => None,
    })
    .await;
    let session = SessionId::parse(&session).unwrap();

    let (remote_tx, mut remote_rx) = mpsc::unbounded_channel();
    let remote = RemoteController::spawn(LinkConfig::remote(&url), session, move |event| {
        let _ = remote_tx.send(event);
    });

    // The host pushed its state on registration; the relay replays it.
    let initial = wait_for(&mut remote_rx, |event| match event {
        RemoteEvent::State(snapshot) => Some(snapshot),
        _ => None,
    })
    .await;
    assert_eq!(initial.position, 0);
    assert!(!initial.running);

    let count = wait_for(&mut link_rx, |event| match event {
        HostLinkEvent::RemoteCount { n } => Some(n),
        _ => None,
    })
    .await;
    assert_eq!(count, 1);

    assert!(remote.send(Command::NextSentence));

    let moved = wait_for(&mut remote_rx, |event| match event {
        RemoteEvent::State(snapshot) if snapshot.position != 0 => Some(snapshot),
        _ => None,
    })
    .await;
    assert_eq!(moved.position, 3);
    assert_eq!(current_snapshot(&prompter).await.unwrap().position, 3);

    prompter.stop(None);
}

#[tokio::test]
async fn remote_sees_host_disconnect() {
    let addr = start_relay().await;
    let url = format!("ws://{addr}/ws");

    let (link_tx, mut link_rx) = mpsc::unbounded_channel();
    let args = PrompterArgs::new(Arc::new(ChannelRuntime { link: link_tx }))
        .with_script("One two three.")
        .with_relay(LinkConfig::host(&url));
    let (prompter, handle) = spawn(args).await;

    let session = wait_for(&mut link_rx, |event| match event {
        HostLinkEvent::Session { id } => Some(id),
        _ => None,
    })
    .await;

    let (remote_tx, mut remote_rx) = mpsc::unbounded_channel();
    let _remote = RemoteController::spawn(
        LinkConfig::remote(&url),
        SessionId::parse(&session).unwrap(),
        move |event| {
            let _ = remote_tx.send(event);
        },
    );
    wait_for(&mut remote_rx, |event| match event {
        RemoteEvent::Accepted => Some(()),
        _ => None,
    })
    .await;

    prompter.stop(None);
    handle.await.unwrap();

    let message = wait_for(&mut remote_rx, |event| match event {
        RemoteEvent::Error(message) => Some(message),
        _ => None,
    })
    .await;
    assert_eq!(message, "Host disconnected");
}

#[tokio::test]
async fn snapshot_messages_are_answered_without_a_relay() {
    let (link_tx, _link_rx) = mpsc::unbounded_channel();
    let args = PrompterArgs::new(Arc::new(ChannelRuntime { link: link_tx })).with_script("a b c");
    let (prompter, _handle) = spawn(args).await;

    prompter
        .cast(PrompterMsg::Command(Command::NextWord))
        .unwrap();
    let snapshot = current_snapshot(&prompter).await.unwrap();
    assert_eq!(snapshot.position, 1);
    assert_eq!(snapshot.script, "a b c");

    prompter.stop(None);
}
