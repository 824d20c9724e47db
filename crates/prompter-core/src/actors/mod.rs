mod prompter;

pub use prompter::{LocalSubscription, PrompterActor, PrompterArgs, PrompterMsg, PrompterState};

use ractor::{Actor, ActorRef};
use tokio::task::JoinHandle;

use vp_relay_interface::StateSnapshot;

use crate::Error;

/// Spawn the registered prompter actor.
pub async fn spawn_prompter(
    args: PrompterArgs,
) -> Result<(ActorRef<PrompterMsg>, JoinHandle<()>), Error> {
    let (actor, handle) = Actor::spawn(Some(PrompterActor::name()), PrompterActor, args).await?;
    Ok((actor, handle))
}

pub async fn current_snapshot(actor: &ActorRef<PrompterMsg>) -> Result<StateSnapshot, Error> {
    ractor::call!(actor, PrompterMsg::GetSnapshot).map_err(|e| Error::Call(e.to_string()))
}
