//! Event pump: applies push events to the session in the background

use std::sync::{Arc, Weak};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::ApiGateway;
use crate::transport::{EventChannel, Subscription};
use crate::types::identifiers::SubscriptionId;

use super::{CleanerClient, Inner};

/// Running pump task
#[derive(Debug)]
pub(super) struct EventPump {
    subscription: SubscriptionId,
    shutdown: CancellationToken,
    task: JoinHandle<()>,
}

impl EventPump {
    pub(super) fn stop(self) {
        self.shutdown.cancel();
        self.task.abort();
    }
}

impl<G: ApiGateway> CleanerClient<G> {
    /// Subscribe to `channel` and apply its events until detached
    ///
    /// Attaching again replaces the previous subscription, so an event is
    /// never applied twice.
    pub fn attach(&self, channel: &EventChannel) -> SubscriptionId {
        let subscription = channel.subscribe();
        let id = subscription.id();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(run(
            Arc::downgrade(&self.inner),
            subscription,
            shutdown.clone(),
        ));

        let previous = self.inner.pump.lock().replace(EventPump {
            subscription: id,
            shutdown,
            task,
        });
        if let Some(previous) = previous {
            log::debug!("Replacing event pump {}", previous.subscription);
            previous.stop();
        }
        id
    }

    /// Stop applying events; a no-op when not attached
    pub async fn detach(&self) {
        let pump = self.inner.pump.lock().take();
        if let Some(pump) = pump {
            pump.shutdown.cancel();
            if let Err(e) = pump.task.await
                && !e.is_cancelled()
            {
                log::warn!("Event pump ended abnormally: {e}");
            }
        }
    }

    /// Whether an event pump is running
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner
            .pump
            .lock()
            .as_ref()
            .is_some_and(|pump| !pump.task.is_finished())
    }

    /// Best-effort stop signal, then detach
    pub async fn shutdown(&self) {
        if let Err(e) = self.inner.gateway.stop().await {
            log::debug!("Stop on shutdown failed: {e}");
        }
        self.detach().await;
    }
}

async fn run<G>(inner: Weak<Inner<G>>, mut subscription: Subscription, shutdown: CancellationToken)
where
    G: Send + Sync + 'static,
{
    log::debug!("Event pump {} started", subscription.id());
    loop {
        tokio::select! {
            () = shutdown.cancelled() => break,
            event = subscription.recv() => {
                let Some(event) = event else { break };
                let Some(inner) = inner.upgrade() else { break };
                inner.apply(event);
            }
        }
    }
    log::debug!("Event pump {} stopped", subscription.id());
}
