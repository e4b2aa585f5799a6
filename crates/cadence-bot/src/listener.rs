//! The engine's downstream: chat output and the websocket bus.

use async_trait::async_trait;
use cadence_bus::WebsocketBus;
use cadence_core::{action::ActionKind, event::RecurringEvent, provider::RecurringEventListener};

/// Event type on the bus for each action kind.
pub fn event_type(kind: ActionKind) -> &'static str {
  match kind {
    ActionKind::SuperTrivia => "superTrivia",
    ActionKind::Weather => "weather",
    ActionKind::WordOfTheDay => "wordOfTheDay",
  }
}

/// Logs the chat line for every event and relays the event to the bus, so
/// overlays can show it too.
pub struct RelayListener {
  bus: WebsocketBus,
}

impl RelayListener {
  pub fn new(bus: WebsocketBus) -> Self { Self { bus } }
}

#[async_trait]
impl RecurringEventListener for RelayListener {
  async fn on_event(&self, event: RecurringEvent) -> anyhow::Result<()> {
    let kind = event.kind();
    tracing::info!(channel = %event.channel(), %kind, "{}", event.to_message());

    let data = serde_json::to_value(&event)?;
    self.bus.publish(event.channel(), event_type(kind), data).await?;
    Ok(())
  }
}
