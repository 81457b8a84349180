//! Connection to the Stream Deck host.
//!
//! One WebSocket to `ws://127.0.0.1:<port>`: register, then pump inbound
//! events into the [`SessionRegistry`] and outbound messages from sessions
//! back to the host until the host closes the socket.

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, trace};

use crate::args::PluginArgs;
use crate::error::PluginError;
use crate::messages::{Inbound, Outbound, Registration};
use crate::registry::SessionRegistry;

pub fn host_url(port: u16) -> String {
    format!("ws://127.0.0.1:{port}")
}

/// Serve the host until it disconnects. Every session is stopped before
/// returning, whatever the outcome.
pub async fn run(
    args: &PluginArgs,
    mut registry: SessionRegistry,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
) -> Result<(), PluginError> {
    let url = host_url(args.port);
    info!(%url, "connecting to host");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| PluginError::Connect {
            url: url.clone(),
            source: Box::new(e),
        })?;
    let (mut write, mut read) = ws_stream.split();

    let registration = serde_json::to_string(&Registration {
        event: &args.register_event,
        uuid: &args.plugin_uuid,
    })?;
    write.send(Message::text(registration)).await?;

    let hello = serde_json::to_string(&Outbound::log_message(format!(
        "ga4deck {} registered",
        env!("CARGO_PKG_VERSION")
    )))?;
    write.send(Message::text(hello)).await?;
    info!("registered with host");

    let result = loop {
        tokio::select! {
            biased;
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break Ok(());
            }
            Some(message) = outbound.recv() => {
                let text = match serde_json::to_string(&message) {
                    Ok(text) => text,
                    Err(e) => break Err(e.into()),
                };
                trace!(%text, "-> host");
                if let Err(e) = write.send(Message::text(text)).await {
                    break Err(e.into());
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        trace!(text = %text.as_str(), "<- host");
                        dispatch(&mut registry, text.as_str()).await;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "host closed the connection");
                        break Ok(());
                    }
                    Some(Ok(_)) => {
                        // Binary, Ping, Pong: tungstenite answers pings itself
                    }
                    Some(Err(e)) => break Err(e.into()),
                    None => {
                        info!("host connection ended");
                        break Ok(());
                    }
                }
            }
        }
    };

    registry.stop_all().await;
    result
}

async fn dispatch(registry: &mut SessionRegistry, text: &str) {
    match serde_json::from_str::<Inbound>(text) {
        Ok(event) => registry.handle(event).await,
        Err(e) => debug!(error = %e, "ignoring unparseable frame"),
    }
}
