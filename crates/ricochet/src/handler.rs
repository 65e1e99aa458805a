//! Per-connection handler: join, event pump, and intent routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. First intent must be `Join` → seat the player in a room
//!   2. Spawn a writer task pumping the room's events onto the socket
//!   3. Loop: receive intents → route to the player's room
//!   4. On close (clean or not), remove the player from their room

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use ricochet_protocol::{ClientIntent, Codec, PlayerId, RejectReason, ServerEvent};
use ricochet_transport::{Connection, WebSocketConnection};

use crate::RicochetError;
use crate::server::ServerState;

/// How long a fresh connection gets to send its Join.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Drop guard that removes the player from their room when the handler
/// exits. Cleanup happens even if the handler errors out; since `Drop`
/// is synchronous, the async removal runs as a fire-and-forget task.
struct RoomGuard<C: Codec> {
    player_id: PlayerId,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for RoomGuard<C> {
    fn drop(&mut self) {
        let player_id = self.player_id;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut registry = state.registry.lock().await;
            if let Err(e) = registry.leave(player_id).await {
                tracing::debug!(%player_id, error = %e, "leave on disconnect failed");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), RicochetError>
where
    C: Codec + Clone,
{
    let conn = Arc::new(conn);
    // The connection id doubles as the player id; ids are never reused
    // within a server process.
    let player_id = PlayerId(conn.id().into_inner());
    tracing::debug!(conn_id = %conn.id(), "handling new connection");

    // --- Step 1: Join ---
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    perform_join(&conn, &state, player_id, event_tx).await?;
    tracing::info!(%player_id, "player joined");

    let _guard = RoomGuard {
        player_id,
        state: Arc::clone(&state),
    };

    // --- Step 2: Writer task ---
    // Pumps room events onto the socket. Exits when the room drops the
    // player's sender or the socket dies.
    let writer = tokio::spawn(pump_events(
        Arc::clone(&conn),
        state.codec.clone(),
        event_rx,
    ));

    // --- Step 3: Intent loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let intent: ClientIntent = match state.codec.decode(&data) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable intent");
                continue;
            }
        };

        let result = {
            let registry = state.registry.lock().await;
            registry.intent(player_id, intent).await
        };
        if let Err(e) = result {
            tracing::debug!(%player_id, error = %e, "intent not routed");
        }
    }

    writer.abort();
    // _guard drops here → room removal fires.
    Ok(())
}

/// Waits for the first intent, which must be `Join`, and seats the
/// player. Any rejection is reported to the client before erroring out.
async fn perform_join<C>(
    conn: &Arc<WebSocketConnection>,
    state: &Arc<ServerState<C>>,
    player_id: PlayerId,
    event_tx: mpsc::UnboundedSender<ServerEvent>,
) -> Result<(), RicochetError>
where
    C: Codec,
{
    let data = match tokio::time::timeout(JOIN_TIMEOUT, conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ricochet_protocol::ProtocolError::InvalidMessage(
                "connection closed before join".into(),
            )
            .into());
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(ricochet_protocol::ProtocolError::InvalidMessage(
                "join timed out".into(),
            )
            .into());
        }
    };

    let intent: ClientIntent = state.codec.decode(&data)?;
    let ClientIntent::Join { room, name } = intent else {
        send_reject(conn, &state.codec, RejectReason::NotInRoom).await?;
        return Err(ricochet_protocol::ProtocolError::InvalidMessage(
            "first message must be Join".into(),
        )
        .into());
    };

    let join_result = {
        let mut registry = state.registry.lock().await;
        registry.join(&room, player_id, name, event_tx).await
    };

    match join_result {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Some(reason) = e.reject_reason() {
                send_reject(conn, &state.codec, reason).await?;
            }
            Err(e.into())
        }
    }
}

/// Writer loop: encodes each room event and sends it to the client.
async fn pump_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    codec: C,
    mut event_rx: mpsc::UnboundedReceiver<ServerEvent>,
) {
    while let Some(event) = event_rx.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "failed to encode event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(error = %e, "event send failed, stopping writer");
            break;
        }
    }
}

/// Sends a `Rejected` event directly, outside any room.
async fn send_reject(
    conn: &Arc<WebSocketConnection>,
    codec: &impl Codec,
    reason: RejectReason,
) -> Result<(), RicochetError> {
    let bytes = codec.encode(&ServerEvent::Rejected { reason })?;
    conn.send(&bytes).await?;
    Ok(())
}
