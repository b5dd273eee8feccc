// ABOUTME: One bound SMPP session over a framed TCP connection
// ABOUTME: Request/response correlation by sequence number, inbound PDU handling and teardown

use super::config::Timeouts;
use super::error::{SmppError, SmppResult};
use super::types::{BindCredentials, BindType};
use crate::connection::Connection;
use crate::datatypes::*;
use crate::Frame;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU8, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{Instant, timeout, timeout_at};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    Unbound = 0,
    Binding = 1,
    Bound = 2,
    HealthChecking = 3,
    Reconnecting = 4,
    Closed = 5,
}

impl SessionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => SessionState::Unbound,
            1 => SessionState::Binding,
            2 => SessionState::Bound,
            3 => SessionState::HealthChecking,
            4 => SessionState::Reconnecting,
            _ => SessionState::Closed,
        }
    }

    /// Whether PDUs may be submitted
    pub fn is_usable(self) -> bool {
        matches!(self, SessionState::Bound | SessionState::HealthChecking)
    }
}

/// A bound session
///
/// Requests are serialized by the connection mutex, so at most one request
/// is outstanding. While waiting for a response the session answers inbound
/// enquire_link and unbind requests and skips anything else.
pub struct Session {
    id: u64,
    connection: tokio::sync::Mutex<Connection>,
    sequence: AtomicU32,
    state: AtomicU8,
    created: Instant,
    /// Milliseconds from `created` to the last successful exchange
    last_interaction: AtomicU64,
    probe_timeouts: AtomicU32,
    timeouts: Timeouts,
    keep_alive: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Connects to `address` and binds with `credentials`
    pub async fn open(
        id: u64,
        address: &str,
        credentials: &BindCredentials,
        timeouts: Timeouts,
    ) -> SmppResult<Session> {
        debug!(session_id = id, address, "connecting");
        let socket = timeout(timeouts.connect, TcpStream::connect(address))
            .await
            .map_err(|_| SmppError::Timeout("connect"))??;

        let session = Session {
            id,
            connection: tokio::sync::Mutex::new(Connection::new(socket)),
            sequence: AtomicU32::new(1),
            state: AtomicU8::new(SessionState::Unbound as u8),
            created: Instant::now(),
            last_interaction: AtomicU64::new(0),
            probe_timeouts: AtomicU32::new(0),
            timeouts,
            keep_alive: Mutex::new(None),
        };

        session.set_state(SessionState::Binding);
        match session.bind(credentials).await {
            Ok(()) => {
                session.set_state(SessionState::Bound);
                session.touch();
                info!(session_id = id, system_id = %credentials.system_id, "session bound");
                Ok(session)
            }
            Err(e) => {
                session.set_state(SessionState::Unbound);
                let _ = session.connection.lock().await.shutdown().await;
                Err(e)
            }
        }
    }

    async fn bind(&self, credentials: &BindCredentials) -> SmppResult<()> {
        let sequence_number = self.next_sequence_number();
        let system_type = credentials.system_type.as_deref().unwrap_or("");
        let version = credentials.interface_version;

        let (frame, expected) = match credentials.bind_type {
            BindType::Transmitter => (
                Frame::BindTransmitter(
                    BindTransmitter::new(sequence_number, &credentials.system_id, &credentials.password)
                        .with_system_type(system_type)
                        .with_interface_version(version),
                ),
                CommandId::BindTransmitterResp,
            ),
            BindType::Transceiver => (
                Frame::BindTransceiver(
                    BindTransceiver::new(sequence_number, &credentials.system_id, &credentials.password)
                        .with_system_type(system_type)
                        .with_interface_version(version),
                ),
                CommandId::BindTransceiverResp,
            ),
        };

        let response = self
            .exchange(frame, expected, self.timeouts.bind, "bind response")
            .await?;
        match response.command_status() {
            CommandStatus::Ok => Ok(()),
            status => {
                warn!(session_id = self.id, ?status, "bind rejected");
                Err(SmppError::BindRejected(status))
            }
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        // Closed is terminal
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current != SessionState::Closed as u8).then_some(state as u8)
            });
    }

    pub fn mark_closed(&self) {
        self.state.store(SessionState::Closed as u8, Ordering::Release);
    }

    /// Next sequence number, skipping the reserved 0 and 0xFFFFFFFF
    pub fn next_sequence_number(&self) -> u32 {
        loop {
            let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
            if sequence != 0 && sequence != u32::MAX {
                return sequence;
            }
        }
    }

    pub fn touch(&self) {
        let elapsed = self.created.elapsed().as_millis() as u64;
        self.last_interaction.store(elapsed, Ordering::Release);
    }

    /// Time since the last successful exchange (or the bind)
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_interaction.load(Ordering::Acquire));
        self.created.elapsed().saturating_sub(last)
    }

    pub fn probe_timeouts(&self) -> u32 {
        self.probe_timeouts.load(Ordering::Acquire)
    }

    pub(crate) fn record_probe_timeout(&self) -> u32 {
        self.probe_timeouts.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn reset_probe_timeouts(&self) {
        self.probe_timeouts.store(0, Ordering::Release);
    }

    pub(crate) fn attach_keep_alive(&self, handle: JoinHandle<()>) {
        let mut slot = self.keep_alive.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = slot.replace(handle) {
            previous.abort();
        }
    }

    pub fn has_keep_alive(&self) -> bool {
        self.keep_alive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Submits one PDU and returns the SMSC message id
    pub async fn submit(&self, mut pdu: SubmitSm) -> SmppResult<String> {
        if !self.state().is_usable() {
            return Err(SmppError::InvalidState(format!("{:?}", self.state())));
        }
        pdu.sequence_number = self.next_sequence_number();
        let response = self
            .exchange(
                Frame::SubmitSm(Box::new(pdu)),
                CommandId::SubmitSmResp,
                self.timeouts.response,
                "submit_sm_resp",
            )
            .await?;

        match response {
            Frame::SubmitSmResp(resp) if resp.command_status == CommandStatus::Ok => {
                self.touch();
                Ok(resp.message_id)
            }
            other => Err(SmppError::Protocol(other.command_status())),
        }
    }

    /// Sends enquire_link and waits at most `wait` for the response
    pub async fn enquire_link(&self, wait: Duration) -> SmppResult<()> {
        let sequence_number = self.next_sequence_number();
        self.exchange(
            Frame::EnquireLink(EnquireLink::new(sequence_number)),
            CommandId::EnquireLinkResp,
            wait,
            "enquire_link_resp",
        )
        .await?;
        self.touch();
        Ok(())
    }

    /// Writes `request` and reads until the response carrying the same
    /// sequence number arrives or `wait` elapses
    async fn exchange(
        &self,
        request: Frame,
        expected: CommandId,
        wait: Duration,
        what: &'static str,
    ) -> SmppResult<Frame> {
        let sequence_number = request.sequence_number();
        let mut connection = self.connection.lock().await;

        let result: SmppResult<Frame> = async {
            timeout(self.timeouts.write, connection.write_frame(&request))
                .await
                .map_err(|_| SmppError::Timeout("write"))??;

            let deadline = Instant::now() + wait;
            loop {
                let frame = timeout_at(deadline, connection.read_frame())
                    .await
                    .map_err(|_| SmppError::Timeout(what))??
                    .ok_or(SmppError::ConnectionClosed)?;

                if frame.is_response() && frame.sequence_number() == sequence_number {
                    return match frame {
                        Frame::GenericNack(nack) => Err(SmppError::Protocol(nack.command_status)),
                        frame if frame.command_id() == expected => Ok(frame),
                        frame => Err(SmppError::UnexpectedPdu {
                            expected,
                            actual: frame.command_id(),
                        }),
                    };
                }
                self.handle_inbound(&mut connection, frame).await?;
            }
        }
        .await;

        if let Err(e) = &result {
            if matches!(
                e,
                SmppError::ConnectionClosed | SmppError::Connection(_) | SmppError::Codec(_)
            ) {
                self.mark_closed();
            }
        }
        result
    }

    async fn handle_inbound(&self, connection: &mut Connection, frame: Frame) -> SmppResult<()> {
        match frame {
            Frame::EnquireLink(request) => {
                debug!(session_id = self.id, "answering enquire_link from SMSC");
                connection
                    .write_frame(&Frame::EnquireLinkResp(request.response()))
                    .await?;
                Ok(())
            }
            Frame::Unbind(request) => {
                info!(session_id = self.id, "SMSC requested unbind");
                let _ = connection
                    .write_frame(&Frame::UnbindResp(UnbindResponse::new(request.sequence_number)))
                    .await;
                self.mark_closed();
                Err(SmppError::ConnectionClosed)
            }
            other => {
                debug!(
                    session_id = self.id,
                    command_id = ?other.command_id(),
                    sequence_number = other.sequence_number(),
                    "skipping unrelated PDU"
                );
                Ok(())
            }
        }
    }

    /// Stops the keep-alive task, unbinds if still bound and closes the socket
    pub async fn close(&self) {
        let handle = self
            .keep_alive
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
            let _ = handle.await;
        }

        let was_usable = self.state().is_usable();
        self.mark_closed();

        if was_usable {
            let sequence_number = self.next_sequence_number();
            let unbind = self.exchange(
                Frame::Unbind(Unbind::new(sequence_number)),
                CommandId::UnbindResp,
                self.timeouts.unbind,
                "unbind_resp",
            );
            match timeout(self.timeouts.unbind, unbind).await {
                Ok(Ok(_)) => debug!(session_id = self.id, "unbound"),
                Ok(Err(e)) => debug!(session_id = self.id, error = %e, "unbind failed"),
                Err(_) => debug!(session_id = self.id, "unbind timed out"),
            }
        }

        if let Ok(mut connection) = timeout(self.timeouts.unbind, self.connection.lock()).await {
            let _ = connection.shutdown().await;
        }
        info!(session_id = self.id, "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_smsc::MockSmsc;

    async fn bound(smsc: &MockSmsc) -> Session {
        let address = format!("127.0.0.1:{}", smsc.port());
        let credentials = BindCredentials::transmitter("tester", "secret");
        Session::open(7, &address, &credentials, Timeouts::default())
            .await
            .unwrap()
    }

    fn greeting() -> SubmitSm {
        SubmitSm::builder()
            .source_addr("1234")
            .destination_addr("5678")
            .short_message("hi")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_binds_and_submit_returns_message_id() {
        let smsc = MockSmsc::start().await;
        let session = bound(&smsc).await;
        assert_eq!(session.id(), 7);
        assert_eq!(session.state(), SessionState::Bound);

        let message_id = session.submit(greeting()).await.unwrap();
        assert_eq!(message_id, "msg-1");
        assert_eq!(smsc.submitted()[0].short_message.as_ref(), b"hi");
    }

    #[tokio::test]
    async fn test_rejected_bind_surfaces_status() {
        let smsc = MockSmsc::start().await;
        smsc.reject_binds(CommandStatus::InvalidSystemId, 1);

        let credentials = BindCredentials::transceiver("tester", "secret");
        let result = Session::open(
            1,
            &format!("127.0.0.1:{}", smsc.port()),
            &credentials,
            Timeouts::default(),
        )
        .await;

        assert!(matches!(
            result,
            Err(SmppError::BindRejected(CommandStatus::InvalidSystemId))
        ));
    }

    #[tokio::test]
    async fn test_unanswered_enquire_link_times_out_without_closing() {
        let smsc = MockSmsc::start().await;
        let session = bound(&smsc).await;
        smsc.ignore_enquire_link(true);

        let result = session.enquire_link(Duration::from_millis(30)).await;
        assert!(matches!(result, Err(SmppError::Timeout(_))));
        assert_eq!(session.state(), SessionState::Bound);

        smsc.ignore_enquire_link(false);
        session.enquire_link(Duration::from_secs(1)).await.unwrap();
    }

    #[tokio::test]
    async fn test_successful_exchange_resets_idle_time() {
        let smsc = MockSmsc::start().await;
        let session = bound(&smsc).await;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(session.idle_for() >= Duration::from_millis(40));

        session.enquire_link(Duration::from_secs(1)).await.unwrap();
        assert!(session.idle_for() < Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_close_unbinds_once_and_is_terminal() {
        let smsc = MockSmsc::start().await;
        let session = bound(&smsc).await;

        session.close().await;
        session.close().await;
        assert_eq!(smsc.unbinds(), 1);
        assert_eq!(session.state(), SessionState::Closed);

        session.set_state(SessionState::Bound);
        assert_eq!(session.state(), SessionState::Closed);
        assert!(matches!(
            session.submit(greeting()).await,
            Err(SmppError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn test_peer_close_marks_session_closed() {
        let smsc = MockSmsc::start().await;
        let session = bound(&smsc).await;
        smsc.drop_submits(1);

        let error = session.submit(greeting()).await.unwrap_err();
        assert!(error.requires_new_session());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_sequence_numbers_skip_reserved_values() {
        let smsc = MockSmsc::start().await;
        let session = bound(&smsc).await;

        session.sequence.store(u32::MAX - 1, Ordering::Relaxed);
        assert_eq!(session.next_sequence_number(), u32::MAX - 1);
        assert_eq!(session.next_sequence_number(), 1);
        assert_eq!(session.next_sequence_number(), 2);
    }
}
