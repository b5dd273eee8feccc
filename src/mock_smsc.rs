// ABOUTME: In-process SMSC speaking just enough SMPP for sender tests
// ABOUTME: Counts PDUs per kind and can reject binds, ignore probes or drop connections

use crate::Frame;
use crate::connection::Connection;
use crate::datatypes::*;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Counters {
    connections: AtomicUsize,
    binds: AtomicUsize,
    enquire_links: AtomicUsize,
    submits: AtomicUsize,
    unbinds: AtomicUsize,
}

struct Behaviour {
    bind_status: Mutex<CommandStatus>,
    /// Bind attempts to reject with `bind_status` before accepting
    rejected_binds: AtomicUsize,
    ignore_enquire_link: AtomicBool,
    /// Submits answered by closing the connection
    dropped_submits: AtomicUsize,
    submitted: Mutex<Vec<SubmitSm>>,
}

pub(crate) struct MockSmsc {
    addr: SocketAddr,
    counters: Arc<Counters>,
    behaviour: Arc<Behaviour>,
    kill: Arc<watch::Sender<u64>>,
    task: JoinHandle<()>,
}

impl MockSmsc {
    pub(crate) async fn start() -> MockSmsc {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let counters = Arc::new(Counters::default());
        let behaviour = Arc::new(Behaviour {
            bind_status: Mutex::new(CommandStatus::Ok),
            rejected_binds: AtomicUsize::new(0),
            ignore_enquire_link: AtomicBool::new(false),
            dropped_submits: AtomicUsize::new(0),
            submitted: Mutex::new(Vec::new()),
        });
        let kill = Arc::new(watch::channel(0u64).0);

        let task = {
            let counters = Arc::clone(&counters);
            let behaviour = Arc::clone(&behaviour);
            let kill = Arc::clone(&kill);
            tokio::spawn(async move {
                while let Ok((socket, _)) = listener.accept().await {
                    counters.connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(
                        socket,
                        Arc::clone(&counters),
                        Arc::clone(&behaviour),
                        kill.subscribe(),
                    ));
                }
            })
        };

        MockSmsc {
            addr,
            counters,
            behaviour,
            kill,
            task,
        }
    }

    pub(crate) fn port(&self) -> u16 {
        self.addr.port()
    }

    pub(crate) fn connections(&self) -> usize {
        self.counters.connections.load(Ordering::SeqCst)
    }

    pub(crate) fn binds(&self) -> usize {
        self.counters.binds.load(Ordering::SeqCst)
    }

    pub(crate) fn enquire_links(&self) -> usize {
        self.counters.enquire_links.load(Ordering::SeqCst)
    }

    pub(crate) fn submits(&self) -> usize {
        self.counters.submits.load(Ordering::SeqCst)
    }

    pub(crate) fn unbinds(&self) -> usize {
        self.counters.unbinds.load(Ordering::SeqCst)
    }

    pub(crate) fn submitted(&self) -> Vec<SubmitSm> {
        self.behaviour.submitted.lock().unwrap().clone()
    }

    /// Rejects the next `count` binds with `status`
    pub(crate) fn reject_binds(&self, status: CommandStatus, count: usize) {
        *self.behaviour.bind_status.lock().unwrap() = status;
        self.behaviour.rejected_binds.store(count, Ordering::SeqCst);
    }

    pub(crate) fn ignore_enquire_link(&self, ignore: bool) {
        self.behaviour
            .ignore_enquire_link
            .store(ignore, Ordering::SeqCst);
    }

    /// Closes the connection instead of answering the next `count` submits
    pub(crate) fn drop_submits(&self, count: usize) {
        self.behaviour.dropped_submits.store(count, Ordering::SeqCst);
    }

    /// Closes every open connection without unbinding
    pub(crate) fn kill_connections(&self) {
        self.kill.send_modify(|generation| *generation += 1);
    }
}

impl Drop for MockSmsc {
    fn drop(&mut self) {
        self.kill_connections();
        self.task.abort();
    }
}

fn take_one(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

async fn serve(
    socket: TcpStream,
    counters: Arc<Counters>,
    behaviour: Arc<Behaviour>,
    mut kill: watch::Receiver<u64>,
) {
    let mut connection = Connection::new(socket);
    loop {
        let frame = tokio::select! {
            _ = kill.changed() => return,
            frame = connection.read_frame() => match frame {
                Ok(Some(frame)) => frame,
                _ => return,
            },
        };

        let response = match frame {
            Frame::BindTransmitter(bind) => {
                counters.binds.fetch_add(1, Ordering::SeqCst);
                Frame::BindTransmitterResp(if take_one(&behaviour.rejected_binds) {
                    let status = *behaviour.bind_status.lock().unwrap();
                    BindTransmitterResponse::error(bind.sequence_number, status)
                } else {
                    BindTransmitterResponse::new(bind.sequence_number, "mock")
                })
            }
            Frame::BindTransceiver(bind) => {
                counters.binds.fetch_add(1, Ordering::SeqCst);
                Frame::BindTransceiverResp(if take_one(&behaviour.rejected_binds) {
                    let status = *behaviour.bind_status.lock().unwrap();
                    BindTransceiverResponse::error(bind.sequence_number, status)
                } else {
                    BindTransceiverResponse::new(bind.sequence_number, "mock")
                })
            }
            Frame::EnquireLink(request) => {
                counters.enquire_links.fetch_add(1, Ordering::SeqCst);
                if behaviour.ignore_enquire_link.load(Ordering::SeqCst) {
                    continue;
                }
                Frame::EnquireLinkResp(request.response())
            }
            Frame::SubmitSm(pdu) => {
                if take_one(&behaviour.dropped_submits) {
                    return;
                }
                let n = counters.submits.fetch_add(1, Ordering::SeqCst) + 1;
                let sequence_number = pdu.sequence_number;
                behaviour.submitted.lock().unwrap().push(*pdu);
                Frame::SubmitSmResp(SubmitSmResponse::new(sequence_number, format!("msg-{n}")))
            }
            Frame::Unbind(request) => {
                counters.unbinds.fetch_add(1, Ordering::SeqCst);
                let _ = connection
                    .write_frame(&Frame::UnbindResp(UnbindResponse::new(
                        request.sequence_number,
                    )))
                    .await;
                return;
            }
            _ => continue,
        };

        if connection.write_frame(&response).await.is_err() {
            return;
        }
    }
}
