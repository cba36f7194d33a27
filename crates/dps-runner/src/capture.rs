//! Concrete `PacketSource`: a TCP listener accepting one connection per
//! flow, forwarding raw bytes as they arrive. Real device capture (raw
//! socket sniffing, decryption) is platform-specific and out of scope;
//! this stands in as the "source of framed-ish bytes over the wire"
//! the rest of the pipeline actually consumes, grounded on the accept/read
//! loop in the teacher's own `util::bin::test_listen`.

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use slog::Logger;

use dps_common::CaptureError;
use dps_engine::{CapturedPayload, PacketSource};

const READ_BUF_SIZE: usize = 4096;
const POLL_TIMEOUT: Duration = Duration::from_millis(200);

pub struct TcpCaptureSource {
    receiver: mpsc::Receiver<CapturedPayload>,
    stop_flag: Arc<AtomicBool>,
}

impl TcpCaptureSource {
    pub fn bind(addr: &str, log: Logger) -> io::Result<TcpCaptureSource> {
        let listener = TcpListener::bind(addr)?;
        let (sender, receiver) = mpsc::channel();
        let stop_flag = Arc::new(AtomicBool::new(false));

        let accept_stop = Arc::clone(&stop_flag);
        let accept_log = log.clone();
        thread::Builder::new()
            .name("dps-capture-accept".into())
            .spawn(move || {
                for incoming in listener.incoming() {
                    if accept_stop.load(Ordering::Relaxed) {
                        break;
                    }
                    match incoming {
                        Ok(stream) => spawn_reader(stream, sender.clone(), accept_log.clone()),
                        Err(err) => {
                            slog::warn!(accept_log, "capture accept failed"; "error" => %err)
                        }
                    }
                }
            })
            .expect("failed to spawn capture accept thread");

        Ok(TcpCaptureSource { receiver, stop_flag })
    }
}

impl PacketSource for TcpCaptureSource {
    /// Blocks the capture thread, as the spec's scheduling model requires,
    /// but only up to `POLL_TIMEOUT` at a time so a cooperative `stop()`
    /// takes effect promptly instead of waiting on a connection that may
    /// never send anything else.
    fn next_payload(&mut self) -> Result<CapturedPayload, CaptureError> {
        loop {
            if self.stop_flag.load(Ordering::Relaxed) {
                return Err(CaptureError::Fatal("capture source stopped".to_string()));
            }
            match self.receiver.recv_timeout(POLL_TIMEOUT) {
                Ok(payload) => return Ok(payload),
                Err(mpsc::RecvTimeoutError::Timeout) => continue,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::Fatal(
                        "capture source disconnected".to_string(),
                    ))
                }
            }
        }
    }

    fn stop(&mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
    }
}

fn spawn_reader(mut stream: TcpStream, sender: mpsc::Sender<CapturedPayload>, log: Logger) {
    let src_port = stream.peer_addr().map(|a| a.port()).unwrap_or(0);
    let dst_port = stream.local_addr().map(|a| a.port()).unwrap_or(0);

    thread::Builder::new()
        .name(format!("dps-capture-read-{src_port}"))
        .spawn(move || {
            let mut buf = [0u8; READ_BUF_SIZE];
            loop {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        let payload = CapturedPayload {
                            src_port,
                            dst_port,
                            payload: buf[..n].to_vec(),
                        };
                        if sender.send(payload).is_err() {
                            break;
                        }
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => {
                        slog::debug!(log, "flow read failed, closing"; "port" => src_port, "error" => %err);
                        break;
                    }
                }
            }
        })
        .expect("failed to spawn capture reader thread");
}
