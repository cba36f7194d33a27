//! Concrete `CommandSource`: `reset`/`quit` lines read from stdin (spec §6
//! "Command surface"). A richer transport (message bus, RPC) plugs in at
//! the same trait boundary without touching the engine.

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;

use dps_engine::{Command, CommandSource};

pub struct StdinCommandSource {
    receiver: mpsc::Receiver<Command>,
}

impl StdinCommandSource {
    pub fn spawn() -> StdinCommandSource {
        let (sender, receiver) = mpsc::channel();
        thread::Builder::new()
            .name("dps-command-stdin".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines().map_while(Result::ok) {
                    let command = match line.trim() {
                        "reset" => Some(Command::Reset),
                        "quit" => Some(Command::Quit),
                        _ => None,
                    };
                    if let Some(command) = command {
                        if sender.send(command).is_err() {
                            break;
                        }
                    }
                }
            })
            .expect("failed to spawn stdin command thread");

        StdinCommandSource { receiver }
    }
}

impl CommandSource for StdinCommandSource {
    fn try_recv(&mut self) -> Option<Command> {
        self.receiver.try_recv().ok()
    }
}
