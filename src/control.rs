//! Remote control via Unix socket
//!
//! Accepts line commands over a Unix socket and forwards them to the main
//! loop, which applies them exactly like key presses.

use crate::session::Command;
use std::io::{BufRead, BufReader};
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

const SOCKET_PATH: &str = "/tmp/tag_bounce.sock";

/// Controller that listens for commands on a Unix socket
pub struct Controller {
    receiver: Receiver<Command>,
    _listener_thread: thread::JoinHandle<()>,
}

impl Controller {
    /// Create a new controller listening on the Unix socket
    pub fn new() -> Result<Self, String> {
        // Remove a stale socket from a previous run
        let _ = std::fs::remove_file(SOCKET_PATH);

        let listener = UnixListener::bind(SOCKET_PATH)
            .map_err(|e| format!("Failed to bind socket {}: {}", SOCKET_PATH, e))?;
        listener
            .set_nonblocking(true)
            .map_err(|e| format!("Failed to set non-blocking: {}", e))?;

        let (sender, receiver) = mpsc::channel();

        let handle = thread::spawn(move || {
            Self::listener_loop(listener, sender);
        });

        log::info!("Remote control listening on {}", SOCKET_PATH);
        Ok(Self {
            receiver,
            _listener_thread: handle,
        })
    }

    fn listener_loop(listener: UnixListener, sender: Sender<Command>) {
        loop {
            match listener.accept() {
                Ok((stream, _)) => {
                    let sender = sender.clone();
                    thread::spawn(move || {
                        Self::handle_client(stream, sender);
                    });
                },
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                },
                Err(e) => {
                    log::warn!("Remote control listener stopped: {}", e);
                    break;
                },
            }
        }
    }

    fn handle_client(stream: UnixStream, sender: Sender<Command>) {
        // Accepted sockets inherit non-blocking on some platforms
        if let Err(e) = stream.set_nonblocking(false) {
            log::warn!("Remote client setup failed: {}", e);
            return;
        }
        let reader = BufReader::new(stream);
        for line in reader.lines().map_while(Result::ok) {
            match parse_command(&line) {
                Some(cmd) => {
                    log::debug!("Remote command {:?}", cmd);
                    if sender.send(cmd).is_err() {
                        break;
                    }
                },
                None => log::warn!("Unknown remote command '{}'", line.trim()),
            }
        }
    }

    /// Get any pending commands (non-blocking)
    pub fn poll(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Ok(cmd) = self.receiver.try_recv() {
            commands.push(cmd);
        }
        commands
    }
}

impl Drop for Controller {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(SOCKET_PATH);
    }
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim().to_lowercase().as_str() {
        "r" | "rotate" => Some(Command::Rotate),
        "s" | "scale" => Some(Command::CycleScale),
        "q" | "quit" | "exit" => Some(Command::Exit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("rotate"), Some(Command::Rotate));
        assert_eq!(parse_command(" R \n"), Some(Command::Rotate));
        assert_eq!(parse_command("Scale"), Some(Command::CycleScale));
        assert_eq!(parse_command("s"), Some(Command::CycleScale));
        assert_eq!(parse_command("exit"), Some(Command::Exit));
        assert_eq!(parse_command("q"), Some(Command::Exit));
        assert_eq!(parse_command("effect 3"), None);
        assert_eq!(parse_command(""), None);
    }
}
