//! Interactive loop.
//!
//! Stdin is read on a helper thread because a terminal read cannot be
//! polled portably; every session call still happens on this thread.

use anyhow::Result;
use picochat_client::{
    ChatSession, ClientConfig, CycleOutcome, HttpTransport, Input, SystemMemory, TickReport,
};
use std::io::BufRead;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::render::{format_history, format_status, parse_line, LineCommand};

/// Longest wait between ticks, so the status line stays fresh.
const MAX_WAIT: Duration = Duration::from_secs(1);

/// Run the interactive loop until `/quit` or end of input.
pub fn run(config: &ClientConfig) -> Result<()> {
    let transport = HttpTransport::new(config);
    let mut session = ChatSession::new(config, transport, SystemMemory::new());

    let (tx, rx) = mpsc::channel::<String>();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("picochat: type a line and press enter to send; /retry, /cancel, /quit");

    let clock = Instant::now();
    let now_ms = || u64::try_from(clock.elapsed().as_millis()).unwrap_or(u64::MAX);
    let mut last_status = None;

    loop {
        let wait = Duration::from_millis(session.next_due_ms(now_ms())).min(MAX_WAIT);
        let input = match rx.recv_timeout(wait) {
            Ok(line) => match parse_line(&line) {
                Some(LineCommand::Quit) => break,
                Some(LineCommand::Input(input)) => {
                    if held_back(session.is_composing(), &input) {
                        println!("a failed message is still pending: /retry or /cancel first");
                        continue;
                    }
                    Some(input)
                }
                None => continue,
            },
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let report = session.tick(now_ms(), input);
        if needs_redraw(&report) {
            print!("{}", format_history(session.history()));
        }
        if let Some(send) = &report.send {
            if let Err(e) = &send.result {
                println!("send failed: {} (/retry or /cancel)", e);
            }
        }

        let status = session.status();
        if last_status != Some(status) {
            println!("{}", format_status(status));
            last_status = Some(status);
        }
    }

    Ok(())
}

fn needs_redraw(report: &TickReport) -> bool {
    matches!(
        report.sync,
        Some(CycleOutcome::Synced { appended, .. }) if appended > 0
    )
}

/// A new line while a failed draft is kept would be appended to it.
fn held_back(composing: bool, input: &Input) -> bool {
    composing && matches!(input, Input::Line(_))
}
