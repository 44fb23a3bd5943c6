//! Interactive session: gate first, then follow the log.

use super::{input, read_line, render_update, HttpSession, Input};
use chatlog_client::{ClientConfig, GateState, Secret};
use std::time::Duration;

/// Runs the moderation gate on stdin, then prints the log whenever a new
/// snapshot arrives until Ctrl-C.
pub async fn run(config: ClientConfig, skip_gate: bool) -> Result<(), Box<dyn std::error::Error>> {
    let session = HttpSession::connect(config)?;

    if skip_gate {
        session.gate().decline()?;
    } else {
        run_gate(&session, &mut input()).await?;
    }

    let refresh = session.config().poll_interval / 4;
    let mut ticker = tokio::time::interval(refresh.max(Duration::from_millis(50)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut shown = None;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let version = session.store().version();
                if shown != Some(version) {
                    shown = Some(version);
                    print!("{}", render_update(&session.messages()));
                }
            }
        }
    }

    session.shutdown();
    Ok(())
}

async fn run_gate(
    session: &HttpSession,
    input: &mut Input,
) -> Result<(), Box<dyn std::error::Error>> {
    let gate = session.gate();

    println!("Clear all messages before starting? [y/N]");
    let answer = read_line(input).await?.unwrap_or_default();
    if !answer.trim().eq_ignore_ascii_case("y") {
        gate.decline()?;
        return Ok(());
    }

    gate.begin_clear()?;
    while gate.state() == GateState::AwaitingSecret {
        println!("Password (empty line to cancel):");
        let line = match read_line(input).await? {
            Some(line) if !line.is_empty() => line,
            _ => {
                gate.cancel()?;
                break;
            }
        };

        match gate.submit(Secret::from(line)).await {
            Ok(()) => println!("✓ All messages cleared"),
            Err(e) if e.is_authorization_failure() => println!("Invalid password"),
            Err(e) => println!("Clear failed: {}", e),
        }
    }
    Ok(())
}
