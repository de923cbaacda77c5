// Minimal integration test that drives the compiled binary through a PTY.
// Exercises the real event loop and crossterm input handling end to end.
//
// Notes:
// - Requires a TTY; uses expectrl which allocates a pseudo terminal.
// - Unix-only and ignored by default to avoid CI/platform issues.
// - Run manually via: `cargo test --test integration_min_session -- --ignored`.

#![cfg(unix)]

use std::time::Duration;

use expectrl::{spawn, Eof};

#[test]
#[ignore]
fn minimal_quiz_completes_and_exits() -> Result<(), Box<dyn std::error::Error>> {
    let bin = assert_cmd::cargo::cargo_bin("quizdeck");
    let cmd = format!("{} --quiz sample --no-history", bin.display());

    let mut p = spawn(cmd)?;
    std::thread::sleep(Duration::from_millis(200));

    // start, then answer all three questions with Enter after each choice
    p.send("\r")?;
    for choice in ["2", "3", "3"] {
        p.send(choice)?;
        p.send("\r")?;
        std::thread::sleep(Duration::from_millis(50));
    }

    p.expect("100%")?;

    p.send("\x1b")?; // ESC
    p.expect(Eof)?;
    Ok(())
}
