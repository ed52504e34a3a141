mod common;

use std::process::Command;
use std::time::{Duration, Instant};

use anyhow::Result;

#[cfg(unix)]
#[test]
fn watchdog_stops_target_once_parent_exits() -> Result<()> {
    let mut parent = Command::new("sleep").arg("1").spawn()?;
    let mut target = Command::new("sleep").arg("60").spawn()?;
    let mut watchdog = common::stop_when_gone(parent.id(), target.id())?;

    // Reaped, so `kill -0` stops seeing it
    parent.wait()?;

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = target.try_wait()? {
            break status;
        }
        if Instant::now() > deadline {
            let _ = target.kill();
            anyhow::bail!("target outlived its parent");
        }
        std::thread::sleep(Duration::from_millis(100));
    };
    assert!(!status.success());
    watchdog.wait()?;
    Ok(())
}
