//! System probe: OS identity, uptime and logged-in users.

use crate::types::{LoginSession, OsIdentity, Uptime};
use crate::util::Elapsed;
use crate::{Probe, Reading};
use anyhow::{bail, Context};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, TimeZone};
use std::process::Command;
use sysinfo::System;

#[derive(Default)]
pub struct SystemProbe;

impl SystemProbe {
    pub fn new() -> Self {
        Self
    }

    fn operating_system(&self) -> anyhow::Result<OsIdentity> {
        let name = System::name().context("os name unavailable")?;
        let kernel = System::kernel_version();
        let arch = std::env::consts::ARCH.to_string();
        let platform = format!(
            "{}-{}-{}",
            name,
            kernel.as_deref().unwrap_or("unknown"),
            arch
        );
        Ok(OsIdentity {
            name,
            version: System::os_version(),
            long_version: System::long_os_version(),
            kernel,
            arch,
            platform,
        })
    }

    fn uptime(&self) -> anyhow::Result<Uptime> {
        let secs = System::uptime();
        if secs == 0 {
            bail!("uptime unavailable");
        }
        Ok(Elapsed::from_secs(secs))
    }

    fn users(&self) -> anyhow::Result<Vec<LoginSession>> {
        let out = Command::new("who").output().context("running who")?;
        if !out.status.success() {
            bail!("who exited with {}", out.status);
        }
        Ok(parse_who(&String::from_utf8_lossy(&out.stdout)))
    }
}

impl Probe for SystemProbe {
    fn name(&self) -> &'static str {
        "system"
    }

    fn read(&mut self) -> Vec<Reading> {
        vec![
            Reading::capture("os", self.operating_system()),
            Reading::capture("uptime", self.uptime()),
            Reading::capture("users", self.users()),
        ]
    }
}

/// Parse `who` output. Understands the GNU (`2026-10-18 09:12`) and BSD
/// (`Oct 18 09:12`) login time layouts; a trailing `(host)` is the remote host.
pub fn parse_who(text: &str) -> Vec<LoginSession> {
    text.lines().filter_map(parse_who_line).collect()
}

fn parse_who_line(line: &str) -> Option<LoginSession> {
    let mut toks: Vec<&str> = line.split_whitespace().collect();
    let host = match toks.last().copied() {
        Some(t) if t.starts_with('(') && t.ends_with(')') => {
            toks.pop();
            Some(t.trim_start_matches('(').trim_end_matches(')').to_string())
                .filter(|h| !h.is_empty())
        }
        _ => None,
    };
    if toks.len() < 2 {
        return None;
    }
    let started = parse_login_time(&toks[2..]);
    Some(LoginSession {
        user_name: toks[0].to_string(),
        terminal: toks[1].to_string(),
        host,
        started,
    })
}

fn parse_login_time(toks: &[&str]) -> Option<chrono::DateTime<Local>> {
    let naive = match toks {
        [date, time, ..] if date.contains('-') => {
            NaiveDateTime::parse_from_str(&format!("{date} {time}"), "%Y-%m-%d %H:%M").ok()?
        }
        [mon, day, time, ..] => {
            let year = Local::now().year();
            let date =
                NaiveDate::parse_from_str(&format!("{year} {mon} {day}"), "%Y %b %d").ok()?;
            let t = chrono::NaiveTime::parse_from_str(time, "%H:%M").ok()?;
            date.and_time(t)
        }
        _ => return None,
    };
    Local.from_local_datetime(&naive).single()
}
