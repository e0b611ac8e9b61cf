//! Schedule a WhatsApp message through WhatsApp Web.
//!
//! At the requested local time the system browser is pointed at a
//! pre-filled `web.whatsapp.com/send` URL. The scheduled task lives in the
//! current process, so the message is lost if the agent exits first.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime, TimeZone};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

use crate::tools::{optional_u64, required_str, Tool, ToolArgs, ToolContext};

pub struct WhatsAppTool {
    opener: PathBuf,
}

impl WhatsAppTool {
    pub fn discover() -> Result<Self> {
        let candidates: &[&str] = if cfg!(target_os = "windows") {
            &["explorer"]
        } else if cfg!(target_os = "macos") {
            &["open"]
        } else {
            &["xdg-open", "gio"]
        };

        let opener = candidates
            .iter()
            .find_map(|c| which::which(c).ok())
            .ok_or_else(|| anyhow::anyhow!("no URL opener found (tried {})", candidates.join(", ")))?;
        Ok(Self { opener })
    }

    fn open_command(&self, url: &str) -> Command {
        let mut cmd = Command::new(&self.opener);
        if self.opener.file_stem().map_or(false, |s| s == "gio") {
            cmd.arg("open");
        }
        cmd.arg(url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

/// Phone numbers must carry a `+` country code and digits only
fn validate_phone(phone: &str) -> Result<String> {
    let cleaned: String = phone.chars().filter(|c| !c.is_whitespace() && *c != '-').collect();
    let digits = cleaned
        .strip_prefix('+')
        .ok_or_else(|| anyhow::anyhow!("Country code missing from phone number '{}'", phone))?;
    if digits.len() < 7 || !digits.chars().all(|c| c.is_ascii_digit()) {
        bail!("Invalid phone number '{}'", phone);
    }
    Ok(cleaned)
}

fn send_url(phone: &str, message: &str) -> String {
    format!(
        "https://web.whatsapp.com/send?phone={}&text={}",
        urlencoding::encode(phone.trim_start_matches('+')),
        urlencoding::encode(message)
    )
}

/// Next local instant at `hour:minute`, today if still ahead, else tomorrow
fn next_occurrence(now: DateTime<Local>, hour: u32, minute: u32) -> Result<DateTime<Local>> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| anyhow::anyhow!("Invalid time {}:{:02}", hour, minute))?;

    let mut date = now.date_naive();
    if now.time() >= time {
        date = date.succ_opt().context("date overflow")?;
    }
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("{}:{:02} does not exist in the local timezone", hour, minute))
}

#[async_trait]
impl Tool for WhatsAppTool {
    fn name(&self) -> &str {
        "send_whatsapp_message"
    }

    fn description(&self) -> &str {
        "Sends a WhatsApp message to a given phone number. Args: phone_no (str), message (str), hour (int), minute (int). The phone number must be a string with the country code."
    }

    async fn execute(&self, args: &ToolArgs, _ctx: &ToolContext) -> Result<String> {
        let phone = validate_phone(required_str(args, "phone_no")?)?;
        let message = required_str(args, "message")?;
        let hour = optional_u64(args, "hour")
            .ok_or_else(|| anyhow::anyhow!("Missing required parameter: hour"))?;
        let minute = optional_u64(args, "minute")
            .ok_or_else(|| anyhow::anyhow!("Missing required parameter: minute"))?;
        if hour > 23 || minute > 59 {
            bail!("Invalid time {}:{:02}", hour, minute);
        }

        let at = next_occurrence(Local::now(), hour as u32, minute as u32)?;
        let delay = (at - Local::now())
            .max(ChronoDuration::zero())
            .to_std()
            .unwrap_or_default();

        info!(phone = %phone, at = %at, "Scheduling WhatsApp message");

        let mut cmd = self.open_command(&send_url(&phone, message));
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match cmd.status().await {
                Ok(status) if status.success() => info!("Opened WhatsApp Web"),
                Ok(status) => warn!(%status, "URL opener exited with failure"),
                Err(e) => warn!(error = %e, "Failed to launch URL opener"),
            }
        });

        Ok(format!(
            "WhatsApp message scheduled to be sent to {} at {}:{:02}.",
            phone, hour, minute
        ))
    }
}
