//! `livehub check`: validate configuration and print what would be used.

use std::fmt::Write;

use crate::config::settings::Settings;
use crate::error::AppResult;
use crate::external::live::LivePlatform;

pub struct CheckCommandHandler {
    settings: Settings,
}

impl CheckCommandHandler {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub async fn execute(&self) -> AppResult<()> {
        self.settings.validate()?;
        tracing::info!("Configuration is valid");
        print!("{}", self.summary());
        Ok(())
    }

    pub fn summary(&self) -> String {
        let s = &self.settings;
        let mut out = String::new();

        // writing into a String cannot fail
        let _ = writeln!(out, "{} {}", s.application.name, s.application.version);
        let _ = writeln!(out, "  log level:        {}", s.logger.level);
        let _ = writeln!(
            out,
            "  log file:         {}",
            if s.logger.file.enabled {
                s.logger.file.path.as_str()
            } else {
                "disabled"
            }
        );
        for platform in LivePlatform::ALL {
            let _ = writeln!(
                out,
                "  page size {:<9} {}",
                format!("{}:", platform),
                s.pager.page_size(platform)
            );
        }
        let _ = writeln!(out, "  default quality:  {}", s.playback.default_quality);
        let _ = writeln!(
            out,
            "  stream retries:   {} (delay {}ms)",
            s.playback.max_retries, s.playback.retry_delay_ms
        );
        let _ = writeln!(out, "  chat buffer:      {}", s.danmaku.buffer_capacity);
        let _ = writeln!(out, "  follow store:     {}", s.follows.store_path);
        let _ = writeln!(
            out,
            "  follow refresh:   {}",
            if s.follows.refresh_enabled {
                s.follows.refresh_cron.as_str()
            } else {
                "disabled"
            }
        );
        out
    }
}
