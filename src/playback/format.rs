//! Container format classification for resolved stream URLs.
//!
//! Each rule maps a pattern over a lower-cased URL or format hint to a
//! container. Rules for every platform are tried before the common rules.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::external::live::LivePlatform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Flv,
    M3u8,
}

impl ContainerFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContainerFormat::Flv => "flv",
            ContainerFormat::M3u8 => "m3u8",
        }
    }
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const COMMON_RULES: &[(&str, ContainerFormat)] = &[
    (r"\.m3u8(\?|$)", ContainerFormat::M3u8),
    (r"\.ts(\?|$)", ContainerFormat::M3u8),
    (r"^(hls|m3u8|ts|fmp4)$", ContainerFormat::M3u8),
    (r"\.flv(\?|$)", ContainerFormat::Flv),
    (r"^(flv|http-flv)$", ContainerFormat::Flv),
];

const DOUYIN_RULES: &[(&str, ContainerFormat)] = &[
    (r"pull-hls", ContainerFormat::M3u8),
    (r"pull-flv", ContainerFormat::Flv),
    // the backend relay serves flv under /live.flv
    (r"^https?://127\.0\.0\.1(:\d+)?/live\.flv", ContainerFormat::Flv),
];

const BILIBILI_RULES: &[(&str, ContainerFormat)] = &[
    (r"[?&]format=(ts|fmp4)\b", ContainerFormat::M3u8),
    (r"/live-bvc/.*\.flv", ContainerFormat::Flv),
];

const HUYA_RULES: &[(&str, ContainerFormat)] = &[(r"\.flv\.huya\.com/", ContainerFormat::Flv)];

const DOUYU_RULES: &[(&str, ContainerFormat)] =
    &[(r"douyucdn\d*\.cn/.*\.flv", ContainerFormat::Flv)];

struct FormatRule {
    pattern: Regex,
    format: ContainerFormat,
}

/// Table-driven URL classifier for one platform.
pub struct FormatClassifier {
    platform: LivePlatform,
    rules: Vec<FormatRule>,
    /// Format the player must use regardless of what the candidates suggest
    forced: Option<ContainerFormat>,
}

impl FormatClassifier {
    pub fn for_platform(platform: LivePlatform) -> Self {
        let (platform_rules, forced) = match platform {
            LivePlatform::Douyin => (DOUYIN_RULES, None),
            LivePlatform::Bilibili => (BILIBILI_RULES, None),
            LivePlatform::Huya => (HUYA_RULES, Some(ContainerFormat::Flv)),
            LivePlatform::Douyu => (DOUYU_RULES, Some(ContainerFormat::Flv)),
        };
        let rules = platform_rules
            .iter()
            .chain(COMMON_RULES)
            .filter_map(|(pattern, format)| match Regex::new(pattern) {
                Ok(pattern) => Some(FormatRule {
                    pattern,
                    format: *format,
                }),
                Err(e) => {
                    tracing::error!(%platform, pattern, error = %e, "Invalid format rule skipped");
                    None
                }
            })
            .collect();
        Self {
            platform,
            rules,
            forced,
        }
    }

    /// Format indicated by a single candidate, if any rule matches it.
    pub fn classify_one(&self, candidate: &str) -> Option<ContainerFormat> {
        let candidate = candidate.trim().to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(&candidate))
            .map(|rule| rule.format)
    }

    /// `M3u8` when any candidate indicates HLS, else `Flv` when any indicates
    /// FLV, else `None`.
    pub fn classify<'a>(&self, candidates: impl IntoIterator<Item = &'a str>) -> Option<ContainerFormat> {
        let mut found = None;
        for candidate in candidates {
            match self.classify_one(candidate) {
                Some(ContainerFormat::M3u8) => return Some(ContainerFormat::M3u8),
                Some(ContainerFormat::Flv) => found = Some(ContainerFormat::Flv),
                None => {}
            }
        }
        found
    }

    /// Like [`classify`](Self::classify), falling back to `Flv` with a warning.
    pub fn classify_or_default<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a str>,
    ) -> ContainerFormat {
        let candidates: Vec<&str> = candidates.into_iter().collect();
        let detected = self.classify(candidates.iter().copied());

        if let Some(forced) = self.forced {
            if detected.is_some_and(|d| d != forced) {
                tracing::warn!(
                    platform = %self.platform,
                    ?detected,
                    %forced,
                    "Detected container overridden for platform"
                );
            }
            return forced;
        }

        detected.unwrap_or_else(|| {
            tracing::warn!(
                platform = %self.platform,
                ?candidates,
                "Could not determine stream container, defaulting to flv"
            );
            ContainerFormat::Flv
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_rules_compile() {
        let douyin = FormatClassifier::for_platform(LivePlatform::Douyin);
        assert_eq!(douyin.rules.len(), DOUYIN_RULES.len() + COMMON_RULES.len());
        let bilibili = FormatClassifier::for_platform(LivePlatform::Bilibili);
        assert_eq!(bilibili.rules.len(), BILIBILI_RULES.len() + COMMON_RULES.len());
        let huya = FormatClassifier::for_platform(LivePlatform::Huya);
        assert_eq!(huya.rules.len(), HUYA_RULES.len() + COMMON_RULES.len());
        let douyu = FormatClassifier::for_platform(LivePlatform::Douyu);
        assert_eq!(douyu.rules.len(), DOUYU_RULES.len() + COMMON_RULES.len());
    }

    #[test]
    fn test_hls_wins_over_flv() {
        let classifier = FormatClassifier::for_platform(LivePlatform::Bilibili);
        let format = classifier.classify([
            "https://cn-gotcha.bilivideo.com/live-bvc/1.flv",
            "ts",
        ]);
        assert_eq!(format, Some(ContainerFormat::M3u8));
    }

    #[test]
    fn test_case_insensitive_hints() {
        let classifier = FormatClassifier::for_platform(LivePlatform::Bilibili);
        assert_eq!(classifier.classify_one("HLS"), Some(ContainerFormat::M3u8));
        assert_eq!(
            classifier.classify_one("https://x.com/Live/INDEX.M3U8?expires=1"),
            Some(ContainerFormat::M3u8)
        );
    }

    #[test]
    fn test_douyin_local_relay_is_flv() {
        let classifier = FormatClassifier::for_platform(LivePlatform::Douyin);
        assert_eq!(
            classifier.classify_or_default(["http://127.0.0.1:34719/live.flv"]),
            ContainerFormat::Flv
        );
        assert_eq!(
            classifier.classify_or_default(["https://pull-hls-l1.douyincdn.com/stage/x/index"]),
            ContainerFormat::M3u8
        );
    }

    #[test]
    fn test_unknown_defaults_to_flv() {
        let classifier = FormatClassifier::for_platform(LivePlatform::Bilibili);
        assert_eq!(classifier.classify(["https://example.com/stream"]), None);
        assert_eq!(
            classifier.classify_or_default(["https://example.com/stream"]),
            ContainerFormat::Flv
        );
    }

    #[test]
    fn test_douyu_forces_flv() {
        let classifier = FormatClassifier::for_platform(LivePlatform::Douyu);
        assert_eq!(
            classifier.classify_or_default(["https://hls3-akm.douyucdn.cn/live/1.m3u8", "m3u8"]),
            ContainerFormat::Flv
        );
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&ContainerFormat::M3u8).unwrap(), "\"m3u8\"");
        assert_eq!(ContainerFormat::Flv.to_string(), "flv");
    }
}
