use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LivePlatform {
    Bilibili,
    Douyin,
    Douyu,
    Huya,
}

impl LivePlatform {
    pub const ALL: [LivePlatform; 4] = [
        LivePlatform::Bilibili,
        LivePlatform::Douyin,
        LivePlatform::Douyu,
        LivePlatform::Huya,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LivePlatform::Bilibili => "bilibili",
            LivePlatform::Douyin => "douyin",
            LivePlatform::Douyu => "douyu",
            LivePlatform::Huya => "huya",
        }
    }
}

impl fmt::Display for LivePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for LivePlatform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bilibili" | "bili" => Ok(LivePlatform::Bilibili),
            "douyin" => Ok(LivePlatform::Douyin),
            "douyu" => Ok(LivePlatform::Douyu),
            "huya" => Ok(LivePlatform::Huya),
            other => Err(format!(
                "Unknown platform '{}'. Valid platforms: bilibili, douyin, douyu, huya",
                other
            )),
        }
    }
}
