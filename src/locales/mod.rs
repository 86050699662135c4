//! Locale handling for Scout
//!
//! The aggregator only ever passes one of a fixed set of locale tags to the
//! provider adapters. Each adapter translates the tag into its own syntax.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported locale tags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    #[serde(rename = "en")]
    En,
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "de")]
    De,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "fr")]
    Fr,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "es")]
    Es,
    #[serde(rename = "es-ES")]
    EsEs,
    #[serde(rename = "it")]
    It,
    #[serde(rename = "it-IT")]
    ItIt,
    #[serde(rename = "nl-NL")]
    NlNl,
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "pt-PT")]
    PtPt,
    #[serde(rename = "pl-PL")]
    PlPl,
    #[serde(rename = "ru-RU")]
    RuRu,
    #[serde(rename = "ja-JP")]
    JaJp,
    #[serde(rename = "zh-CN")]
    ZhCn,
}

/// Every supported locale, in display order
pub const SUPPORTED_LOCALES: &[Locale] = &[
    Locale::En,
    Locale::EnUs,
    Locale::EnGb,
    Locale::De,
    Locale::DeDe,
    Locale::Fr,
    Locale::FrFr,
    Locale::Es,
    Locale::EsEs,
    Locale::It,
    Locale::ItIt,
    Locale::NlNl,
    Locale::PtBr,
    Locale::PtPt,
    Locale::PlPl,
    Locale::RuRu,
    Locale::JaJp,
    Locale::ZhCn,
];

impl Locale {
    /// The canonical tag, e.g. `en-US` or `de`
    pub fn tag(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::De => "de",
            Self::DeDe => "de-DE",
            Self::Fr => "fr",
            Self::FrFr => "fr-FR",
            Self::Es => "es",
            Self::EsEs => "es-ES",
            Self::It => "it",
            Self::ItIt => "it-IT",
            Self::NlNl => "nl-NL",
            Self::PtBr => "pt-BR",
            Self::PtPt => "pt-PT",
            Self::PlPl => "pl-PL",
            Self::RuRu => "ru-RU",
            Self::JaJp => "ja-JP",
            Self::ZhCn => "zh-CN",
        }
    }

    /// Lowercase language part of the tag
    pub fn language(&self) -> &'static str {
        self.tag().split('-').next().unwrap_or("en")
    }

    /// Region part of the tag, if the tag has one
    pub fn region(&self) -> Option<&'static str> {
        self.tag().split('-').nth(1)
    }

    /// Region to assume for providers that always need one
    pub fn default_region(&self) -> &'static str {
        if let Some(region) = self.region() {
            return region;
        }
        match self.language() {
            "en" => "US",
            "de" => "DE",
            "fr" => "FR",
            "es" => "ES",
            "it" => "IT",
            _ => "US",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Error returned for tags outside the supported set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale: {0}")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    /// Case-insensitive; accepts `_` as the separator as well
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        SUPPORTED_LOCALES
            .iter()
            .copied()
            .find(|locale| locale.tag().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| UnknownLocale(s.to_string()))
    }
}
