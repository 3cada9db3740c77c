//! # Model families
//!
//! Registries for the supported translation model families. Each family
//! carries a model-id builder, a language-code mapper and a known language
//! table. Opus-MT publishes one model per language pair; mBART-50 and
//! M2M-100 are single multilingual checkpoints shared across pairs.

mod m2m100;
mod mbart50;
mod opus_mt;

pub use m2m100::{M2m100Languages, M2m100Models};
pub use mbart50::{Mbart50Languages, Mbart50Models};
pub use opus_mt::{OpusMtLanguages, OpusMtModels};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::NmtError;

/// # Translation model family
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelFamily {
    #[serde(rename = "opus-mt")]
    OpusMt,
    #[serde(rename = "mbart50")]
    Mbart50,
    #[serde(rename = "m2m100")]
    M2m100,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::OpusMt => "opus-mt",
            ModelFamily::Mbart50 => "mbart50",
            ModelFamily::M2m100 => "m2m100",
        }
    }

    /// Concrete model identifier for a language pair.
    pub fn model_id(&self, src: &str, tgt: &str) -> String {
        match self {
            ModelFamily::OpusMt => OpusMtModels::model_id(src, tgt),
            ModelFamily::Mbart50 => Mbart50Models::MANY_TO_MANY.to_string(),
            ModelFamily::M2m100 => M2m100Models::M2M100_418M.to_string(),
        }
    }

    /// Model-specific language code for a plain ISO 639-1 code.
    pub fn lang_code(&self, lang: &str) -> String {
        match self {
            ModelFamily::OpusMt => lang.to_string(),
            ModelFamily::Mbart50 => format!("{lang}_XX"),
            ModelFamily::M2m100 => lang.to_string(),
        }
    }

    /// Language table the family is known to cover. Opus-MT support is
    /// open-ended (one model per published pair), so its table only lists
    /// the codes commonly available and actual support is established by
    /// the loader.
    pub fn known_languages(&self) -> &'static [&'static str] {
        match self {
            ModelFamily::OpusMt => &OpusMtLanguages::COMMON,
            ModelFamily::Mbart50 => &Mbart50Languages::MANY_TO_MANY,
            ModelFamily::M2m100 => &M2m100Languages::M2M100_418M,
        }
    }

    /// Whether the family nominally supports a pair. Opus-MT always passes
    /// the static filter; the loader is the authority for it.
    pub fn supports_pair(&self, src: &str, tgt: &str) -> bool {
        match self {
            ModelFamily::OpusMt => true,
            ModelFamily::Mbart50 | ModelFamily::M2m100 => {
                let langs = self.known_languages();
                langs.contains(&src) && langs.contains(&tgt)
            }
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelFamily {
    type Err = NmtError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "opus-mt" | "opus_mt" | "opusmt" => Ok(ModelFamily::OpusMt),
            "mbart50" | "mbart-50" | "mbart" => Ok(ModelFamily::Mbart50),
            "m2m100" | "m2m-100" | "m2m_100" => Ok(ModelFamily::M2m100),
            other => Err(NmtError::ValueError(format!(
                "Unknown model family: {other}"
            ))),
        }
    }
}
