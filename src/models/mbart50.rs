/// # mBART-50 pretrained model registry
///
/// Shared under MIT license by the Facebook AI Research Fairseq team at
/// <https://github.com/pytorch/fairseq>.
pub struct Mbart50Models;

/// # mBART-50 language tables
pub struct Mbart50Languages;

impl Mbart50Models {
    pub const MANY_TO_MANY: &'static str = "facebook/mbart-large-50-many-to-many-mmt";
}

impl Mbart50Languages {
    /// The fixed 50-language set of the many-to-many checkpoint. Model
    /// codes carry an `_XX` region suffix (see `ModelFamily::lang_code`).
    pub const MANY_TO_MANY: [&'static str; 50] = [
        "ar", "cs", "de", "en", "es", "et", "fi", "fr", "gu", "hi", "it", "ja", "kk", "ko", "lt",
        "lv", "my", "ne", "nl", "ro", "ru", "si", "tr", "vi", "zh", "af", "az", "bn", "fa", "he",
        "hr", "id", "ka", "km", "mk", "ml", "mn", "mr", "pl", "ps", "pt", "sv", "sw", "ta", "te",
        "th", "tl", "uk", "ur", "xh",
    ];
}
