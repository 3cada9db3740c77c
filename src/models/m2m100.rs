/// # M2M-100 pretrained model registry
///
/// Shared under MIT license by the Facebook AI Research Fairseq team at
/// <https://github.com/pytorch/fairseq>.
pub struct M2m100Models;

/// # M2M-100 language tables
pub struct M2m100Languages;

impl M2m100Models {
    pub const M2M100_418M: &'static str = "facebook/m2m100_418M";
    pub const M2M100_1_2B: &'static str = "facebook/m2m100_1.2B";
}

impl M2m100Languages {
    /// The fixed 100-language set shared by the 418M and 1.2B checkpoints.
    pub const M2M100_418M: [&'static str; 100] = [
        "af", "am", "ar", "ast", "az", "ba", "be", "bg", "bn", "br", "bs", "ca", "ceb", "cs", "cy",
        "da", "de", "el", "en", "es", "et", "fa", "ff", "fi", "fr", "fy", "ga", "gd", "gl", "gu",
        "ha", "he", "hi", "hr", "ht", "hu", "hy", "id", "ig", "ilo", "is", "it", "ja", "jv", "ka",
        "kk", "km", "kn", "ko", "lb", "lg", "ln", "lo", "lt", "lv", "mg", "mk", "ml", "mn", "mr",
        "ms", "my", "ne", "nl", "no", "ns", "oc", "or", "pa", "pl", "ps", "pt", "ro", "ru", "sd",
        "si", "sk", "sl", "so", "sq", "sr", "ss", "su", "sv", "sw", "ta", "th", "tl", "tn", "tr",
        "uk", "ur", "uz", "vi", "wo", "xh", "yi", "yo", "zh", "zu",
    ];
}
