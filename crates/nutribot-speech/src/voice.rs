//! Locale mapping and voice selection.

use nutribot_core::types::LanguageCode;

use crate::engine::Voice;

/// Speech locale for a language code. Unknown codes speak as `en-US`.
pub fn locale_for(language: &LanguageCode) -> &'static str {
    match language.as_str() {
        "hi" => "hi-IN",
        "te" => "te-IN",
        _ => "en-US",
    }
}

fn normalize_locale(locale: &str) -> String {
    locale.trim().replace('_', "-").to_ascii_lowercase()
}

/// Pick a voice for `language`.
///
/// Preference order:
/// 1. a voice whose locale matches the language's speech locale
/// 2. a voice whose primary subtag is the language (`hi` for `hi-IN`)
/// 3. any voice whose name contains one of `quality_markers`
/// 4. `None`, meaning the engine default
pub fn resolve_voice<'a>(
    voices: &'a [Voice],
    language: &LanguageCode,
    quality_markers: &[String],
) -> Option<&'a Voice> {
    let wanted = normalize_locale(locale_for(language));
    let primary = language.as_str().split(['-', '_']).next().unwrap_or_default();

    voices
        .iter()
        .find(|v| normalize_locale(&v.locale) == wanted)
        .or_else(|| {
            voices
                .iter()
                .find(|v| normalize_locale(&v.locale).split('-').next() == Some(primary))
        })
        .or_else(|| {
            voices.iter().find(|v| {
                quality_markers
                    .iter()
                    .any(|marker| !marker.is_empty() && v.name.contains(marker.as_str()))
            })
        })
}
