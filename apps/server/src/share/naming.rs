use chrono::{DateTime, Utc};
use rand::distr::{Alphanumeric, SampleString};

/// Longest kept stem of the original filename
const MAX_STEM_LEN: usize = 50;

/// Builds the object name a file is stored under:
/// `<clean stem>_<last 8 digits of epoch millis>_<4 random chars>.<ext>`
///
/// The stem keeps ASCII letters, digits, spaces and `-_()[]`; runs of
/// whitespace become a single `_`.
pub fn storage_filename(original: &str, now: DateTime<Utc>) -> String {
    let suffix = Alphanumeric
        .sample_string(&mut rand::rng(), 4)
        .to_ascii_lowercase();
    build_storage_filename(original, now, &suffix)
}

fn build_storage_filename(original: &str, now: DateTime<Utc>, suffix: &str) -> String {
    let (stem, ext) = split_extension(original);

    let mut clean = clean_stem(stem);
    if clean.is_empty() {
        clean = "file".to_string();
    }

    let millis = now.timestamp_millis().to_string();
    let stamp = &millis[millis.len().saturating_sub(8)..];

    match ext.map(clean_extension).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{clean}_{stamp}_{suffix}.{ext}"),
        None => format!("{clean}_{stamp}_{suffix}"),
    }
}

fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(0) | None => (name, None),
        Some(idx) => (&name[..idx], Some(&name[idx + 1..])),
    }
}

fn clean_stem(stem: &str) -> String {
    let kept: String = stem
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || "-_()[]".contains(*c))
        .collect();

    kept.split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .take(MAX_STEM_LEN)
        .collect()
}

fn clean_extension(ext: &str) -> String {
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(16)
        .collect::<String>()
        .to_ascii_lowercase()
}
