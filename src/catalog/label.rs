/// Separator between the lesson number and the title in course filenames,
/// e.g. `001&002－Excuse Me`.
const PREFIX_SEPARATOR: char = '－';

fn filename_prefix(filename: &str) -> &str {
    match filename.find(PREFIX_SEPARATOR) {
        Some(i) => filename[..i].trim(),
        None => filename,
    }
}

/// Human-readable label derived from a course filename.
///
/// `"001&002－Excuse Me"` becomes `"Lesson 1&2"`, `"045－The Best"` becomes
/// `"Lesson 45"`.
pub fn lesson_label(filename: &str) -> String {
    let normalized = filename_prefix(filename).trim_start_matches('0');

    if normalized.contains('&') {
        let parts: Vec<&str> = normalized
            .split('&')
            .map(|p| p.trim_start_matches('0').trim())
            .filter(|p| !p.is_empty())
            .collect();
        if parts.len() >= 2 {
            return format!("Lesson {}", parts.join("&"));
        }
    }

    format!("Lesson {normalized}")
}
