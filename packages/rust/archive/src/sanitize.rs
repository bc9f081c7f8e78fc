//! Label → folder name.

use pdfsorter_shared::UNKNOWN_FOLDER;

/// Reduce a label to characters safe in a folder name.
///
/// Keeps alphanumerics (any script), space, `_` and `-`, then trims.
/// A label with nothing left becomes `"Unknown"`.
pub fn sanitize_folder_name(label: &str) -> String {
    let kept: String = label
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '_' | '-'))
        .collect();

    let trimmed = kept.trim();
    if trimmed.is_empty() {
        UNKNOWN_FOLDER.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_disallowed_characters() {
        assert_eq!(sanitize_folder_name("Finance/Q3!"), "FinanceQ3");
        assert_eq!(sanitize_folder_name("Tax_Return - 2023"), "Tax_Return - 2023");
        assert_eq!(sanitize_folder_name("../../etc"), "etc");
    }

    #[test]
    fn keeps_non_ascii_letters() {
        assert_eq!(sanitize_folder_name("Données: été"), "Données été");
    }

    #[test]
    fn empty_result_becomes_unknown() {
        assert_eq!(sanitize_folder_name(""), "Unknown");
        assert_eq!(sanitize_folder_name("***"), "Unknown");
        assert_eq!(sanitize_folder_name("  / "), "Unknown");
    }

    #[test]
    fn trims_surrounding_space() {
        assert_eq!(sanitize_folder_name("  Travel!  "), "Travel");
    }
}
