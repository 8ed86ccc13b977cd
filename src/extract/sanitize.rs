//! Filesystem-safe attachment names.

/// Make `name` safe to use as a single file name, keeping its extension.
///
/// The text after the last `.` is the extension. Everything before it is
/// the base: its segments are joined with `-` and every run of characters
/// outside `[A-Za-z0-9]` collapses to one `-`.
///
/// A name without any `.` is sanitized as a base with no extension.
/// Path separators and NUL in the extension become `-` so the result never
/// leaves the directory it is written to.
///
/// ```
/// use mboxsplit::extract::sanitize::sanitize_filename;
///
/// assert_eq!(sanitize_filename("mail-3-report (final).pdf"), "mail-3-report-final-.pdf");
/// assert_eq!(sanitize_filename("mail-0-archive.tar.gz"), "mail-0-archive-tar.gz");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((base, extension)) => {
            let extension: String = extension
                .chars()
                .map(|c| if matches!(c, '/' | '\\' | '\0') { '-' } else { c })
                .collect();
            format!("{}.{}", collapse_non_alphanumeric(base), extension)
        }
        None => collapse_non_alphanumeric(name),
    }
}

/// Replace every run of non-ASCII-alphanumeric characters with a single `-`.
fn collapse_non_alphanumeric(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_run = false;
    for c in s.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_runs_and_keeps_extension() {
        assert_eq!(
            sanitize_filename("mail-3-report (final).pdf"),
            "mail-3-report-final-.pdf"
        );
    }

    #[test]
    fn test_inner_dots_join_the_base() {
        assert_eq!(sanitize_filename("mail-1-a.b.c.txt"), "mail-1-a-b-c.txt");
    }

    #[test]
    fn test_non_ascii_collapses() {
        assert_eq!(sanitize_filename("mail-2-café menü.doc"), "mail-2-caf-men-.doc");
    }

    #[test]
    fn test_extension_kept_verbatim() {
        assert_eq!(sanitize_filename("mail-0-photo.JPEG"), "mail-0-photo.JPEG");
        assert_eq!(sanitize_filename("mail-0-x.tar gz"), "mail-0-x.tar gz");
    }

    #[test]
    fn test_no_dot_has_no_extension() {
        assert_eq!(sanitize_filename("mail-4-README"), "mail-4-README");
        assert_eq!(sanitize_filename("mail-4-read me!"), "mail-4-read-me-");
    }

    #[test]
    fn test_trailing_and_leading_dot() {
        assert_eq!(sanitize_filename("mail-5-notes."), "mail-5-notes.");
        assert_eq!(sanitize_filename(".hidden"), ".hidden");
    }

    #[test]
    fn test_separators_cannot_escape() {
        let name = sanitize_filename("mail-6-evil.x/../../etc/passwd");
        assert!(!name.contains('/'));
        let name = sanitize_filename("mail-6-../../passwd");
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_deterministic() {
        let a = sanitize_filename("mail-7-Scan 2024 #3.png");
        let b = sanitize_filename("mail-7-Scan 2024 #3.png");
        assert_eq!(a, b);
        assert_eq!(a, "mail-7-Scan-2024-3.png");
    }
}
