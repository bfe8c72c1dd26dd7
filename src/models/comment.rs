use chrono::{DateTime, SecondsFormat, Utc};

fn marker(at: DateTime<Utc>) -> String {
    format!(" [DELETED {}]", at.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Appends the deletion annotation to a user comment.
pub fn mark_deleted(comment: &str, at: DateTime<Utc>) -> String {
    format!("{comment}{}", marker(at))
}

/// Removes the annotation added by [`mark_deleted`] for the same timestamp.
///
/// Returns `None` when the stored comment does not end with that annotation.
pub fn unmark_deleted(comment: &str, at: DateTime<Utc>) -> Option<&str> {
    comment.strip_suffix(marker(at).as_str())
}
