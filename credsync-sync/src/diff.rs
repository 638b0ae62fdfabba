//! Equality and diff primitives for realm lists.

use similar::TextDiff;

use credsync_core::RealmGroup;

/// Ordered, element-wise equality of two string sequences.
pub fn deep_sequence_equals<A, B>(a: &[A], b: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.as_ref() == y.as_ref())
}

/// Whether `destination` must be replaced by `source`.
///
/// A length mismatch is stale without looking at the groups. Otherwise groups
/// are compared in source order and the first mismatch decides.
pub fn realms_are_stale(source: &[RealmGroup], destination: &[RealmGroup]) -> bool {
    if source.len() != destination.len() {
        return true;
    }
    source
        .iter()
        .zip(destination)
        .any(|(s, d)| !deep_sequence_equals(s, d))
}

/// Unified diff between the pretty-printed JSON of two realm lists.
///
/// Returns an empty string when the lists serialize identically.
pub fn unified_realms_diff(
    current: &[RealmGroup],
    proposed: &[RealmGroup],
) -> Result<String, serde_json::Error> {
    let old = to_pretty_lines(current)?;
    let new = to_pretty_lines(proposed)?;
    if old == new {
        return Ok(String::new());
    }
    Ok(TextDiff::from_lines(&old, &new)
        .unified_diff()
        .context_radius(2)
        .header("destination", "source")
        .to_string())
}

fn to_pretty_lines(realms: &[RealmGroup]) -> Result<String, serde_json::Error> {
    let mut text = serde_json::to_string_pretty(realms)?;
    text.push('\n');
    Ok(text)
}
