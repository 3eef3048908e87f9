//! A user's cumulative tag list: first-seen order, no duplicates.

pub fn merge(existing: &[String], new: &[String]) -> Vec<String> {
    let mut merged = existing.to_vec();
    merge_into(&mut merged, new);
    merged
}

/// Append each tag of `new` that `tags` does not hold yet, in order.
pub fn merge_into(tags: &mut Vec<String>, new: &[String]) {
    for tag in new {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
}
