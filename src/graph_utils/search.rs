use super::graph::Node;

/// Case-insensitive substring match on label or description, in insertion
/// order. A blank query matches nothing.
pub fn search<'a>(query: &str, nodes: &'a [Node]) -> Vec<&'a Node> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    nodes
        .iter()
        .filter(|n| {
            n.data.label.to_lowercase().contains(&needle)
                || n.data
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&needle))
        })
        .collect()
}
