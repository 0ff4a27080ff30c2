//! FILENAME: frame/src/hierarchy.rs
//! PURPOSE: The implicit variable tree encoded in `|`-delimited names.
//! CONTEXT: No tree is stored. Parent/child relations are derived on demand
//! by splitting names on the separator: `A|B|C` sits at depth 3 below `A|B`
//! (depth 2) and `A` (depth 1).

/// Separator between hierarchy levels in a variable name.
pub const SEPARATOR: char = '|';

/// Depth of a variable: number of separators plus one.
pub fn depth(variable: &str) -> usize {
    variable.matches(SEPARATOR).count() + 1
}

/// The immediate parent of a variable, or `None` at the top level.
pub fn parent(variable: &str) -> Option<&str> {
    variable.rsplit_once(SEPARATOR).map(|(head, _)| head)
}

/// Number of levels `variable` sits below `ancestor`, if it is a descendant.
/// Direct children are one level below.
pub fn levels_below(variable: &str, ancestor: &str) -> Option<usize> {
    let rest = variable.strip_prefix(ancestor)?;
    let rest = rest.strip_prefix(SEPARATOR)?;
    if rest.is_empty() {
        return None;
    }
    Some(depth(rest))
}
