/// Normalize a node id into the key used for run outputs.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`, so `"Get Row"` and
/// `"Get-Row"` both map to `"Get_Row"`.
pub fn sanitize_id(id: &str) -> String {
  id.chars()
    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_sanitize_id() {
    assert_eq!(sanitize_id("Get Row"), "Get_Row");
    assert_eq!(sanitize_id("node-1:a.b"), "node_1_a_b");
    assert_eq!(sanitize_id("abc123"), "abc123");
    assert_eq!(sanitize_id("déjà"), "d_j_");
  }
}
