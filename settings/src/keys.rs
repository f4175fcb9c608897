//! Cache key derivation.
//!
//! Every key starts with a fixed namespace, followed by the byte length of the
//! dictionary name and the name itself. Because the length is encoded up
//! front, the end of the name is never guessed from its content, so no
//! character has to be forbidden in dictionary names and no two dictionaries
//! can produce overlapping keys.
//!
//! ```text
//! fibre_settings:<len>:<name>              dictionary (pooled entity)
//! fibre_settings:<len>:<name>:all          "get all" key index
//! fibre_settings:<len>:<name>:item:<key>   single value
//! ```
//!
//! All functions return `None` when the dictionary name or the item key is
//! empty or whitespace-only. Callers validate their arguments before asking for
//! a key, so `None` never reaches the cache.

use crate::error::is_blank;

const NAMESPACE: &str = "fibre_settings";
const ALL_ITEMS_SUFFIX: &str = ":all";
const ITEM_INFIX: &str = ":item:";

/// Key under which a dictionary itself is registered.
pub fn dictionary_key(dictionary_name: &str) -> Option<String> {
  if is_blank(dictionary_name) {
    return None;
  }
  Some(format!(
    "{}:{}:{}",
    NAMESPACE,
    dictionary_name.len(),
    dictionary_name
  ))
}

/// Key of a single settings value inside a dictionary.
pub fn item_key(dictionary_name: &str, key: &str) -> Option<String> {
  if is_blank(key) {
    return None;
  }
  let mut generated = dictionary_key(dictionary_name)?;
  generated.reserve(ITEM_INFIX.len() + key.len());
  generated.push_str(ITEM_INFIX);
  generated.push_str(key);
  Some(generated)
}

/// Key of the index listing every settings key cached by `get_all`.
pub fn all_items_key(dictionary_name: &str) -> Option<String> {
  let mut generated = dictionary_key(dictionary_name)?;
  generated.push_str(ALL_ITEMS_SUFFIX);
  Some(generated)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_layout() {
    assert_eq!(dictionary_key("Test").unwrap(), "fibre_settings:4:Test");
    assert_eq!(all_items_key("Test").unwrap(), "fibre_settings:4:Test:all");
    assert_eq!(
      item_key("Test", "Key").unwrap(),
      "fibre_settings:4:Test:item:Key"
    );
  }

  #[test]
  fn test_invalid_input_yields_none() {
    for blank in ["", " ", "\t\n"] {
      assert_eq!(dictionary_key(blank), None);
      assert_eq!(all_items_key(blank), None);
      assert_eq!(item_key(blank, "key"), None);
      assert_eq!(item_key("dict", blank), None);
    }
  }

  #[test]
  fn test_prefix_names_do_not_collide() {
    // "a" + ":item:b" must not be confused with a dictionary named "a:item:b".
    let nested = dictionary_key("a:item:b").unwrap();
    let item = item_key("a", "b").unwrap();
    assert_ne!(nested, item);

    assert_ne!(all_items_key("a").unwrap(), dictionary_key("a:all").unwrap());
    assert_ne!(item_key("ab", "c").unwrap(), item_key("a", "bc").unwrap());
    assert_ne!(item_key("a:all", "x").unwrap(), item_key("a", "x").unwrap());
  }

  #[test]
  fn test_kinds_are_pairwise_distinct() {
    let names = ["d", "dict", "dict:all", "dict:item:all", "ü", "1:x"];
    let keys = ["all", "item", ":all", "x", "dict"];
    let mut seen = std::collections::HashSet::new();
    for name in names {
      assert!(seen.insert(dictionary_key(name).unwrap()));
      assert!(seen.insert(all_items_key(name).unwrap()));
      for key in keys {
        assert!(seen.insert(item_key(name, key).unwrap()), "{name}/{key}");
      }
    }
  }
}
