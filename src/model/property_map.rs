//! PropertyMap: loosely typed request arguments and query extras.

use std::collections::HashMap;
use super::Value;

/// A map of argument names to values.
pub type PropertyMap = HashMap<String, Value>;

/// Build a map from (key, value) pairs.
pub fn props<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> PropertyMap
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
}
