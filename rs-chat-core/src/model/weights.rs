use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer};

/// Raw layout of a weights file, before normalization.
///
/// ```json
/// {
///   "N": 12,
///   "unigram": { "привет": 120, "!": 300 },
///   "grams": { "1": { "привет": { "!": 80 } }, "2": { ... } },
///   "meta": { ... }
/// }
/// ```
///
/// `unigram` and `grams` are optional here so that their absence can be
/// reported by name instead of as a generic parse error. Unknown fields
/// (`meta`) are ignored.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct WeightsFile {
	#[serde(rename = "N")]
	pub n: Option<i64>,
	pub unigram: Option<CountTable<u64>>,
	pub grams: Option<CountTable<CountTable<CountTable<u64>>>>,
}

/// A string-keyed table that also accepts a JSON array.
///
/// Training tools serialize empty tables as `[]`, and tables whose keys
/// happen to be `"0".."n-1"` as plain arrays. Both are read back as maps
/// keyed by the element index.
#[derive(Debug, Default)]
pub(crate) struct CountTable<V>(pub HashMap<String, V>);

impl<'de, V: Deserialize<'de>> Deserialize<'de> for CountTable<V> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		deserializer.deserialize_any(CountTableVisitor(PhantomData))
	}
}

struct CountTableVisitor<V>(PhantomData<V>);

impl<'de, V: Deserialize<'de>> Visitor<'de> for CountTableVisitor<V> {
	type Value = CountTable<V>;

	fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
		formatter.write_str("an object or an array")
	}

	fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
		let mut table = HashMap::with_capacity(access.size_hint().unwrap_or(0));
		while let Some((key, value)) = access.next_entry::<String, V>()? {
			table.insert(key, value);
		}
		Ok(CountTable(table))
	}

	fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
		let mut table = HashMap::with_capacity(access.size_hint().unwrap_or(0));
		let mut index = 0usize;
		while let Some(value) = access.next_element::<V>()? {
			table.insert(index.to_string(), value);
			index += 1;
		}
		Ok(CountTable(table))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_parse_full_file() {
		let file: WeightsFile = serde_json::from_str(
			r#"{"N": 3, "unigram": {"a": 2}, "grams": {"1": {"a": {"b": 1}}}, "meta": {"turns": 5}}"#,
		)
		.unwrap();
		assert_eq!(file.n, Some(3));
		assert_eq!(file.unigram.unwrap().0["a"], 2);
		assert_eq!(file.grams.unwrap().0["1"].0["a"].0["b"], 1);
	}

	#[test]
	fn test_empty_arrays_are_empty_tables() {
		let file: WeightsFile = serde_json::from_str(r#"{"unigram": [], "grams": {"1": []}}"#).unwrap();
		assert!(file.unigram.unwrap().0.is_empty());
		assert!(file.grams.unwrap().0["1"].0.is_empty());
		assert_eq!(file.n, None);
	}

	#[test]
	fn test_array_keys_are_indices() {
		let table: CountTable<u64> = serde_json::from_str("[4, 7]").unwrap();
		assert_eq!(table.0["0"], 4);
		assert_eq!(table.0["1"], 7);
	}

	#[test]
	fn test_missing_tables() {
		let file: WeightsFile = serde_json::from_str(r#"{"N": 4}"#).unwrap();
		assert!(file.unigram.is_none());
		assert!(file.grams.is_none());
	}

	#[test]
	fn test_negative_count_is_rejected() {
		assert!(serde_json::from_str::<CountTable<u64>>(r#"{"a": -1}"#).is_err());
	}
}
