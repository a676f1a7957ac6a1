use proptest::prelude::*;
use proptest::sample::subsequence;

/// Strategy for generating valid field names
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}".prop_filter("lookup separator", |name| !name.contains("__"))
}

/// Strategy for generating ordering tokens over a fixed field set
pub fn ordering_token_strategy(fields: &'static [&'static str]) -> impl Strategy<Value = String> {
    (prop::sample::select(fields), any::<bool>()).prop_map(|(field, descending)| {
        if descending {
            format!("-{field}")
        } else {
            field.to_string()
        }
    })
}

/// Strategy for generating a request's parameter keys: a subset of the
/// declared keys mixed with keys no schema declares
pub fn request_keys_strategy(declared: Vec<String>) -> impl Strategy<Value = Vec<String>> {
    let size = declared.len();
    (
        subsequence(declared, 0..=size),
        prop::collection::vec("zz_[a-z]{1,8}", 0..4),
    )
        .prop_map(|(mut keys, unknown)| {
            keys.extend(unknown);
            keys
        })
}

/// Strategy for generating `(per_page_max, per_page, requested)` triples
pub fn page_size_strategy() -> impl Strategy<Value = (u32, u32, Option<u64>)> {
    (1u32..=100, 1u32..=100, prop::option::of(1u64..=200))
}
