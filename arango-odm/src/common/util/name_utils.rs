/// Lowercases the first character of `name`, leaving the rest untouched.
///
/// This produces the default collection and view name of an entity type,
/// e.g. `Product` becomes `product` and `ViewEntityA` becomes `viewEntityA`.
pub fn uncapitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Returns the simple (unqualified, non-generic) name of `T`.
pub fn simple_type_name<T: ?Sized>() -> String {
    let full_name = std::any::type_name::<T>();
    let without_generics = match full_name.find('<') {
        Some(idx) => &full_name[..idx],
        None => full_name,
    };
    match without_generics.rsplit_once("::") {
        Some((_, simple)) => simple.to_string(),
        None => without_generics.to_string(),
    }
}

/// Splits a comma separated attribute value into trimmed, non-empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}

/// Returns true when the list carries at least one non-empty entry.
pub fn has_text(values: &[String]) -> bool {
    values.iter().any(|value| !value.trim().is_empty())
}
