//! Request cache keys.

/// Namespace of thumbnail entries in the request cache.
pub const NAMESPACE: &str = "thumbs";

fn push_escaped(key: &mut String, component: &str) {
    for c in component.chars() {
        match c {
            '%' => key.push_str("%25"),
            ':' => key.push_str("%3A"),
            c => key.push(c),
        }
    }
}

/// `namespace:hash:size`, with `%` and `:` inside components percent-escaped
/// so that distinct inputs never share a key.
pub fn cache_key(namespace: &str, hash: &str, size: &str) -> String {
    let mut key = String::with_capacity(namespace.len() + hash.len() + size.len() + 2);
    push_escaped(&mut key, namespace);
    key.push(':');
    push_escaped(&mut key, hash);
    key.push(':');
    push_escaped(&mut key, size);
    key
}
