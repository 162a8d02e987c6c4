//! Structural content hashing.
//!
//! The hash feeds an unambiguous canonical rendering of the tree into
//! SHA-256. Map entries are visited in sorted-key order so the hash is
//! independent of insertion order; arrays hash positionally; provenance,
//! secrecy and pending directives do not participate.

use sha2::{Digest, Sha256};

use super::{Node, NodeValue, Scalar};

impl Node {
    /// Stable structural content hash of this tree, as lowercase hex.
    ///
    /// Two trees with equal structure and values hash identically even when
    /// their map keys were inserted in different orders or their values
    /// came from different sources.
    #[must_use]
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        update(&mut hasher, self);
        hasher
            .finalize()
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

fn update(hasher: &mut Sha256, node: &Node) {
    match node.value() {
        NodeValue::Empty => hasher.update(b"e;"),
        NodeValue::Scalar(scalar) => update_scalar(hasher, scalar),
        NodeValue::Array(children) => {
            hasher.update(format!("a:{}[", children.len()).as_bytes());
            for child in children {
                update(hasher, child);
            }
            hasher.update(b"]");
        }
        NodeValue::Map(children) => {
            hasher.update(format!("m:{}{{", children.len()).as_bytes());
            let mut keys: Vec<&String> = children.keys().collect();
            keys.sort();
            for key in keys {
                hasher.update(format!("k:{}:", key.len()).as_bytes());
                hasher.update(key.as_bytes());
                hasher.update(b":");
                if let Some(child) = children.get(key) {
                    update(hasher, child);
                }
            }
            hasher.update(b"}");
        }
    }
}

fn update_scalar(hasher: &mut Sha256, scalar: &Scalar) {
    match scalar {
        Scalar::Null => hasher.update(b"n;"),
        Scalar::Bool(value) => hasher.update(format!("b:{value};").as_bytes()),
        Scalar::Integer(value) => hasher.update(format!("i:{value};").as_bytes()),
        Scalar::Float(value) => hasher.update(format!("f:{};", value.to_bits()).as_bytes()),
        Scalar::String(text) => {
            hasher.update(format!("s:{}:", text.len()).as_bytes());
            hasher.update(text.as_bytes());
            hasher.update(b";");
        }
    }
}
