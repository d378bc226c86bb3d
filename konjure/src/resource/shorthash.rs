use std::borrow::Cow;
use std::collections::BTreeMap;

use anyhow::bail;
use serde_json::Value;

use crate::manifest::Str;

use super::{Object, Resource};

impl Resource {
    pub fn shorthash(&self) -> anyhow::Result<Str> {
        let encoded = match self.kind().as_str() {
            "Secret" => encode_secret(self)?,
            _ => bail!("Hash generation is only supported for kind Secret"),
        };

        // Match go's json.HTMLEscape behavior when marshalling json.
        // Sadly kustomize does not turn off this default behavior.
        let encoded = html_escape(&encoded);
        let hex = sha256::digest(encoded.as_ref());
        encode_hex(&hex)
    }
}

// Sort by key order similar to go's `json.Marshal`
fn sorted(object: &Object) -> Value {
    Value::Object(
        object
            .iter()
            .collect::<BTreeMap<_, _>>()
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    )
}

fn encode_secret(resource: &Resource) -> anyhow::Result<String> {
    #[derive(serde::Serialize)]
    struct Secret {
        data: Value,
        kind: &'static str,
        name: Str,
        #[serde(skip_serializing_if = "Option::is_none")]
        #[serde(rename = "stringData")]
        string_data: Option<Value>,
        #[serde(rename = "type")]
        secret_type: Value,
    }

    let root = resource.root();
    let data = match root.get("data").and_then(Value::as_object) {
        Some(data) => sorted(data),
        None => Value::String(String::new()),
    };

    let string_data = root
        .get("stringData")
        .and_then(Value::as_object)
        .map(sorted);

    let secret_type = root
        .get("type")
        .cloned()
        .unwrap_or_else(|| Value::String(String::new()));

    let secret = Secret {
        data,
        kind: "Secret",
        // kustomize hashes generated secrets before naming them
        name: Str::default(),
        string_data,
        secret_type,
    };

    Ok(serde_json::to_string(&secret)?)
}

/// HTMLEscape escapes <, >, &, U+2028 and U+2029 characters in JSON strings
/// to make them safe for embedding in HTML <script> tags.
/// Ported from Go's encoding/json HTMLEscape function.
/// Returns a Cow to avoid allocation if no escaping is needed.
fn html_escape(src: &str) -> Cow<'_, str> {
    const HEX: &[u8; 16] = b"0123456789abcdef";

    fn needs_escape(bytes: &[u8], i: usize) -> bool {
        let c = bytes[i];
        c == b'<'
            || c == b'>'
            || c == b'&'
            || (c == 0xE2
                && i + 2 < bytes.len()
                && bytes[i + 1] == 0x80
                && (bytes[i + 2] & !1) == 0xA8)
    }

    let bytes = src.as_bytes();
    let Some(first_escape) = (0..bytes.len()).find(|&i| needs_escape(bytes, i)) else {
        return Cow::Borrowed(src);
    };

    let mut dst = String::with_capacity(bytes.len() + 8);
    dst.push_str(&src[..first_escape]);

    let mut rest = &src[first_escape..];
    while let Some(c) = rest.chars().next() {
        match c {
            '<' | '>' | '&' => {
                let b = c as u8;
                dst.push_str("\\u00");
                dst.push(HEX[(b >> 4) as usize] as char);
                dst.push(HEX[(b & 0xF) as usize] as char);
            }
            '\u{2028}' => dst.push_str("\\u2028"),
            '\u{2029}' => dst.push_str("\\u2029"),
            c => dst.push(c),
        }
        rest = &rest[c.len_utf8()..];
    }

    Cow::Owned(dst)
}

// Copied from https://github.com/kubernetes/kubernetes
// /blob/master/pkg/kubectl/util/hash/hash.go
fn encode_hex(hex: &str) -> anyhow::Result<Str> {
    if hex.len() < 10 {
        bail!("input hex string must be at least 10 characters long");
    }

    let out = hex
        .chars()
        .take(10)
        .map(|c| match c {
            '0' => 'g',
            '1' => 'h',
            '3' => 'k',
            'a' => 'm',
            'e' => 't',
            _ => c,
        })
        .collect::<Str>();

    Ok(out)
}
