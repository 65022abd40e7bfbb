use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::Path;

/// Read size used when streaming artifacts through the hasher.
pub const DIGEST_CHUNK_BYTES: usize = 8192;

/// `path` relative to `base`, or as given when it lies elsewhere.
pub fn display_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Accept scalars of any type where a string is expected.
///
/// `version: 1.0` in YAML is a float and chat ids in JSON are often numbers;
/// both are recorded as text. Nulls and structured values read as absent.
pub fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let value =
        serde_json::from_slice(&bytes).with_context(|| format!("parse JSON {}", path.display()))?;
    Ok(value)
}

/// Like [`read_json`], but an absent file is `None` rather than an error.
pub fn read_json_if_exists<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.is_file() {
        return Ok(None);
    }
    read_json(path).map(Some)
}

pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let value =
        serde_yaml::from_str(&text).with_context(|| format!("parse YAML {}", path.display()))?;
    Ok(value)
}

/// Write two-space indented JSON with a trailing newline.
pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut text = serde_json::to_string_pretty(value)
        .with_context(|| format!("serialize {}", path.display()))?;
    text.push('\n');
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Hex SHA-256 of a file, streamed in fixed-size chunks.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; DIGEST_CHUNK_BYTES];
    loop {
        let read = file
            .read(&mut buf)
            .with_context(|| format!("read {}", path.display()))?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_file_matches_known_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("abc.bin");
        fs::write(&path, b"abc").expect("write");
        assert_eq!(
            sha256_file(&path).expect("digest"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn sha256_file_streams_across_chunk_boundaries() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.bin");
        let bytes: Vec<u8> = (0..(DIGEST_CHUNK_BYTES * 3 + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        fs::write(&path, &bytes).expect("write");
        let expected = format!("{:x}", Sha256::digest(&bytes));
        assert_eq!(sha256_file(&path).expect("digest"), expected);
    }

    #[test]
    fn write_json_pretty_ends_with_newline() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/out.json");
        write_json_pretty(&path, &serde_json::json!({ "a": [1] })).expect("write");
        let text = fs::read_to_string(&path).expect("read");
        assert_eq!(text, "{\n  \"a\": [\n    1\n  ]\n}\n");
    }

    #[test]
    fn read_json_names_the_missing_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.json");
        let err = read_json::<serde_json::Value>(&path).expect_err("missing file");
        assert!(format!("{err:#}").contains("absent.json"));
        assert!(read_json_if_exists::<serde_json::Value>(&path)
            .expect("absent is ok")
            .is_none());
    }

    #[test]
    fn display_path_strips_base() {
        let base = Path::new("/tmp/pack");
        assert_eq!(
            display_path(Path::new("/tmp/pack/components/a.json"), base),
            "components/a.json"
        );
        assert_eq!(display_path(Path::new("/other/a.json"), base), "/other/a.json");
    }

    #[derive(Debug, Deserialize)]
    struct Scalars {
        #[serde(default, deserialize_with = "scalar_string")]
        text: Option<String>,
    }

    #[test]
    fn scalar_string_coerces_numbers_and_bools() {
        let parse = |json: &str| -> Option<String> {
            serde_json::from_str::<Scalars>(json).expect("parse").text
        };
        assert_eq!(parse(r#"{"text":"abc"}"#).as_deref(), Some("abc"));
        assert_eq!(parse(r#"{"text":123456789}"#).as_deref(), Some("123456789"));
        assert_eq!(parse(r#"{"text":1.5}"#).as_deref(), Some("1.5"));
        assert_eq!(parse(r#"{"text":true}"#).as_deref(), Some("true"));
        assert_eq!(parse(r#"{"text":null}"#), None);
        assert_eq!(parse(r#"{"text":["a"]}"#), None);
        assert_eq!(parse("{}"), None);
    }
}
