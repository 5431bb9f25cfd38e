//! Payload envelopes of a file entry's `contents`.
//!
//! Ignition allows either a bare string or an object whose `source` is a URL,
//! optionally with a `compression` field. Only inline strings and `data:` URLs
//! can be rewritten locally; everything else is classified as [`FileContents::Remote`].

use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use flate2::{read::GzDecoder, write::GzEncoder};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

use crate::error::ContentError;

const SOURCE: &str = "source";
const COMPRESSION: &str = "compression";
const VERIFICATION: &str = "verification";
const HASH: &str = "hash";

/// RFC 3986 unreserved characters stay literal, everything else is escaped.
const DATA_URL_ESCAPES: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    /// `data:<media>;base64,<payload>`
    Base64,
    /// `data:<media>,<percent-encoded payload>`
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    fn from_field(value: Option<&Value>) -> Result<Self, ContentError> {
        match value {
            None | Some(Value::Null) => Ok(Self::None),
            Some(Value::String(s)) if s.is_empty() => Ok(Self::None),
            Some(Value::String(s)) if s == "gzip" => Ok(Self::Gzip),
            Some(other) => Err(ContentError::UnsupportedCompression(match other {
                Value::String(s) => s.clone(),
                v => v.to_string(),
            })),
        }
    }

    fn decompress(self, data: Vec<u8>) -> Result<Vec<u8>, ContentError> {
        match self {
            Self::None => Ok(data),
            Self::Gzip => {
                let mut out = Vec::new();
                GzDecoder::new(data.as_slice())
                    .read_to_end(&mut out)
                    .map_err(ContentError::Gzip)?;
                Ok(out)
            }
        }
    }

    fn compress(self, data: &[u8]) -> Result<Vec<u8>, ContentError> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
                encoder.write_all(data).map_err(ContentError::Gzip)?;
                encoder.finish().map_err(ContentError::Gzip)
            }
        }
    }
}

/// A parsed `data:` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    /// Everything between `data:` and the payload, minus `;base64`. Kept verbatim.
    pub media_type: String,
    pub encoding: PayloadEncoding,
    payload: String,
}

impl DataUrl {
    pub fn parse(url: &str) -> Result<Self, ContentError> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| ContentError::InvalidDataUrl("missing `data:` scheme".to_owned()))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ContentError::InvalidDataUrl("missing `,` separator".to_owned()))?;

        let (media_type, encoding) = match header.strip_suffix(";base64") {
            Some(media) => (media, PayloadEncoding::Base64),
            None => (header, PayloadEncoding::Percent),
        };

        Ok(Self {
            media_type: media_type.to_owned(),
            encoding,
            payload: payload.to_owned(),
        })
    }

    pub fn data(&self) -> Result<Vec<u8>, ContentError> {
        match self.encoding {
            PayloadEncoding::Base64 => Ok(STANDARD.decode(self.payload.trim())?),
            PayloadEncoding::Percent => Ok(percent_decode_str(&self.payload).collect()),
        }
    }

    /// Same header and encoding, new payload.
    pub fn with_data(&self, data: &[u8]) -> Result<Self, ContentError> {
        let payload = match self.encoding {
            PayloadEncoding::Base64 => STANDARD.encode(data),
            PayloadEncoding::Percent => {
                // percent-encoded data urls only carry text
                let text = std::str::from_utf8(data).map_err(|_| {
                    ContentError::InvalidDataUrl(
                        "binary payload cannot be percent-encoded".to_owned(),
                    )
                })?;
                utf8_percent_encode(text, DATA_URL_ESCAPES).to_string()
            }
        };
        Ok(Self {
            media_type: self.media_type.clone(),
            encoding: self.encoding,
            payload,
        })
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.encoding {
            PayloadEncoding::Base64 => write!(f, "data:{};base64,{}", self.media_type, self.payload),
            PayloadEncoding::Percent => write!(f, "data:{},{}", self.media_type, self.payload),
        }
    }
}

/// Envelope of an entry's payload, one decode/encode strategy per variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// `"contents": "<text>"`
    Inline(String),
    /// `"contents": {"source": "data:...", "compression": ...}`
    Data {
        url: DataUrl,
        compression: Compression,
        verified: bool,
    },
    /// `"contents": {"source": "https://..."}` and other fetched sources
    Remote { url: String },
}

impl FileContents {
    /// Classifies a `contents` value by inspecting its shape and metadata.
    pub fn from_json(value: Option<&Value>) -> Result<Self, ContentError> {
        let contents = match value {
            None | Some(Value::Null) => return Err(ContentError::MissingContents),
            Some(Value::String(text)) => return Ok(Self::Inline(text.clone())),
            Some(Value::Object(contents)) => contents,
            Some(other) => {
                return Err(ContentError::UnsupportedLayout(format!(
                    "contents must be a string or an object, got `{other}`"
                )))
            }
        };

        let source = match contents.get(SOURCE) {
            None | Some(Value::Null) => return Err(ContentError::MissingContents),
            Some(Value::String(source)) => source,
            Some(other) => {
                return Err(ContentError::UnsupportedLayout(format!(
                    "`source` must be a string, got `{other}`"
                )))
            }
        };

        if !source.starts_with("data:") {
            return Ok(Self::Remote {
                url: source.clone(),
            });
        }

        let verified = contents
            .get(VERIFICATION)
            .and_then(|v| v.get(HASH))
            .is_some_and(|hash| !hash.is_null());

        Ok(Self::Data {
            url: DataUrl::parse(source)?,
            compression: Compression::from_field(contents.get(COMPRESSION))?,
            verified,
        })
    }

    /// The file bytes as they will appear on the booted host.
    pub fn decode(&self) -> Result<Vec<u8>, ContentError> {
        match self {
            Self::Inline(text) => Ok(text.as_bytes().to_vec()),
            Self::Data {
                url, compression, ..
            } => compression.decompress(url.data()?),
            Self::Remote { url } => Err(ContentError::RemoteSource { url: url.clone() }),
        }
    }

    pub fn decode_text(&self) -> Result<String, ContentError> {
        Ok(String::from_utf8(self.decode()?)?)
    }

    /// Wraps `data` in the same envelope this value was read with.
    pub fn reencode(&self, data: &[u8]) -> Result<Self, ContentError> {
        match self {
            Self::Inline(_) => Ok(Self::Inline(String::from_utf8(data.to_vec())?)),
            Self::Data {
                url,
                compression,
                verified,
            } => {
                if *verified {
                    return Err(ContentError::VerificationHash);
                }
                Ok(Self::Data {
                    url: url.with_data(&compression.compress(data)?)?,
                    compression: *compression,
                    verified: false,
                })
            }
            Self::Remote { url } => Err(ContentError::RemoteSource { url: url.clone() }),
        }
    }

    /// Stores this payload into an existing `contents` value, touching only
    /// the string or `source` field.
    pub(crate) fn write_into(&self, slot: &mut Value) -> Result<(), ContentError> {
        let layout_changed = || {
            ContentError::UnsupportedLayout(
                "contents layout changed between decode and encode".to_owned(),
            )
        };

        match self {
            Self::Inline(text) if slot.is_string() => {
                *slot = Value::String(text.clone());
                Ok(())
            }
            Self::Data { url, .. } => {
                let contents = slot.as_object_mut().ok_or_else(layout_changed)?;
                contents.insert(SOURCE.to_owned(), Value::String(url.to_string()));
                Ok(())
            }
            Self::Remote { url } => Err(ContentError::RemoteSource { url: url.clone() }),
            Self::Inline(_) => Err(layout_changed()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gzip(data: &[u8]) -> Vec<u8> {
        Compression::Gzip.compress(data).unwrap()
    }

    #[test]
    fn inline_contents() {
        let contents = FileContents::from_json(Some(&json!("hi"))).unwrap();
        assert_eq!(contents, FileContents::Inline("hi".to_owned()));
        assert_eq!(contents.decode_text().unwrap(), "hi");
        assert_eq!(
            contents.reencode(b"bye").unwrap(),
            FileContents::Inline("bye".to_owned())
        );
    }

    #[test]
    fn base64_data_url() {
        let value = json!({"source": "data:text/plain;charset=utf-8;base64,aGVsbG8K"});
        let contents = FileContents::from_json(Some(&value)).unwrap();
        assert_eq!(contents.decode_text().unwrap(), "hello\n");

        let FileContents::Data { url, .. } = contents.reencode(b"bye\n").unwrap() else {
            panic!("envelope changed");
        };
        assert_eq!(url.to_string(), "data:text/plain;charset=utf-8;base64,YnllCg==");
    }

    #[test]
    fn percent_data_url() {
        let value = json!({"source": "data:,key%3A%20value%0A"});
        let contents = FileContents::from_json(Some(&value)).unwrap();
        assert_eq!(contents.decode_text().unwrap(), "key: value\n");

        let FileContents::Data { url, .. } = contents.reencode(b"a: b-c\n").unwrap() else {
            panic!("envelope changed");
        };
        assert_eq!(url.encoding, PayloadEncoding::Percent);
        assert_eq!(url.to_string(), "data:,a%3A%20b-c%0A");
    }

    #[test]
    fn gzip_data_url() {
        let source = format!("data:;base64,{}", STANDARD.encode(gzip(b"zipped")));
        let value = json!({"compression": "gzip", "source": source});
        let contents = FileContents::from_json(Some(&value)).unwrap();
        assert_eq!(contents.decode_text().unwrap(), "zipped");

        let updated = contents.reencode(b"rezipped").unwrap();
        assert!(matches!(
            updated,
            FileContents::Data {
                compression: Compression::Gzip,
                ..
            }
        ));
        assert_eq!(updated.decode_text().unwrap(), "rezipped");
    }

    #[test]
    fn empty_compression_means_none() {
        let value = json!({"compression": "", "source": "data:,x"});
        let contents = FileContents::from_json(Some(&value)).unwrap();
        assert!(matches!(
            contents,
            FileContents::Data {
                compression: Compression::None,
                ..
            }
        ));
    }

    #[test]
    fn unsupported_compression() {
        let value = json!({"compression": "xz", "source": "data:,x"});
        let err = FileContents::from_json(Some(&value)).unwrap_err();
        assert!(matches!(err, ContentError::UnsupportedCompression(c) if c == "xz"));
    }

    #[test]
    fn remote_source_cannot_be_decoded() {
        let value = json!({"source": "https://example.com/hosts-0.yaml"});
        let contents = FileContents::from_json(Some(&value)).unwrap();
        assert!(matches!(contents, FileContents::Remote { .. }));
        assert!(matches!(
            contents.decode(),
            Err(ContentError::RemoteSource { .. })
        ));
    }

    #[test]
    fn verified_payload_cannot_be_rewritten() {
        let value = json!({"source": "data:,x", "verification": {"hash": "sha512-00"}});
        let contents = FileContents::from_json(Some(&value)).unwrap();
        assert_eq!(contents.decode_text().unwrap(), "x");
        assert!(matches!(
            contents.reencode(b"y"),
            Err(ContentError::VerificationHash)
        ));
    }

    #[test]
    fn malformed_envelopes() {
        assert!(matches!(
            FileContents::from_json(None),
            Err(ContentError::MissingContents)
        ));
        assert!(matches!(
            FileContents::from_json(Some(&json!({}))),
            Err(ContentError::MissingContents)
        ));
        assert!(matches!(
            FileContents::from_json(Some(&json!(7))),
            Err(ContentError::UnsupportedLayout(_))
        ));
        assert!(matches!(
            FileContents::from_json(Some(&json!({"source": "data:no-comma"}))),
            Err(ContentError::InvalidDataUrl(_))
        ));

        let bad_base64 = FileContents::from_json(Some(&json!({"source": "data:;base64,@@@"})))
            .unwrap();
        assert!(matches!(bad_base64.decode(), Err(ContentError::Base64(_))));
    }

    #[test]
    fn write_into_only_touches_source() {
        let mut slot = json!({"compression": "", "source": "data:,old", "verification": {}});
        let contents = FileContents::from_json(Some(&slot)).unwrap();
        let updated = contents.reencode(b"new").unwrap();
        updated.write_into(&mut slot).unwrap();
        assert_eq!(
            slot,
            json!({"compression": "", "source": "data:,new", "verification": {}})
        );
    }
}
