use std::collections::BTreeMap;
use std::io::{self, BufRead, BufReader, Read, Write};

use tracing::{debug, warn};

use prefs_types::{Snapshot, TypeError, Value};

use crate::config::CodecConfig;
use crate::decode::decode_document;
use crate::error::{CodecError, CodecResult};
use crate::format::{DocumentOut, EntryOut, MetaDataOut, ValueOut};

/// Codec between [`Snapshot`]s and the tagged JSON store document.
///
/// Stateless apart from its configuration; one codec may serve any number
/// of independent streams concurrently.
#[derive(Clone, Debug, Default)]
pub struct StoreCodec {
    config: CodecConfig,
}

impl StoreCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Read a whole document from `reader`.
    ///
    /// An empty stream is an empty, unnamed store. So is a stream that fails
    /// before yielding a single byte. A failure after content has started
    /// is returned as [`CodecError::StreamRead`].
    pub fn decode<R: Read>(&self, reader: R) -> CodecResult<Snapshot> {
        let mut reader = BufReader::new(reader);

        let at_end = loop {
            match reader.fill_buf() {
                Ok(buf) => break buf.is_empty(),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "store document unreadable before any content; treating as empty");
                    return Ok(Snapshot::empty());
                }
            }
        };
        if at_end {
            debug!("store document is empty");
            return Ok(Snapshot::empty());
        }

        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(CodecError::StreamRead)?;
        self.decode_slice(&bytes)
    }

    /// Decode a document already held in memory.
    pub fn decode_slice(&self, bytes: &[u8]) -> CodecResult<Snapshot> {
        decode_document(bytes, self.config.malformed_entries)
    }

    /// Write `name` and `entries` as a document to `writer`.
    ///
    /// The document is rendered in memory first; if any entry cannot be
    /// represented nothing is written. A `None` name omits the field.
    pub fn encode<W: Write>(
        &self,
        name: Option<&str>,
        entries: &BTreeMap<String, Value>,
        mut writer: W,
    ) -> CodecResult<()> {
        let bytes = self.render(name, entries)?;
        writer.write_all(&bytes).map_err(CodecError::StreamWrite)?;
        writer.flush().map_err(CodecError::StreamWrite)?;
        debug!(entries = entries.len(), bytes = bytes.len(), "encoded store document");
        Ok(())
    }

    pub fn encode_snapshot<W: Write>(&self, snapshot: &Snapshot, writer: W) -> CodecResult<()> {
        self.encode(snapshot.name.as_deref(), snapshot.entries(), writer)
    }

    /// Render a snapshot into a byte buffer.
    pub fn to_vec(&self, snapshot: &Snapshot) -> CodecResult<Vec<u8>> {
        self.render(snapshot.name.as_deref(), snapshot.entries())
    }

    fn render(&self, name: Option<&str>, entries: &BTreeMap<String, Value>) -> CodecResult<Vec<u8>> {
        let mut data = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            if key.is_empty() {
                return Err(TypeError::EmptyKey.into());
            }
            if let Value::Float32(v) = value {
                if !v.is_finite() {
                    return Err(CodecError::NonFiniteFloat { key: key.clone() });
                }
            }
            data.push(EntryOut {
                tag: value.type_tag(),
                key,
                value: ValueOut(value),
            });
        }

        let document = DocumentOut {
            meta_data: MetaDataOut { name },
            data,
        };
        let rendered = if self.config.pretty {
            serde_json::to_vec_pretty(&document)
        } else {
            serde_json::to_vec(&document)
        };
        rendered.map_err(|e| CodecError::Serialization(e.to_string()))
    }
}

/// Decode a document with the default configuration.
pub fn decode<R: Read>(reader: R) -> CodecResult<Snapshot> {
    StoreCodec::default().decode(reader)
}

/// Encode a document with the default configuration.
pub fn encode<W: Write>(
    name: Option<&str>,
    entries: &BTreeMap<String, Value>,
    writer: W,
) -> CodecResult<()> {
    StoreCodec::default().encode(name, entries, writer)
}
