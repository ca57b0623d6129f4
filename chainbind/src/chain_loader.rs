use crate::errors::InFile;
use anyhow::{bail, Result};
use libflate::gzip::Decoder;
use rand::{thread_rng, Rng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind, Lines, Read, Seek};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tree_buf::prelude::*;

/// One logged expression, with the type it is known to bind to, if any.
#[derive(Serialize, Deserialize, Encode, Decode, Eq, PartialEq, Ord, PartialOrd, Debug, Clone)]
pub struct ExprRecord {
    pub source: String,
    #[serde(default)]
    pub expected: Option<String>,
}

struct ChunkLoader<T> {
    start: Instant,
    logs: std::vec::IntoIter<String>,
    sample: f64,
    current: Option<AnyLoader>,
    _marker: PhantomData<*const T>,
}

impl<T> ChunkLoader<T> {
    fn elapsed(&self) -> std::time::Duration {
        Instant::now() - self.start
    }
}

impl<T> Iterator for ChunkLoader<T>
where
    T: tree_buf::Decodable + DeserializeOwned,
    Vec<T>: tree_buf::Decodable,
{
    type Item = Result<Vec<T>>;

    fn next(&mut self) -> Option<Result<Vec<T>>> {
        loop {
            match &mut self.current {
                Some(current) => match current.load_chunk(self.sample) {
                    Ok(Some(chunk)) => {
                        tracing::info!(elapsed = ?self.elapsed(), records = chunk.len(), "Loaded chunk");
                        return Some(Ok(chunk));
                    }
                    Ok(None) => self.current = None,
                    Err(e) => return Some(Err(e)),
                },
                None => match self.logs.next() {
                    Some(log) => {
                        tracing::info!(elapsed = ?self.elapsed(), file = %log, "Loading file");
                        match AnyLoader::new(log) {
                            Ok(loader) => self.current = Some(loader),
                            Err(e) => return Some(Err(e)),
                        }
                    }
                    None => {
                        tracing::info!(elapsed = ?self.elapsed(), "Finished loading");
                        return None;
                    }
                },
            }
        }
    }
}

pub fn load_all_chunks<T>(logs: &[String], sample: f64) -> impl Iterator<Item = Result<Vec<T>>>
where
    T: tree_buf::Decodable + DeserializeOwned,
    Vec<T>: tree_buf::Decodable,
{
    ChunkLoader {
        start: Instant::now(),
        logs: logs.to_vec().into_iter(),
        sample,
        current: None,
        _marker: PhantomData,
    }
}

enum AnyLoader {
    Gz(JsonLinesLoader<Decoder<File>>),
    Json(JsonLinesLoader<File>),
    TreeBuf(TreeBufLoader),
}

impl AnyLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = InFile::context(&path, |p| File::open(p))?;
        let path = path.as_ref();
        let loader = match path.extension().and_then(|ext| ext.to_str()) {
            Some("gz") => {
                let decoder = InFile::context(path, |_| Decoder::new(file))?;
                Self::Gz(JsonLinesLoader::new(path, decoder))
            }
            Some("jsonl") => Self::Json(JsonLinesLoader::new(path, file)),
            Some("treebuf") => Self::TreeBuf(TreeBufLoader::new(file)),
            _ => bail!(
                "Expecting a .jsonl, .gz or .treebuf file. Got: {}",
                path.display()
            ),
        };
        Ok(loader)
    }

    fn load_chunk<T: tree_buf::Decodable + DeserializeOwned>(
        &mut self,
        sample: f64,
    ) -> Result<Option<Vec<T>>>
    where
        Vec<T>: tree_buf::Decodable,
    {
        match self {
            Self::Json(inner) => inner.load_chunk(sample),
            Self::TreeBuf(inner) => inner.load_chunk(sample),
            Self::Gz(inner) => inner.load_chunk(sample),
        }
    }
}

struct JsonLinesLoader<R> {
    path: PathBuf,
    lines: Lines<BufReader<R>>,
    line: usize,
}

impl<R: Read> JsonLinesLoader<R> {
    fn new(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_owned(),
            lines: BufReader::new(reader).lines(),
            line: 0,
        }
    }

    fn load_chunk<V: DeserializeOwned>(&mut self, sample: f64) -> Result<Option<Vec<V>>> {
        let mut rand = thread_rng();

        let mut result = Vec::new();

        let Self { path, lines, line } = self;
        for text in lines {
            *line += 1;
            let text = text?;
            if text.trim().is_empty() {
                continue;
            }

            let prob: f64 = rand.gen();
            if prob >= sample {
                continue;
            }

            let deserialized =
                serde_json::from_str(&text).map_err(|e| InFile::at_line(&*path, *line, e))?;
            result.push(deserialized);

            if result.len() == crate::CHUNK_SIZE_HINT {
                break;
            }
        }
        Ok(if result.is_empty() {
            None
        } else {
            Some(result)
        })
    }
}

/// Chunks of tree-buf, each preceded by its length as a little endian u64.
struct TreeBufLoader {
    file: File,
}

impl TreeBufLoader {
    fn new(file: File) -> Self {
        Self { file }
    }

    fn load_chunk<T: tree_buf::Decodable>(&mut self, sample: f64) -> Result<Option<Vec<T>>>
    where
        Vec<T>: tree_buf::Decodable,
    {
        let mut chunk_size: [u8; 8] = Default::default();

        match self.file.read_exact(&mut chunk_size) {
            Ok(()) => (),
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        let chunk_size = u64::from_le_bytes(chunk_size);
        let remaining = self
            .file
            .metadata()?
            .len()
            .saturating_sub(self.file.stream_position()?);
        if chunk_size > remaining {
            bail!(
                "Chunk of {} bytes runs past the end of the file ({} bytes left)",
                chunk_size,
                remaining
            );
        }
        let mut buf = vec![0; chunk_size as usize];

        self.file.read_exact(&mut buf)?;

        let mut result: Vec<T> = decode(&buf)?;

        if sample < 1.0 {
            let mut rand = thread_rng();
            result.retain(|_| rand.gen::<f64>() < sample);
        }

        Ok(Some(result))
    }
}
