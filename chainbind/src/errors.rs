use std::error::Error;
use std::fmt;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// Points an error at the file, and optionally the line, it came from.
#[derive(Debug, Clone)]
pub struct InFile<Err> {
    path: PathBuf,
    line: Option<usize>,
    inner: Err,
}

impl<E> InFile<E> {
    pub fn context<T>(
        path: impl AsRef<Path>,
        f: impl FnOnce(&Path) -> Result<T, E>,
    ) -> Result<T, InFile<E>> {
        f(path.as_ref()).map_err(|inner| InFile {
            path: path.as_ref().to_owned(),
            line: None,
            inner,
        })
    }

    /// `line` counts from one.
    pub fn at_line(path: impl AsRef<Path>, line: usize, inner: E) -> Self {
        InFile {
            path: path.as_ref().to_owned(),
            line: Some(line),
            inner,
        }
    }
}

impl<E: fmt::Display> fmt::Display for InFile<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", &self.inner)?;
        write!(f, "In file: {}", self.path.display())?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        Ok(())
    }
}

impl<I: Error> Error for InFile<I> {}
