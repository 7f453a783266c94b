use std::io::{self, Write};

/// Writer that forces every write through to the OS before returning
pub struct FlushingSink<W: Write> {
    inner: W,
}

impl<W: Write> FlushingSink<W> {
    pub fn new(inner: W) -> Self {
        FlushingSink { inner }
    }

    pub fn write(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())?;
        self.inner.flush()
    }

    /// Write all chunks, then flush once
    pub fn write_lines<I, S>(&mut self, chunks: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for chunk in chunks {
            self.inner.write_all(chunk.as_ref().as_bytes())?;
        }
        self.inner.flush()
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
