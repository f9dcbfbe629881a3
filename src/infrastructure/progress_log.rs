//! Log output that cooperates with the export progress bar.
//!
//! Each formatted event is buffered and written in one piece while the bar
//! is suspended, so the bar is cleared first and redrawn below the line.

use std::io::{self, Write};

use indicatif::ProgressBar;
use tracing_subscriber::fmt::MakeWriter;

/// `MakeWriter` wrapping another writer with [`ProgressBar::suspend`].
#[derive(Debug, Clone)]
pub struct ProgressWriter<M> {
    bar: ProgressBar,
    inner: M,
}

impl<M> ProgressWriter<M> {
    /// Route writes of `inner` through `bar`.
    pub const fn new(bar: ProgressBar, inner: M) -> Self {
        Self { bar, inner }
    }
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for ProgressWriter<M> {
    type Writer = SuspendedWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendedWriter {
            bar: self.bar.clone(),
            inner: self.inner.make_writer(),
            buf: Vec::new(),
        }
    }
}

/// Writer for a single event; flushes through the bar on drop.
pub struct SuspendedWriter<W: Write> {
    bar: ProgressBar,
    inner: W,
    buf: Vec<u8>,
}

impl<W: Write> Write for SuspendedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let buf = std::mem::take(&mut self.buf);
        let inner = &mut self.inner;
        self.bar.suspend(|| {
            inner.write_all(&buf)?;
            inner.flush()
        })
    }
}

impl<W: Write> Drop for SuspendedWriter<W> {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Writes each line to an in-memory terminal, for asserting screen contents.
#[cfg(test)]
pub struct TermSink(pub indicatif::InMemoryTerm);

#[cfg(test)]
impl Write for TermSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        use indicatif::TermLike;

        let text = String::from_utf8_lossy(buf);
        for line in text.lines() {
            self.0.write_line(line)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
