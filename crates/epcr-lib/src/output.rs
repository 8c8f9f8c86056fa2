//! Hit formatting
//!
//! One tab-delimited line per hit, in the classic electronic-PCR
//! layout:
//!
//! ```text
//! <label>\t<pos1>..<pos2>\t<sts_id>\t(<strand>)[\t<annotation>]
//! ```
//!
//! Positions are 1-based and inclusive. The annotation column appears
//! only when the STS record carries one. Writes are buffered; pass
//! `flush_each` for sinks like stdout where hits should appear as soon
//! as they are found.

use std::io::{self, BufWriter, Write};

use crate::primer::PrimerRecord;
use crate::scanner::Hit;

/// Buffered writer for formatted hits
pub struct HitWriter<W: Write> {
    out: BufWriter<W>,
    flush_each: bool,
}

impl<W: Write> HitWriter<W> {
    /// Wrap a sink
    pub fn new(sink: W, flush_each: bool) -> Self {
        Self {
            out: BufWriter::new(sink),
            flush_each,
        }
    }

    /// Write one hit line
    ///
    /// # Errors
    /// Propagates sink I/O errors.
    pub fn write_hit(
        &mut self,
        label: &str,
        hit: &Hit,
        record: &PrimerRecord<'_>,
    ) -> io::Result<()> {
        write!(
            self.out,
            "{}\t{}..{}\t{}\t({})",
            label,
            hit.start + 1,
            hit.end + 1,
            record.sts.id,
            record.strand
        )?;
        if !record.sts.alias.is_empty() {
            write!(self.out, "\t{}", record.sts.alias)?;
        }
        self.out.write_all(b"\n")?;
        if self.flush_each {
            self.out.flush()?;
        }
        Ok(())
    }

    /// Flush buffered output
    ///
    /// # Errors
    /// Propagates sink I/O errors.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Flush and recover the underlying sink
    ///
    /// # Errors
    /// Propagates sink I/O errors.
    pub fn into_inner(self) -> io::Result<W> {
        self.out.into_inner().map_err(io::IntoInnerError::into_error)
    }
}
