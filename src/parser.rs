//! Streaming parser for OpenCover XML coverage reports.
//!
//! OpenCover XML structure (relevant subset):
//!   <CoverageSession>
//!     <Modules>
//!       <Module>
//!         <Files>
//!           <File uid="1" fullPath="C:\src\Foo.cs" />
//!         </Files>
//!         <Classes><Class><Methods><Method>
//!           <FileRef uid="1" />
//!           <SequencePoints>
//!             <SequencePoint vc="3" sl="10" ... />
//!           </SequencePoints>
//!         </Method></Methods></Class></Classes>
//!       </Module>
//!     </Modules>
//!   </CoverageSession>
//!
//! The report is consumed in a single forward pass over pull-reader events;
//! the document is never materialized as a DOM. The only state carried
//! across events is a uid → fullPath table built from `<File>` elements and
//! the most recently seen `<FileRef>` uid. Each `<SequencePoint>` resolves
//! its visit count through both to a source line. Everything else in the
//! document (summaries, branch points, method points) is skipped.
//!
//! Element and attribute matching is on local names only; namespaces are
//! ignored.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use tracing::info;

use crate::error::{ParseError, Result};
use crate::model::Coverage;

/// Parse the OpenCover report at `path` into a [`Coverage`].
pub fn parse_file(path: &Path) -> Result<Coverage> {
    let origin = path.display().to_string();
    info!(report = %origin, "parsing OpenCover report");

    let input = std::fs::read(path).map_err(|source| ParseError::Io {
        path: origin.clone(),
        source,
    })?;

    parse(&input, &origin)
}

/// Parse an OpenCover report from raw bytes. `origin` names the report in
/// error messages (normally its path).
pub fn parse(input: &[u8], origin: &str) -> Result<Coverage> {
    OpenCoverParser::new(input, origin).parse()
}

struct OpenCoverParser<'a> {
    input: &'a [u8],
    origin: &'a str,
    reader: Reader<&'a [u8]>,
    /// uid → fullPath, from `<File>` elements. Duplicate uids overwrite.
    files: HashMap<String, String>,
    /// Most recently seen `<FileRef>` uid. Not scoped to element depth;
    /// persists until the next `<FileRef>` overwrites it.
    file_ref: Option<String>,
    coverage: Coverage,
}

impl<'a> OpenCoverParser<'a> {
    fn new(input: &'a [u8], origin: &'a str) -> Self {
        let mut reader = Reader::from_reader(input);
        reader.trim_text(true);

        Self {
            input,
            origin,
            reader,
            files: HashMap::new(),
            file_ref: None,
            coverage: Coverage::new(),
        }
    }

    fn parse(mut self) -> Result<Coverage> {
        let mut buf = Vec::new();

        self.check_root(&mut buf)?;

        loop {
            buf.clear();
            match self.reader.read_event_into(&mut buf) {
                Err(e) => return Err(self.xml_error(e)),
                Ok(Event::Eof) => break,
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match e.local_name().as_ref() {
                        b"File" => self.handle_file(e)?,
                        b"FileRef" => self.handle_file_ref(e)?,
                        b"SequencePoint" => self.handle_sequence_point(e)?,
                        _ => {}
                    }
                }
                Ok(_) => {}
            }
        }

        Ok(self.coverage)
    }

    /// Advance to the first start element and require its local name to be
    /// `CoverageSession`.
    fn check_root(&mut self, buf: &mut Vec<u8>) -> Result<()> {
        loop {
            buf.clear();
            match self.reader.read_event_into(buf) {
                Err(e) => return Err(self.xml_error(e)),
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    if e.local_name().as_ref() == b"CoverageSession" {
                        return Ok(());
                    }
                    return Err(self.invalid("Missing root element <CoverageSession>".into()));
                }
                Ok(Event::Eof) => {
                    return Err(self.invalid("Missing root element <CoverageSession>".into()));
                }
                Ok(_) => {}
            }
        }
    }

    fn handle_file(&mut self, e: &BytesStart) -> Result<()> {
        let uid = self.required_attr(e, "uid")?;
        let full_path = self.required_attr(e, "fullPath")?;

        // Last writer wins.
        self.files.insert(uid, full_path);
        Ok(())
    }

    fn handle_file_ref(&mut self, e: &BytesStart) -> Result<()> {
        self.file_ref = Some(self.required_attr(e, "uid")?);
        Ok(())
    }

    fn handle_sequence_point(&mut self, e: &BytesStart) -> Result<()> {
        let line: u32 = self.required_int_attr(e, "sl")?;
        let count: u64 = self.required_int_attr(e, "vc")?;

        // Points with no active file reference, or one that never resolved
        // through a <File> definition, contribute nothing.
        if let Some(uid) = &self.file_ref {
            if let Some(path) = self.files.get(uid) {
                self.coverage.add_hits(path, line, count);
            }
        }
        Ok(())
    }

    /// Look up an attribute by local name; the first match wins.
    fn attr(&self, e: &BytesStart, name: &str) -> Result<Option<String>> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.xml_error(quick_xml::Error::from(err)))?;
            if attr.key.local_name().as_ref() == name.as_bytes() {
                let value = attr.unescape_value().map_err(|err| self.xml_error(err))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn required_attr(&self, e: &BytesStart, name: &str) -> Result<String> {
        self.attr(e, name)?.ok_or_else(|| {
            self.invalid(format!(
                "Missing attribute \"{}\" in element <{}>",
                name,
                String::from_utf8_lossy(e.local_name().as_ref())
            ))
        })
    }

    fn required_int_attr<T: FromStr>(&self, e: &BytesStart, name: &str) -> Result<T> {
        let value = self.required_attr(e, name)?;
        value.parse().map_err(|_| {
            self.invalid(format!(
                "Expected an integer instead of \"{value}\" for the attribute \"{name}\""
            ))
        })
    }

    /// 1-based line number of the reader's current position in the input.
    fn line(&self) -> u64 {
        let pos = self.reader.buffer_position().min(self.input.len());
        let newlines = self.input[..pos].iter().filter(|&&b| b == b'\n').count();
        newlines as u64 + 1
    }

    fn invalid(&self, message: String) -> ParseError {
        ParseError::Invalid {
            message,
            path: self.origin.to_string(),
            line: self.line(),
        }
    }

    fn xml_error(&self, source: quick_xml::Error) -> ParseError {
        ParseError::Xml {
            path: self.origin.to_string(),
            line: self.line(),
            source,
        }
    }
}
