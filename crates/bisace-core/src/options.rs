//! # XML Options Framework
//!
//! Tenants enable optional features through XML option files. At startup the
//! files listed in a tenant's settings are registered with an
//! [`OptionsBuilder`], then merged into one [`OptionsDocument`] whose root is
//! `<OptionsRoot>` and whose children are the root elements of each file:
//!
//! ```text
//! <OptionsRoot>
//!   <Cards> <CardOptions>...</CardOptions> </Cards>     <- cards.xml
//!   <Site> ... </Site>                                  <- site.xml
//! </OptionsRoot>
//! ```
//!
//! A typed section is looked up by element name anywhere in the merged
//! document and deserialized with `quick-xml`'s serde support. A section
//! that is absent yields the type's `Default`.

use std::path::{Path, PathBuf};

use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::card_number::DEFAULT_CARD_NUMBER_LENGTH;

/// Name of the element wrapping all merged option files.
pub const OPTIONS_ROOT: &str = "OptionsRoot";

/// Errors from registering, merging, or reading option files.
#[derive(Error, Debug)]
pub enum OptionsError {
    /// A required option file does not exist.
    #[error("File Not Found And Is Required: {0}")]
    MissingFile(String),

    /// An option file could not be read.
    #[error("failed to read option file {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An option file is empty or is not a well-formed XML document.
    #[error("Option File: {0}; either contains no data or badly formatted xml. You may fix the xml or remove the file from environment's setting file(s).")]
    Malformed(String),

    /// More than one element matches a section name.
    #[error("option section '{0}' appears more than once")]
    AmbiguousSection(String),

    /// A section could not be deserialized into its options type.
    #[error("option section '{section}' is invalid: {reason}")]
    InvalidSection {
        /// Section name.
        section: String,
        /// Deserializer message.
        reason: String,
    },

    /// The merged document could not be written.
    #[error("failed to assemble options document: {0}")]
    Assemble(String),
}

/// A typed options section.
pub trait OptionsSection: DeserializeOwned + Default {
    /// Element name of the section in the merged document.
    const SECTION: &'static str;
}

/// Card handling options.
///
/// ```xml
/// <CardOptions>
///   <CardNumberLength>10</CardNumberLength>
///   <CardNameField>BadgeName</CardNameField>
/// </CardOptions>
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CardOptions {
    /// Width card numbers are zero-padded to.
    pub card_number_length: usize,
    /// Person custom field holding the card display name.
    pub card_name_field: String,
}

impl Default for CardOptions {
    fn default() -> Self {
        Self {
            card_number_length: DEFAULT_CARD_NUMBER_LENGTH,
            card_name_field: "CardName".to_string(),
        }
    }
}

impl OptionsSection for CardOptions {
    const SECTION: &'static str = "CardOptions";
}

/// Collects option files before they are merged.
#[derive(Debug, Clone, Default)]
pub struct OptionsBuilder {
    files: Vec<PathBuf>,
}

impl OptionsBuilder {
    /// Create a builder with no files.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an option file.
    ///
    /// Files already registered are ignored. A missing file is skipped when
    /// `optional` is set and rejected otherwise. Returns whether the file
    /// was added.
    ///
    /// # Errors
    ///
    /// [`OptionsError::MissingFile`] for a missing required file.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, optional: bool) -> Result<bool, OptionsError> {
        let path = path.into();
        if self.files.contains(&path) {
            return Ok(false);
        }
        if path.is_file() {
            self.files.push(path);
            return Ok(true);
        }
        if optional {
            tracing::debug!(path = %path.display(), "optional option file not found, skipping");
            Ok(false)
        } else {
            Err(OptionsError::MissingFile(path.display().to_string()))
        }
    }

    /// Registered files, in registration order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Whether no file has been registered.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Read every registered file and merge them into one document.
    ///
    /// # Errors
    ///
    /// [`OptionsError::Io`] if a file cannot be read and
    /// [`OptionsError::Malformed`] if one is empty or not well-formed.
    pub fn build(&self) -> Result<OptionsDocument, OptionsError> {
        let mut writer = Writer::new(Vec::new());
        write(&mut writer, Event::Start(BytesStart::new(OPTIONS_ROOT)))?;

        for path in &self.files {
            let text = std::fs::read_to_string(path).map_err(|source| OptionsError::Io {
                path: path.display().to_string(),
                source,
            })?;
            append_root(&mut writer, &text, path)?;
        }

        write(&mut writer, Event::End(BytesEnd::new(OPTIONS_ROOT)))?;
        let xml = String::from_utf8(writer.into_inner())
            .map_err(|e| OptionsError::Assemble(e.to_string()))?;

        Ok(OptionsDocument {
            xml,
            sources: self.files.clone(),
        })
    }
}

fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<(), OptionsError> {
    writer
        .write_event(event)
        .map_err(|e| OptionsError::Assemble(e.to_string()))
}

/// Copy the root element of `text` into `writer`, rejecting anything that is
/// not a single well-formed element.
fn append_root(writer: &mut Writer<Vec<u8>>, text: &str, path: &Path) -> Result<(), OptionsError> {
    let malformed = || OptionsError::Malformed(path.display().to_string());

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(|_| malformed())?;
        match event {
            Event::Eof => break,
            Event::Start(_) | Event::Empty(_) if depth == 0 && seen_root => return Err(malformed()),
            Event::Start(start) => {
                seen_root = true;
                depth += 1;
                write(writer, Event::Start(start))?;
            }
            Event::Empty(empty) => {
                seen_root = true;
                write(writer, Event::Empty(empty))?;
            }
            Event::End(end) => {
                depth = depth.checked_sub(1).ok_or_else(malformed)?;
                write(writer, Event::End(end))?;
            }
            Event::Text(text) if depth == 0 => {
                if !text.iter().all(u8::is_ascii_whitespace) {
                    return Err(malformed());
                }
            }
            other if depth > 0 => write(writer, other)?,
            // Declarations, comments and processing instructions outside the root.
            _ => {}
        }
    }

    if !seen_root || depth != 0 {
        return Err(malformed());
    }
    Ok(())
}

/// Option files merged under a single `<OptionsRoot>` element.
#[derive(Debug, Clone)]
pub struct OptionsDocument {
    xml: String,
    sources: Vec<PathBuf>,
}

impl Default for OptionsDocument {
    fn default() -> Self {
        Self {
            xml: format!("<{OPTIONS_ROOT}/>"),
            sources: Vec::new(),
        }
    }
}

impl OptionsDocument {
    /// The merged XML text.
    pub fn as_xml(&self) -> &str {
        &self.xml
    }

    /// Files the document was built from.
    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    /// Names of the top-level sections (the root element of each file).
    pub fn top_level_sections(&self) -> Vec<String> {
        let mut reader = Reader::from_str(&self.xml);
        reader.config_mut().trim_text(true);
        let mut names = Vec::new();
        let mut depth = 0usize;
        while let Ok(event) = reader.read_event() {
            match event {
                Event::Eof => break,
                Event::Start(e) => {
                    if depth == 1 {
                        names.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                    }
                    depth += 1;
                }
                Event::Empty(e) if depth == 1 => {
                    names.push(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
        names
    }

    /// Return the single element named `name`, serialized, or `None`.
    ///
    /// The element may appear at any depth below the root.
    ///
    /// # Errors
    ///
    /// [`OptionsError::AmbiguousSection`] if more than one element matches.
    pub fn section(&self, name: &str) -> Result<Option<String>, OptionsError> {
        let mut reader = Reader::from_str(&self.xml);
        let mut found: Option<String> = None;
        let mut capture: Option<(Writer<Vec<u8>>, usize)> = None;
        let mut depth = 0usize;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| OptionsError::Assemble(e.to_string()))?;
            if matches!(event, Event::Eof) {
                break;
            }

            let is_match = match &event {
                Event::Start(e) | Event::Empty(e) => {
                    depth > 0 && e.local_name().as_ref() == name.as_bytes()
                }
                _ => false,
            };
            if is_match && (found.is_some() || capture.is_some()) {
                return Err(OptionsError::AmbiguousSection(name.to_string()));
            }

            match event {
                Event::Start(e) => {
                    depth += 1;
                    if is_match {
                        capture = Some((Writer::new(Vec::new()), depth));
                    }
                    if let Some((w, _)) = capture.as_mut() {
                        write(w, Event::Start(e))?;
                    }
                }
                Event::End(e) => {
                    if let Some((mut w, start_depth)) = capture.take() {
                        write(&mut w, Event::End(e))?;
                        if start_depth == depth {
                            found = Some(
                                String::from_utf8(w.into_inner())
                                    .map_err(|e| OptionsError::Assemble(e.to_string()))?,
                            );
                        } else {
                            capture = Some((w, start_depth));
                        }
                    }
                    depth = depth.saturating_sub(1);
                }
                Event::Empty(e) if is_match => {
                    let mut w = Writer::new(Vec::new());
                    write(&mut w, Event::Empty(e))?;
                    found = Some(
                        String::from_utf8(w.into_inner())
                            .map_err(|e| OptionsError::Assemble(e.to_string()))?,
                    );
                }
                other => {
                    if let Some((w, _)) = capture.as_mut() {
                        write(w, other)?;
                    }
                }
            }
        }

        Ok(found)
    }

    /// Deserialize the section named `name`, or return `T::default()` when
    /// it is absent.
    ///
    /// # Errors
    ///
    /// [`OptionsError::AmbiguousSection`] or [`OptionsError::InvalidSection`].
    pub fn options_for<T>(&self, name: &str) -> Result<T, OptionsError>
    where
        T: DeserializeOwned + Default,
    {
        match self.section(name)? {
            None => Ok(T::default()),
            Some(xml) => quick_xml::de::from_str(&xml).map_err(|e| OptionsError::InvalidSection {
                section: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Deserialize a typed section by its declared name.
    ///
    /// # Errors
    ///
    /// See [`OptionsDocument::options_for`].
    pub fn options<T: OptionsSection>(&self) -> Result<T, OptionsError> {
        self.options_for(T::SECTION)
    }
}
