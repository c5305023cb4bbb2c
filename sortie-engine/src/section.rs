//! Generic key-ordered section store.
//!
//! This is the only persistence shape the engine reads or writes: ordered
//! `[Section]` groups of ordered `key value` lines. Keys may repeat inside a
//! section (route lines), so lookups by key return the first match.
use std::fmt::Write as _;
use std::str::FromStr;

use crate::error::ConfigError;

pub type Entry = (String, String);

/// Read access used by the template loader.
pub trait SectionRead {
    /// Name used in error messages (usually the file name).
    fn source_name(&self) -> &str;

    fn entries(&self, section: &str) -> Option<&[Entry]>;

    fn has_section(&self, section: &str) -> bool {
        self.entries(section).is_some()
    }

    fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.entries(section)?
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingSection`] when the section is absent.
    fn require_entries(&self, section: &str) -> Result<&[Entry], ConfigError> {
        self.entries(section)
            .ok_or_else(|| ConfigError::MissingSection {
                file: self.source_name().to_string(),
                section: section.to_string(),
            })
    }

    /// # Errors
    ///
    /// Returns a missing-section or missing-key error.
    fn require(&self, section: &str, key: &str) -> Result<&str, ConfigError> {
        let entries = self.require_entries(section)?;
        entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .ok_or_else(|| ConfigError::MissingKey {
                file: self.source_name().to_string(),
                section: section.to_string(),
                key: key.to_string(),
            })
    }

    /// Parse a required value.
    ///
    /// # Errors
    ///
    /// Returns missing-section/key errors or [`ConfigError::InvalidValue`].
    fn parse_required<T>(&self, section: &str, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.require(section, key)?;
        raw.trim()
            .parse::<T>()
            .map_err(|e| self.invalid(section, key, raw, &e.to_string()))
    }

    /// Parse an optional value; absent keys yield `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a present value does not parse.
    fn parse_optional<T>(&self, section: &str, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(section, key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| self.invalid(section, key, raw, &e.to_string())),
        }
    }

    fn invalid(&self, section: &str, key: &str, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            file: self.source_name().to_string(),
            section: section.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Write access used by the mission serializer. Only appends or overwrites.
pub trait SectionWrite {
    /// Overwrite the first `key` in `section`, or append it.
    fn set(&mut self, section: &str, key: &str, value: &str);

    /// Append a line even if `key` already exists.
    fn append(&mut self, section: &str, key: &str, value: &str);

    /// Make sure `section` exists, even if it stays empty.
    fn ensure_section(&mut self, section: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    entries: Vec<Entry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SectionStore {
    name: String,
    sections: Vec<Section>,
}

impl SectionStore {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            sections: Vec::new(),
        }
    }

    /// Parse the text form.
    ///
    /// Blank lines and lines starting with `;` or `#` are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a key line outside any section
    /// or an unterminated section header.
    pub fn parse(name: &str, text: &str) -> Result<Self, ConfigError> {
        let mut store = Self::new(name);
        let mut current: Option<String> = None;
        for (line_no, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                let Some(section) = rest.strip_suffix(']') else {
                    return Err(ConfigError::InvalidValue {
                        file: name.to_string(),
                        section: rest.to_string(),
                        key: format!("line {}", line_no + 1),
                        value: line.to_string(),
                        reason: "unterminated section header".to_string(),
                    });
                };
                let section = section.trim().to_string();
                store.ensure_section(&section);
                current = Some(section);
                continue;
            }
            let Some(section) = current.as_deref() else {
                return Err(ConfigError::InvalidValue {
                    file: name.to_string(),
                    section: String::new(),
                    key: format!("line {}", line_no + 1),
                    value: line.to_string(),
                    reason: "entry outside of any section".to_string(),
                });
            };
            let (key, value) = line
                .split_once(char::is_whitespace)
                .map_or((line, ""), |(k, v)| (k, v.trim()));
            store.append(section, key, value);
        }
        Ok(store)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(|s| s.name.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render the text form. Identical stores render identical bytes.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            let _ = writeln!(out, "[{}]", section.name);
            for (key, value) in &section.entries {
                if value.is_empty() {
                    let _ = writeln!(out, "  {key}");
                } else {
                    let _ = writeln!(out, "  {key} {value}");
                }
            }
        }
        out
    }

    fn section_mut(&mut self, section: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == section) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section {
                    name: section.to_string(),
                    entries: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }
}

impl SectionRead for SectionStore {
    fn source_name(&self) -> &str {
        &self.name
    }

    fn entries(&self, section: &str) -> Option<&[Entry]> {
        self.sections
            .iter()
            .find(|s| s.name == section)
            .map(|s| s.entries.as_slice())
    }
}

impl SectionWrite for SectionStore {
    fn set(&mut self, section: &str, key: &str, value: &str) {
        let entries = &mut self.section_mut(section).entries;
        if let Some(entry) = entries.iter_mut().find(|(k, _)| k == key) {
            entry.1 = value.to_string();
        } else {
            entries.push((key.to_string(), value.to_string()));
        }
    }

    fn append(&mut self, section: &str, key: &str, value: &str) {
        self.section_mut(section)
            .entries
            .push((key.to_string(), value.to_string()));
    }

    fn ensure_section(&mut self, section: &str) {
        let _ = self.section_mut(section);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
; comment
[MAIN]
  TIME 12.5
  MAP  Steppe Map
[Wing]
  r0100
  r0101
";

    #[test]
    fn parses_sections_and_values() {
        let store = SectionStore::parse("sample.mis", SAMPLE).unwrap();
        assert_eq!(store.get("MAIN", "TIME"), Some("12.5"));
        assert_eq!(store.get("MAIN", "MAP"), Some("Steppe Map"));
        assert_eq!(store.entries("Wing").map(<[Entry]>::len), Some(2));
        assert_eq!(store.get("Wing", "r0100"), Some(""));
        let time: f64 = store.parse_required("MAIN", "TIME").unwrap();
        assert!((time - 12.5).abs() < f64::EPSILON);
    }

    #[test]
    fn errors_name_file_section_and_key() {
        let store = SectionStore::parse("sample.mis", SAMPLE).unwrap();
        assert_eq!(
            store.require("Chiefs", "x"),
            Err(ConfigError::MissingSection {
                file: "sample.mis".into(),
                section: "Chiefs".into()
            })
        );
        assert!(matches!(
            store.require("MAIN", "CloudHeight"),
            Err(ConfigError::MissingKey { .. })
        ));
        assert!(matches!(
            store.parse_required::<u32>("MAIN", "MAP"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(store.parse_optional::<u32>("MAIN", "WEATHER"), Ok(None));
    }

    #[test]
    fn rejects_entries_outside_sections() {
        assert!(SectionStore::parse("x", "orphan 1\n[A]\n").is_err());
        assert!(SectionStore::parse("x", "[A\n").is_err());
    }

    #[test]
    fn set_overwrites_append_duplicates_and_text_round_trips() {
        let mut store = SectionStore::new("out.mis");
        store.set("MAIN", "TIME", "6");
        store.set("MAIN", "TIME", "7");
        store.append("Route", "P", "1 2");
        store.append("Route", "P", "3 4");
        store.ensure_section("Empty");
        assert_eq!(store.get("MAIN", "TIME"), Some("7"));
        assert_eq!(store.entries("Route").map(<[Entry]>::len), Some(2));
        let text = store.to_text();
        let reparsed = SectionStore::parse("out.mis", &text).unwrap();
        assert_eq!(reparsed, store);
    }
}
