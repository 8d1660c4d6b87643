use std::collections::BTreeMap;
use std::io::{self, BufRead};

use anyhow::Result;

use crate::FreezeError;

/// Word that must appear in a record's `status` value for the package to count as installed.
pub const INSTALLED_STATUS_MARKER: &str = "installed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackageRecord {
    pub package: String,
    pub version: Option<String>,
    pub port_version: u32,
    pub feature: Option<String>,
    pub status: String,
    /// Every attribute of the paragraph keyed by its lower-cased name, including the typed ones above.
    pub fields: BTreeMap<String, String>,
}

impl InstalledPackageRecord {
    pub fn from_fields(fields: BTreeMap<String, String>) -> Result<Self> {
        let package = fields
            .get("package")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or(FreezeError::MissingPackageField)?;

        let port_version = match fields.get("port-version") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| FreezeError::InvalidPortVersion {
                    package: package.clone(),
                    value: raw.clone(),
                })?,
            None => 0,
        };

        Ok(Self {
            version: fields.get("version").map(|value| value.trim().to_string()),
            feature: fields.get("feature").map(|value| value.trim().to_string()),
            status: fields.get("status").cloned().unwrap_or_default(),
            package,
            port_version,
            fields,
        })
    }

    /// Feature paragraphs describe an optional part of a package and carry no version.
    pub fn is_feature_entry(&self) -> bool {
        self.version.is_none()
    }

    pub fn is_installed(&self) -> bool {
        self.status
            .split_whitespace()
            .any(|word| word == INSTALLED_STATUS_MARKER)
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

/// Lazily splits a status file into records, one blank-line separated paragraph at a time.
///
/// The underlying line source is consumed as records are pulled, so the iterator cannot be
/// restarted. The first error ends the sequence.
pub struct StatusParagraphs<I> {
    lines: I,
    finished: bool,
}

impl<R: BufRead> StatusParagraphs<io::Lines<R>> {
    pub fn from_reader(reader: R) -> Self {
        Self::new(reader.lines())
    }
}

impl<I> StatusParagraphs<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    pub fn new(lines: I) -> Self {
        Self {
            lines,
            finished: false,
        }
    }
}

impl<I> Iterator for StatusParagraphs<I>
where
    I: Iterator<Item = io::Result<String>>,
{
    type Item = Result<InstalledPackageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut paragraph: Vec<String> = Vec::new();
        loop {
            match self.lines.next() {
                None => {
                    self.finished = true;
                    if paragraph.is_empty() {
                        return None;
                    }
                    return Some(parse_status_paragraph(&paragraph));
                }
                Some(Err(err)) => {
                    self.finished = true;
                    return Some(Err(anyhow::Error::new(err).context("failed reading status file")));
                }
                Some(Ok(line)) => {
                    let line = line.strip_suffix('\r').unwrap_or(&line).to_string();
                    if line.trim().is_empty() {
                        if !paragraph.is_empty() {
                            let record = parse_status_paragraph(&paragraph);
                            if record.is_err() {
                                self.finished = true;
                            }
                            return Some(record);
                        }
                    } else {
                        paragraph.push(line);
                    }
                }
            }
        }
    }
}

pub fn parse_status_paragraph<S: AsRef<str>>(lines: &[S]) -> Result<InstalledPackageRecord> {
    let mut fields: BTreeMap<String, String> = BTreeMap::new();
    let mut current_key: Option<String> = None;

    for line in lines {
        let line = line.as_ref();
        match split_key_value(line) {
            Some((key, value)) => {
                let key = key.to_ascii_lowercase();
                fields.insert(key.clone(), value.to_string());
                current_key = Some(key);
            }
            None => {
                let Some(key) = current_key.as_ref() else {
                    return Err(FreezeError::OrphanContinuation {
                        line: line.to_string(),
                    }
                    .into());
                };
                fields.entry(key.clone()).or_default().push_str(line);
            }
        }
    }

    InstalledPackageRecord::from_fields(fields)
}

fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, rest) = line.split_once(':')?;
    if key.is_empty() || !key.chars().all(|ch| ch.is_ascii_alphabetic() || ch == '-') {
        return None;
    }
    if rest.is_empty() {
        return Some((key, ""));
    }
    rest.strip_prefix(' ').map(|value| (key, value))
}
