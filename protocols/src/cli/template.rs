use std::collections::BTreeMap;

use regex::Regex;
use tracing::trace;

/// Named attributes extracted from one record line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(BTreeMap<String, String>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str).filter(|v| !v.is_empty())
    }

    /// First element of a comma-separated list field such as `destination_port`.
    pub fn first_of(&self, name: &str) -> Option<&str> {
        self.get(name)?
            .split(',')
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One line of structured output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRow {
    Record(Fields),
    /// A line the template could not make sense of, kept verbatim.
    Unparsable(String),
}

impl ParsedRow {
    pub fn as_record(&self) -> Option<&Fields> {
        match self {
            Self::Record(fields) => Some(fields),
            Self::Unparsable(_) => None,
        }
    }
}

pub struct Template {
    command: &'static str,
    record: Regex,
    boilerplate: Vec<Regex>,
}

impl Template {
    pub fn new(
        command: &'static str,
        record: &str,
        boilerplate: &[&str],
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            command,
            record: Regex::new(record)?,
            boilerplate: boilerplate
                .iter()
                .map(|p| Regex::new(p))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    pub fn command(&self) -> &'static str {
        self.command
    }

    pub fn parse(&self, raw: &str) -> Vec<ParsedRow> {
        raw.lines()
            .map(|line| line.trim_end_matches('\r'))
            .filter(|line| !is_blank_or_rule(line))
            .filter(|line| !self.boilerplate.iter().any(|re| re.is_match(line)))
            .map(|line| self.parse_line(line))
            .collect()
    }

    fn parse_line(&self, line: &str) -> ParsedRow {
        let Some(caps) = self.record.captures(line) else {
            trace!(command = self.command, line, "line does not match the record pattern");
            return ParsedRow::Unparsable(line.to_string());
        };

        let fields: Fields = self
            .record
            .capture_names()
            .flatten()
            .filter_map(|name| caps.name(name).map(|m| (name, m.as_str().trim())))
            .collect();

        ParsedRow::Record(fields)
    }
}

fn is_blank_or_rule(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_whitespace() || matches!(c, '-' | '='))
}
