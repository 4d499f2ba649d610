//! Mapping files and subject values given on the command line.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use vmap_map::Datum;
use vmap_model::{DirectMappingData, Mapping, MappingData};

/// Reads a mapping in wire format. `-` reads standard input.
pub fn read_mapping(path: &Path) -> Result<Mapping> {
    let source = read_source(path)?;
    parse_mapping(&source).with_context(|| format!("parse mapping {}", path.display()))
}

pub fn parse_mapping(source: &str) -> Result<Mapping> {
    let data = MappingData::from_json(source)?;
    Ok(Mapping::from_wire(&data))
}

/// Reads a direct mapping body. `-` reads standard input.
pub fn read_direct_mapping(path: &Path) -> Result<DirectMappingData> {
    let source = read_source(path)?;
    parse_direct_mapping(&source)
        .with_context(|| format!("parse direct mapping {}", path.display()))
}

/// Parses a direct mapping body and rejects blank names.
pub fn parse_direct_mapping(source: &str) -> Result<DirectMappingData> {
    let data = DirectMappingData::from_json(source)?;
    let missing = data.missing_fields();
    if !missing.is_empty() {
        bail!("missing {}", missing.join(", "));
    }
    Ok(data)
}

fn read_source(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("read mapping from stdin")?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).with_context(|| format!("read mapping file {}", path.display()))
}

/// Parses `schema.attribute=value`. A blank value is missing.
pub fn parse_assignment(raw: &str) -> Result<(String, Datum), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected schema.attribute=value, got `{raw}`"))?;
    let key = key.trim();
    match key.split_once('.') {
        Some((schema, attribute)) if !schema.is_empty() && !attribute.is_empty() => {
            Ok((key.to_string(), Datum::parse(value)))
        }
        _ => Err(format!("expected schema.attribute before `=`, got `{key}`")),
    }
}

/// Collects assignments; a later value for the same variable wins.
pub fn subject_values(assignments: &[(String, Datum)]) -> BTreeMap<String, Datum> {
    assignments.iter().cloned().collect()
}

/// Source variables of `mapping` that have no value, each named once.
pub fn unassigned_sources(mapping: &Mapping, values: &BTreeMap<String, Datum>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    mapping
        .source_variables()
        .map(|variable| variable.label())
        .filter(|label| !values.contains_key(label) && seen.insert(label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignments() {
        assert_eq!(
            parse_assignment("site.weight_lb= 220 ").unwrap(),
            ("site.weight_lb".to_string(), Datum::Number(220.0))
        );
        assert_eq!(
            parse_assignment("site.smoker=yes").unwrap().1,
            Datum::Text("yes".to_string())
        );
        assert_eq!(parse_assignment("site.weight_lb=").unwrap().1, Datum::Missing);
        assert!(parse_assignment("weight_lb=1").is_err());
        assert!(parse_assignment("site.weight_lb").is_err());
        assert!(parse_assignment(".x=1").is_err());
    }

    #[test]
    fn later_values_win() {
        let values = subject_values(&[
            parse_assignment("a.b=1").unwrap(),
            parse_assignment("a.b=2").unwrap(),
        ]);
        assert_eq!(values.len(), 1);
        assert_eq!(values["a.b"], Datum::Number(2.0));
    }
}
