//! Catalog parser (verb module)
//!
//! Transforms YAML files into catalog definitions and checks that they
//! refer to each other consistently.

use std::collections::HashSet;
use std::path::Path;

use crate::catalog::CatalogFile;
use crate::error::ParseError;

/// Parse a catalog from a YAML file
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<CatalogFile, ParseError> {
    let path_str = path.as_ref().display().to_string();
    let contents = std::fs::read_to_string(&path).map_err(|e| ParseError::Io {
        path: path_str,
        source: e,
    })?;
    parse_str(&contents)
}

/// Parse a catalog from a YAML string
pub fn parse_str(yaml: &str) -> Result<CatalogFile, ParseError> {
    let catalog: CatalogFile = serde_yaml::from_str(yaml)?;
    validate(&catalog)?;
    Ok(catalog)
}

/// Cross-reference checks serde cannot express.
///
/// Field ownership is not checked here; it depends on the anchoring policy
/// and is reported at query time.
pub fn validate(catalog: &CatalogFile) -> Result<(), ParseError> {
    let mut source_ids = HashSet::new();
    for source in &catalog.data_sources {
        if !source_ids.insert(source.id) {
            return Err(invalid(format!("duplicate data source id {}", source.id)));
        }
    }

    let mut dataset_ids = HashSet::new();
    for dataset in &catalog.data_sets {
        if !dataset_ids.insert(dataset.id) {
            return Err(invalid(format!("duplicate dataset id {}", dataset.id)));
        }
        if !source_ids.contains(&dataset.data_source_id) {
            return Err(invalid(format!(
                "dataset '{}' references unknown data source {}",
                dataset.name, dataset.data_source_id
            )));
        }
    }

    let mut model_ids = HashSet::new();
    for model in &catalog.data_models {
        if !model_ids.insert(model.id) {
            return Err(invalid(format!("duplicate model id {}", model.id)));
        }
        if model.data_sets.is_empty() {
            return Err(invalid(format!("model '{}' has no datasets", model.name)));
        }
        for member in model.member_ids() {
            if !dataset_ids.contains(&member) {
                return Err(invalid(format!(
                    "model '{}' references unknown dataset {}",
                    model.name, member
                )));
            }
        }
        for rel in &model.relationships {
            for end in [rel.source_data_set, rel.target_data_set] {
                if !model.is_member(end) {
                    return Err(invalid(format!(
                        "relationship in model '{}' references dataset {}, which is not a member",
                        model.name, end
                    )));
                }
            }
        }
        for hierarchy in &model.hierarchies {
            for level in &hierarchy.levels {
                if model.dimension(level).is_none() {
                    return Err(invalid(format!(
                        "hierarchy '{}' in model '{}' names unknown dimension '{}'",
                        hierarchy.name, model.name, level
                    )));
                }
            }
        }
    }

    Ok(())
}

fn invalid(message: String) -> ParseError {
    ParseError::Invalid(message)
}
