//! Storefront catalog shape and the static catalog file.
//!
//! `GET /catalog` lists active families from the database first; families
//! only present in the static JSON file fill in behind them.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use stylist_core::catalog::STATUS_ACTIVE;
use stylist_db::models::fabric::FabricWithColors;

/// Hex reported for colors stored without one.
pub const FALLBACK_HEX: &str = "#CCCCCC";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogColor {
    pub color_id: String,
    pub name: String,
    pub hex: String,
    #[serde(default)]
    pub swatch_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogFamily {
    pub family_id: String,
    pub display_name: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub sort: i32,
    #[serde(default)]
    pub colors: Vec<CatalogColor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogResponse {
    #[serde(default)]
    pub families: Vec<CatalogFamily>,
}

fn default_status() -> String {
    STATUS_ACTIVE.to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid catalog JSON in {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Read the static catalog file.
pub fn load_static_catalog(path: &Path) -> Result<CatalogResponse, CatalogError> {
    let display = path.display().to_string();
    let raw = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: display,
        source,
    })
}

impl From<FabricWithColors> for CatalogFamily {
    fn from(row: FabricWithColors) -> Self {
        Self {
            family_id: row.fabric.family_id,
            display_name: row.fabric.display_name,
            status: row.fabric.status,
            sort: row.fabric.sort_order,
            colors: row
                .colors
                .into_iter()
                .map(|c| CatalogColor {
                    color_id: c.color_id,
                    name: c.name,
                    hex: c.hex_value.unwrap_or_else(|| FALLBACK_HEX.to_string()),
                    swatch_url: c.swatch_url,
                })
                .collect(),
        }
    }
}

/// Merge database families with the static catalog.
///
/// Database rows win on `family_id`; inactive static families are dropped.
/// The result is ordered by `sort`, then display name.
pub fn merge_catalog(db: Vec<CatalogFamily>, fallback: &CatalogResponse) -> CatalogResponse {
    let known: HashSet<String> = db.iter().map(|f| f.family_id.clone()).collect();
    let mut families = db;
    families.extend(
        fallback
            .families
            .iter()
            .filter(|f| f.status == STATUS_ACTIVE && !known.contains(&f.family_id))
            .cloned(),
    );
    families.sort_by(|a, b| match a.sort.cmp(&b.sort) {
        Ordering::Equal => a.display_name.cmp(&b.display_name),
        other => other,
    });
    CatalogResponse { families }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn family(id: &str, name: &str, sort: i32, status: &str) -> CatalogFamily {
        CatalogFamily {
            family_id: id.into(),
            display_name: name.into(),
            status: status.into(),
            sort,
            colors: vec![],
        }
    }

    #[test]
    fn database_families_shadow_static_ones() {
        let db = vec![family("lana", "Lana (db)", 1, "active")];
        let fallback = CatalogResponse {
            families: vec![
                family("lana", "Lana (file)", 0, "active"),
                family("lino", "Lino", 0, "active"),
            ],
        };

        let merged = merge_catalog(db, &fallback);
        let names: Vec<_> = merged.families.iter().map(|f| f.display_name.as_str()).collect();
        assert_eq!(names, vec!["Lino", "Lana (db)"]);
    }

    #[test]
    fn inactive_static_families_are_hidden() {
        let fallback = CatalogResponse {
            families: vec![family("seda", "Seda", 0, "inactive")],
        };
        assert!(merge_catalog(vec![], &fallback).families.is_empty());
    }

    #[test]
    fn ties_on_sort_break_by_name() {
        let db = vec![family("b", "Beta", 2, "active"), family("a", "Alfa", 2, "active")];
        let merged = merge_catalog(db, &CatalogResponse::default());
        assert_eq!(merged.families[0].family_id, "a");
    }

    #[test]
    fn static_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fabrics.json");
        std::fs::write(
            &path,
            r##"{"families":[{"family_id":"lana","display_name":"Lana",
                "colors":[{"color_id":"azul","name":"Azul","hex":"#1F2A44"}]}]}"##,
        )
        .unwrap();

        let catalog = load_static_catalog(&path).unwrap();
        let lana = &catalog.families[0];
        assert_eq!(lana.status, "active");
        assert_eq!(lana.sort, 0);
        assert_eq!(lana.colors[0].swatch_url, None);
    }

    #[test]
    fn missing_or_broken_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        assert_matches!(
            load_static_catalog(&dir.path().join("nope.json")),
            Err(CatalogError::Io { .. })
        );

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{").unwrap();
        assert_matches!(load_static_catalog(&broken), Err(CatalogError::Parse { .. }));
    }
}
