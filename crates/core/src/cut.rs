//! Garment cut variants.
//!
//! A cut selects the prompt template, the control images and the inpaint
//! assets used when rendering a suit. The wire format is the lowercase
//! Spanish name used by the storefront (`recto`, `cruzado`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Suit cut variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cut {
    /// Single-breasted.
    Recto,
    /// Double-breasted.
    Cruzado,
}

/// Cuts rendered when a request does not name any.
pub const DEFAULT_CUTS: [Cut; 2] = [Cut::Recto, Cut::Cruzado];

impl Cut {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recto => "recto",
            Self::Cruzado => "cruzado",
        }
    }

    /// The opposite cut, used as an asset fallback.
    pub fn other(self) -> Self {
        match self {
            Self::Recto => Self::Cruzado,
            Self::Cruzado => Self::Recto,
        }
    }
}

impl fmt::Display for Cut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Cut {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recto" => Ok(Self::Recto),
            "cruzado" => Ok(Self::Cruzado),
            other => Err(CoreError::Validation(format!(
                "Unknown cut '{other}'. Must be one of: recto, cruzado"
            ))),
        }
    }
}

/// Parse a list of cut names, dropping duplicates while keeping order.
///
/// An empty list yields [`DEFAULT_CUTS`].
pub fn parse_cuts<S: AsRef<str>>(names: &[S]) -> Result<Vec<Cut>, CoreError> {
    if names.is_empty() {
        return Ok(DEFAULT_CUTS.to_vec());
    }
    let mut cuts = Vec::with_capacity(names.len());
    for name in names {
        let cut: Cut = name.as_ref().parse()?;
        if !cuts.contains(&cut) {
            cuts.push(cut);
        }
    }
    Ok(cuts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("Recto".parse::<Cut>().unwrap(), Cut::Recto);
        assert_eq!(" cruzado ".parse::<Cut>().unwrap(), Cut::Cruzado);
    }

    #[test]
    fn rejects_unknown_cut() {
        assert_matches!("tuxedo".parse::<Cut>(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn other_is_symmetric() {
        assert_eq!(Cut::Recto.other(), Cut::Cruzado);
        assert_eq!(Cut::Cruzado.other(), Cut::Recto);
    }

    #[test]
    fn empty_list_defaults_to_both_cuts() {
        let cuts = parse_cuts::<&str>(&[]).unwrap();
        assert_eq!(cuts, vec![Cut::Recto, Cut::Cruzado]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let cuts = parse_cuts(&["cruzado", "recto", "cruzado"]).unwrap();
        assert_eq!(cuts, vec![Cut::Cruzado, Cut::Recto]);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Cut::Cruzado).unwrap(), "\"cruzado\"");
    }
}
