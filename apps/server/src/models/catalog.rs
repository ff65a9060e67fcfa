//! Reference catalog domain models.
//!
//! KBOB, EC3 and OpenEPD publish slightly different fields. Each source is a
//! variant of [`CatalogEntry`]; callers read coefficients through
//! [`ImpactSource`] without caring which dataset an entry came from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::entity::catalog_entry;
use crate::models::Coefficients;

/// Reference dataset a catalog entry was imported from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    Kbob,
    Ec3,
    #[serde(rename = "openepd")]
    OpenEpd,
}

impl CatalogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kbob => "kbob",
            Self::Ec3 => "ec3",
            Self::OpenEpd => "openepd",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kbob" => Some(Self::Kbob),
            "ec3" => Some(Self::Ec3),
            "openepd" | "open_epd" => Some(Self::OpenEpd),
            _ => None,
        }
    }
}

impl std::fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Common coefficient-extraction interface of all catalog variants.
pub trait ImpactSource {
    fn source(&self) -> CatalogSource;

    /// Per-kg coefficients, or `None` when the entry has no usable GWP value.
    fn coefficients(&self) -> Option<Coefficients>;

    /// Density published by the dataset in kg/m³, if any.
    fn default_density(&self) -> Option<f64>;
}

/// KBOB Ökobilanzdaten entry. Publishes all three indicators per kg.
#[derive(Debug, Clone, PartialEq)]
pub struct KbobEntry {
    pub gwp: Option<f64>,
    pub ubp: Option<f64>,
    pub penre: Option<f64>,
    pub density: Option<f64>,
    pub density_min: Option<f64>,
    pub density_max: Option<f64>,
}

/// EC3 (Building Transparency) material. No UBP.
#[derive(Debug, Clone, PartialEq)]
pub struct Ec3Entry {
    pub gwp: Option<f64>,
    pub penre: Option<f64>,
    pub density: Option<f64>,
    pub declared_unit: Option<String>,
}

/// OpenEPD declaration. No UBP.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenEpdEntry {
    pub gwp: Option<f64>,
    pub penre: Option<f64>,
    pub density: Option<f64>,
    pub declared_unit: Option<String>,
}

/// Source-specific payload of a catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogData {
    Kbob(KbobEntry),
    Ec3(Ec3Entry),
    OpenEpd(OpenEpdEntry),
}

/// A reference catalog entry with its identity and source-specific data.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: Uuid,
    pub external_id: String,
    pub name: String,
    pub name_normalized: String,
    pub category: Option<String>,
    pub data: CatalogData,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl ImpactSource for KbobEntry {
    fn source(&self) -> CatalogSource {
        CatalogSource::Kbob
    }

    fn coefficients(&self) -> Option<Coefficients> {
        Some(Coefficients {
            gwp: finite(self.gwp)?,
            ubp: finite(self.ubp)?,
            penre: finite(self.penre)?,
        })
    }

    fn default_density(&self) -> Option<f64> {
        // KBOB lists a density range for some materials
        positive(self.density).or_else(|| {
            match (positive(self.density_min), positive(self.density_max)) {
                (Some(min), Some(max)) => Some((min + max) / 2.0),
                (Some(only), None) | (None, Some(only)) => Some(only),
                (None, None) => None,
            }
        })
    }
}

impl ImpactSource for Ec3Entry {
    fn source(&self) -> CatalogSource {
        CatalogSource::Ec3
    }

    fn coefficients(&self) -> Option<Coefficients> {
        Some(Coefficients {
            gwp: finite(self.gwp)?,
            ubp: 0.0,
            penre: finite(self.penre).unwrap_or(0.0),
        })
    }

    fn default_density(&self) -> Option<f64> {
        positive(self.density)
    }
}

impl ImpactSource for OpenEpdEntry {
    fn source(&self) -> CatalogSource {
        CatalogSource::OpenEpd
    }

    fn coefficients(&self) -> Option<Coefficients> {
        Some(Coefficients {
            gwp: finite(self.gwp)?,
            ubp: 0.0,
            penre: finite(self.penre).unwrap_or(0.0),
        })
    }

    fn default_density(&self) -> Option<f64> {
        positive(self.density)
    }
}

impl ImpactSource for CatalogData {
    fn source(&self) -> CatalogSource {
        match self {
            Self::Kbob(e) => e.source(),
            Self::Ec3(e) => e.source(),
            Self::OpenEpd(e) => e.source(),
        }
    }

    fn coefficients(&self) -> Option<Coefficients> {
        match self {
            Self::Kbob(e) => e.coefficients(),
            Self::Ec3(e) => e.coefficients(),
            Self::OpenEpd(e) => e.coefficients(),
        }
    }

    fn default_density(&self) -> Option<f64> {
        match self {
            Self::Kbob(e) => e.default_density(),
            Self::Ec3(e) => e.default_density(),
            Self::OpenEpd(e) => e.default_density(),
        }
    }
}

impl ImpactSource for CatalogEntry {
    fn source(&self) -> CatalogSource {
        self.data.source()
    }

    fn coefficients(&self) -> Option<Coefficients> {
        self.data.coefficients()
    }

    fn default_density(&self) -> Option<f64> {
        self.data.default_density()
    }
}

impl CatalogEntry {
    /// Build the typed entry from a database row.
    ///
    /// Returns `None` for rows with an unknown source.
    pub fn from_model(m: &catalog_entry::Model) -> Option<Self> {
        let data = match CatalogSource::parse(&m.source)? {
            CatalogSource::Kbob => CatalogData::Kbob(KbobEntry {
                gwp: m.gwp,
                ubp: m.ubp,
                penre: m.penre,
                density: m.density,
                density_min: m.density_min,
                density_max: m.density_max,
            }),
            CatalogSource::Ec3 => CatalogData::Ec3(Ec3Entry {
                gwp: m.gwp,
                penre: m.penre,
                density: m.density,
                declared_unit: m.declared_unit.clone(),
            }),
            CatalogSource::OpenEpd => CatalogData::OpenEpd(OpenEpdEntry {
                gwp: m.gwp,
                penre: m.penre,
                density: m.density,
                declared_unit: m.declared_unit.clone(),
            }),
        };

        Some(Self {
            id: m.id,
            external_id: m.external_id.clone(),
            name: m.name.clone(),
            name_normalized: m.name_normalized.clone(),
            category: m.category.clone(),
            data,
        })
    }
}

/// One record of a catalog import file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogImportRecord {
    pub source: CatalogSource,
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub gwp: Option<f64>,
    #[serde(default)]
    pub ubp: Option<f64>,
    #[serde(default)]
    pub penre: Option<f64>,
    #[serde(default)]
    pub density: Option<f64>,
    #[serde(default)]
    pub density_min: Option<f64>,
    #[serde(default)]
    pub density_max: Option<f64>,
    #[serde(default)]
    pub declared_unit: Option<String>,
}

/// Catalog entry as returned by the API.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogEntryResponse {
    pub id: Uuid,
    pub source: String,
    pub external_id: String,
    pub name: String,
    pub category: Option<String>,
    pub gwp: Option<f64>,
    pub ubp: Option<f64>,
    pub penre: Option<f64>,
    pub density: Option<f64>,
    pub density_min: Option<f64>,
    pub density_max: Option<f64>,
    pub declared_unit: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<catalog_entry::Model> for CatalogEntryResponse {
    fn from(m: catalog_entry::Model) -> Self {
        Self {
            id: m.id,
            source: m.source,
            external_id: m.external_id,
            name: m.name,
            category: m.category,
            gwp: m.gwp,
            ubp: m.ubp,
            penre: m.penre,
            density: m.density,
            density_min: m.density_min,
            density_max: m.density_max,
            declared_unit: m.declared_unit,
            updated_at: m.updated_at,
        }
    }
}

/// Catalog search parameters.
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCatalogQuery {
    /// Restrict to one dataset (kbob, ec3, openepd).
    pub source: Option<String>,
    /// Case-insensitive name search.
    pub q: Option<String>,
    #[serde(default = "default_catalog_limit")]
    pub limit: u64,
    #[serde(default)]
    pub offset: u64,
}

fn default_catalog_limit() -> u64 {
    50
}

/// Paginated catalog search response.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogListResponse {
    pub entries: Vec<CatalogEntryResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}
