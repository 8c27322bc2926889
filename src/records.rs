//! Typed rows for each pipeline stage.
//!
//! Every field read from an input file is optional: empty cells and
//! unmatched joins both surface as `None`.

/// Rows that can be joined on the normalized country code.
pub trait CountryKeyed {
    fn country_code(&self) -> Option<&str>;
}

/// Per-tonne biodiversity impact factors for one commodity in one country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropImpactFactor {
    pub country_code: Option<String>,
    pub item_name: Option<String>,
    pub land_use_static: Option<f64>,
    pub land_use_dynamic: Option<f64>,
    pub fragmentation_static: Option<f64>,
    pub fragmentation_dynamic: Option<f64>,
    pub encroachment_static: Option<f64>,
    pub encroachment_dynamic: Option<f64>,
    pub climate_change_terrestrial_dynamic: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountrySpec {
    pub country_code: Option<String>,
    pub alpha_2_code: Option<String>,
}

/// Produced quantity in tonnes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Production {
    pub country_code: Option<String>,
    pub production_quantity: Option<f64>,
}

/// Harvested area, already converted to square kilometres.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Area {
    pub country_code: Option<String>,
    pub area_sqkm: Option<f64>,
}

/// An impact-factor row widened with everything the joins attach to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductionRecord {
    pub factors: CropImpactFactor,
    pub production_quantity: Option<f64>,
    pub area_sqkm: Option<f64>,
    pub alpha_2_code: Option<String>,
}

/// One row of the output table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FootprintRecord {
    pub country_code: Option<String>,
    pub alpha_2_code: Option<String>,
    pub production_quantity: Option<f64>,
    pub area_sqkm: Option<f64>,
    pub static_impact: Option<i64>,
    pub total_static_impact: Option<i64>,
    pub total_dynamic_impact: Option<i64>,
    pub static_impact_2020: Option<i64>,
}

impl From<CropImpactFactor> for ProductionRecord {
    fn from(factors: CropImpactFactor) -> Self {
        Self {
            factors,
            ..Default::default()
        }
    }
}

macro_rules! country_keyed {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CountryKeyed for $ty {
                fn country_code(&self) -> Option<&str> {
                    self.country_code.as_deref()
                }
            }
        )*
    };
}

country_keyed!(CropImpactFactor, CountrySpec, Production, Area);

impl CountryKeyed for ProductionRecord {
    fn country_code(&self) -> Option<&str> {
        self.factors.country_code()
    }
}
