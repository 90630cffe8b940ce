use serde::{Deserialize, Serialize};
use strum::Display;

/// Which rows the trailing-metrics stage recomputes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TrailingScope {
    /// Every product, then every brand rollup.
    #[default]
    All,
    ProductsOnly,
    BrandsOnly,
    /// Rollup of a single brand from its products' cached metrics.
    Brand(i32),
    /// Products of a single brand, without the brand rollup.
    BrandProducts(i32),
}

impl TrailingScope {
    pub fn includes_products(&self) -> bool {
        matches!(self, Self::All | Self::ProductsOnly | Self::BrandProducts(_))
    }

    pub fn includes_brands(&self) -> bool {
        matches!(self, Self::All | Self::BrandsOnly | Self::Brand(_))
    }

    /// Brand the stage is restricted to, if any.
    pub fn brand_id(&self) -> Option<i32> {
        match self {
            Self::Brand(id) | Self::BrandProducts(id) => Some(*id),
            _ => None,
        }
    }
}

/// Which forecast partition is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ForecastScope {
    /// All products, followed by the brand rollup.
    #[default]
    All,
    /// One product; the brand rollup is skipped.
    Product(i32),
}

impl ForecastScope {
    pub fn product_id(&self) -> Option<i32> {
        match self {
            Self::All => None,
            Self::Product(id) => Some(*id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum OverstockMode {
    #[default]
    Both,
    ProductsOnly,
    BrandsOnly,
}

impl OverstockMode {
    pub fn includes_products(&self) -> bool {
        matches!(self, Self::Both | Self::ProductsOnly)
    }

    pub fn includes_brands(&self) -> bool {
        matches!(self, Self::Both | Self::BrandsOnly)
    }
}

/// Summary tables refreshed by `refresh-summaries`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryTables {
    pub brand: bool,
    pub category: bool,
}

impl Default for SummaryTables {
    fn default() -> Self {
        Self {
            brand: true,
            category: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_scope_flags() {
        assert!(TrailingScope::All.includes_products() && TrailingScope::All.includes_brands());
        assert!(!TrailingScope::BrandProducts(3).includes_brands());
        assert!(!TrailingScope::Brand(3).includes_products());
        assert_eq!(TrailingScope::Brand(3).brand_id(), Some(3));
        assert_eq!(TrailingScope::ProductsOnly.brand_id(), None);
    }

    #[test]
    fn overstock_mode_flags() {
        assert!(OverstockMode::Both.includes_products() && OverstockMode::Both.includes_brands());
        assert!(!OverstockMode::BrandsOnly.includes_products());
        assert!(!OverstockMode::ProductsOnly.includes_brands());
    }
}
