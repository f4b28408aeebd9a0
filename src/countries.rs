//! Supported countries and their marketplace/currency configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Countries the comparison covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Country {
    Mx,
    Us,
    Co,
}

impl Country {
    /// Returns the ISO 3166 alpha-2 code.
    pub fn code(&self) -> &'static str {
        match self {
            Country::Mx => "MX",
            Country::Us => "US",
            Country::Co => "CO",
        }
    }

    /// Returns the local currency code, used when a source omits one.
    pub fn currency(&self) -> &'static str {
        match self {
            Country::Mx => "MXN",
            Country::Us => "USD",
            Country::Co => "COP",
        }
    }

    /// Returns the Mercado Libre site identifier, if the catalog operates here.
    pub fn catalog_site(&self) -> Option<&'static str> {
        match self {
            Country::Mx => Some("MLM"),
            Country::Co => Some("MCO"),
            Country::Us => None,
        }
    }

    /// Returns the Google `gl` (geolocation) parameter.
    pub fn shopping_gl(&self) -> &'static str {
        match self {
            Country::Mx => "mx",
            Country::Us => "us",
            Country::Co => "co",
        }
    }

    /// Returns the Google `hl` (interface language) parameter.
    pub fn shopping_hl(&self) -> &'static str {
        match self {
            Country::Us => "en",
            Country::Mx | Country::Co => "es",
        }
    }

    /// Returns all supported countries in default request order.
    pub fn all() -> &'static [Country] {
        &[Country::Mx, Country::Us, Country::Co]
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.code())
    }
}

impl FromStr for Country {
    type Err = CountryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MX" => Ok(Country::Mx),
            "US" => Ok(Country::Us),
            "CO" => Ok(Country::Co),
            _ => Err(CountryParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CountryParseError(String);

impl fmt::Display for CountryParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown country '{}'. Valid countries: MX, US, CO", self.0)
    }
}

impl std::error::Error for CountryParseError {}

/// Resolves the requested country list.
///
/// `None` means the caller did not ask for specific countries and yields every
/// supported country. Each supplied value may itself be comma-delimited. Unknown
/// codes are dropped silently and duplicates keep their first position.
pub fn select_countries<S: AsRef<str>>(raw: Option<&[S]>) -> Vec<Country> {
    let Some(values) = raw else {
        return Country::all().to_vec();
    };

    let mut selected = Vec::new();
    for code in values.iter().flat_map(|v| v.as_ref().split(',')) {
        if let Ok(country) = code.parse::<Country>() {
            if !selected.contains(&country) {
                selected.push(country);
            }
        }
    }
    selected
}
