//! Location records: attribute extraction, merging, and text rendering.

use std::fmt;

use geojson::JsonObject;
use serde::{Deserialize, Serialize};

/// Attribute record attached to each indexed shape.
///
/// Fields are plain strings with the empty string meaning "absent"; empty
/// fields are skipped when serializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Commonly used country name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country: String,

    /// Formal name of the country.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country_long: String,

    /// ISO 3166-1 alpha-2 code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country_code_2: String,

    /// ISO 3166-1 alpha-3 code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub country_code_3: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub continent: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub region: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subregion: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub province: String,

    /// ISO 3166-2 code.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub province_code: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub county: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub city: String,
}

impl Location {
    /// Extract a location from GeoJSON feature properties.
    ///
    /// Each field has an ordered list of candidate keys; the first key
    /// holding a string value wins, otherwise the field stays empty.
    pub(crate) fn from_properties(properties: Option<&JsonObject>) -> Self {
        let Some(props) = properties else {
            return Location::default();
        };

        let mut location = Location {
            country: property_string(props, &["ADMIN", "admin"]),
            country_long: property_string(props, &["FORMAL_EN"]),
            country_code_2: property_string(props, &["ISO_A2"]),
            country_code_3: property_string(props, &["ISO_A3"]),
            continent: property_string(props, &["CONTINENT"]),
            region: property_string(props, &["REGION_UN"]),
            subregion: property_string(props, &["SUBREGION"]),
            province: property_string(props, &["name"]),
            province_code: property_string(props, &["iso_3166_2"]),
            county: String::new(),
            city: property_string(props, &["name_conve"]),
        };

        // A trailing "2" disambiguates duplicate city names in the source
        // data; it is not part of the name.
        if let Some(stripped) = location.city.strip_suffix('2') {
            location.city = stripped.to_string();
        }

        // County collections mark their features with an explicit type.
        if property_string(props, &["TYPE"]) == "County" {
            location.county = property_string(props, &["NAME"]);
        }

        location
    }

    /// Fill any empty field from `other`. Populated fields are never
    /// overwritten, which makes repeated merging left-biased.
    pub(crate) fn merge_from(&mut self, other: &Location) {
        fill(&mut self.country, &other.country);
        fill(&mut self.country_long, &other.country_long);
        fill(&mut self.country_code_2, &other.country_code_2);
        fill(&mut self.country_code_3, &other.country_code_3);
        fill(&mut self.continent, &other.continent);
        fill(&mut self.region, &other.region);
        fill(&mut self.subregion, &other.subregion);
        fill(&mut self.province, &other.province);
        fill(&mut self.province_code, &other.province_code);
        fill(&mut self.county, &other.county);
        fill(&mut self.city, &other.city);
    }

    /// Whether every field is empty.
    pub fn is_empty(&self) -> bool {
        self == &Location::default()
    }
}

fn fill(field: &mut String, value: &str) {
    if field.is_empty() && !value.is_empty() {
        *field = value.to_string();
    }
}

fn property_string(props: &JsonObject, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| props.get(*key).and_then(|value| value.as_str()))
        .unwrap_or_default()
        .to_string()
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "<Location> Empty Location");
        }

        let mut out = String::from("<Location>");

        if !self.city.is_empty() {
            out.push(' ');
            out.push_str(&self.city);
            out.push(',');
        }

        if !self.province.is_empty() {
            out.push(' ');
            out.push_str(&self.province);
            out.push(',');
        }

        if !self.country.is_empty() {
            out.push(' ');
            out.push_str(&self.country);
        } else if !self.country_long.is_empty() {
            out.push(' ');
            out.push_str(&self.country_long);
        }

        if !self.country_code_3.is_empty() {
            out.push_str(" (");
            out.push_str(&self.country_code_3);
            out.push(')');
        } else if !self.country_code_2.is_empty() {
            out.push_str(" (");
            out.push_str(&self.country_code_2);
            out.push(')');
        }

        let area = [&self.continent, &self.region, &self.subregion]
            .into_iter()
            .find(|value| !value.is_empty());
        if let Some(area) = area {
            if out.len() > "<Location>".len() {
                out.push(',');
            }
            out.push(' ');
            out.push_str(area);
        }

        f.write_str(&out)
    }
}

/// A merged location together with one matching shape's raw geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationWithGeometry {
    pub location: Location,
    pub geometry: geojson::Geometry,
}
