//! Highway classes and speed resolution
//!
//! Only drivable classes are routable. Each class has a default speed in mph,
//! overridden by an explicit `maxspeed` tag when that tag can be parsed to a
//! positive value.

use std::fmt;
use std::str::FromStr;

/// Kilometres per mile
pub const KM_PER_MILE: f64 = 1.60934;

/// Road classes accepted into the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighwayClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    LivingStreet,
    Service,
    MotorwayLink,
    TrunkLink,
    PrimaryLink,
    SecondaryLink,
    TertiaryLink,
}

impl HighwayClass {
    pub const ALL: [HighwayClass; 14] = [
        HighwayClass::Motorway,
        HighwayClass::Trunk,
        HighwayClass::Primary,
        HighwayClass::Secondary,
        HighwayClass::Tertiary,
        HighwayClass::Unclassified,
        HighwayClass::Residential,
        HighwayClass::LivingStreet,
        HighwayClass::Service,
        HighwayClass::MotorwayLink,
        HighwayClass::TrunkLink,
        HighwayClass::PrimaryLink,
        HighwayClass::SecondaryLink,
        HighwayClass::TertiaryLink,
    ];

    /// Default travel speed in mph when the way carries no usable `maxspeed`
    pub const fn default_mph(self) -> f64 {
        match self {
            HighwayClass::Motorway => 70.0,
            HighwayClass::Trunk => 60.0,
            HighwayClass::Primary => 60.0,
            HighwayClass::Secondary => 45.0,
            HighwayClass::Tertiary => 35.0,
            HighwayClass::Unclassified => 55.0,
            HighwayClass::Residential => 25.0,
            HighwayClass::LivingStreet => 25.0,
            HighwayClass::Service => 25.0,
            HighwayClass::MotorwayLink => 45.0,
            HighwayClass::TrunkLink => 35.0,
            HighwayClass::PrimaryLink => 30.0,
            HighwayClass::SecondaryLink => 30.0,
            HighwayClass::TertiaryLink => 35.0,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            HighwayClass::Motorway => "motorway",
            HighwayClass::Trunk => "trunk",
            HighwayClass::Primary => "primary",
            HighwayClass::Secondary => "secondary",
            HighwayClass::Tertiary => "tertiary",
            HighwayClass::Unclassified => "unclassified",
            HighwayClass::Residential => "residential",
            HighwayClass::LivingStreet => "living_street",
            HighwayClass::Service => "service",
            HighwayClass::MotorwayLink => "motorway_link",
            HighwayClass::TrunkLink => "trunk_link",
            HighwayClass::PrimaryLink => "primary_link",
            HighwayClass::SecondaryLink => "secondary_link",
            HighwayClass::TertiaryLink => "tertiary_link",
        }
    }
}

impl fmt::Display for HighwayClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned for highway values outside the drivable whitelist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotRoutable(pub String);

impl FromStr for HighwayClass {
    type Err = NotRoutable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HighwayClass::ALL
            .iter()
            .copied()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| NotRoutable(s.to_string()))
    }
}

/// Where a way's resolved speed came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedSource {
    /// Parsed from the `maxspeed` tag
    Tagged,
    /// No `maxspeed` tag, class default used
    ClassDefault,
    /// `maxspeed` present but unparseable or non-positive, class default used
    Fallback,
}

/// Speed resolved once per way, applied to all of its segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedSpeed {
    pub mph: f64,
    pub source: SpeedSource,
}

/// Resolve the travel speed of a way from its class and optional `maxspeed` tag
pub fn resolve_speed(class: HighwayClass, maxspeed: Option<&str>) -> ResolvedSpeed {
    match maxspeed {
        None => ResolvedSpeed {
            mph: class.default_mph(),
            source: SpeedSource::ClassDefault,
        },
        Some(raw) => match parse_maxspeed_mph(raw) {
            Some(mph) => ResolvedSpeed {
                mph,
                source: SpeedSource::Tagged,
            },
            None => ResolvedSpeed {
                mph: class.default_mph(),
                source: SpeedSource::Fallback,
            },
        },
    }
}

/// Parse a `maxspeed` value into mph
///
/// Accepted forms: `"50"` (km/h), `"50 km/h"`, `"50km/h"`, `"30 mph"`,
/// `"30mph"`. Returns `None` for anything else and for values that are not
/// strictly positive and finite.
pub fn parse_maxspeed_mph(raw: &str) -> Option<f64> {
    let raw = raw.trim();

    let mph = if let Some(value) = raw.strip_suffix("mph") {
        parse_number(value)?
    } else if let Some(value) = raw.strip_suffix("km/h") {
        kmh_to_mph(parse_number(value)?)
    } else {
        // Bare numbers are km/h
        kmh_to_mph(parse_number(raw)?)
    };

    (mph.is_finite() && mph > 0.0).then_some(mph)
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    s.parse::<f64>().ok()
}

/// Convert km/h to mph
pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh / KM_PER_MILE
}

/// Whether a `oneway` tag value restricts travel to the way's node order
pub fn is_oneway(value: Option<&str>) -> bool {
    matches!(value, Some("yes") | Some("true") | Some("1"))
}
