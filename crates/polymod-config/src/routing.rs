//! Routing description file format.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use polymod_core::{DestinationId, ModMatrix, RowSettings, SharedRouting, SourceId};
use serde::Deserialize;

use crate::error::ConfigError;
use crate::validation::{
    ValidationError, ValidationResult, clamp_depth, clamp_scale, validate_finite,
};

/// A source or destination written either by name or by raw id.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IdSpec {
    /// Raw configuration id (`0` = none).
    Raw(u16),
    /// Stable name (`"lfo1"`, `"osc1.pitch_linear"`, `"none"`).
    Name(String),
}

impl fmt::Display for IdSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdSpec::Raw(raw) => write!(f, "{raw}"),
            IdSpec::Name(name) => f.write_str(name),
        }
    }
}

impl IdSpec {
    /// Resolve as a source id.
    pub fn to_source(&self) -> Option<SourceId> {
        match self {
            IdSpec::Raw(raw) => SourceId::from_raw(*raw).ok(),
            IdSpec::Name(name) => name.parse().ok(),
        }
    }

    /// Resolve as a destination id.
    pub fn to_destination(&self) -> Option<DestinationId> {
        match self {
            IdSpec::Raw(raw) => DestinationId::from_raw(*raw).ok(),
            IdSpec::Name(name) => name.parse().ok(),
        }
    }
}

/// One `[[route]]` entry.
///
/// Omitted ids are unset and omitted depths are 0, except `scale_amount`
/// which defaults to 1.0 (the scale source applies fully).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteConfig {
    /// Target matrix row.
    pub row: usize,

    /// Primary source.
    #[serde(default)]
    pub source: Option<IdSpec>,

    /// First destination.
    #[serde(default)]
    pub destination_1: Option<IdSpec>,

    /// Depth for the first destination.
    #[serde(default)]
    pub amount_1: f32,

    /// Second destination.
    #[serde(default)]
    pub destination_2: Option<IdSpec>,

    /// Depth for the second destination.
    #[serde(default)]
    pub amount_2: f32,

    /// Scale source for the second destination.
    #[serde(default)]
    pub scale: Option<IdSpec>,

    /// How strongly the scale source applies.
    #[serde(default = "default_scale_amount")]
    pub scale_amount: f32,
}

fn default_scale_amount() -> f32 {
    1.0
}

type Clamp = fn(usize, &'static str, f32) -> f32;

impl RouteConfig {
    /// Create an empty route for `row`.
    pub fn new(row: usize) -> Self {
        Self {
            row,
            source: None,
            destination_1: None,
            amount_1: 0.0,
            destination_2: None,
            amount_2: 0.0,
            scale: None,
            scale_amount: default_scale_amount(),
        }
    }

    /// Resolve ids and clamp depths, collecting every problem into `errors`.
    fn resolve(&self, errors: &mut Vec<ValidationError>) -> RowSettings {
        let row = self.row;

        let mut source = |field: &'static str, spec: &Option<IdSpec>| match spec {
            None => SourceId::None,
            Some(spec) => spec.to_source().unwrap_or_else(|| {
                errors.push(ValidationError::UnknownSource {
                    row,
                    field,
                    id: spec.to_string(),
                });
                SourceId::None
            }),
        };
        let primary = source("source", &self.source);
        let scale = source("scale", &self.scale);

        let mut destination = |field: &'static str, spec: &Option<IdSpec>| match spec {
            None => DestinationId::None,
            Some(spec) => spec.to_destination().unwrap_or_else(|| {
                errors.push(ValidationError::UnknownDestination {
                    row,
                    field,
                    id: spec.to_string(),
                });
                DestinationId::None
            }),
        };
        let destination_1 = destination("destination_1", &self.destination_1);
        let destination_2 = destination("destination_2", &self.destination_2);

        let mut amount = |field: &'static str, value: f32, clamp: Clamp| {
            match validate_finite(row, field, value) {
                Ok(value) => clamp(row, field, value),
                Err(err) => {
                    errors.push(err);
                    0.0
                }
            }
        };

        RowSettings {
            source: primary,
            destination_1,
            destination_2,
            scale,
            amount_1: amount("amount_1", self.amount_1, clamp_depth),
            amount_2: amount("amount_2", self.amount_2, clamp_depth),
            scale_amount: amount("scale_amount", self.scale_amount, clamp_scale),
        }
    }
}

/// A complete routing description.
///
/// Rows that no route mentions are reset to their defaults when the
/// description is applied or published.
///
/// # TOML Format
///
/// ```toml
/// [[route]]
/// row = 0
/// source = "global_lfo"
/// destination_1 = "osc1.pitch_linear"
/// amount_1 = 0.2
/// destination_2 = "filter1.freq"
/// amount_2 = 0.5
/// scale = "mod_wheel"
/// scale_amount = 1.0
///
/// [[route]]
/// row = 1
/// source = 9            # raw id of lfo1
/// destination_1 = 90    # raw id of global_adsr.attack
/// amount_1 = -0.3
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RoutingConfig {
    /// Routes in file order.
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteConfig>,
}

impl RoutingConfig {
    /// Create an empty description.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Load a description from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a description from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Number of routes.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// `true` if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Resolve into settings for a matrix of `rows` rows.
    ///
    /// The result has exactly `rows` entries; unmentioned rows hold
    /// [`RowSettings::default`]. Nothing is returned unless the whole
    /// description is valid.
    pub fn resolve(&self, rows: usize) -> ValidationResult<Vec<RowSettings>> {
        let mut settings = vec![RowSettings::default(); rows];
        let mut errors = Vec::new();
        let mut seen = HashSet::new();

        for route in &self.routes {
            let resolved = route.resolve(&mut errors);
            if route.row >= rows {
                errors.push(ValidationError::RowOutOfRange {
                    row: route.row,
                    rows,
                });
            } else if !seen.insert(route.row) {
                errors.push(ValidationError::DuplicateRow { row: route.row });
            } else {
                settings[route.row] = resolved;
            }
        }

        ValidationError::from_list(errors)?;
        Ok(settings)
    }

    /// Check the description against a matrix of `rows` rows.
    pub fn validate(&self, rows: usize) -> ValidationResult<()> {
        self.resolve(rows).map(|_| ())
    }

    /// Configure `matrix` from this description.
    ///
    /// The matrix is left untouched if the description is invalid.
    pub fn apply<const ROWS: usize>(
        &self,
        matrix: &mut ModMatrix<ROWS>,
    ) -> Result<(), ConfigError> {
        let settings = self.resolve(ROWS)?;
        for (row, settings) in settings.into_iter().enumerate() {
            matrix.set_row(row, settings);
        }
        tracing::debug!(routes = self.routes.len(), rows = ROWS, "routing applied");
        Ok(())
    }

    /// Push this description to the audio thread through `shared`.
    ///
    /// Nothing is published if the description is invalid.
    pub fn publish<const ROWS: usize>(
        &self,
        shared: &SharedRouting<ROWS>,
    ) -> Result<(), ConfigError> {
        let settings = self.resolve(ROWS)?;
        for (row, settings) in settings.into_iter().enumerate() {
            shared.set_row(row, settings);
        }
        tracing::debug!(routes = self.routes.len(), rows = ROWS, "routing published");
        Ok(())
    }
}
