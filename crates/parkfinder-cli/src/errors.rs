use console::style;
use parkfinder_core::ParkfinderError;
use std::fmt;

/// Error with context and suggestions for the terminal
pub struct CliError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn display(&self) {
        eprintln!("{} {}", style("✗").red().bold(), style(&self.message).red().bold());

        if let Some(ref context) = self.context {
            eprintln!("\n{}", context);
        }

        if !self.suggestions.is_empty() {
            eprintln!("\n{}", style("To fix this:").yellow().bold());
            for (i, suggestion) in self.suggestions.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, suggestion);
            }
        }
        eprintln!();
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Debug for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Turn any error from a lookup or startup into a displayable error,
/// with suggestions for the failures a user can act on
pub fn explain(error: &anyhow::Error) -> CliError {
    let Some(err) = error.downcast_ref::<ParkfinderError>() else {
        return CliError::new(error.to_string());
    };

    let base = CliError::new(err.to_string());
    match err {
        ParkfinderError::InvalidOrigin { .. } => base
            .with_suggestion("Check the postal code or address for typos")
            .with_suggestion("Set a region qualifier (--region \"Victoria, BC\") to narrow the search"),
        ParkfinderError::ProviderTimeout { provider, .. } => base
            .with_context(format!("{} may be overloaded or unreachable.", provider))
            .with_suggestion("Try again in a moment")
            .with_suggestion("Raise the timeout with --timeout or PARKFINDER_PROVIDER_TIMEOUT"),
        ParkfinderError::ProviderError { .. } => base
            .with_suggestion("Check network access and the provider base URL (--show-config)"),
        ParkfinderError::DatasetNotFound { path } => base
            .with_context(format!("Path: {}", path.display()))
            .with_suggestion("Pass the dataset location with --dataset")
            .with_suggestion("Or set PARKFINDER_DATASET or `dataset` in the config file"),
        ParkfinderError::UnsupportedFormat { .. } | ParkfinderError::ParseError { .. } => base
            .with_suggestion("Use a polygon Shapefile (.shp with .shx/.dbf) or a GeoJSON file"),
        ParkfinderError::EmptyStore { .. } => base
            .with_suggestion("Check that the dataset contains polygon features")
            .with_suggestion("Check the [fields] mapping in the config file"),
        ParkfinderError::ConfigInvalid { .. } | ParkfinderError::ConfigMissing { .. } => base
            .with_suggestion("Inspect the effective configuration with --show-config"),
        _ => base,
    }
}
