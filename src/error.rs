use thiserror::Error;

/// Failures the scoring pipeline can surface.
///
/// Degenerate-but-valid configuration (zero weights, zero variance,
/// `rec_dose == min_dose`) never produces one of these.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("column mapping error: {logical} column '{physical}' was not found in the input")]
    MissingColumn {
        logical: &'static str,
        physical: String,
    },

    #[error(
        "column mapping error: brand column '{physical}' was not found in the input \
         (set columns.brand in the rule book to the input's brand column, or to null to skip brands)"
    )]
    MissingBrandColumn { physical: String },

    #[error("failed to aggregate input rows: {source}")]
    Preprocess {
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// True for errors caused by the rule book's column mapping.
    pub fn is_configuration(&self) -> bool {
        match self {
            EngineError::MissingColumn { .. } | EngineError::MissingBrandColumn { .. } => true,
            EngineError::Preprocess { source } => source.is_configuration(),
        }
    }
}
