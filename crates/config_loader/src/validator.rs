//! Configuration validation module
//!
//! Validation rules:
//! - field bounds via `validator` derive (worker_count, history_limit, ...)
//! - temp_dir / database_path non-empty
//! - at least one stage enabled (an empty registry produces empty results
//!   for every job)

use contracts::{ContractError, EngineBlueprint};
use validator::Validate;

/// Validate an EngineBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    validate_derived_bounds(blueprint)?;
    validate_paths(blueprint)?;
    validate_stage_toggles(blueprint)?;
    Ok(())
}

/// Field-level bounds declared on the blueprint types
fn validate_derived_bounds(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|e| {
        let field = e
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        ContractError::config_validation(field, e.to_string())
    })
}

/// Storage and temp paths must be non-empty
fn validate_paths(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    if blueprint.engine.temp_dir.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "engine.temp_dir",
            "must not be empty",
        ));
    }
    if blueprint.storage.database_path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "storage.database_path",
            "must not be empty",
        ));
    }
    Ok(())
}

/// At least one stage must be enabled
fn validate_stage_toggles(blueprint: &EngineBlueprint) -> Result<(), ContractError> {
    let s = &blueprint.stages;
    let any = s.signal_features
        || s.harmonic_profile
        || s.listening
        || s.lyric_analysis
        || s.industry
        || s.platform
        || s.market
        || s.culture
        || s.audience;
    if !any {
        return Err(ContractError::config_validation(
            "stages",
            "all stages disabled; every job would produce an empty result",
        ));
    }
    Ok(())
}
