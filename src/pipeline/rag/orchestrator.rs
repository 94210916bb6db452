use std::time::Instant;

use super::generator::TemplateNarrator;
use super::ollama::OllamaClient;
use super::prompt::{build_correction_prompt, build_discharge_prompt};
use super::types::{LlmGenerate, SummaryOutcome};
use super::RagError;
use crate::config::BackendConfig;
use crate::models::ClinicalRecord;
use crate::pipeline::safety::{check_completeness, HallucinationValidator};
use crate::pipeline_config::{GenerationConfig, ValidatorConfig};

/// Discharge summary orchestrator.
///
/// Coordinates: prompt → generate → validate → (correct → validate) →
/// completeness. At most one correction pass; completeness warnings never
/// trigger one.
pub struct DischargeSummaryPipeline<'a, G: LlmGenerate + ?Sized> {
    generator: &'a G,
    validator: HallucinationValidator,
    config: GenerationConfig,
}

impl<'a, G: LlmGenerate + ?Sized> DischargeSummaryPipeline<'a, G> {
    pub fn new(generator: &'a G) -> Self {
        Self {
            generator,
            validator: HallucinationValidator::default(),
            config: GenerationConfig::discharge_summary(),
        }
    }

    pub fn with_validator(mut self, config: ValidatorConfig) -> Self {
        self.validator = HallucinationValidator::new(config);
        self
    }

    pub fn with_generation(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn run(&self, record: &ClinicalRecord) -> Result<SummaryOutcome, RagError> {
        let start = Instant::now();

        let mut text = self
            .generator
            .generate(&build_discharge_prompt(record), &self.config)?;
        let mut validation = self.validator.validate(&text, record);
        let mut regenerated = false;

        if !validation.ok {
            tracing::warn!(
                violations = validation.violations.len(),
                "Narrative rejected, regenerating with correction prompt"
            );
            let prompt = build_correction_prompt(record, &validation.violations);
            text = self.generator.generate(&prompt, &self.config)?;
            validation = self.validator.validate(&text, record);
            regenerated = true;
        }

        let warnings = check_completeness(&text, record);

        tracing::info!(
            ok = validation.ok,
            regenerated,
            completeness_warnings = warnings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Discharge summary finished"
        );

        Ok(SummaryOutcome {
            text,
            validation,
            warnings,
            regenerated,
        })
    }
}

/// Narrator selected by [`BackendConfig`].
pub enum Narrator {
    Ollama(OllamaClient),
    Template,
}

impl Narrator {
    pub fn from_config(config: &BackendConfig) -> Result<Self, RagError> {
        match config {
            BackendConfig::Ollama(settings) => Ok(Self::Ollama(OllamaClient::new(settings)?)),
            BackendConfig::Template => Ok(Self::Template),
        }
    }

    /// Write and check the discharge summary for `record`.
    pub fn summarize(
        &self,
        record: &ClinicalRecord,
        validator: &ValidatorConfig,
    ) -> Result<SummaryOutcome, RagError> {
        match self {
            Self::Ollama(client) => DischargeSummaryPipeline::new(client)
                .with_validator(validator.clone())
                .run(record),
            Self::Template => {
                let text = TemplateNarrator::narrate(record);
                let validation = HallucinationValidator::new(validator.clone()).validate(&text, record);
                let warnings = check_completeness(&text, record);
                Ok(SummaryOutcome {
                    text,
                    validation,
                    warnings,
                    regenerated: false,
                })
            }
        }
    }
}
