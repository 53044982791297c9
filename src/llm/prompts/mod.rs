// ABOUTME: System prompts for the business-analyst chat loaded at compile time
// ABOUTME: Renders the decision-phase prompt with the current date and exposes the narrative task prompt
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Commerce Insights Contributors

//! # System Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

use chrono::NaiveDate;

/// Decision-phase prompt; `{{fecha_actual}}` is replaced with the current date
pub const BUSINESS_ANALYST_PROMPT: &str = include_str!("business_analyst.md");

/// Narrative-phase system prompt
pub const NARRATIVE_TASK_PROMPT: &str = include_str!("narrative_task.md");

/// Assistant turn that introduces the analysis text in the narrative phase
pub const ANALYSIS_PREAMBLE: &str = "Datos disponibles para análisis (resumen estructurado):\n";

/// Final user instruction of the narrative phase
pub const ANALYSIS_INSTRUCTION: &str =
    "Analizá estos datos y devolvé conclusiones, insights y recomendaciones. No incluyas datos crudos.";

const DATE_PLACEHOLDER: &str = "{{fecha_actual}}";

/// Business-analyst prompt for a given day, formatted `dd/mm/yyyy`
#[must_use]
pub fn business_analyst_prompt(today: NaiveDate) -> String {
    BUSINESS_ANALYST_PROMPT.replace(DATE_PLACEHOLDER, &today.format("%d/%m/%Y").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_date_and_tool_name() {
        let prompt = business_analyst_prompt(NaiveDate::from_ymd_opt(2025, 2, 7).unwrap());
        assert!(prompt.contains("Fecha actual: 07/02/2025"));
        assert!(prompt.contains("getStats"));
        assert!(!prompt.contains(DATE_PLACEHOLDER));
    }

    #[test]
    fn narrative_prompt_starts_with_task() {
        assert!(NARRATIVE_TASK_PROMPT.starts_with("TAREA:"));
    }
}
