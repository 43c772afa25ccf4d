use crate::report::{RunReport, Severity, Violation};
use serde_sarif::sarif::{
    ArtifactLocation, Location, Message, MultiformatMessageString, PhysicalLocation,
    ReportingDescriptor, Result as SarifResult, ResultLevel, Run, Sarif, Tool, ToolComponent,
};
use std::collections::HashMap;

pub fn format(report: &RunReport) -> String {
    let all_violations: Vec<&Violation> = report.violations.iter().collect();

    // Collect unique codes
    let mut code_map: HashMap<&str, &Violation> = HashMap::new();
    for v in &all_violations {
        code_map.entry(v.code.as_str()).or_insert(v);
    }

    let mut code_ids: Vec<&str> = code_map.keys().copied().collect();
    code_ids.sort();

    let code_index: HashMap<&str, i64> = code_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (*id, i as i64))
        .collect();

    let rules: Vec<ReportingDescriptor> = code_ids
        .iter()
        .map(|id| {
            let v = code_map[id];
            let mut rule = ReportingDescriptor::builder().id(id.to_string()).build();
            rule.short_description = Some(
                MultiformatMessageString::builder()
                    .text(v.message.clone())
                    .build(),
            );
            if let Some(ref rem) = v.remediation {
                rule.help = Some(
                    MultiformatMessageString::builder()
                        .text(rem.clone())
                        .build(),
                );
            }
            rule
        })
        .collect();

    let results: Vec<SarifResult> = all_violations
        .iter()
        .map(|v| {
            let level = match v.severity {
                Severity::Error => ResultLevel::Error,
                Severity::Warning => ResultLevel::Warning,
                Severity::Info => ResultLevel::Note,
            };

            let mut result = SarifResult::builder()
                .message(Message::builder().text(v.message.clone()).build())
                .build();

            result.rule_id = Some(v.code.clone());
            result.level = Some(level);
            result.rule_index = code_index.get(v.code.as_str()).copied();

            if let Some(ref file) = v.file {
                let uri = file.to_string_lossy().replace('\\', "/");

                let mut location = Location::builder().build();
                let mut physical = PhysicalLocation::builder().build();
                physical.artifact_location = Some(ArtifactLocation::builder().uri(uri).build());
                location.physical_location = Some(physical);
                result.locations = Some(vec![location]);
            }

            result
        })
        .collect();

    let driver = ToolComponent::builder()
        .name("ch-rulebook")
        .version(env!("CARGO_PKG_VERSION").to_string())
        .rules(rules)
        .build();

    let tool = Tool::builder().driver(driver).build();

    let run = Run::builder().tool(tool).results(results).build();

    let sarif = Sarif::builder().version("2.1.0").runs(vec![run]).build();

    serde_json::to_string_pretty(&sarif).expect("SARIF serialization failed")
}
