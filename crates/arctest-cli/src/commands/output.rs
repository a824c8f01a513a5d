//! Shared output formatting for check results.

use anyhow::Result;
use arctest::{CheckReport, Config};
use serde::Serialize;

use crate::OutputFormat;

#[derive(Serialize)]
struct JsonReport<'a> {
    passed: bool,
    count: usize,
    violations: &'a [String],
}

/// Prints a report in the given format.
pub fn print(report: &CheckReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_text(report),
        OutputFormat::Json => println!("{}", render_json(report)?),
        OutputFormat::Compact => {
            for violation in &report.violations {
                println!("{violation}");
            }
        }
    }
    Ok(())
}

fn print_text(report: &CheckReport) {
    for (i, violation) in report.violations.iter().enumerate() {
        println!("\x1b[31mviolation\x1b[0m [{}] {violation}", i + 1);
    }
    if !report.is_empty() {
        println!();
    }

    if report.passed() {
        println!("\x1b[32mArchitecture check passed\x1b[0m");
    } else {
        println!(
            "\x1b[31mFound {} architecture violation(s)\x1b[0m",
            report.len()
        );
    }
}

fn render_json(report: &CheckReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(&JsonReport {
        passed: report.passed(),
        count: report.len(),
        violations: &report.violations,
    })?)
}

/// Prints the loaded rule configuration.
pub fn print_config(config: &Config) {
    println!("Layers:");
    for layer in &config.layers {
        println!("  {} = {}", layer.name, layer.pattern);
    }
    if !config.rules.is_empty() {
        println!("Allowed dependencies:");
        for rule in &config.rules {
            println!("  {} -> {}", rule.from, rule.to);
        }
    }
    for rule in &config.interface_rules {
        println!(
            "Interface rule: {} implements {}",
            rule.struct_pattern, rule.interface_pattern
        );
    }
    for rule in &config.parameter_rules {
        let shape = if rule.should_use_interface {
            "interface"
        } else {
            "struct"
        };
        println!(
            "Parameter rule: {}.{} params {} use {shape}",
            rule.struct_pattern, rule.method_pattern, rule.parameter_type_pattern
        );
    }
    for rule in &config.layer_specific_rules {
        println!("Layer rule: {} ({})", rule.layer, rule.rule_type);
        for (key, value) in &rule.parameters {
            println!("  {key} = {value}");
        }
    }
    for rule in &config.direct_layer_dependency_rules {
        let verb = if rule.allowed { "may" } else { "must not" };
        println!(
            "Direct rule: {} {verb} depend on {}",
            rule.source_layer, rule.target_layer
        );
    }
    if !config.exclude.is_empty() {
        println!("Exclude: {}", config.exclude.join(", "));
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_report_shape() {
        let report = CheckReport::from(vec!["Package \"a\" imports \"b\"".to_string()]);
        let value: serde_json::Value = serde_json::from_str(&render_json(&report).unwrap()).unwrap();
        assert_eq!(value["passed"], false);
        assert_eq!(value["count"], 1);
        assert_eq!(value["violations"][0], "Package \"a\" imports \"b\"");
    }

    #[test]
    fn empty_report_passes() {
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&CheckReport::new()).unwrap()).unwrap();
        assert_eq!(value["passed"], true);
        assert!(value["violations"].as_array().unwrap().is_empty());
    }
}
