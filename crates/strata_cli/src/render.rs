//! Human-readable diagnostics.

use console::style;
use std::fmt::Write;
use strata_law::{LawResult, LawViolation};
use strata_plugin::{PluginResolution, RegistryConflict};

/// Render one violation with its law name and, when known, location
#[must_use]
pub fn violation(source: &str, v: &LawViolation) -> String {
    let mut out = format!("{}[{}]: {}", style("error").red().bold(), v.law, v.message);
    if let Some(location) = v.location {
        let _ = write!(out, "\n  --> {}:{}", source, location);
    }
    out
}

/// Render a whole law result
#[must_use]
pub fn law_result(source: &str, result: &LawResult) -> String {
    let mut out = String::new();
    for v in result.violations() {
        let _ = writeln!(out, "{}", violation(source, v));
    }
    if result.valid() {
        let _ = writeln!(out, "{}: {}", style("ok").green().bold(), result.summary());
    } else {
        let _ = writeln!(out, "{}", result.summary());
    }
    out
}

/// Render registry conflicts and a resolution
#[must_use]
pub fn resolution(latent: &[RegistryConflict], resolution: &PluginResolution) -> String {
    let mut out = String::new();
    for conflict in latent {
        let _ = writeln!(out, "{}: {}", style("note").cyan(), conflict);
    }

    let _ = writeln!(out, "resolved: {}", resolution.names().join(" -> "));
    for conflict in &resolution.conflicts {
        let _ = writeln!(out, "{}: {}", style("conflict").yellow().bold(), conflict);
    }
    for name in &resolution.missing {
        let _ = writeln!(out, "{}: plugin '{}' is not registered", style("missing").red(), name);
    }
    for cycle in &resolution.cycles {
        let _ = writeln!(out, "{}: {}", style("cycle").red(), cycle.join(" -> "));
    }
    out
}
