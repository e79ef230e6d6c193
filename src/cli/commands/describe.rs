//! describe command - Show tool parameter declarations
//!
//! Prints the declarative schema a UI layer would read to render a tool:
//! datatype, requirement, direction, defaults, constraints, dependencies.

use std::path::Path;

use anyhow::{bail, Result};

use crate::cli::Context;
use crate::core::params::{Constraint, Direction, Requirement, ToolSpec};
use crate::ui::output;

/// Parameter declarations of every built-in tool.
pub fn builtin_specs() -> Vec<ToolSpec> {
    vec![super::update::spec(), super::stamp::spec()]
}

/// Show tool parameter declarations.
///
/// # Arguments
///
/// * `ctx` - Execution context
/// * `tool` - Built-in tool to describe; all tools when `None`
/// * `spec_path` - TOML spec file to load instead of the built-ins
pub fn describe(ctx: &Context, tool: Option<&str>, spec_path: Option<&Path>) -> Result<()> {
    let specs = match spec_path {
        Some(path) => vec![ToolSpec::load(path)?],
        None => {
            let mut specs = builtin_specs();
            if let Some(name) = tool {
                specs.retain(|s| s.name == name);
                if specs.is_empty() {
                    bail!("unknown tool '{}'", name);
                }
            }
            specs
        }
    };

    for (i, spec) in specs.iter().enumerate() {
        if i > 0 {
            output::print("", ctx.verbosity());
        }
        print_spec(ctx, spec);
    }
    Ok(())
}

/// Print one tool spec.
fn print_spec(ctx: &Context, spec: &ToolSpec) {
    let verbosity = ctx.verbosity();

    let heading = match &spec.category {
        Some(category) => format!("{} - {} [{}]", spec.name, spec.label, category),
        None => format!("{} - {}", spec.name, spec.label),
    };
    output::print(heading, verbosity);
    output::print(format!("  {}", spec.description), verbosity);

    if spec.parameters.is_empty() {
        return;
    }
    output::print("  parameters:", verbosity);
    for param in &spec.parameters {
        let mut line = format!(
            "    {:<12} {:<8} {:<8} {:<7} {}",
            param.name,
            param.datatype.to_string(),
            requirement_str(param.requirement),
            direction_str(param.direction),
            param.display_name,
        );
        if let Some(default) = &param.default {
            line.push_str(&format!(" [default: {}]", default));
        }
        if let Some(constraint) = &param.constraint {
            line.push_str(&format!(" ({})", constraint_str(constraint)));
        }
        if let Some(dep) = &param.depends_on {
            line.push_str(&format!(" (depends on {})", dep));
        }
        output::print(line, verbosity);
    }
}

fn requirement_str(requirement: Requirement) -> &'static str {
    match requirement {
        Requirement::Required => "required",
        Requirement::Optional => "optional",
        Requirement::Derived => "derived",
    }
}

fn direction_str(direction: Direction) -> &'static str {
    match direction {
        Direction::Input => "input",
        Direction::Output => "output",
    }
}

fn constraint_str(constraint: &Constraint) -> String {
    match constraint {
        Constraint::Range { min, max } => format!("range {}-{}", min, max),
        Constraint::ValueList { values } => format!("one of: {}", values.join(", ")),
    }
}
