//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use crate::api::{self, AppState, InsertResponse, ScriptJson, ScriptReport, TypeJson};
use crate::config::Config;
use crate::error::AppError;
use atomspace_core::{AtomSpace, TypeEntry};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE LIMITS
// =============================================================================

/// Maximum script size (100 MB).
const MAX_SCRIPT_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AppError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AppError::Io(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AppError::InvalidRequest(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Canonicalize a path and require it to be a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, AppError> {
    let canonical = path.canonicalize().map_err(|e| {
        AppError::Io(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(AppError::Io(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(
    mut config: Config,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), AppError> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    config.validate()?;

    let space = config.build_space()?;

    println!("AtomSpace Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:        {}", config.server.host);
    println!("  Port:        {}", config.server.port);
    println!("  Types:       {}", space.types().len());
    println!("  Max results: {}", config.query.max_results);
    println!("  Max steps:   {}", config.query.max_steps);
    println!();
    println!("Endpoints:");
    println!("  POST /atoms              - Insert an atom");
    println!("  GET  /atoms/{{handle}}     - Fetch an atom");
    println!("  PUT  /atoms/{{handle}}/truth - Revise a truth value");
    println!("  POST /query              - Run a pattern query");
    println!("  GET  /types              - List types");
    println!("  GET  /status             - Store counts");
    println!("  GET  /health             - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(space, config.limits());
    api::run_server(state, &config.server).await
}

// =============================================================================
// RUN COMMAND
// =============================================================================

/// Execute a script file against a fresh store.
pub fn cmd_run(config: &Config, file: &Path, json_mode: bool) -> Result<(), AppError> {
    let path = validate_file_path(file)?;
    validate_file_size(&path, MAX_SCRIPT_FILE_SIZE)?;

    let content = std::fs::read_to_string(&path)
        .map_err(|e| AppError::Io(format!("Cannot read '{}': {}", path.display(), e)))?;
    let script: ScriptJson = serde_json::from_str(&content)
        .map_err(|e| AppError::InvalidRequest(format!("Invalid script: {}", e)))?;

    let space = config.build_space()?;
    let report = run_script(&space, &script, config)?;

    if json_mode {
        let output = serde_json::to_string_pretty(&report)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        println!("{}", output);
    } else {
        let created = report.atoms.iter().filter(|a| a.created).count();
        println!("Atoms:   {} inserted ({} new)", report.atoms.len(), created);
        println!("Store:   {} atoms", space.len());
        for (i, result) in report.queries.iter().enumerate() {
            println!();
            println!(
                "Query {}: {} solution(s){}{}",
                i,
                result.count,
                if result.truncated {
                    " (result cap reached)"
                } else {
                    ""
                },
                if result.budget_exhausted {
                    " (step cap reached)"
                } else {
                    ""
                }
            );
            for binding in &result.bindings {
                let vars: Vec<String> = binding
                    .values
                    .iter()
                    .map(|(name, h)| format!("{}=#{}", name, h))
                    .collect();
                println!("  {}", vars.join(" "));
            }
        }
    }
    Ok(())
}

/// Apply a script: register types, insert atoms, then run queries in order.
pub fn run_script(
    space: &AtomSpace,
    script: &ScriptJson,
    config: &Config,
) -> Result<ScriptReport, AppError> {
    for decl in &script.types {
        space.register_type(&decl.name, decl.parent.as_deref())?;
    }

    let mut report = ScriptReport::default();
    for request in &script.atoms {
        let truth = request.truth.map(|t| t.to_truth()).transpose()?;
        let outcome = space.insert_with_outcome(&request.atom.to_spec(), truth)?;
        report.atoms.push(InsertResponse {
            handle: outcome.handle().value(),
            created: outcome.is_created(),
        });
    }
    tracing::debug!(atoms = report.atoms.len(), "script atoms applied");

    for query in &script.queries {
        report
            .queries
            .push(api::execute_query(space, query, config.limits())?);
    }
    Ok(report)
}

// =============================================================================
// TYPES COMMAND
// =============================================================================

/// Print the type hierarchy of a store built from the configuration.
pub fn cmd_types(config: &Config, json_mode: bool) -> Result<(), AppError> {
    let space = config.build_space()?;
    let entries = space.types();

    if json_mode {
        let types: Vec<TypeJson> = entries
            .iter()
            .map(|e| TypeJson::from_entry(e, &entries))
            .collect();
        let output = serde_json::to_string_pretty(&types)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        println!("{}", output);
    } else {
        for line in render_type_tree(&entries) {
            println!("{}", line);
        }
    }
    Ok(())
}

/// Indented tree, children in registration order.
pub fn render_type_tree(entries: &[TypeEntry]) -> Vec<String> {
    fn walk(entries: &[TypeEntry], entry: &TypeEntry, depth: usize, out: &mut Vec<String>) {
        out.push(format!("{}{}", "  ".repeat(depth), entry.name));
        for child in entries.iter().filter(|e| e.parent == Some(entry.id)) {
            walk(entries, child, depth + 1, out);
        }
    }

    let mut out = Vec::with_capacity(entries.len());
    for root in entries.iter().filter(|e| e.parent.is_none()) {
        walk(entries, root, 0, &mut out);
    }
    out
}

// =============================================================================
// CONFIG COMMAND
// =============================================================================

pub fn cmd_config(config: &Config) -> Result<(), AppError> {
    print!("{}", config.to_toml()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{AtomSpecJson, InsertRequest, PatternTermJson, QueryRequest};

    fn walmart_script() -> ScriptJson {
        serde_json::from_str(
            r#"{
                "types": [
                    {"name": "Concept", "parent": "Node"},
                    {"name": "Categorization", "parent": "Link"}
                ],
                "atoms": [
                    {"atom": {"type": "Categorization", "outgoing": [
                        {"type": "Concept", "name": "Walmart"},
                        {"type": "Concept", "name": "Groceries"}
                    ]}},
                    {"atom": {"type": "Categorization", "outgoing": [
                        {"type": "Concept", "name": "Target"},
                        {"type": "Concept", "name": "Groceries"}
                    ]}}
                ],
                "queries": [
                    {"clauses": [{"type": "Categorization", "outgoing": [
                        {"var": "$S"},
                        {"type": "Concept", "name": "Groceries"}
                    ]}]}
                ]
            }"#,
        )
        .expect("script")
    }

    #[test]
    fn script_runs_end_to_end() {
        let config = Config::default();
        let space = config.build_space().expect("space");
        let report = run_script(&space, &walmart_script(), &config).expect("run");

        assert_eq!(report.atoms.len(), 2);
        assert!(report.atoms.iter().all(|a| a.created));
        assert_eq!(report.queries.len(), 1);
        assert_eq!(report.queries[0].count, 2);
        assert!(!report.queries[0].budget_exhausted);
        assert!(!report.queries[0].truncated);
    }

    #[test]
    fn duplicate_script_atoms_are_reported() {
        let config = Config::default();
        let space = config.build_space().expect("space");
        let mut script = walmart_script();
        script.atoms.push(InsertRequest {
            atom: AtomSpecJson::Node {
                atom_type: "Concept".into(),
                name: "Walmart".into(),
            },
            truth: None,
        });
        script.queries.clear();
        let report = run_script(&space, &script, &config).expect("run");
        assert!(!report.atoms[2].created);
    }

    #[test]
    fn script_with_unknown_type_fails() {
        let config = Config::default();
        let space = config.build_space().expect("space");
        let script = ScriptJson {
            queries: vec![QueryRequest {
                clauses: vec![PatternTermJson::Node {
                    atom_type: "Nope".into(),
                    name: "x".into(),
                }],
                constraints: vec![],
                max_results: None,
                max_steps: None,
            }],
            ..ScriptJson::default()
        };
        assert!(run_script(&space, &script, &config).is_err());
    }

    #[test]
    fn type_tree_indents_children() {
        let space = AtomSpace::new();
        space.register_type("Concept", Some("Node")).expect("type");
        let lines = render_type_tree(&space.types());
        assert_eq!(lines[0], "Atom");
        assert!(lines.contains(&"    Concept".to_string()));
    }

    #[test]
    fn oversize_check_reads_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("s.json");
        std::fs::write(&path, "{}").expect("write");
        assert!(validate_file_size(&path, 1).is_err());
        assert!(validate_file_size(&path, 1024).is_ok());
        assert!(validate_file_path(dir.path()).is_err());
    }
}
