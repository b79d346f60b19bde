//! Notebook building: classify decoded payloads and assemble ipynb documents.
//!
//! Real DBC archives are loose about shape: an entry may hold a single
//! notebook record (`commands` or `cells`), a `notebooks` wrapper holding
//! several, a bare JSON array, or something else entirely. Classification is
//! a tagged-variant function so downstream code matches exhaustively instead
//! of re-probing keys. Checked against a payload in this order:
//!
//! 1. `notebooks` wrapper (or bare array) — recurse, fan out
//! 2. `cells` list — Jupyter-style records in declared order
//! 3. `commands` list — Databricks records ordered by their `position` field
//! 4. anything else — preserved as a single code cell
//!
//! After cells are assembled, each one is split on Databricks'
//! `# COMMAND ----------` separator and checked for a leading line magic
//! (`%sql`, `%md`, ...).

use crate::converter::ConvertOptions;
use crate::decode::DecodedPayload;
use dbcnb_core::{Language, NotebookCell, NotebookDocument};
use serde_json::Value;

/// Databricks' in-source cell separator for notebooks stored as one blob.
pub const COMMAND_BOUNDARY: &str = "# COMMAND ----------";

/// A notebook document paired with the name it should be written under.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertedNotebook {
    /// Name resolved from the payload's `name` field or the entry stem
    pub name: String,
    /// The assembled notebook document
    pub document: NotebookDocument,
}

/// Logical shape of a decoded DBC payload.
#[derive(Debug, Clone, PartialEq)]
enum NotebookSchema<'a> {
    /// A `notebooks` wrapper or bare array: recurse into each record
    Notebooks(&'a [Value]),
    /// Jupyter-style `cells` list, array order preserved
    Cells {
        notebook: &'a Value,
        cells: &'a [Value],
    },
    /// Databricks `commands` list, ordered by `position`
    Commands {
        notebook: &'a Value,
        commands: &'a [Value],
    },
    /// Unrecognized value, preserved as a single code cell
    Fallback(&'a Value),
}

/// A cell as pulled out of a payload, before splitting and magic handling.
#[derive(Debug, Clone, Default)]
struct RawCell {
    source: String,
    markdown: bool,
    language: Option<Language>,
}

/// Leading line magic of a cell.
enum Magic {
    Markdown,
    Language(Language),
}

/// Build zero or more notebook documents from one decoded entry.
///
/// The `notebooks` schema fans out into several documents; notebooks whose
/// cells are all empty produce none. `fallback_name` (normally the archive
/// entry's stem) names notebooks whose payload carries no `name` field.
#[must_use = "this function returns the built notebooks that should be written"]
pub fn build_notebooks(
    payload: &DecodedPayload,
    fallback_name: &str,
    options: &ConvertOptions,
) -> Vec<ConvertedNotebook> {
    match payload {
        DecodedPayload::Json(value) => build_from_value(value, fallback_name, options),
        DecodedPayload::RawText(text) => {
            let raw = RawCell {
                source: text.clone(),
                ..RawCell::default()
            };
            build_single(&Value::Null, vec![raw], fallback_name, options)
                .into_iter()
                .collect()
        }
    }
}

fn build_from_value(
    value: &Value,
    fallback_name: &str,
    options: &ConvertOptions,
) -> Vec<ConvertedNotebook> {
    match classify(value) {
        NotebookSchema::Notebooks(items) => items
            .iter()
            .filter(|item| item.is_object())
            .flat_map(|item| build_from_value(item, fallback_name, options))
            .collect(),
        NotebookSchema::Cells { notebook, cells } => {
            let raw_cells = cells.iter().map(raw_cell_from_value).collect();
            build_single(notebook, raw_cells, fallback_name, options)
                .into_iter()
                .collect()
        }
        NotebookSchema::Commands { notebook, commands } => {
            let raw_cells = raw_cells_from_commands(commands);
            build_single(notebook, raw_cells, fallback_name, options)
                .into_iter()
                .collect()
        }
        NotebookSchema::Fallback(other) => {
            let raw = RawCell {
                source: serde_json::to_string_pretty(other).unwrap_or_default(),
                ..RawCell::default()
            };
            build_single(other, vec![raw], fallback_name, options)
                .into_iter()
                .collect()
        }
    }
}

fn classify(value: &Value) -> NotebookSchema<'_> {
    if let Some(notebooks) = value.get("notebooks").and_then(Value::as_array) {
        return NotebookSchema::Notebooks(notebooks);
    }
    if let Value::Array(items) = value {
        return NotebookSchema::Notebooks(items);
    }
    if let Some(cells) = value.get("cells").and_then(Value::as_array) {
        return NotebookSchema::Cells {
            notebook: value,
            cells,
        };
    }
    if let Some(commands) = value.get("commands").and_then(Value::as_array) {
        return NotebookSchema::Commands {
            notebook: value,
            commands,
        };
    }
    NotebookSchema::Fallback(value)
}

/// Assemble one notebook from its raw cells.
///
/// Language resolution: an explicit notebook-level `language` field wins;
/// otherwise the first per-cell `language` field; otherwise the configured
/// fallback. Line magics retag individual cells but never the kernel.
fn build_single(
    notebook: &Value,
    raw_cells: Vec<RawCell>,
    fallback_name: &str,
    options: &ConvertOptions,
) -> Option<ConvertedNotebook> {
    let declared = notebook
        .get("language")
        .and_then(Value::as_str)
        .map(Language::normalize);

    let mut first_field: Option<Language> = None;
    let mut cells = Vec::new();

    for raw in raw_cells {
        if first_field.is_none() {
            first_field.clone_from(&raw.language);
        }
        for segment in split_on_boundary(&raw.source) {
            if let Some(cell) = finish_cell(segment, &raw, declared.as_ref()) {
                cells.push(cell);
            }
        }
    }

    if cells.is_empty() {
        return None;
    }

    let language = declared
        .or(first_field)
        .unwrap_or_else(|| options.fallback_language.clone());
    let name = notebook
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(fallback_name);

    Some(ConvertedNotebook {
        name: name.to_string(),
        document: NotebookDocument::new(cells, &language),
    })
}

/// Pull a cell out of a `cells`-schema record (or a single command object).
fn raw_cell_from_value(cell: &Value) -> RawCell {
    let source = cell
        .get("command")
        .or_else(|| cell.get("source"))
        .map(join_source)
        .unwrap_or_default();
    let markdown = cell
        .get("cell_type")
        .or_else(|| cell.get("type"))
        .and_then(Value::as_str)
        .map(|kind| kind.eq_ignore_ascii_case("markdown") || kind.eq_ignore_ascii_case("md"))
        .unwrap_or(false);
    let language = cell
        .get("language")
        .and_then(Value::as_str)
        .map(Language::normalize);

    RawCell {
        source,
        markdown,
        language,
    }
}

/// Order `commands`-schema records by their `position` field.
///
/// Positions are not pre-sorted in storage. The sort is stable, so records
/// sharing a position keep their array order; a missing position sorts as 0.
fn raw_cells_from_commands(commands: &[Value]) -> Vec<RawCell> {
    let mut ordered: Vec<(f64, &Value)> = commands
        .iter()
        .map(|command| {
            let position = command
                .get("position")
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            (position, command)
        })
        .collect();
    ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    ordered
        .into_iter()
        .map(|(_, command)| raw_cell_from_value(command))
        .collect()
}

/// Source text may arrive as a string or as a list of string fragments.
fn join_source(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts.iter().filter_map(Value::as_str).collect(),
        _ => String::new(),
    }
}

/// Split a cell's source on boundary-marker lines.
///
/// The marker line itself is discarded; segments are trimmed and empty ones
/// dropped, so `"x=1\n# COMMAND ----------\ny=2"` yields two cells.
fn split_on_boundary(source: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for line in source.lines() {
        if line.trim() == COMMAND_BOUNDARY {
            segments.push(std::mem::take(&mut current));
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|segment| segment.trim().to_string())
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Turn one non-empty segment into a cell, honoring kind and line magics.
fn finish_cell(segment: String, raw: &RawCell, declared: Option<&Language>) -> Option<NotebookCell> {
    if raw.markdown {
        return Some(NotebookCell::markdown(segment));
    }

    match strip_magic(&segment) {
        Some((Magic::Markdown, body)) => {
            (!body.is_empty()).then(|| NotebookCell::markdown(body))
        }
        Some((Magic::Language(language), body)) => {
            if let Some(declared_language) = declared {
                if *declared_language != language {
                    log::warn!(
                        "cell magic '%{language}' disagrees with declared notebook language \
                         '{declared_language}'; keeping '{declared_language}' for the kernel"
                    );
                }
            }
            (!body.is_empty()).then(|| NotebookCell::code_in(body, &language))
        }
        None => match &raw.language {
            Some(language) => Some(NotebookCell::code_in(segment, language)),
            None => Some(NotebookCell::code(segment)),
        },
    }
}

/// Detect a whole-line `%magic` at the start of a segment.
///
/// Only `%md`/`%md-sandbox` and the language magics are stripped; workflow
/// magics (`%run`, `%sh`, `%pip`, ...) stay in the cell untouched.
fn strip_magic(source: &str) -> Option<(Magic, String)> {
    let first_line = source.lines().next()?.trim();
    let token = first_line.strip_prefix('%')?;
    if token.is_empty() || token.contains(char::is_whitespace) {
        return None;
    }

    let magic = match token.to_ascii_lowercase().as_str() {
        "md" | "md-sandbox" => Magic::Markdown,
        other => Magic::Language(Language::from_magic(other)?),
    };

    let body: String = source.lines().skip(1).collect::<Vec<_>>().join("\n");
    Some((magic, body.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options() -> ConvertOptions {
        ConvertOptions::default()
    }

    fn build_json(value: Value) -> Vec<ConvertedNotebook> {
        build_notebooks(&DecodedPayload::Json(value), "entry", &options())
    }

    // ==================== COMMANDS SCHEMA ====================

    #[test]
    fn test_commands_sorted_by_position() {
        let notebooks = build_json(json!({
            "name": "ordering",
            "language": "python",
            "commands": [
                {"command": "C", "position": 3},
                {"command": "A", "position": 1},
                {"command": "B", "position": 2},
            ]
        }));

        assert_eq!(notebooks.len(), 1);
        let sources: Vec<&str> = notebooks[0].document.cells.iter().map(NotebookCell::source).collect();
        assert_eq!(sources, ["A", "B", "C"], "cells must follow position order, not array order");
    }

    #[test]
    fn test_commands_position_ties_keep_array_order() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "first", "position": 1},
                {"command": "second", "position": 1},
                {"command": "third", "position": 1},
            ]
        }));

        let sources: Vec<&str> = notebooks[0].document.cells.iter().map(NotebookCell::source).collect();
        assert_eq!(sources, ["first", "second", "third"]);
    }

    #[test]
    fn test_commands_missing_position_sorts_first() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "late", "position": 2.5},
                {"command": "early"},
            ]
        }));

        let sources: Vec<&str> = notebooks[0].document.cells.iter().map(NotebookCell::source).collect();
        assert_eq!(sources, ["early", "late"], "missing position defaults to 0");
    }

    #[test]
    fn test_command_source_as_string_list() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": ["x = ", "1"], "position": 1},
            ]
        }));

        assert_eq!(notebooks[0].document.cells[0].source(), "x = 1");
    }

    #[test]
    fn test_commands_empty_sources_dropped() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "   ", "position": 1},
                {"command": "x = 1", "position": 2},
            ]
        }));

        assert_eq!(notebooks[0].document.cells.len(), 1);
        assert_eq!(notebooks[0].document.cells[0].source(), "x = 1");
    }

    // ==================== CELLS SCHEMA ====================

    #[test]
    fn test_cells_preserve_array_order() {
        let notebooks = build_json(json!({
            "cells": [
                {"source": "one"},
                {"source": "two"},
                {"source": "three"},
            ]
        }));

        let sources: Vec<&str> = notebooks[0].document.cells.iter().map(NotebookCell::source).collect();
        assert_eq!(sources, ["one", "two", "three"]);
    }

    #[test]
    fn test_cells_markdown_type_respected() {
        let notebooks = build_json(json!({
            "cells": [
                {"source": "# Title", "cell_type": "markdown"},
                {"source": "x = 1"},
            ]
        }));

        let cells = &notebooks[0].document.cells;
        assert!(!cells[0].is_code(), "cell_type markdown maps to a markdown cell");
        assert!(cells[1].is_code(), "untyped cells default to code");
    }

    #[test]
    fn test_cells_source_list_and_command_key() {
        let notebooks = build_json(json!({
            "cells": [
                {"command": "from command key"},
                {"source": ["a", "b", "c"]},
            ]
        }));

        let cells = &notebooks[0].document.cells;
        assert_eq!(cells[0].source(), "from command key");
        assert_eq!(cells[1].source(), "abc");
    }

    #[test]
    fn test_cells_missing_source_recovered_as_empty() {
        // A cell object with no source field degrades to an empty cell,
        // which the post-processing then drops.
        let notebooks = build_json(json!({
            "cells": [
                {"unrelated": true},
                {"source": "kept"},
            ]
        }));

        assert_eq!(notebooks[0].document.cells.len(), 1);
        assert_eq!(notebooks[0].document.cells[0].source(), "kept");
    }

    // ==================== NOTEBOOKS WRAPPER ====================

    #[test]
    fn test_notebooks_wrapper_fans_out() {
        let notebooks = build_json(json!({
            "notebooks": [
                {"name": "a", "cells": [{"source": "cell"}]},
                {"name": "b", "commands": [{"command": "cmd", "position": 1}]},
            ]
        }));

        assert_eq!(notebooks.len(), 2, "one entry fans out into two documents");
        assert_eq!(notebooks[0].name, "a");
        assert_eq!(notebooks[0].document.cells[0].source(), "cell");
        assert_eq!(notebooks[1].name, "b");
        assert_eq!(notebooks[1].document.cells[0].source(), "cmd");
    }

    #[test]
    fn test_notebooks_wrapper_wins_over_cells_key() {
        // Ambiguous payloads carrying both keys classify as the wrapper.
        let notebooks = build_json(json!({
            "cells": [{"source": "outer"}],
            "notebooks": [
                {"cells": [{"source": "inner"}]},
            ]
        }));

        assert_eq!(notebooks.len(), 1);
        assert_eq!(notebooks[0].document.cells[0].source(), "inner");
    }

    #[test]
    fn test_bare_array_treated_as_notebooks() {
        let notebooks = build_json(json!([
            {"name": "x", "cells": [{"source": "1"}]},
            {"name": "y", "cells": [{"source": "2"}]},
        ]));

        assert_eq!(notebooks.len(), 2);
    }

    #[test]
    fn test_notebooks_wrapper_skips_non_objects() {
        let notebooks = build_json(json!({
            "notebooks": [
                "stray string",
                42,
                {"cells": [{"source": "real"}]},
            ]
        }));

        assert_eq!(notebooks.len(), 1);
        assert_eq!(notebooks[0].document.cells[0].source(), "real");
    }

    #[test]
    fn test_nested_notebooks_recurse() {
        let notebooks = build_json(json!({
            "notebooks": [
                {"notebooks": [
                    {"cells": [{"source": "deep"}]},
                ]},
            ]
        }));

        assert_eq!(notebooks.len(), 1);
        assert_eq!(notebooks[0].document.cells[0].source(), "deep");
    }

    // ==================== FALLBACKS ====================

    #[test]
    fn test_unrecognized_object_dumped_as_json() {
        let notebooks = build_json(json!({"mystery": [1, 2, 3]}));

        assert_eq!(notebooks.len(), 1);
        assert_eq!(notebooks[0].name, "entry", "fallback uses the entry stem");
        let cell = &notebooks[0].document.cells[0];
        assert!(cell.is_code());
        assert!(cell.source().contains("\"mystery\""));
    }

    #[test]
    fn test_raw_text_marker_single_code_cell() {
        let payload = DecodedPayload::RawText("print('degraded')".to_string());
        let notebooks = build_notebooks(&payload, "entry", &options());

        assert_eq!(notebooks.len(), 1);
        let cells = &notebooks[0].document.cells;
        assert_eq!(cells.len(), 1);
        assert!(cells[0].is_code());
        assert_eq!(cells[0].source(), "print('degraded')");
    }

    #[test]
    fn test_blank_raw_text_produces_nothing() {
        let payload = DecodedPayload::RawText("  \n\n ".to_string());
        assert!(build_notebooks(&payload, "entry", &options()).is_empty());
    }

    #[test]
    fn test_raw_text_with_boundaries_still_splits() {
        let payload = DecodedPayload::RawText(format!("a\n{COMMAND_BOUNDARY}\nb"));
        let notebooks = build_notebooks(&payload, "entry", &options());

        assert_eq!(notebooks[0].document.cells.len(), 2);
    }

    #[test]
    fn test_all_empty_cells_produce_no_document() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "", "position": 1},
                {"command": "  \n ", "position": 2},
            ]
        }));

        assert!(notebooks.is_empty(), "a notebook with only empty cells is skipped");
    }

    // ==================== BOUNDARY SPLITTING ====================

    #[test]
    fn test_boundary_split_drops_marker_line() {
        let segments = split_on_boundary("x=1\n# COMMAND ----------\ny=2");
        assert_eq!(segments, ["x=1", "y=2"]);
    }

    #[test]
    fn test_boundary_split_consecutive_markers() {
        let source = "a\n# COMMAND ----------\n# COMMAND ----------\n\nb\n";
        assert_eq!(split_on_boundary(source), ["a", "b"]);
    }

    #[test]
    fn test_boundary_split_marker_with_surrounding_whitespace() {
        let segments = split_on_boundary("a\n  # COMMAND ----------  \nb");
        assert_eq!(segments, ["a", "b"], "indented marker lines still split");
    }

    #[test]
    fn test_boundary_split_no_marker() {
        assert_eq!(split_on_boundary("x = 1\ny = 2"), ["x = 1\ny = 2"]);
    }

    #[test]
    fn test_boundary_requires_own_line() {
        let source = "text mentioning # COMMAND ---------- inline";
        assert_eq!(
            split_on_boundary(source),
            [source],
            "the marker only splits when alone on its line"
        );
    }

    #[test]
    fn test_single_command_with_embedded_boundaries_fans_into_cells() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "x=1\n# COMMAND ----------\ny=2", "position": 1},
            ]
        }));

        let sources: Vec<&str> = notebooks[0].document.cells.iter().map(NotebookCell::source).collect();
        assert_eq!(sources, ["x=1", "y=2"]);
    }

    // ==================== LINE MAGICS & LANGUAGE ====================

    #[test]
    fn test_sql_magic_strips_and_tags_cell() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "%sql\nSELECT 1", "position": 1},
            ]
        }));

        let document = &notebooks[0].document;
        assert_eq!(document.cells[0].source(), "SELECT 1", "the magic line is stripped");
        assert_eq!(document.cells[0].language_tag(), Some("sql"));
        assert_eq!(
            document.metadata.kernelspec.name, "python3",
            "a cell magic never changes the kernel; it falls back to the default"
        );
    }

    #[test]
    fn test_declared_language_drives_kernel() {
        let notebooks = build_json(json!({
            "language": "scala",
            "commands": [{"command": "val x = 1", "position": 1}]
        }));

        assert_eq!(notebooks[0].document.metadata.kernelspec.name, "scala");
        assert_eq!(notebooks[0].document.metadata.language_info.name, "scala");
    }

    #[test]
    fn test_magic_conflict_keeps_declared_kernel() {
        let notebooks = build_json(json!({
            "language": "python",
            "commands": [
                {"command": "%sql\nSELECT 1", "position": 1},
            ]
        }));

        let document = &notebooks[0].document;
        assert_eq!(document.metadata.kernelspec.name, "python3");
        assert_eq!(document.cells[0].language_tag(), Some("sql"));
    }

    #[test]
    fn test_per_cell_language_field_sets_notebook_language() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "SELECT 1", "position": 1, "language": "sql"},
            ]
        }));

        let document = &notebooks[0].document;
        assert_eq!(
            document.metadata.kernelspec.name, "sql",
            "an explicit per-cell field informs the kernel when nothing else does"
        );
        assert_eq!(document.cells[0].language_tag(), Some("sql"));
    }

    #[test]
    fn test_md_magic_becomes_markdown_cell() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "%md\n# Heading", "position": 1},
            ]
        }));

        let cell = &notebooks[0].document.cells[0];
        assert!(!cell.is_code());
        assert_eq!(cell.source(), "# Heading");
    }

    #[test]
    fn test_md_sandbox_magic_becomes_markdown_cell() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "%md-sandbox\ncontent", "position": 1},
            ]
        }));

        assert!(!notebooks[0].document.cells[0].is_code());
    }

    #[test]
    fn test_workflow_magics_left_verbatim() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "%run ./setup", "position": 1},
                {"command": "%sh\nls -la", "position": 2},
            ]
        }));

        let cells = &notebooks[0].document.cells;
        assert_eq!(cells[0].source(), "%run ./setup");
        assert!(cells[0].is_code());
        assert_eq!(cells[1].source(), "%sh\nls -la");
    }

    #[test]
    fn test_magic_with_empty_body_dropped() {
        let notebooks = build_json(json!({
            "commands": [
                {"command": "%sql", "position": 1},
                {"command": "kept", "position": 2},
            ]
        }));

        assert_eq!(notebooks[0].document.cells.len(), 1);
        assert_eq!(notebooks[0].document.cells[0].source(), "kept");
    }

    #[test]
    fn test_default_language_is_python() {
        let notebooks = build_json(json!({
            "commands": [{"command": "x = 1", "position": 1}]
        }));

        assert_eq!(notebooks[0].document.metadata.kernelspec.name, "python3");
        assert_eq!(
            notebooks[0].document.metadata.kernelspec.display_name,
            "Python 3"
        );
    }

    #[test]
    fn test_fallback_language_option_respected() {
        let options = ConvertOptions::default().with_fallback_language(Language::Scala);
        let notebooks = build_notebooks(
            &DecodedPayload::Json(json!({"commands": [{"command": "val x = 1", "position": 1}]})),
            "entry",
            &options,
        );

        assert_eq!(notebooks[0].document.metadata.kernelspec.name, "scala");
    }

    // ==================== NAMING ====================

    #[test]
    fn test_name_from_payload() {
        let notebooks = build_json(json!({
            "name": "my analysis",
            "commands": [{"command": "x", "position": 1}]
        }));

        assert_eq!(notebooks[0].name, "my analysis");
    }

    #[test]
    fn test_blank_name_falls_back_to_entry_stem() {
        let notebooks = build_json(json!({
            "name": "   ",
            "commands": [{"command": "x", "position": 1}]
        }));

        assert_eq!(notebooks[0].name, "entry");
    }
}
