//! Graph output: Graphviz DOT, PDF through the `dot` binary, JSON, and a
//! terminal summary table.
//!
//! Each contract becomes an HTML-like table node with a header row
//! (`name - address`), a `read` section and a `write` section. Every function
//! row carries a port named after the function so reference edges leave from
//! the exact getter that produced them.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use explorer_data::types::{ContractDescriptor, FunctionDescriptor};
use eyre::{eyre, Context, Result};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::graph::{ContractGraph, NodeRef};

const HEADER_COLOR: &str = "#0496FF";

/// Strips a trailing `.pdf` from a user-supplied output name.
pub fn output_base(name: &str) -> &str {
    name.strip_suffix(".pdf").unwrap_or(name)
}

/// Appends `.<extension>` to `base` without replacing an existing extension.
fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut path = base.as_os_str().to_owned();
    path.push(".");
    path.push(extension);
    PathBuf::from(path)
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn function_row(function: &FunctionDescriptor) -> String {
    let args: Vec<String> = function
        .inputs
        .iter()
        .map(|p| {
            if p.name.is_empty() {
                format!("<i>{}</i>", escape_html(&p.ty))
            } else {
                format!("<i>{}</i> {}", escape_html(&p.ty), escape_html(&p.name))
            }
        })
        .collect();
    let mut row = format!(
        "<b>{}</b>({})",
        escape_html(&function.name),
        args.join(", ")
    );
    if !function.outputs.is_empty() {
        let returns: Vec<String> = function
            .outputs
            .iter()
            .map(|p| escape_html(&p.to_string()))
            .collect();
        let _ = write!(row, " : {}", returns.join(", "));
    }
    row
}

fn contract_label(contract: &ContractDescriptor) -> String {
    let mut label = String::from(r#"<<table BORDER="0" CELLBORDER="1" CELLSPACING="0">"#);
    let _ = write!(
        label,
        r#"<tr><td bgcolor="{HEADER_COLOR}"><font color="white">{} - {}</font></td></tr>"#,
        escape_html(&contract.name),
        contract.address
    );

    for (section, functions) in [("read", &contract.read), ("write", &contract.write)] {
        let _ = write!(label, r#"<tr><td bgcolor="grey">{section}</td></tr>"#);
        for function in functions {
            let _ = write!(
                label,
                r#"<tr><td align="left" port="{}">{}</td></tr>"#,
                escape_html(&function.name),
                function_row(function)
            );
        }
    }

    label.push_str("</table>>");
    label
}

/// Renders the graph as a Graphviz `digraph`.
///
/// Nodes are emitted in insertion order followed by unresolved targets,
/// edges in discovery order, so identical graphs produce identical text.
pub fn to_dot(graph: &ContractGraph) -> String {
    let layout = graph.to_digraph();
    let mut dot = String::from("digraph {\n\tnode [shape=plaintext]\n");

    for ix in layout.node_indices() {
        match layout[ix] {
            NodeRef::Contract(contract) => {
                let _ = writeln!(
                    dot,
                    "\t\"{}\" [label={}]",
                    contract.address,
                    contract_label(contract)
                );
            }
            NodeRef::Unresolved(address) => {
                let _ = writeln!(
                    dot,
                    "\t\"{address}\" [shape=ellipse label=\"{address}\"]"
                );
            }
        }
    }

    for edge in layout.edge_references() {
        let source = layout[edge.source()].address();
        let target = layout[edge.target()].address();
        let _ = writeln!(
            dot,
            "\t\"{}\":\"{}\" -> \"{}\"",
            source,
            edge.weight(),
            target
        );
    }

    dot.push_str("}\n");
    dot
}

/// Writes `<base>.dot` and returns its path.
///
/// # Errors
/// Returns error if the file cannot be written.
pub fn write_dot(graph: &ContractGraph, base: &Path) -> Result<PathBuf> {
    let path = with_suffix(base, "dot");
    std::fs::write(&path, to_dot(graph))
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// Converts a DOT file to `<base>.pdf` with the Graphviz `dot` binary.
///
/// # Errors
/// Returns error if `dot` is not installed or exits unsuccessfully.
pub fn render_pdf(dot_path: &Path, base: &Path) -> Result<PathBuf> {
    let pdf_path = with_suffix(base, "pdf");
    let output = Command::new("dot")
        .arg("-Tpdf")
        .arg("-o")
        .arg(&pdf_path)
        .arg(dot_path)
        .output()
        .wrap_err("failed to run graphviz `dot` (is graphviz installed?)")?;

    if !output.status.success() {
        return Err(eyre!(
            "graphviz `dot` failed with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(pdf_path)
}

#[derive(Serialize)]
struct NodeExport<'a> {
    address: String,
    name: &'a str,
    read: &'a [FunctionDescriptor],
    write: &'a [FunctionDescriptor],
}

#[derive(Serialize)]
struct EdgeExport<'a> {
    source: String,
    function: &'a str,
    target: String,
    resolved: bool,
}

#[derive(Serialize)]
struct GraphExport<'a> {
    nodes: Vec<NodeExport<'a>>,
    edges: Vec<EdgeExport<'a>>,
}

/// Serializes nodes and edges as pretty-printed JSON.
///
/// # Errors
/// Returns error if serialization fails.
pub fn to_json(graph: &ContractGraph) -> Result<String> {
    let export = GraphExport {
        nodes: graph
            .nodes()
            .map(|contract| NodeExport {
                address: contract.address.to_string(),
                name: &contract.name,
                read: &contract.read,
                write: &contract.write,
            })
            .collect(),
        edges: graph
            .edges()
            .iter()
            .map(|edge| EdgeExport {
                source: edge.source.to_string(),
                function: &edge.function,
                target: edge.target.to_string(),
                resolved: graph.contains(&edge.target),
            })
            .collect(),
    };
    serde_json::to_string_pretty(&export).wrap_err("failed to serialize graph to JSON")
}

/// Writes `<base>.json` and returns its path.
///
/// # Errors
/// Returns error if serialization or the write fails.
pub fn write_json(graph: &ContractGraph, base: &Path) -> Result<PathBuf> {
    let path = with_suffix(base, "json");
    std::fs::write(&path, to_json(graph)?)
        .wrap_err_with(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

/// One row per contract: address, name, function counts and outgoing references.
pub fn summary_table(graph: &ContractGraph) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Address", "Name", "Read", "Write", "References"]);

    for contract in graph.nodes() {
        table.add_row(vec![
            contract.address.to_string(),
            contract.name.clone(),
            contract.read.len().to_string(),
            contract.write.len().to_string(),
            graph.outgoing(&contract.address).count().to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;
    use explorer_data::types::{Mutability, Param};

    fn addr(n: u8) -> Address {
        let mut bytes = [0u8; 20];
        bytes[19] = n;
        Address::from(bytes)
    }

    fn sample_graph() -> ContractGraph {
        let owner = FunctionDescriptor::new(
            "owner",
            vec![],
            vec![Param::new("", "address")],
            Mutability::View,
        );
        let set = FunctionDescriptor::new(
            "setFee",
            vec![Param::new("fee", "uint24")],
            vec![],
            Mutability::NonPayable,
        );
        let mut graph = ContractGraph::new();
        graph.insert(ContractDescriptor::new(addr(1), "Pool<V2>", vec![owner, set]));
        graph.add_edge(addr(1), "owner", addr(2)).unwrap();
        graph
    }

    #[test]
    fn output_base_strips_pdf_only() {
        assert_eq!(output_base("graph.pdf"), "graph");
        assert_eq!(output_base("graph"), "graph");
        assert_eq!(output_base("graph.dot"), "graph.dot");
        assert_eq!(output_base("output"), "output");
    }

    #[test]
    fn function_rows_are_escaped() {
        let f = FunctionDescriptor::new(
            "balanceOf",
            vec![Param::new("account", "address")],
            vec![Param::new("", "uint256")],
            Mutability::View,
        );
        assert_eq!(
            function_row(&f),
            "<b>balanceOf</b>(<i>address</i> account) : uint256"
        );
        assert_eq!(escape_html("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }

    #[test]
    fn dot_contains_nodes_ports_and_edges() {
        let dot = to_dot(&sample_graph());
        let a1 = addr(1).to_string();
        let a2 = addr(2).to_string();

        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("Pool&lt;V2&gt; - "));
        assert!(dot.contains(r#"port="owner""#));
        assert!(dot.contains(r#"<tr><td bgcolor="grey">write</td></tr>"#));
        assert!(dot.contains(&format!("\"{a2}\" [shape=ellipse")));
        assert!(dot.contains(&format!("\"{a1}\":\"owner\" -> \"{a2}\"")));
    }

    #[test]
    fn json_marks_unresolved_targets() {
        let json = to_json(&sample_graph()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"][0]["name"], "Pool<V2>");
        assert_eq!(value["nodes"][0]["read"][0]["outputs"][0]["type"], "address");
        assert_eq!(value["nodes"][0]["write"][0]["mutability"], "nonpayable");
        assert_eq!(value["edges"][0]["function"], "owner");
        assert_eq!(value["edges"][0]["resolved"], false);
    }

    #[test]
    fn files_written_next_to_base() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("output");
        let graph = sample_graph();

        let dot = write_dot(&graph, &base).unwrap();
        let json = write_json(&graph, &base).unwrap();
        assert_eq!(dot, dir.path().join("output.dot"));
        assert_eq!(json, dir.path().join("output.json"));
        assert_eq!(std::fs::read_to_string(dot).unwrap(), to_dot(&graph));

        let dotted = dir.path().join("report.v2");
        assert_eq!(
            write_dot(&graph, &dotted).unwrap(),
            dir.path().join("report.v2.dot")
        );
    }

    #[test]
    fn summary_has_one_row_per_contract() {
        let table = summary_table(&sample_graph());
        assert_eq!(table.row_iter().count(), 1);
    }
}
