//! Line-delimited JSON-RPC front end for highlight sessions.
//!
//! One request per stdin line, one response per stdout line. Each circuit
//! id gets its own graph, summary and session; requests without a `circuit`
//! key use `"default"`.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use tokio::io::{stdin, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::config::HighlightConfig;
use crate::engine::HighlightSession;
use crate::graph::SfgGraph;
use crate::presenter::GainSummary;
use crate::protocol::{
    RpcError, RpcRequest, RpcResponse, ENGINE_ERROR, JSONRPC_VERSION, METHOD_NOT_FOUND, PARSE_ERROR,
};
use crate::simplify::simplify_request;

const DEFAULT_CIRCUIT: &str = "default";

/// Graph, summary sink and highlight state for one circuit.
#[derive(Debug)]
pub struct CircuitSession {
    pub graph: SfgGraph,
    pub summary: GainSummary,
    pub session: HighlightSession,
}

/// All open circuits, keyed by circuit id.
pub struct SessionRegistry {
    config: HighlightConfig,
    circuits: HashMap<String, CircuitSession>,
}

impl SessionRegistry {
    pub fn new(config: HighlightConfig) -> Self {
        Self {
            config,
            circuits: HashMap::new(),
        }
    }

    pub fn circuit(&self, id: &str) -> Option<&CircuitSession> {
        self.circuits.get(id)
    }

    /// Handle one request. Never fails: errors become JSON-RPC error objects.
    pub fn handle(&mut self, request: RpcRequest) -> RpcResponse {
        if let Err(error) = request.check_version() {
            return RpcResponse::failure(request.id, error);
        }
        let params = request.params.unwrap_or_default();
        match self.dispatch(&request.method, &params) {
            Ok(result) => RpcResponse::success(request.id, result),
            Err(error) => {
                debug!(method = %request.method, code = error.code, "{}", error.message);
                RpcResponse::failure(request.id, error)
            }
        }
    }

    /// Parse and handle one raw input line.
    pub fn handle_line(&mut self, line: &str) -> RpcResponse {
        match serde_json::from_str::<RpcRequest>(line) {
            Ok(request) => self.handle(request),
            Err(e) => RpcResponse::failure(None, RpcError::new(PARSE_ERROR, format!("Parse error: {}", e))),
        }
    }

    fn dispatch(&mut self, method: &str, params: &Map<String, Value>) -> Result<Value, RpcError> {
        let circuit_id = params
            .get("circuit")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_CIRCUIT)
            .to_string();

        if method == "load_graph" {
            return self.load_graph(circuit_id, params);
        }

        let circuit = self.circuits.get_mut(&circuit_id).ok_or_else(|| {
            RpcError::new(ENGINE_ERROR, format!("No graph loaded for circuit {}", circuit_id))
        })?;
        let CircuitSession {
            graph,
            summary,
            session,
        } = circuit;

        match method {
            "set_mode" => {
                let enabled = params
                    .get("enabled")
                    .and_then(Value::as_bool)
                    .ok_or_else(|| RpcError::invalid_params("Missing boolean 'enabled'"))?;
                session.set_mode(graph, summary, enabled);
                Ok(json!({ "selection": session.selection(), "summary": summary }))
            }
            "tap_node" => {
                let node = str_param(params, "node")?;
                let tap = session.tap(graph, summary, node)?;
                Ok(json!({
                    "tap": tap,
                    "message": tap.outcome.message(),
                    "phase": session.phase(),
                    "summary": summary,
                }))
            }
            "highlight" => {
                let source = str_param(params, "source")?;
                let target = str_param(params, "target")?;
                let outcome = session.highlight(graph, summary, source, target)?;
                Ok(json!({
                    "outcome": outcome,
                    "message": outcome.message(),
                    "phase": session.phase(),
                    "summary": summary,
                }))
            }
            "clear" => {
                session.clear(graph, summary);
                Ok(json!({ "phase": session.phase(), "summary": summary }))
            }
            "tags" => {
                let elements: Vec<Value> = graph
                    .tagged_elements()
                    .into_iter()
                    .map(|(element, tags)| {
                        let classes: Vec<&str> = tags.iter().map(|t| t.class_name()).collect();
                        json!({ "element": element, "classes": classes })
                    })
                    .collect();
                Ok(json!({
                    "elements": elements,
                    "phase": session.phase(),
                    "selection": session.selection(),
                    "summary": summary,
                }))
            }
            "simplify_request" => {
                let body = simplify_request(&*graph, session.selection())?;
                Ok(json!({ "body": body }))
            }
            _ => Err(RpcError::new(METHOD_NOT_FOUND, format!("Method not found: {}", method))),
        }
    }

    fn load_graph(&mut self, circuit_id: String, params: &Map<String, Value>) -> Result<Value, RpcError> {
        let elements = params
            .get("elements")
            .cloned()
            .ok_or_else(|| RpcError::invalid_params("Missing 'elements'"))?;
        let graph = SfgGraph::from_value(elements)?;
        let (nodes, edges) = (graph.num_nodes(), graph.num_edges());
        info!("Loaded circuit {}: {} nodes, {} edges", circuit_id, nodes, edges);

        // A re-rendered graph starts a fresh session
        self.circuits.insert(
            circuit_id.clone(),
            CircuitSession {
                graph,
                summary: GainSummary::default(),
                session: HighlightSession::new(&self.config),
            },
        );
        Ok(json!({ "circuit": circuit_id, "nodes": nodes, "edges": edges }))
    }
}

fn str_param<'a>(params: &'a Map<String, Value>, key: &str) -> Result<&'a str, RpcError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params(format!("Missing string '{}'", key)))
}

/// Serve requests from stdin until EOF.
pub async fn run_stdio(config: HighlightConfig) -> anyhow::Result<()> {
    let mut registry = SessionRegistry::new(config);
    let mut reader = BufReader::new(stdin()).lines();

    while let Some(line) = reader.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = registry.handle_line(&line);
        if let Some(error) = &response.error {
            warn!(code = error.code, "{}", error.message);
        }
        println!("{}", serde_json::to_string(&response)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{ElementId, GraphView};

    fn request(method: &str, params: Value) -> RpcRequest {
        RpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: params.as_object().cloned(),
        }
    }

    fn elements() -> Value {
        json!({
            "nodes": [{"data": {"id": "a"}}, {"data": {"id": "b"}}, {"data": {"id": "c"}}],
            "edges": [
                {"data": {"id": "ab", "source": "a", "target": "b",
                          "weight": {"magnitude": 2.0, "phase": 0.0, "symbolic": "x"}}},
                {"data": {"id": "bc", "source": "b", "target": "c",
                          "weight": {"magnitude": 3.0, "phase": 0.0, "symbolic": "y"}}}
            ]
        })
    }

    #[test]
    fn test_requires_loaded_graph() {
        let mut registry = SessionRegistry::new(HighlightConfig::default());
        let response = registry.handle(request("clear", json!({})));
        assert_eq!(response.error.map(|e| e.code), Some(ENGINE_ERROR));
    }

    #[test]
    fn test_unknown_method_and_bad_params() {
        let mut registry = SessionRegistry::new(HighlightConfig::default());
        registry.handle(request("load_graph", json!({ "elements": elements() })));

        let response = registry.handle(request("explode", json!({})));
        assert_eq!(response.error.map(|e| e.code), Some(METHOD_NOT_FOUND));

        let response = registry.handle(request("tap_node", json!({ "node": 7 })));
        assert_eq!(
            response.error.map(|e| e.code),
            Some(crate::protocol::INVALID_PARAMS)
        );
    }

    #[test]
    fn test_version_checked_before_dispatch() {
        let mut registry = SessionRegistry::new(HighlightConfig::default());

        let response = registry.handle_line(r#"{"jsonrpc":"1.0","id":3,"method":"load_graph","params":{}}"#);
        assert_eq!(response.id, Some(json!(3)));
        assert_eq!(
            response.error.map(|e| e.code),
            Some(crate::protocol::INVALID_REQUEST)
        );
        assert!(registry.circuit(DEFAULT_CIRCUIT).is_none());

        // Omitted version is accepted
        let line = json!({"id": 4, "method": "load_graph", "params": {"elements": elements()}});
        let response = registry.handle_line(&line.to_string());
        assert!(response.error.is_none());
        assert!(registry.circuit(DEFAULT_CIRCUIT).is_some());
    }

    #[test]
    fn test_parse_error_line() {
        let mut registry = SessionRegistry::new(HighlightConfig::default());
        let response = registry.handle_line("{not json");
        assert_eq!(response.error.map(|e| e.code), Some(PARSE_ERROR));
    }

    #[test]
    fn test_tap_flow_over_rpc() -> anyhow::Result<()> {
        let mut registry = SessionRegistry::new(HighlightConfig::default());
        let loaded = registry.handle(request(
            "load_graph",
            json!({ "circuit": "c1", "elements": elements() }),
        ));
        assert_eq!(loaded.result.as_ref().map(|r| r["edges"].clone()), Some(json!(2)));

        registry.handle(request("tap_node", json!({ "circuit": "c1", "node": "a" })));
        let response = registry.handle(request("tap_node", json!({ "circuit": "c1", "node": "c" })));
        let result = response.result.ok_or_else(|| anyhow::anyhow!("missing result"))?;

        assert_eq!(result["tap"]["outcome"]["status"], json!("presented"));
        assert_eq!(result["summary"]["dominant"], json!("6.00e+0"));
        assert_eq!(result["phase"], json!("presented"));

        let circuit = registry.circuit("c1").ok_or_else(|| anyhow::anyhow!("no circuit"))?;
        assert!(!circuit.graph.tags(&ElementId::Edge("ab".into())).is_empty());
        Ok(())
    }
}
