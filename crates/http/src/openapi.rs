//! Merging of per-module OpenAPI fragments into one document.

use folio_kernel::ModuleRegistry;
use serde_json::{json, Map, Value};

use crate::links::mount_path;

fn error_response_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "code": { "type": "string" },
            "message": { "type": "string" },
            "data": {
                "type": "object",
                "properties": {
                    "status": { "type": "integer" },
                    "details": { "type": "array", "items": {} }
                }
            },
            "trace_id": { "type": "string" },
            "timestamp": { "type": "string" }
        },
        "required": ["code", "message", "data", "trace_id", "timestamp"]
    })
}

/// Build the service document. Module paths are prefixed with the module's mount path.
pub fn build_document(registry: &ModuleRegistry, api_root: &str) -> Value {
    let mut paths = Map::new();
    let mut schemas = Map::new();
    schemas.insert("ErrorResponse".to_string(), error_response_schema());

    paths.insert(
        "/healthz".to_string(),
        json!({
            "get": {
                "summary": "Health check",
                "responses": {
                    "200": {
                        "description": "OK",
                        "content": { "text/plain": { "schema": { "type": "string" } } }
                    }
                }
            }
        }),
    );

    for module in registry.modules() {
        let Some(fragment) = module.openapi() else {
            continue;
        };
        let prefix = mount_path(api_root, module.namespace());

        if let Some(module_paths) = fragment.get("paths").and_then(Value::as_object) {
            for (path, item) in module_paths {
                paths.insert(format!("{prefix}{path}"), item.clone());
            }
        }

        if let Some(module_schemas) = fragment
            .pointer("/components/schemas")
            .and_then(Value::as_object)
        {
            for (name, schema) in module_schemas {
                if schemas.insert(name.clone(), schema.clone()).is_some() {
                    tracing::warn!(module = module.name(), schema = %name, "OpenAPI schema redefined");
                }
            }
        }
    }

    json!({
        "openapi": "3.1.0",
        "info": {
            "title": "Folio API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Book resource controller"
        },
        "paths": paths,
        "components": { "schemas": schemas }
    })
}
