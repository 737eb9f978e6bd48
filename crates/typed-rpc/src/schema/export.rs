//! Procedure contract export for external tooling
//!
//! ```rust,ignore
//! let specs = router.specs();
//! std::fs::write("procedures.json", specs.to_json_pretty())?;
//! ```

use super::TypeSchema;
use crate::middleware::ProcedureType;
use serde::{Deserialize, Serialize};

/// Published contract of one procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureSpec {
    pub name: String,
    /// Serialized as the transport verb, "GET" or "POST"
    pub method: ProcedureType,
    pub input_schema: TypeSchema,
    pub output_schema: TypeSchema,
}

/// Every procedure registered on a router, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcedureSpecs {
    pub procedures: Vec<ProcedureSpec>,
}

impl ProcedureSpecs {
    /// Look up a procedure by name
    pub fn get(&self, name: &str) -> Option<&ProcedureSpec> {
        self.procedures.iter().find(|p| p.name == name)
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Convert to pretty-printed JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_spec_wire_format() {
        let specs = ProcedureSpecs {
            procedures: vec![ProcedureSpec {
                name: "hello".into(),
                method: ProcedureType::Query,
                input_schema: TypeSchema::string().with_min_length(5),
                output_schema: TypeSchema::string(),
            }],
        };

        let value: serde_json::Value = serde_json::from_str(&specs.to_json()).unwrap();
        assert_eq!(
            value,
            json!({
                "procedures": [{
                    "name": "hello",
                    "method": "GET",
                    "inputSchema": {"type": "string", "minLength": 5},
                    "outputSchema": {"type": "string"}
                }]
            })
        );
        assert!(specs.get("hello").is_some());
        assert!(specs.get("bye").is_none());
    }

    #[test]
    fn test_spec_round_trip() {
        let specs = ProcedureSpecs {
            procedures: vec![ProcedureSpec {
                name: "users.create".into(),
                method: ProcedureType::Mutation,
                input_schema: TypeSchema::object().with_property("name", TypeSchema::string()),
                output_schema: TypeSchema::any(),
            }],
        };
        let back: ProcedureSpecs = serde_json::from_str(&specs.to_json_pretty()).unwrap();
        assert_eq!(back, specs);
    }
}
