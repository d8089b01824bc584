//! Status sub-schema provider

use super::SchemaNode;

/// Supplies the `status` sub-schema of a custom resource
///
/// Implementations are keyed on the status kind name (e.g. `CDIStatus`).
pub trait StatusSchemaProvider: Send + Sync {
    fn status_schema(&self, kind: &str) -> SchemaNode;
}

/// Operator status shape shared by every lifecycle-managed operator config
///
/// `phase`, `conditions` and the observed/target/operator versions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OperatorConfigStatus;

impl OperatorConfigStatus {
    fn condition() -> SchemaNode {
        SchemaNode::object()
            .describe("Condition represents the state of the operator's reconciliation functionality.")
            .property(
                "lastHeartbeatTime",
                SchemaNode::string().format("date-time"),
            )
            .property(
                "lastTransitionTime",
                SchemaNode::string().format("date-time"),
            )
            .property("message", SchemaNode::string())
            .property("reason", SchemaNode::string())
            .property("status", SchemaNode::string())
            .property(
                "type",
                SchemaNode::string().describe(
                    "ConditionType is the state of the operator's reconciliation functionality.",
                ),
            )
            .required(["status", "type"])
    }
}

impl StatusSchemaProvider for OperatorConfigStatus {
    fn status_schema(&self, kind: &str) -> SchemaNode {
        SchemaNode::object()
            .describe(format!("{} defines the status of the installation", kind))
            .property(
                "conditions",
                SchemaNode::array(Self::condition())
                    .describe("A list of current conditions of the resource"),
            )
            .property(
                "observedVersion",
                SchemaNode::string().describe("The observed version of the resource"),
            )
            .property(
                "operatorVersion",
                SchemaNode::string()
                    .describe("The version of the resource as defined by the operator"),
            )
            .property(
                "phase",
                SchemaNode::string().describe("Phase is the current phase of the deployment"),
            )
            .property(
                "targetVersion",
                SchemaNode::string().describe("The desired version of the resource"),
            )
    }
}
