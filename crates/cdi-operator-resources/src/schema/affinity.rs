//! Pod placement schema (affinity, node selector, tolerations)
//!
//! Mirrors the orchestrator's native scheduling types so that `infra` and
//! `workload` placement in the CDI resource is validated structurally.

use super::SchemaNode;

const NODE_AFFINITY_PREFERRED: &str = "The scheduler will prefer to schedule pods to nodes that satisfy the affinity expressions specified by this field, but it may choose a node that violates one or more of the expressions. The node that is most preferred is the one with the greatest sum of weights, i.e. for each node that meets all of the scheduling requirements (resource request, requiredDuringScheduling affinity expressions, etc.), compute a sum by iterating through the elements of this field and adding \"weight\" to the sum if the node matches the corresponding matchExpressions; the node(s) with the highest sum are the most preferred.";

const NODE_AFFINITY_REQUIRED: &str = "If the affinity requirements specified by this field are not met at scheduling time, the pod will not be scheduled onto the node. If the affinity requirements specified by this field cease to be met at some point during pod execution (e.g. due to an update), the system may or may not try to eventually evict the pod from its node.";

const POD_AFFINITY_PREFERRED: &str = "The scheduler will prefer to schedule pods to nodes that satisfy the affinity expressions specified by this field, but it may choose a node that violates one or more of the expressions. The node that is most preferred is the one with the greatest sum of weights, i.e. for each node that meets all of the scheduling requirements (resource request, requiredDuringScheduling affinity expressions, etc.), compute a sum by iterating through the elements of this field and adding \"weight\" to the sum if the node has pods which matches the corresponding podAffinityTerm; the node(s) with the highest sum are the most preferred.";

const POD_AFFINITY_REQUIRED: &str = "If the affinity requirements specified by this field are not met at scheduling time, the pod will not be scheduled onto the node. If the affinity requirements specified by this field cease to be met at some point during pod execution (e.g. due to a pod label update), the system may or may not try to eventually evict the pod from its node. When there are multiple elements, the lists of nodes corresponding to each podAffinityTerm are intersected, i.e. all terms must be satisfied.";

const POD_ANTI_AFFINITY_PREFERRED: &str = "The scheduler will prefer to schedule pods to nodes that satisfy the anti-affinity expressions specified by this field, but it may choose a node that violates one or more of the expressions. The node that is most preferred is the one with the greatest sum of weights, i.e. for each node that meets all of the scheduling requirements (resource request, requiredDuringScheduling anti-affinity expressions, etc.), compute a sum by iterating through the elements of this field and adding \"weight\" to the sum if the node has pods which matches the corresponding podAffinityTerm; the node(s) with the highest sum are the most preferred.";

const POD_ANTI_AFFINITY_REQUIRED: &str = "If the anti-affinity requirements specified by this field are not met at scheduling time, the pod will not be scheduled onto the node. If the anti-affinity requirements specified by this field cease to be met at some point during pod execution (e.g. due to a pod label update), the system may or may not try to eventually evict the pod from its node. When there are multiple elements, the lists of nodes corresponding to each podAffinityTerm are intersected, i.e. all terms must be satisfied.";

const POD_AFFINITY_TERM: &str = "Defines a set of pods (namely those matching the labelSelector relative to the given namespace(s)) that this pod should be co-located (affinity) or not co-located (anti-affinity) with, where co-located is defined as running on a node whose value of the label with key <topologyKey> matches that of any node on which a pod of the set of pods is running";

const TOPOLOGY_KEY: &str = "This pod should be co-located (affinity) or not co-located (anti-affinity) with the pods matching the labelSelector in the specified namespaces, where co-located is defined as running on a node whose value of the label with key topologyKey matches that of any node on which any of the selected pods is running. Empty topologyKey is not allowed.";

/// `NodeSelectorRequirement`
fn node_selector_requirement() -> SchemaNode {
    SchemaNode::object()
        .describe("A node selector requirement is a selector that contains values, a key, and an operator that relates the key and values.")
        .property(
            "key",
            SchemaNode::string().describe("The label key that the selector applies to."),
        )
        .property(
            "operator",
            SchemaNode::string().describe("Represents a key's relationship to a set of values. Valid operators are In, NotIn, Exists, DoesNotExist. Gt, and Lt."),
        )
        .property(
            "values",
            SchemaNode::array(SchemaNode::string()).describe("An array of string values. If the operator is In or NotIn, the values array must be non-empty. If the operator is Exists or DoesNotExist, the values array must be empty. If the operator is Gt or Lt, the values array must have a single element, which will be interpreted as an integer. This array is replaced during a strategic merge patch."),
        )
        .required(["key", "operator"])
}

/// Properties shared by `NodeSelectorTerm` and the preferred-term `preference`
fn node_selector_term(description: &str) -> SchemaNode {
    SchemaNode::object()
        .describe(description)
        .property(
            "matchExpressions",
            SchemaNode::array(node_selector_requirement())
                .describe("A list of node selector requirements by node's labels."),
        )
        .property(
            "matchFields",
            SchemaNode::array(node_selector_requirement())
                .describe("A list of node selector requirements by node's fields."),
        )
}

fn node_affinity() -> SchemaNode {
    let preferred_term = SchemaNode::object()
        .describe("An empty preferred scheduling term matches all objects with implicit weight 0 (i.e. it's a no-op). A null preferred scheduling term matches no objects (i.e. is also a no-op).")
        .property(
            "preference",
            node_selector_term("A node selector term, associated with the corresponding weight."),
        )
        .property(
            "weight",
            SchemaNode::integer()
                .format("int32")
                .describe("Weight associated with matching the corresponding nodeSelectorTerm, in the range 1-100."),
        )
        .required(["preference", "weight"]);

    let required = SchemaNode::object()
        .describe(NODE_AFFINITY_REQUIRED)
        .property(
            "nodeSelectorTerms",
            SchemaNode::array(node_selector_term("A null or empty node selector term matches no objects. The requirements of them are ANDed. The TopologySelectorTerm type implements a subset of the NodeSelectorTerm."))
                .describe("Required. A list of node selector terms. The terms are ORed."),
        )
        .required(["nodeSelectorTerms"]);

    SchemaNode::object()
        .describe("Describes node affinity scheduling rules for the pod.")
        .property(
            "preferredDuringSchedulingIgnoredDuringExecution",
            SchemaNode::array(preferred_term).describe(NODE_AFFINITY_PREFERRED),
        )
        .property("requiredDuringSchedulingIgnoredDuringExecution", required)
}

/// `LabelSelector` restricted to pods
fn label_selector() -> SchemaNode {
    let requirement = SchemaNode::object()
        .describe("A label selector requirement is a selector that contains values, a key, and an operator that relates the key and values.")
        .property(
            "key",
            SchemaNode::string().describe("key is the label key that the selector applies to."),
        )
        .property(
            "operator",
            SchemaNode::string().describe("operator represents a key's relationship to a set of values. Valid operators are In, NotIn, Exists and DoesNotExist."),
        )
        .property(
            "values",
            SchemaNode::array(SchemaNode::string()).describe("values is an array of string values. If the operator is In or NotIn, the values array must be non-empty. If the operator is Exists or DoesNotExist, the values array must be empty. This array is replaced during a strategic merge patch."),
        )
        .required(["key", "operator"]);

    SchemaNode::object()
        .describe("A label query over a set of resources, in this case pods.")
        .property(
            "matchExpressions",
            SchemaNode::array(requirement).describe(
                "matchExpressions is a list of label selector requirements. The requirements are ANDed.",
            ),
        )
        .property(
            "matchLabels",
            SchemaNode::map(SchemaNode::string()).describe("matchLabels is a map of {key,value} pairs. A single {key,value} in the matchLabels map is equivalent to an element of matchExpressions, whose key field is \"key\", the operator is \"In\", and the values array contains only \"value\". The requirements are ANDed."),
        )
}

fn pod_affinity_term(description: &str) -> SchemaNode {
    SchemaNode::object()
        .describe(description)
        .property("labelSelector", label_selector())
        .property(
            "namespaces",
            SchemaNode::array(SchemaNode::string()).describe("namespaces specifies which namespaces the labelSelector applies to (matches against); null or empty list means \"this pod's namespace\""),
        )
        .property("topologyKey", SchemaNode::string().describe(TOPOLOGY_KEY))
        .required(["topologyKey"])
}

fn weighted_pod_affinity_term() -> SchemaNode {
    SchemaNode::object()
        .describe("The weights of all of the matched WeightedPodAffinityTerm fields are added per-node to find the most preferred node(s)")
        .property(
            "podAffinityTerm",
            pod_affinity_term("Required. A pod affinity term, associated with the corresponding weight."),
        )
        .property(
            "weight",
            SchemaNode::integer()
                .format("int32")
                .describe("weight associated with matching the corresponding podAffinityTerm, in the range 1-100."),
        )
        .required(["podAffinityTerm", "weight"])
}

/// Pod affinity and pod anti-affinity share one shape
fn pod_affinity(description: &str, preferred: &str, required: &str) -> SchemaNode {
    SchemaNode::object()
        .describe(description)
        .property(
            "preferredDuringSchedulingIgnoredDuringExecution",
            SchemaNode::array(weighted_pod_affinity_term()).describe(preferred),
        )
        .property(
            "requiredDuringSchedulingIgnoredDuringExecution",
            SchemaNode::array(pod_affinity_term(POD_AFFINITY_TERM)).describe(required),
        )
}

/// `Affinity`
pub fn affinity() -> SchemaNode {
    SchemaNode::object()
        .describe("affinity enables pod affinity/anti-affinity placement expanding the types of constraints that can be expressed with nodeSelector. affinity is going to be applied to the relevant kind of pods in parallel with nodeSelector See https://kubernetes.io/docs/concepts/scheduling-eviction/assign-pod-node/#affinity-and-anti-affinity")
        .property("nodeAffinity", node_affinity())
        .property(
            "podAffinity",
            pod_affinity(
                "Describes pod affinity scheduling rules (e.g. co-locate this pod in the same node, zone, etc. as some other pod(s)).",
                POD_AFFINITY_PREFERRED,
                POD_AFFINITY_REQUIRED,
            ),
        )
        .property(
            "podAntiAffinity",
            pod_affinity(
                "Describes pod anti-affinity scheduling rules (e.g. avoid putting this pod in the same node, zone, etc. as some other pod(s)).",
                POD_ANTI_AFFINITY_PREFERRED,
                POD_ANTI_AFFINITY_REQUIRED,
            ),
        )
}

pub fn node_selector() -> SchemaNode {
    SchemaNode::map(SchemaNode::string()).describe("nodeSelector is the node selector applied to the relevant kind of pods It specifies a map of key-value pairs: for the pod to be eligible to run on a node, the node must have each of the indicated key-value pairs as labels (it can have additional labels as well). See https://kubernetes.io/docs/concepts/configuration/assign-pod-node/#nodeselector")
}

pub fn tolerations() -> SchemaNode {
    let toleration = SchemaNode::object()
        .describe("The pod this Toleration is attached to tolerates any taint that matches the triple <key,value,effect> using the matching operator <operator>.")
        .property(
            "effect",
            SchemaNode::string().describe("Effect indicates the taint effect to match. Empty means match all taint effects. When specified, allowed values are NoSchedule, PreferNoSchedule and NoExecute."),
        )
        .property(
            "key",
            SchemaNode::string().describe("Key is the taint key that the toleration applies to. Empty means match all taint keys. If the key is empty, operator must be Exists; this combination means to match all values and all keys."),
        )
        .property(
            "operator",
            SchemaNode::string().describe("Operator represents a key's relationship to the value. Valid operators are Exists and Equal. Defaults to Equal. Exists is equivalent to wildcard for value, so that a pod can tolerate all taints of a particular category."),
        )
        .property(
            "tolerationSeconds",
            SchemaNode::integer()
                .format("int64")
                .describe("TolerationSeconds represents the period of time the toleration (which must be of effect NoExecute, otherwise this field is ignored) tolerates the taint. By default, it is not set, which means tolerate the taint forever (do not evict). Zero and negative values will be treated as 0 (evict immediately) by the system."),
        )
        .property(
            "value",
            SchemaNode::string().describe("Value is the taint value the toleration matches to. If the operator is Exists, the value should be empty, otherwise just a regular string."),
        );

    SchemaNode::array(toleration).describe("tolerations is a list of tolerations applied to the relevant kind of pods See https://kubernetes.io/docs/concepts/configuration/taint-and-toleration/ for more info. These are additional tolerations other than default ones.")
}

/// Placement block used by `infra` and `workload`
pub fn node_placement(description: &str) -> SchemaNode {
    SchemaNode::object()
        .describe(description)
        .property("affinity", affinity())
        .property("nodeSelector", node_selector())
        .property("tolerations", tolerations())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placement_is_well_formed() {
        assert!(node_placement("placement").validate().is_ok());
    }

    #[test]
    fn test_node_selector_requirement_requires_key_and_operator() {
        let placement = node_placement("placement");
        let requirement = placement
            .get_nested(
                "affinity.nodeAffinity.requiredDuringSchedulingIgnoredDuringExecution.nodeSelectorTerms",
            )
            .and_then(|terms| terms.items.as_deref())
            .and_then(|term| term.get_nested("matchExpressions"))
            .and_then(|exprs| exprs.items.as_deref())
            .unwrap();

        assert_eq!(requirement.required, ["key", "operator"]);
    }

    #[test]
    fn test_weighted_terms_are_int32() {
        let term = weighted_pod_affinity_term();
        assert_eq!(term.required, ["podAffinityTerm", "weight"]);
        assert_eq!(term.properties["weight"].format.as_deref(), Some("int32"));
        assert_eq!(
            term.get_nested("podAffinityTerm").unwrap().required,
            ["topologyKey"]
        );
    }

    #[test]
    fn test_pod_anti_affinity_mirrors_pod_affinity_shape() {
        let affinity = affinity();
        let pod = affinity.get_nested("podAffinity").unwrap();
        let anti = affinity.get_nested("podAntiAffinity").unwrap();

        let pod_keys: Vec<_> = pod.properties.keys().collect();
        let anti_keys: Vec<_> = anti.properties.keys().collect();
        assert_eq!(pod_keys, anti_keys);
        assert_eq!(
            pod.properties["requiredDuringSchedulingIgnoredDuringExecution"].items,
            anti.properties["requiredDuringSchedulingIgnoredDuringExecution"].items
        );
    }

    #[test]
    fn test_toleration_seconds_is_int64() {
        let tolerations = tolerations();
        let toleration = tolerations.items.as_deref().unwrap();
        assert_eq!(
            toleration.properties["tolerationSeconds"].format.as_deref(),
            Some("int64")
        );
    }
}
