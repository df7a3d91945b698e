//! The closed set of plugin operations.
//!
//! [`BridgeMethod`] names every operation the plugin understands. [`Command`]
//! pairs each method with its typed params; serializing a command yields the
//! `{"method", "params"}` pair sent on the wire.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::BridgeError;
use crate::params::{
    CollectionOptions, ComponentPropertyType, DesignToken, InstantiateOptions, NewVariable,
    NodeType, PropertyEdit, PropertyOptions, ResolvedType, ScreenshotOptions, TextOptions,
    VariableOptions, VariableUpdate, Verbosity,
};

/// Deepest node tree the plugin will walk.
pub const MAX_DEPTH: u8 = 3;
/// Largest console-log page.
pub const MAX_CONSOLE_LIMIT: u16 = 200;
/// Largest batch of variable creates or updates.
pub const MAX_BATCH_ITEMS: usize = 100;
/// Smallest screenshot scale.
pub const MIN_SCREENSHOT_SCALE: f64 = 0.5;
/// Largest screenshot scale.
pub const MAX_SCREENSHOT_SCALE: f64 = 4.0;

macro_rules! bridge_methods {
    ($($variant:ident => $wire:literal),* $(,)?) => {
        /// Wire name of a plugin operation.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum BridgeMethod {
            $(
                #[doc = concat!("`", $wire, "`")]
                #[serde(rename = $wire)]
                $variant,
            )*
        }

        impl BridgeMethod {
            /// Every method, in declaration order.
            pub const ALL: &'static [BridgeMethod] = &[$(BridgeMethod::$variant),*];

            /// Wire name.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(BridgeMethod::$variant => $wire,)*
                }
            }
        }
    };
}

bridge_methods! {
    GetVariablesFromPluginUi => "getVariablesFromPluginUI",
    GetComponentFromPluginUi => "getComponentFromPluginUI",
    GetVariables => "getVariables",
    GetComponentByNodeId => "getComponentByNodeId",
    GetLocalComponents => "getLocalComponents",
    GetDocumentStructure => "getDocumentStructure",
    GetNodeContext => "getNodeContext",
    GetLocalStyles => "getLocalStyles",
    CaptureScreenshot => "captureScreenshot",
    RefreshVariables => "refreshVariables",
    GetConsoleLogs => "getConsoleLogs",
    ClearConsole => "clearConsole",
    ExecuteCodeViaUi => "executeCodeViaUI",
    UpdateVariable => "updateVariable",
    CreateVariable => "createVariable",
    CreateVariableCollection => "createVariableCollection",
    DeleteVariable => "deleteVariable",
    DeleteVariableCollection => "deleteVariableCollection",
    RenameVariable => "renameVariable",
    AddMode => "addMode",
    RenameMode => "renameMode",
    InstantiateComponent => "instantiateComponent",
    SetNodeDescription => "setNodeDescription",
    AddComponentProperty => "addComponentProperty",
    EditComponentProperty => "editComponentProperty",
    DeleteComponentProperty => "deleteComponentProperty",
    ResizeNode => "resizeNode",
    MoveNode => "moveNode",
    SetNodeFills => "setNodeFills",
    SetNodeStrokes => "setNodeStrokes",
    SetNodeOpacity => "setNodeOpacity",
    SetNodeCornerRadius => "setNodeCornerRadius",
    CloneNode => "cloneNode",
    DeleteNode => "deleteNode",
    RenameNode => "renameNode",
    SetTextContent => "setTextContent",
    CreateChildNode => "createChildNode",
    SetInstanceProperties => "setInstanceProperties",
    BatchCreateVariables => "batchCreateVariables",
    BatchUpdateVariables => "batchUpdateVariables",
    SetupDesignTokens => "setupDesignTokens",
    ArrangeComponentSet => "arrangeComponentSet",
}

impl fmt::Display for BridgeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A plugin operation together with its arguments.
///
/// Variants without arguments still carry an empty struct so the wire frame
/// has `"params": {}`, which is what the plugin expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "method",
    content = "params",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Command {
    /// Variables as cached by the plugin UI.
    #[serde(rename = "getVariablesFromPluginUI")]
    GetVariablesFromPluginUi {
        /// File the caller expects to be open.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_key: Option<String>,
    },
    /// Component data as cached by the plugin UI.
    #[serde(rename = "getComponentFromPluginUI")]
    GetComponentFromPluginUi {
        /// Component node.
        node_id: String,
    },
    /// Local variables and collections.
    GetVariables {
        /// File the caller expects to be open.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_key: Option<String>,
    },
    /// One component by node id.
    GetComponentByNodeId {
        /// Component node.
        node_id: String,
    },
    /// Every local component and component set.
    GetLocalComponents {},
    /// Page and node tree of the open document.
    GetDocumentStructure {
        /// Tree depth, `0..=3`.
        depth: u8,
        /// Detail level.
        verbosity: Verbosity,
    },
    /// Subtree around one node.
    GetNodeContext {
        /// Root of the subtree.
        node_id: String,
        /// Tree depth, `0..=3`.
        depth: u8,
        /// Detail level.
        verbosity: Verbosity,
    },
    /// Paint, text and effect styles.
    GetLocalStyles {
        /// Detail level.
        verbosity: Verbosity,
    },
    /// Export a node (or the current page when `node_id` is `None`).
    CaptureScreenshot {
        /// Node to export; sent as `null` for the current page.
        node_id: Option<String>,
        /// Encoding and scale.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<ScreenshotOptions>,
    },
    /// Re-read variables from the document.
    RefreshVariables {},
    /// Buffered plugin console output.
    GetConsoleLogs {
        /// Entries to return, `1..=200`.
        limit: u16,
    },
    /// Empty the plugin console buffer.
    ClearConsole {},
    /// Run a code snippet in the plugin sandbox.
    #[serde(rename = "executeCodeViaUI")]
    ExecuteCodeViaUi {
        /// Source to evaluate.
        code: String,
        /// Plugin-side execution limit in milliseconds.
        timeout: u64,
    },
    /// Set one variable value for one mode.
    UpdateVariable {
        /// Variable to change.
        variable_id: String,
        /// Mode to change.
        mode_id: String,
        /// New value.
        value: Value,
    },
    /// Create a variable in a collection.
    CreateVariable {
        /// Variable name.
        name: String,
        /// Target collection.
        collection_id: String,
        /// Variable type.
        resolved_type: ResolvedType,
        /// Initial values, description and scopes.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<VariableOptions>,
    },
    /// Create a variable collection.
    CreateVariableCollection {
        /// Collection name.
        name: String,
        /// Mode setup.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<CollectionOptions>,
    },
    /// Delete a variable.
    DeleteVariable {
        /// Variable to delete.
        variable_id: String,
    },
    /// Delete a collection and its variables.
    DeleteVariableCollection {
        /// Collection to delete.
        collection_id: String,
    },
    /// Rename a variable.
    RenameVariable {
        /// Variable to rename.
        variable_id: String,
        /// New name.
        new_name: String,
    },
    /// Add a mode to a collection.
    AddMode {
        /// Target collection.
        collection_id: String,
        /// Name of the new mode.
        mode_name: String,
    },
    /// Rename a mode.
    RenameMode {
        /// Collection owning the mode.
        collection_id: String,
        /// Mode to rename.
        mode_id: String,
        /// New name.
        new_name: String,
    },
    /// Place an instance of a component.
    InstantiateComponent {
        /// Published or local component key.
        component_key: String,
        /// Placement, size and overrides.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<InstantiateOptions>,
    },
    /// Set the description of a component, component set or style.
    SetNodeDescription {
        /// Target node.
        node_id: String,
        /// Plain description.
        description: String,
        /// Markdown description.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description_markdown: Option<String>,
    },
    /// Add a component property.
    AddComponentProperty {
        /// Component or component set.
        node_id: String,
        /// Property name.
        property_name: String,
        /// Property kind.
        #[serde(rename = "type")]
        property_type: ComponentPropertyType,
        /// Default value.
        default_value: Value,
        /// Preferred values.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<PropertyOptions>,
    },
    /// Change a component property.
    EditComponentProperty {
        /// Component or component set.
        node_id: String,
        /// Property to change.
        property_name: String,
        /// Fields to change.
        new_value: PropertyEdit,
    },
    /// Remove a component property.
    DeleteComponentProperty {
        /// Component or component set.
        node_id: String,
        /// Property to remove.
        property_name: String,
    },
    /// Resize a node.
    ResizeNode {
        /// Target node.
        node_id: String,
        /// New width.
        width: f64,
        /// New height.
        height: f64,
        /// Apply child constraints while resizing.
        with_constraints: bool,
    },
    /// Move a node.
    MoveNode {
        /// Target node.
        node_id: String,
        /// New x.
        x: f64,
        /// New y.
        y: f64,
    },
    /// Replace a node's fills.
    SetNodeFills {
        /// Target node.
        node_id: String,
        /// Paint objects.
        fills: Vec<Value>,
    },
    /// Replace a node's strokes.
    SetNodeStrokes {
        /// Target node.
        node_id: String,
        /// Paint objects.
        strokes: Vec<Value>,
        /// Stroke weight.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke_weight: Option<f64>,
    },
    /// Set a node's opacity.
    SetNodeOpacity {
        /// Target node.
        node_id: String,
        /// Opacity, `0.0..=1.0`.
        opacity: f64,
    },
    /// Set a node's corner radius.
    SetNodeCornerRadius {
        /// Target node.
        node_id: String,
        /// Radius in pixels.
        radius: f64,
    },
    /// Duplicate a node.
    CloneNode {
        /// Node to duplicate.
        node_id: String,
    },
    /// Delete a node.
    DeleteNode {
        /// Node to delete.
        node_id: String,
    },
    /// Rename a node.
    RenameNode {
        /// Target node.
        node_id: String,
        /// New name.
        new_name: String,
    },
    /// Replace the characters of a text node.
    SetTextContent {
        /// Text node.
        node_id: String,
        /// New characters.
        text: String,
        /// Font size.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options: Option<TextOptions>,
    },
    /// Create a child node.
    CreateChildNode {
        /// Parent node.
        parent_id: String,
        /// Kind of node to create.
        node_type: NodeType,
        /// Initial properties.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        properties: Option<Map<String, Value>>,
    },
    /// Set component properties on an instance.
    SetInstanceProperties {
        /// Instance node.
        node_id: String,
        /// Property name to value.
        properties: Map<String, Value>,
    },
    /// Create up to 100 variables.
    BatchCreateVariables {
        /// Variables to create.
        items: Vec<NewVariable>,
    },
    /// Update up to 100 variable values.
    BatchUpdateVariables {
        /// Values to set.
        items: Vec<VariableUpdate>,
    },
    /// Create a collection, its modes and its variables in one step.
    SetupDesignTokens {
        /// Collection name.
        collection_name: String,
        /// Mode names; the first renames the default mode.
        modes: Vec<String>,
        /// Tokens to create.
        tokens: Vec<DesignToken>,
    },
    /// Combine components into a component set.
    ArrangeComponentSet {
        /// Component nodes, at least two.
        node_ids: Vec<String>,
    },
}

impl Command {
    /// Wire method of this command.
    pub fn method(&self) -> BridgeMethod {
        match self {
            Self::GetVariablesFromPluginUi { .. } => BridgeMethod::GetVariablesFromPluginUi,
            Self::GetComponentFromPluginUi { .. } => BridgeMethod::GetComponentFromPluginUi,
            Self::GetVariables { .. } => BridgeMethod::GetVariables,
            Self::GetComponentByNodeId { .. } => BridgeMethod::GetComponentByNodeId,
            Self::GetLocalComponents {} => BridgeMethod::GetLocalComponents,
            Self::GetDocumentStructure { .. } => BridgeMethod::GetDocumentStructure,
            Self::GetNodeContext { .. } => BridgeMethod::GetNodeContext,
            Self::GetLocalStyles { .. } => BridgeMethod::GetLocalStyles,
            Self::CaptureScreenshot { .. } => BridgeMethod::CaptureScreenshot,
            Self::RefreshVariables {} => BridgeMethod::RefreshVariables,
            Self::GetConsoleLogs { .. } => BridgeMethod::GetConsoleLogs,
            Self::ClearConsole {} => BridgeMethod::ClearConsole,
            Self::ExecuteCodeViaUi { .. } => BridgeMethod::ExecuteCodeViaUi,
            Self::UpdateVariable { .. } => BridgeMethod::UpdateVariable,
            Self::CreateVariable { .. } => BridgeMethod::CreateVariable,
            Self::CreateVariableCollection { .. } => BridgeMethod::CreateVariableCollection,
            Self::DeleteVariable { .. } => BridgeMethod::DeleteVariable,
            Self::DeleteVariableCollection { .. } => BridgeMethod::DeleteVariableCollection,
            Self::RenameVariable { .. } => BridgeMethod::RenameVariable,
            Self::AddMode { .. } => BridgeMethod::AddMode,
            Self::RenameMode { .. } => BridgeMethod::RenameMode,
            Self::InstantiateComponent { .. } => BridgeMethod::InstantiateComponent,
            Self::SetNodeDescription { .. } => BridgeMethod::SetNodeDescription,
            Self::AddComponentProperty { .. } => BridgeMethod::AddComponentProperty,
            Self::EditComponentProperty { .. } => BridgeMethod::EditComponentProperty,
            Self::DeleteComponentProperty { .. } => BridgeMethod::DeleteComponentProperty,
            Self::ResizeNode { .. } => BridgeMethod::ResizeNode,
            Self::MoveNode { .. } => BridgeMethod::MoveNode,
            Self::SetNodeFills { .. } => BridgeMethod::SetNodeFills,
            Self::SetNodeStrokes { .. } => BridgeMethod::SetNodeStrokes,
            Self::SetNodeOpacity { .. } => BridgeMethod::SetNodeOpacity,
            Self::SetNodeCornerRadius { .. } => BridgeMethod::SetNodeCornerRadius,
            Self::CloneNode { .. } => BridgeMethod::CloneNode,
            Self::DeleteNode { .. } => BridgeMethod::DeleteNode,
            Self::RenameNode { .. } => BridgeMethod::RenameNode,
            Self::SetTextContent { .. } => BridgeMethod::SetTextContent,
            Self::CreateChildNode { .. } => BridgeMethod::CreateChildNode,
            Self::SetInstanceProperties { .. } => BridgeMethod::SetInstanceProperties,
            Self::BatchCreateVariables { .. } => BridgeMethod::BatchCreateVariables,
            Self::BatchUpdateVariables { .. } => BridgeMethod::BatchUpdateVariables,
            Self::SetupDesignTokens { .. } => BridgeMethod::SetupDesignTokens,
            Self::ArrangeComponentSet { .. } => BridgeMethod::ArrangeComponentSet,
        }
    }

    /// Check argument ranges the plugin would otherwise reject late.
    pub fn validate(&self) -> Result<(), BridgeError> {
        match self {
            Self::GetDocumentStructure { depth, .. } | Self::GetNodeContext { depth, .. } => {
                check_depth(*depth)
            }
            Self::GetConsoleLogs { limit } => {
                if (1..=MAX_CONSOLE_LIMIT).contains(limit) {
                    Ok(())
                } else {
                    Err(BridgeError::invalid_params(format!(
                        "limit must be between 1 and {MAX_CONSOLE_LIMIT}, got {limit}"
                    )))
                }
            }
            Self::CaptureScreenshot {
                options: Some(ScreenshotOptions { scale: Some(scale), .. }),
                ..
            } => {
                if (MIN_SCREENSHOT_SCALE..=MAX_SCREENSHOT_SCALE).contains(scale) {
                    Ok(())
                } else {
                    Err(BridgeError::invalid_params(format!(
                        "scale must be between {MIN_SCREENSHOT_SCALE} and {MAX_SCREENSHOT_SCALE}, got {scale}"
                    )))
                }
            }
            Self::SetNodeOpacity { opacity, .. } => {
                if (0.0..=1.0).contains(opacity) {
                    Ok(())
                } else {
                    Err(BridgeError::invalid_params(format!(
                        "opacity must be between 0 and 1, got {opacity}"
                    )))
                }
            }
            Self::BatchCreateVariables { items } => check_batch(items.len()),
            Self::BatchUpdateVariables { items } => check_batch(items.len()),
            Self::SetupDesignTokens { modes, .. } if modes.is_empty() => Err(
                BridgeError::invalid_params("setupDesignTokens needs at least one mode"),
            ),
            Self::ArrangeComponentSet { node_ids } if node_ids.len() < 2 => {
                Err(BridgeError::invalid_params(format!(
                    "arrangeComponentSet needs at least 2 component node ids, got {}",
                    node_ids.len()
                )))
            }
            _ => Ok(()),
        }
    }

    /// Split into the wire method and its params object.
    pub fn into_parts(self) -> Result<(BridgeMethod, Value), BridgeError> {
        let method = self.method();
        let mut frame = serde_json::to_value(self).map_err(|e| {
            BridgeError::invalid_params(format!("{method} params are not serializable: {e}"))
        })?;
        let params = frame
            .get_mut("params")
            .map_or_else(|| Value::Object(Map::new()), Value::take);
        Ok((method, params))
    }
}

fn check_depth(depth: u8) -> Result<(), BridgeError> {
    if depth <= MAX_DEPTH {
        Ok(())
    } else {
        Err(BridgeError::invalid_params(format!(
            "depth must be between 0 and {MAX_DEPTH}, got {depth}"
        )))
    }
}

fn check_batch(len: usize) -> Result<(), BridgeError> {
    if len <= MAX_BATCH_ITEMS {
        Ok(())
    } else {
        Err(BridgeError::invalid_params(format!(
            "at most {MAX_BATCH_ITEMS} items per batch, got {len}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn wire_names_are_unique() {
        let names: HashSet<&str> = BridgeMethod::ALL.iter().map(|m| m.as_str()).collect();
        assert_eq!(names.len(), BridgeMethod::ALL.len());
    }

    #[test]
    fn bridge_method_serde_matches_as_str() {
        for method in BridgeMethod::ALL {
            assert_eq!(serde_json::to_value(method).unwrap(), json!(method.as_str()));
        }
    }

    #[test]
    fn serialized_tag_matches_method() {
        let commands = vec![
            Command::GetVariablesFromPluginUi { file_key: None },
            Command::GetComponentFromPluginUi { node_id: "1:2".into() },
            Command::ExecuteCodeViaUi { code: "1".into(), timeout: 5000 },
            Command::GetLocalComponents {},
            Command::ResizeNode {
                node_id: "1:2".into(),
                width: 10.0,
                height: 20.0,
                with_constraints: true,
            },
            Command::ArrangeComponentSet { node_ids: vec!["1:1".into(), "1:2".into()] },
        ];
        for command in commands {
            let method = command.method();
            let frame = serde_json::to_value(&command).unwrap();
            assert_eq!(frame["method"], json!(method.as_str()));
        }
    }

    #[test]
    fn empty_params_are_an_object() {
        let (method, params) = Command::RefreshVariables {}.into_parts().unwrap();
        assert_eq!(method, BridgeMethod::RefreshVariables);
        assert_eq!(params, json!({}));
    }

    #[test]
    fn params_are_camel_case() {
        let (_, params) = Command::RenameMode {
            collection_id: "c".into(),
            mode_id: "m".into(),
            new_name: "Dark".into(),
        }
        .into_parts()
        .unwrap();
        assert_eq!(params, json!({"collectionId": "c", "modeId": "m", "newName": "Dark"}));
    }

    #[test]
    fn absent_optionals_are_omitted() {
        let (_, params) = Command::GetVariables { file_key: None }.into_parts().unwrap();
        assert_eq!(params, json!({}));
        let (_, params) = Command::SetNodeStrokes {
            node_id: "1:2".into(),
            strokes: vec![],
            stroke_weight: None,
        }
        .into_parts()
        .unwrap();
        assert_eq!(params, json!({"nodeId": "1:2", "strokes": []}));
    }

    #[test]
    fn screenshot_sends_null_node() {
        let (_, params) = Command::CaptureScreenshot { node_id: None, options: None }
            .into_parts()
            .unwrap();
        assert_eq!(params, json!({"nodeId": null}));
    }

    #[test]
    fn component_property_type_field() {
        let (_, params) = Command::AddComponentProperty {
            node_id: "1:2".into(),
            property_name: "Label".into(),
            property_type: ComponentPropertyType::Text,
            default_value: json!("OK"),
            options: None,
        }
        .into_parts()
        .unwrap();
        assert_eq!(params["type"], "TEXT");
        assert_eq!(params["defaultValue"], "OK");
    }

    #[test]
    fn command_round_trips_from_wire() {
        let frame = json!({"method": "moveNode", "params": {"nodeId": "1:2", "x": 4.0, "y": 8.0}});
        let command: Command = serde_json::from_value(frame).unwrap();
        assert_eq!(
            command,
            Command::MoveNode { node_id: "1:2".into(), x: 4.0, y: 8.0 }
        );
    }

    #[test]
    fn depth_is_bounded() {
        let ok = Command::GetDocumentStructure { depth: 3, verbosity: Verbosity::Summary };
        assert!(ok.validate().is_ok());
        let bad = Command::GetNodeContext {
            node_id: "1:2".into(),
            depth: 4,
            verbosity: Verbosity::Standard,
        };
        assert_matches!(bad.validate(), Err(BridgeError::InvalidParams { message }) => {
            assert!(message.contains("depth"));
        });
    }

    #[test]
    fn console_limit_is_bounded() {
        assert!(Command::GetConsoleLogs { limit: 200 }.validate().is_ok());
        assert!(Command::GetConsoleLogs { limit: 0 }.validate().is_err());
        assert!(Command::GetConsoleLogs { limit: 201 }.validate().is_err());
    }

    #[test]
    fn opacity_is_bounded() {
        let at = |opacity| Command::SetNodeOpacity { node_id: "1:2".into(), opacity };
        assert!(at(0.0).validate().is_ok());
        assert!(at(1.0).validate().is_ok());
        assert!(at(1.5).validate().is_err());
        assert!(at(f64::NAN).validate().is_err());
    }

    #[test]
    fn screenshot_scale_is_bounded() {
        let at = |scale| Command::CaptureScreenshot {
            node_id: Some("1:2".into()),
            options: Some(ScreenshotOptions { format: None, scale: Some(scale) }),
        };
        assert!(at(2.0).validate().is_ok());
        assert!(at(8.0).validate().is_err());
    }

    #[test]
    fn component_set_needs_two_nodes() {
        let one = Command::ArrangeComponentSet { node_ids: vec!["1:1".into()] };
        assert_matches!(one.validate(), Err(BridgeError::InvalidParams { .. }));
    }

    #[test]
    fn design_tokens_need_a_mode() {
        let cmd = Command::SetupDesignTokens {
            collection_name: "Brand".into(),
            modes: vec![],
            tokens: vec![],
        };
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn batches_are_capped() {
        let item = VariableUpdate { variable_id: "v".into(), mode_id: "m".into(), value: json!(1) };
        let ok = Command::BatchUpdateVariables { items: vec![item.clone(); MAX_BATCH_ITEMS] };
        assert!(ok.validate().is_ok());
        let bad = Command::BatchUpdateVariables { items: vec![item; MAX_BATCH_ITEMS + 1] };
        assert!(bad.validate().is_err());
    }
}
