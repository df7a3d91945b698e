//! `PluginBridgeConnector`: one method per plugin operation.

use std::sync::Arc;

use fmcp_core::params::{
    CollectionOptions, ComponentPropertyType, DesignToken, InstantiateOptions, NewVariable,
    NodeType, PropertyEdit, PropertyOptions, ResolvedType, ScreenshotOptions, TextOptions,
    VariableOptions, VariableUpdate, Verbosity,
};
use fmcp_core::results::decode;
use fmcp_core::{BridgeError, Command, ConsoleLogs, LocalStyles, PluginObject, PluginTransport};
use serde_json::{Map, Value};
use tracing::{debug, info};

/// Default tree depth for `getDocumentStructure`.
pub const DEFAULT_STRUCTURE_DEPTH: u8 = 1;
/// Default tree depth for `getNodeContext`.
pub const DEFAULT_CONTEXT_DEPTH: u8 = 2;
/// Default page size for `getConsoleLogs`.
pub const DEFAULT_CONSOLE_LIMIT: u16 = 50;
/// Default plugin-side limit for `executeCodeViaUI`, in milliseconds.
pub const DEFAULT_EXECUTE_TIMEOUT_MS: u64 = 5000;

type Result<T> = std::result::Result<T, BridgeError>;

/// Typed façade over a [`PluginTransport`].
///
/// Every method fills in defaults, validates arguments and forwards a single
/// request. There is no retry and no protocol logic here.
#[derive(Clone)]
pub struct PluginBridgeConnector {
    transport: Arc<dyn PluginTransport>,
}

impl std::fmt::Debug for PluginBridgeConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginBridgeConnector")
            .field("connected", &self.transport.is_connected())
            .finish()
    }
}

impl PluginBridgeConnector {
    /// Connector sending through `transport`.
    pub fn new(transport: Arc<dyn PluginTransport>) -> Self {
        Self { transport }
    }

    /// Log readiness. The socket itself is owned by the server.
    pub fn initialize(&self) {
        info!(connected = self.transport.is_connected(), "plugin bridge connector ready");
    }

    /// Log teardown.
    pub fn dispose(&self) {
        info!("plugin bridge connector disposed");
    }

    /// Whether a plugin is attached.
    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    async fn read(&self, command: Command) -> Result<PluginObject> {
        self.read_as(command).await
    }

    async fn read_as<T: serde::de::DeserializeOwned>(&self, command: Command) -> Result<T> {
        let method = command.method();
        debug!(%method, "plugin read");
        let value = self.transport.dispatch(command).await?;
        decode(method, value)
    }

    async fn write(&self, command: Command) -> Result<Value> {
        debug!(method = %command.method(), "plugin write");
        self.transport.dispatch(command).await
    }

    // Reads

    /// Variables as cached by the plugin UI.
    pub async fn get_variables_from_plugin_ui(&self, file_key: Option<&str>) -> Result<PluginObject> {
        self.read(Command::GetVariablesFromPluginUi {
            file_key: file_key.map(str::to_owned),
        })
        .await
    }

    /// Component data as cached by the plugin UI.
    pub async fn get_component_from_plugin_ui(&self, node_id: &str) -> Result<PluginObject> {
        self.read(Command::GetComponentFromPluginUi { node_id: node_id.to_owned() })
            .await
    }

    /// Local variables and collections.
    pub async fn get_variables(&self, file_key: Option<&str>) -> Result<PluginObject> {
        self.read(Command::GetVariables {
            file_key: file_key.map(str::to_owned),
        })
        .await
    }

    /// One component by node id.
    pub async fn get_component_by_node_id(&self, node_id: &str) -> Result<PluginObject> {
        self.read(Command::GetComponentByNodeId { node_id: node_id.to_owned() })
            .await
    }

    /// Every local component and component set.
    pub async fn get_local_components(&self) -> Result<PluginObject> {
        self.read(Command::GetLocalComponents {}).await
    }

    /// Document tree. Defaults: depth 1, summary.
    pub async fn get_document_structure(
        &self,
        depth: Option<u8>,
        verbosity: Option<Verbosity>,
    ) -> Result<PluginObject> {
        self.read(Command::GetDocumentStructure {
            depth: depth.unwrap_or(DEFAULT_STRUCTURE_DEPTH),
            verbosity: verbosity.unwrap_or(Verbosity::Summary),
        })
        .await
    }

    /// Subtree around `node_id`. Defaults: depth 2, standard.
    pub async fn get_node_context(
        &self,
        node_id: &str,
        depth: Option<u8>,
        verbosity: Option<Verbosity>,
    ) -> Result<PluginObject> {
        self.read(Command::GetNodeContext {
            node_id: node_id.to_owned(),
            depth: depth.unwrap_or(DEFAULT_CONTEXT_DEPTH),
            verbosity: verbosity.unwrap_or(Verbosity::Standard),
        })
        .await
    }

    /// Paint, text and effect styles. Default verbosity: summary.
    pub async fn get_local_styles(&self, verbosity: Option<Verbosity>) -> Result<LocalStyles> {
        self.read_as(Command::GetLocalStyles {
            verbosity: verbosity.unwrap_or(Verbosity::Summary),
        })
        .await
    }

    /// Export a node, or the current page when `node_id` is `None`.
    pub async fn capture_screenshot(
        &self,
        node_id: Option<&str>,
        options: Option<ScreenshotOptions>,
    ) -> Result<PluginObject> {
        self.read(Command::CaptureScreenshot {
            node_id: node_id.map(str::to_owned),
            options,
        })
        .await
    }

    /// Re-read variables from the document.
    pub async fn refresh_variables(&self) -> Result<PluginObject> {
        self.read(Command::RefreshVariables {}).await
    }

    /// Buffered plugin console output. Default limit: 50.
    pub async fn get_console_logs(&self, limit: Option<u16>) -> Result<ConsoleLogs> {
        self.read_as(Command::GetConsoleLogs {
            limit: limit.unwrap_or(DEFAULT_CONSOLE_LIMIT),
        })
        .await
    }

    // Writes and execution

    /// Empty the plugin console buffer.
    pub async fn clear_console(&self) -> Result<Value> {
        self.write(Command::ClearConsole {}).await
    }

    /// Run `code` in the plugin sandbox. Default limit: 5000 ms.
    pub async fn execute_code_via_ui(&self, code: &str, timeout_ms: Option<u64>) -> Result<Value> {
        self.write(Command::ExecuteCodeViaUi {
            code: code.to_owned(),
            timeout: timeout_ms.unwrap_or(DEFAULT_EXECUTE_TIMEOUT_MS),
        })
        .await
    }

    /// Set one variable value for one mode.
    pub async fn update_variable(&self, variable_id: &str, mode_id: &str, value: Value) -> Result<Value> {
        self.write(Command::UpdateVariable {
            variable_id: variable_id.to_owned(),
            mode_id: mode_id.to_owned(),
            value,
        })
        .await
    }

    /// Create a variable in `collection_id`.
    pub async fn create_variable(
        &self,
        name: &str,
        collection_id: &str,
        resolved_type: ResolvedType,
        options: Option<VariableOptions>,
    ) -> Result<Value> {
        self.write(Command::CreateVariable {
            name: name.to_owned(),
            collection_id: collection_id.to_owned(),
            resolved_type,
            options,
        })
        .await
    }

    /// Create a variable collection.
    pub async fn create_variable_collection(
        &self,
        name: &str,
        options: Option<CollectionOptions>,
    ) -> Result<Value> {
        self.write(Command::CreateVariableCollection {
            name: name.to_owned(),
            options,
        })
        .await
    }

    /// Delete a variable.
    pub async fn delete_variable(&self, variable_id: &str) -> Result<Value> {
        self.write(Command::DeleteVariable { variable_id: variable_id.to_owned() })
            .await
    }

    /// Delete a collection and its variables.
    pub async fn delete_variable_collection(&self, collection_id: &str) -> Result<Value> {
        self.write(Command::DeleteVariableCollection {
            collection_id: collection_id.to_owned(),
        })
        .await
    }

    /// Rename a variable.
    pub async fn rename_variable(&self, variable_id: &str, new_name: &str) -> Result<Value> {
        self.write(Command::RenameVariable {
            variable_id: variable_id.to_owned(),
            new_name: new_name.to_owned(),
        })
        .await
    }

    /// Add a mode to a collection.
    pub async fn add_mode(&self, collection_id: &str, mode_name: &str) -> Result<Value> {
        self.write(Command::AddMode {
            collection_id: collection_id.to_owned(),
            mode_name: mode_name.to_owned(),
        })
        .await
    }

    /// Rename a mode.
    pub async fn rename_mode(&self, collection_id: &str, mode_id: &str, new_name: &str) -> Result<Value> {
        self.write(Command::RenameMode {
            collection_id: collection_id.to_owned(),
            mode_id: mode_id.to_owned(),
            new_name: new_name.to_owned(),
        })
        .await
    }

    /// Place an instance of a component.
    pub async fn instantiate_component(
        &self,
        component_key: &str,
        options: Option<InstantiateOptions>,
    ) -> Result<Value> {
        self.write(Command::InstantiateComponent {
            component_key: component_key.to_owned(),
            options,
        })
        .await
    }

    /// Set the description of a component, component set or style.
    pub async fn set_node_description(
        &self,
        node_id: &str,
        description: &str,
        description_markdown: Option<&str>,
    ) -> Result<Value> {
        self.write(Command::SetNodeDescription {
            node_id: node_id.to_owned(),
            description: description.to_owned(),
            description_markdown: description_markdown.map(str::to_owned),
        })
        .await
    }

    /// Add a component property.
    pub async fn add_component_property(
        &self,
        node_id: &str,
        property_name: &str,
        property_type: ComponentPropertyType,
        default_value: Value,
        options: Option<PropertyOptions>,
    ) -> Result<Value> {
        self.write(Command::AddComponentProperty {
            node_id: node_id.to_owned(),
            property_name: property_name.to_owned(),
            property_type,
            default_value,
            options,
        })
        .await
    }

    /// Change a component property.
    pub async fn edit_component_property(
        &self,
        node_id: &str,
        property_name: &str,
        new_value: PropertyEdit,
    ) -> Result<Value> {
        self.write(Command::EditComponentProperty {
            node_id: node_id.to_owned(),
            property_name: property_name.to_owned(),
            new_value,
        })
        .await
    }

    /// Remove a component property.
    pub async fn delete_component_property(&self, node_id: &str, property_name: &str) -> Result<Value> {
        self.write(Command::DeleteComponentProperty {
            node_id: node_id.to_owned(),
            property_name: property_name.to_owned(),
        })
        .await
    }

    /// Resize a node. Constraints apply unless `with_constraints` is `Some(false)`.
    pub async fn resize_node(
        &self,
        node_id: &str,
        width: f64,
        height: f64,
        with_constraints: Option<bool>,
    ) -> Result<Value> {
        self.write(Command::ResizeNode {
            node_id: node_id.to_owned(),
            width,
            height,
            with_constraints: with_constraints.unwrap_or(true),
        })
        .await
    }

    /// Move a node.
    pub async fn move_node(&self, node_id: &str, x: f64, y: f64) -> Result<Value> {
        self.write(Command::MoveNode { node_id: node_id.to_owned(), x, y })
            .await
    }

    /// Replace a node's fills.
    pub async fn set_node_fills(&self, node_id: &str, fills: Vec<Value>) -> Result<Value> {
        self.write(Command::SetNodeFills { node_id: node_id.to_owned(), fills })
            .await
    }

    /// Replace a node's strokes.
    pub async fn set_node_strokes(
        &self,
        node_id: &str,
        strokes: Vec<Value>,
        stroke_weight: Option<f64>,
    ) -> Result<Value> {
        self.write(Command::SetNodeStrokes {
            node_id: node_id.to_owned(),
            strokes,
            stroke_weight,
        })
        .await
    }

    /// Set a node's opacity.
    pub async fn set_node_opacity(&self, node_id: &str, opacity: f64) -> Result<Value> {
        self.write(Command::SetNodeOpacity { node_id: node_id.to_owned(), opacity })
            .await
    }

    /// Set a node's corner radius.
    pub async fn set_node_corner_radius(&self, node_id: &str, radius: f64) -> Result<Value> {
        self.write(Command::SetNodeCornerRadius { node_id: node_id.to_owned(), radius })
            .await
    }

    /// Duplicate a node.
    pub async fn clone_node(&self, node_id: &str) -> Result<Value> {
        self.write(Command::CloneNode { node_id: node_id.to_owned() }).await
    }

    /// Delete a node.
    pub async fn delete_node(&self, node_id: &str) -> Result<Value> {
        self.write(Command::DeleteNode { node_id: node_id.to_owned() }).await
    }

    /// Rename a node.
    pub async fn rename_node(&self, node_id: &str, new_name: &str) -> Result<Value> {
        self.write(Command::RenameNode {
            node_id: node_id.to_owned(),
            new_name: new_name.to_owned(),
        })
        .await
    }

    /// Replace the characters of a text node.
    pub async fn set_text_content(
        &self,
        node_id: &str,
        text: &str,
        options: Option<TextOptions>,
    ) -> Result<Value> {
        self.write(Command::SetTextContent {
            node_id: node_id.to_owned(),
            text: text.to_owned(),
            options,
        })
        .await
    }

    /// Create a child node under `parent_id`.
    pub async fn create_child_node(
        &self,
        parent_id: &str,
        node_type: NodeType,
        properties: Option<Map<String, Value>>,
    ) -> Result<Value> {
        self.write(Command::CreateChildNode {
            parent_id: parent_id.to_owned(),
            node_type,
            properties,
        })
        .await
    }

    /// Set component properties on an instance.
    pub async fn set_instance_properties(
        &self,
        node_id: &str,
        properties: Map<String, Value>,
    ) -> Result<Value> {
        self.write(Command::SetInstanceProperties {
            node_id: node_id.to_owned(),
            properties,
        })
        .await
    }

    /// Create up to 100 variables in one request.
    pub async fn batch_create_variables(&self, items: Vec<NewVariable>) -> Result<Value> {
        self.write(Command::BatchCreateVariables { items }).await
    }

    /// Update up to 100 variable values in one request.
    pub async fn batch_update_variables(&self, items: Vec<VariableUpdate>) -> Result<Value> {
        self.write(Command::BatchUpdateVariables { items }).await
    }

    /// Create a collection with its modes and tokens.
    pub async fn setup_design_tokens(
        &self,
        collection_name: &str,
        modes: Vec<String>,
        tokens: Vec<DesignToken>,
    ) -> Result<Value> {
        self.write(Command::SetupDesignTokens {
            collection_name: collection_name.to_owned(),
            modes,
            tokens,
        })
        .await
    }

    /// Combine at least two components into a component set.
    pub async fn arrange_component_set(&self, node_ids: Vec<String>) -> Result<Value> {
        self.write(Command::ArrangeComponentSet { node_ids }).await
    }
}
