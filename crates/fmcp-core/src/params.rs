//! Typed building blocks for [`Command`](crate::methods::Command) params.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How much detail the plugin includes when describing nodes or styles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    /// Names and ids only.
    #[default]
    Summary,
    /// Adds text content and common properties.
    Standard,
    /// Everything the plugin can serialize.
    Full,
}

/// Resolved type of a design variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResolvedType {
    /// RGBA color.
    Color,
    /// Number.
    Float,
    /// Text.
    String,
    /// Boolean.
    Boolean,
}

/// Kind of a component property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentPropertyType {
    /// On/off toggle.
    Boolean,
    /// Text override.
    Text,
    /// Swappable nested instance.
    InstanceSwap,
    /// Variant axis.
    Variant,
}

/// Node kinds `createChildNode` can create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    /// `RECTANGLE`
    Rectangle,
    /// `ELLIPSE`
    Ellipse,
    /// `FRAME`
    Frame,
    /// `TEXT`
    Text,
    /// `LINE`
    Line,
    /// `POLYGON`
    Polygon,
    /// `STAR`
    Star,
    /// `VECTOR`
    Vector,
}

/// Screenshot encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImageFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG.
    Jpg,
}

/// Optional screenshot settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenshotOptions {
    /// Output encoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<ImageFormat>,
    /// Export scale, `0.5..=4`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Optional settings for `createVariable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableOptions {
    /// Initial value per mode id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_by_mode: Option<Map<String, Value>>,
    /// Variable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Where the variable may be applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
}

/// Optional settings for `createVariableCollection`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOptions {
    /// Name given to the collection's first mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_mode_name: Option<String>,
    /// Extra modes created after the first.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_modes: Option<Vec<String>>,
}

/// Canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

/// Width and height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// Optional settings for `instantiateComponent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantiateOptions {
    /// Component node id, used when the key lookup fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    /// Where to place the instance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// Instance size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    /// Component property overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<Map<String, Value>>,
    /// Variant selection, axis name to value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<BTreeMap<String, String>>,
    /// Parent to append the instance to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Optional settings for `addComponentProperty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyOptions {
    /// Preferred swap targets for instance-swap properties.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_values: Option<Vec<Value>>,
}

/// Changes applied by `editComponentProperty`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyEdit {
    /// New property name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New default value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    /// New preferred values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_values: Option<Vec<Value>>,
}

/// Optional settings for `setTextContent`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    /// Font size applied with the new text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
}

/// One entry of `batchCreateVariables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewVariable {
    /// Target collection.
    pub collection_id: String,
    /// Variable name.
    pub name: String,
    /// Variable type.
    pub resolved_type: ResolvedType,
    /// Value for `mode_id` (or the default mode).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Mode that receives `value`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_id: Option<String>,
    /// Values per mode id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values_by_mode: Option<Map<String, Value>>,
}

/// One entry of `batchUpdateVariables`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableUpdate {
    /// Variable to update.
    pub variable_id: String,
    /// Mode whose value changes.
    pub mode_id: String,
    /// New value.
    pub value: Value,
}

/// One token of `setupDesignTokens`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignToken {
    /// Token name; `/` separates groups.
    pub name: String,
    /// Variable type, inferred by the plugin when absent.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<ResolvedType>,
    /// Same value for every mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Value per mode name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Map<String, Value>>,
}
