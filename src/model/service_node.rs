use std::fmt;
use std::str::FromStr;
use serde::{Deserialize, Serialize};

pub const ICONS_CDN: &str = "https://cdn-botway.deno.dev/icons";

/// Node ids are opaque to us; the platform sends strings but integers are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeId
{
    Number(i64),
    Text(String),
}

impl fmt::Display for NodeId
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match self
        {
            NodeId::Number(n) => write!(f, "{}", n),
            NodeId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge<T>
{
    pub node: T,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry
{
    pub id: NodeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginEntry
{
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeEntry
{
    pub id: NodeId,
    pub name: String,
}

/// The three lists the deployment platform reports for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ServicesResponse
{
    #[serde(default)]
    pub services: Vec<Edge<ServiceEntry>>,
    #[serde(default)]
    pub plugins: Vec<Edge<PluginEntry>>,
    #[serde(default)]
    pub volumes: Vec<Edge<VolumeEntry>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind
{
    Service,
    Plugin,
    Volume,
}

impl NodeKind
{
    pub fn as_str(self) -> &'static str
    {
        match self
        {
            NodeKind::Service => "service",
            NodeKind::Plugin => "plugin",
            NodeKind::Volume => "volume",
        }
    }
}

impl FromStr for NodeKind
{
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s
        {
            "service" => Ok(NodeKind::Service),
            "plugin" => Ok(NodeKind::Plugin),
            "volume" => Ok(NodeKind::Volume),
            other => Err(format!("Unknown node type '{}'. Expected service, plugin or volume.", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServiceNode
{
    Service
    {
        id: NodeId,
        name: String,
    },
    Plugin
    {
        id: NodeId,
        name: String,
        #[serde(rename = "friendlyName", skip_serializing_if = "Option::is_none")]
        friendly_name: Option<String>,
    },
    Volume
    {
        id: NodeId,
        name: String,
    },
}

impl ServiceNode
{
    pub fn id(&self) -> &NodeId
    {
        match self
        {
            ServiceNode::Service { id, .. } | ServiceNode::Plugin { id, .. } | ServiceNode::Volume { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str
    {
        match self
        {
            ServiceNode::Service { name, .. } | ServiceNode::Plugin { name, .. } | ServiceNode::Volume { name, .. } => name.as_str(),
        }
    }

    pub fn kind(&self) -> NodeKind
    {
        match self
        {
            ServiceNode::Service { .. } => NodeKind::Service,
            ServiceNode::Plugin { .. } => NodeKind::Plugin,
            ServiceNode::Volume { .. } => NodeKind::Volume,
        }
    }

    /// Plugins are shown by their friendly name, everything else by name.
    pub fn display_name(&self) -> &str
    {
        match self
        {
            ServiceNode::Plugin { friendly_name: Some(friendly), .. } => friendly.as_str(),
            other => other.name(),
        }
    }

    pub fn icon(&self) -> String
    {
        match self
        {
            ServiceNode::Plugin { name, .. } => format!("{}/{}.svg", ICONS_CDN, name),
            ServiceNode::Volume { .. } => format!("{}/volume.svg", ICONS_CDN),
            ServiceNode::Service { .. } => format!("{}/github.svg", ICONS_CDN),
        }
    }
}
