//! Scenario file format and validation.

use crate::schedule::Schedule;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use vn_valve::{ValveConfig, ValveError, ValveInput};

pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[derive(thiserror::Error, Debug)]
pub enum ScenarioError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Valve error: {0}")]
    Valve(#[from] ValveError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub dt_s: f64,
    pub t_end_s: f64,
    #[serde(default = "default_record_every")]
    pub record_every: usize,
    pub fluid: FluidDef,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub valves: Vec<ValveDef>,
    #[serde(default)]
    pub events: Vec<EventDef>,
}

fn default_record_every() -> usize {
    1
}

/// Ideal-gas fluid shared by every node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FluidDef {
    pub temperature_k: f64,
    /// kg/kmol
    pub molecular_weight: f64,
}

/// A boundary node with a scheduled potential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub pressure_kpa: Schedule,
}

/// A valve, the two nodes it connects and the two nodes it senses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ValveDef {
    pub config: ValveConfig,
    #[serde(default)]
    pub input: ValveInput,
    /// Flow ports: inlet, outlet
    pub ports: [String; 2],
    /// Sense points: control pressure is `sense[0] - sense[1]`
    pub sense: [String; 2],
}

impl ValveDef {
    pub fn id(&self) -> &str {
        &self.config.name
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventDef {
    pub time_s: f64,
    pub action: ActionDef,
}

/// Runtime inputs applied to a valve at an event time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ActionDef {
    SetLeakThrough {
        valve: String,
        active: bool,
        #[serde(default)]
        rate_kgps: f64,
    },
    SetPressureBias {
        valve: String,
        active: bool,
        #[serde(default)]
        bias_kpa: f64,
    },
    SetStuck {
        valve: String,
        active: bool,
    },
    SetFailTo {
        valve: String,
        active: bool,
        #[serde(default)]
        position: f64,
    },
    SetBlockage {
        valve: String,
        active: bool,
        #[serde(default)]
        fraction: f64,
    },
    SetPosition {
        valve: String,
        position: f64,
    },
    SetSetpointBias {
        valve: String,
        bias_kpa: f64,
    },
}

impl ActionDef {
    /// Valve the action targets.
    pub fn valve(&self) -> &str {
        match self {
            ActionDef::SetLeakThrough { valve, .. }
            | ActionDef::SetPressureBias { valve, .. }
            | ActionDef::SetStuck { valve, .. }
            | ActionDef::SetFailTo { valve, .. }
            | ActionDef::SetBlockage { valve, .. }
            | ActionDef::SetPosition { valve, .. }
            | ActionDef::SetSetpointBias { valve, .. } => valve,
        }
    }
}

impl Scenario {
    pub fn valve(&self, id: &str) -> Option<&ValveDef> {
        self.valves.iter().find(|v| v.id() == id)
    }
}

fn invalid(field: impl Into<String>, value: impl ToString, reason: &str) -> ScenarioError {
    ScenarioError::InvalidValue {
        field: field.into(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Check structure, references and every valve's configuration.
///
/// Events naming unknown valves are not rejected here; the runner skips them
/// with a warning.
pub fn validate_scenario(scenario: &Scenario) -> ScenarioResult<()> {
    if !(scenario.dt_s.is_finite() && scenario.dt_s > 0.0) {
        return Err(invalid("dt_s", scenario.dt_s, "must be positive"));
    }
    if !(scenario.t_end_s.is_finite() && scenario.t_end_s >= 0.0) {
        return Err(invalid("t_end_s", scenario.t_end_s, "must be non-negative"));
    }
    if scenario.record_every == 0 {
        return Err(invalid("record_every", 0, "must be at least 1"));
    }
    let fluid = &scenario.fluid;
    if !(fluid.temperature_k.is_finite() && fluid.temperature_k > 0.0) {
        return Err(invalid(
            "fluid.temperature_k",
            fluid.temperature_k,
            "must be positive",
        ));
    }
    if !(fluid.molecular_weight.is_finite() && fluid.molecular_weight > 0.0) {
        return Err(invalid(
            "fluid.molecular_weight",
            fluid.molecular_weight,
            "must be positive",
        ));
    }

    let mut node_ids = HashSet::new();
    for node in &scenario.nodes {
        if !node_ids.insert(node.id.as_str()) {
            return Err(ScenarioError::DuplicateId {
                id: node.id.clone(),
                context: "nodes".to_string(),
            });
        }
        let field = format!("nodes.{}.pressure_kpa", node.id);
        if let Some(reason) = node.pressure_kpa.check() {
            return Err(invalid(field, node.pressure_kpa.points().len(), reason));
        }
        if let Some(min) = node.pressure_kpa.min_value().filter(|p| *p <= 0.0) {
            return Err(invalid(field, min, "pressures must be positive"));
        }
    }

    let mut valve_ids = HashSet::new();
    for valve in &scenario.valves {
        if !valve_ids.insert(valve.id()) {
            return Err(ScenarioError::DuplicateId {
                id: valve.id().to_string(),
                context: "valves".to_string(),
            });
        }
        let ports = valve.ports.iter().map(|n| ("ports", n));
        let sense = valve.sense.iter().map(|n| ("sense", n));
        for (role, node) in ports.chain(sense) {
            if !node_ids.contains(node.as_str()) {
                return Err(ScenarioError::MissingReference {
                    id: node.clone(),
                    context: format!("valve '{}' {role}", valve.id()),
                });
            }
        }
        valve.config.validate()?;
        valve.input.validate(valve.id())?;
    }

    for (i, event) in scenario.events.iter().enumerate() {
        if !(event.time_s.is_finite() && event.time_s >= 0.0) {
            return Err(invalid(
                format!("events[{i}].time_s"),
                event.time_s,
                "must be non-negative",
            ));
        }
    }

    Ok(())
}

pub fn from_yaml_str(content: &str) -> ScenarioResult<Scenario> {
    let scenario: Scenario = serde_yaml::from_str(content)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn from_json_str(content: &str) -> ScenarioResult<Scenario> {
    let scenario: Scenario = serde_json::from_str(content)?;
    validate_scenario(&scenario)?;
    Ok(scenario)
}

pub fn load_yaml(path: &Path) -> ScenarioResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    from_yaml_str(&content)
}

pub fn load_json(path: &Path) -> ScenarioResult<Scenario> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

/// Load by extension: `.json` as JSON, anything else as YAML.
pub fn load(path: &Path) -> ScenarioResult<Scenario> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => load_json(path),
        _ => load_yaml(path),
    }
}

pub fn save_yaml(path: &Path, scenario: &Scenario) -> ScenarioResult<()> {
    validate_scenario(scenario)?;
    let content = serde_yaml::to_string(scenario)?;
    std::fs::write(path, content)?;
    Ok(())
}
