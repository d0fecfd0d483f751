//! JSON ABI parsing and the per-contract method index

use std::collections::HashMap;

use serde::Deserialize;

use super::function::{FunctionDescriptor, FunctionKind, Param};
use super::types::*;
use crate::{log_debug, log_warn};

/// One entry of a JSON ABI array
#[derive(Debug, Clone, Deserialize)]
pub struct AbiEntry {
    /// `function` when absent
    #[serde(rename = "type", default)]
    pub entry_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub constant: Option<bool>,
    #[serde(rename = "stateMutability", default)]
    pub state_mutability: Option<String>,
    #[serde(default)]
    pub anonymous: bool,
    #[serde(default)]
    pub inputs: Vec<AbiEntryParam>,
    #[serde(default)]
    pub outputs: Option<Vec<AbiEntryParam>>,
}

/// Parameter of a JSON ABI entry
#[derive(Debug, Clone, Deserialize)]
pub struct AbiEntryParam {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default)]
    pub indexed: bool,
}

impl AbiEntry {
    /// `constant: true` or a view/pure state mutability
    fn is_constant(&self) -> bool {
        self.constant.unwrap_or(false)
            || matches!(self.state_mutability.as_deref(), Some("view") | Some("pure"))
    }
}

/// Read-only index of a contract's functions, constructor and events
#[derive(Debug, Clone, Default)]
pub struct ContractIndex {
    constant_functions: HashMap<String, FunctionDescriptor>,
    functions: HashMap<String, FunctionDescriptor>,
    constructor: Option<FunctionDescriptor>,
    events: HashMap<String, FunctionDescriptor>,
    // Overloads stay reachable here even when shadowed by name
    by_selector: HashMap<[u8; 4], FunctionDescriptor>,
    by_topic: HashMap<[u8; 32], FunctionDescriptor>,
}

impl ContractIndex {
    /// Parse ABI from JSON string
    pub fn from_json(json: &str) -> Result<Self, AbiError> {
        let entries: Vec<AbiEntry> = serde_json::from_str(json)
            .map_err(|e| AbiError::InvalidAbi(format!("JSON parse error: {}", e)))?;
        Self::from_abi(entries)
    }

    /// Parse ABI from JSON Value
    pub fn from_json_value(value: serde_json::Value) -> Result<Self, AbiError> {
        let entries: Vec<AbiEntry> = serde_json::from_value(value)
            .map_err(|e| AbiError::InvalidAbi(format!("JSON parse error: {}", e)))?;
        Self::from_abi(entries)
    }

    /// Classify entries into constructor, events, constant and mutating functions
    pub fn from_abi(entries: Vec<AbiEntry>) -> Result<Self, AbiError> {
        let mut index = ContractIndex::default();

        for entry in entries {
            let entry_type = entry.entry_type.clone().unwrap_or_else(|| "function".to_string());
            match entry_type.as_str() {
                "function" => {
                    let constant = entry.is_constant();
                    let descriptor = FunctionDescriptor::new(
                        entry.name.clone(),
                        FunctionKind::Function,
                        constant,
                        false,
                        convert_params(&entry.inputs)?,
                        convert_params(entry.outputs.as_deref().unwrap_or_default())?,
                    );
                    index.by_selector.insert(descriptor.selector(), descriptor.clone());
                    let map = if constant { &mut index.constant_functions } else { &mut index.functions };
                    if let Some(previous) = map.insert(entry.name.clone(), descriptor) {
                        log_warn!(
                            "abi",
                            "overloaded function, keeping last declaration",
                            name = entry.name,
                            replaced = previous.signature(),
                        );
                    }
                }
                "constructor" => {
                    index.constructor = Some(FunctionDescriptor::constructor(convert_params(&entry.inputs)?));
                }
                "event" => {
                    let descriptor = FunctionDescriptor::event(
                        entry.name.clone(),
                        convert_params(&entry.inputs)?,
                        entry.anonymous,
                    );
                    if !descriptor.is_anonymous() {
                        index.by_topic.insert(descriptor.topic(), descriptor.clone());
                    }
                    if let Some(previous) = index.events.insert(entry.name.clone(), descriptor) {
                        log_warn!(
                            "abi",
                            "overloaded event, keeping last declaration",
                            name = entry.name,
                            replaced = previous.signature(),
                        );
                    }
                }
                "fallback" | "receive" | "error" => {
                    log_debug!("abi", "skipping ABI entry", entry_type = entry_type, name = entry.name);
                }
                other => {
                    return Err(AbiError::InvalidAbi(format!("Unknown ABI entry type: {}", other)));
                }
            }
        }

        Ok(index)
    }

    /// Constant (view/pure) function by name
    pub fn constant_function(&self, name: &str) -> Result<&FunctionDescriptor, AbiError> {
        self.constant_functions
            .get(name)
            .ok_or_else(|| AbiError::NoSuchContractMethod(name.to_string()))
    }

    /// Mutating function by name
    pub fn function(&self, name: &str) -> Result<&FunctionDescriptor, AbiError> {
        self.functions
            .get(name)
            .ok_or_else(|| AbiError::NoSuchContractMethod(name.to_string()))
    }

    /// Function by name, constant or mutating
    pub fn method(&self, name: &str) -> Result<&FunctionDescriptor, AbiError> {
        self.constant_functions
            .get(name)
            .or_else(|| self.functions.get(name))
            .ok_or_else(|| AbiError::NoSuchContractMethod(name.to_string()))
    }

    /// Event by name
    pub fn event(&self, name: &str) -> Result<&FunctionDescriptor, AbiError> {
        self.events
            .get(name)
            .ok_or_else(|| AbiError::NoSuchContractMethod(name.to_string()))
    }

    pub fn constructor(&self) -> Option<&FunctionDescriptor> {
        self.constructor.as_ref()
    }

    /// Function by 4-byte selector
    pub fn function_by_selector(&self, selector: &[u8; 4]) -> Option<&FunctionDescriptor> {
        self.by_selector.get(selector)
    }

    /// Non-anonymous event by topic 0
    pub fn event_by_topic(&self, topic: &[u8; 32]) -> Option<&FunctionDescriptor> {
        self.by_topic.get(topic)
    }

    pub fn constant_functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.constant_functions.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.functions.values()
    }

    pub fn events(&self) -> impl Iterator<Item = &FunctionDescriptor> {
        self.events.values()
    }
}

fn convert_params(params: &[AbiEntryParam]) -> Result<Vec<Param>, AbiError> {
    params
        .iter()
        .map(|p| {
            Ok(Param {
                name: p.name.clone(),
                param_type: AbiType::parse(&p.param_type)?,
                indexed: p.indexed,
            })
        })
        .collect()
}
