//! Function, constructor and event descriptors

use super::selector::AbiSelector;
use super::types::{AbiError, AbiType};

/// A named, typed parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub param_type: AbiType,
    /// Only meaningful for event inputs
    pub indexed: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, param_type: AbiType) -> Self {
        Self { name: name.into(), param_type, indexed: false }
    }

    pub fn indexed(name: impl Into<String>, param_type: AbiType) -> Self {
        Self { name: name.into(), param_type, indexed: true }
    }
}

/// What an ABI entry describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Constructor,
    Function,
    Event,
}

/// Immutable description of a contract function, constructor or event.
///
/// The canonical signature, selector, event topic and the indexed /
/// non-indexed input split are computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    name: String,
    kind: FunctionKind,
    constant: bool,
    anonymous: bool,
    inputs: Vec<Param>,
    outputs: Vec<Param>,
    signature: String,
    selector: [u8; 4],
    topic: [u8; 32],
    indexed_inputs: Vec<usize>,
    data_inputs: Vec<usize>,
}

impl FunctionDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: FunctionKind,
        constant: bool,
        anonymous: bool,
        inputs: Vec<Param>,
        outputs: Vec<Param>,
    ) -> Self {
        let name = name.into();
        let canonical: Vec<String> = inputs.iter().map(|p| p.param_type.canonical_type()).collect();
        let signature = AbiSelector::signature(&name, canonical.iter().map(String::as_str));
        let selector = AbiSelector::selector_from_signature(&signature);
        let topic = AbiSelector::topic_from_signature(&signature);

        let (indexed_inputs, data_inputs): (Vec<usize>, Vec<usize>) = if kind == FunctionKind::Event {
            (0..inputs.len()).partition(|&i| inputs[i].indexed)
        } else {
            (Vec::new(), (0..inputs.len()).collect())
        };

        Self {
            name,
            kind,
            constant,
            anonymous,
            inputs,
            outputs,
            signature,
            selector,
            topic,
            indexed_inputs,
            data_inputs,
        }
    }

    /// Mutating function
    pub fn function(name: impl Into<String>, inputs: Vec<Param>, outputs: Vec<Param>) -> Self {
        Self::new(name, FunctionKind::Function, false, false, inputs, outputs)
    }

    /// Read-only (view/pure) function
    pub fn constant(name: impl Into<String>, inputs: Vec<Param>, outputs: Vec<Param>) -> Self {
        Self::new(name, FunctionKind::Function, true, false, inputs, outputs)
    }

    pub fn constructor(inputs: Vec<Param>) -> Self {
        Self::new("constructor", FunctionKind::Constructor, false, false, inputs, Vec::new())
    }

    pub fn event(name: impl Into<String>, inputs: Vec<Param>, anonymous: bool) -> Self {
        Self::new(name, FunctionKind::Event, false, anonymous, inputs, Vec::new())
    }

    /// Build a mutating function descriptor from `name(type1,type2)`.
    /// Inputs are named `arg0`, `arg1`, ...
    pub fn parse_signature(signature: &str) -> Result<Self, AbiError> {
        let open = signature
            .find('(')
            .ok_or_else(|| AbiError::InvalidAbi(format!("Missing '(' in signature: {}", signature)))?;
        if !signature.ends_with(')') {
            return Err(AbiError::InvalidAbi(format!("Missing ')' in signature: {}", signature)));
        }
        let name = signature[..open].trim();
        if name.is_empty() {
            return Err(AbiError::InvalidAbi("Empty function name".to_string()));
        }

        let args = &signature[open + 1..signature.len() - 1];
        let inputs = if args.trim().is_empty() {
            Vec::new()
        } else {
            args.split(',')
                .enumerate()
                .map(|(i, t)| Ok(Param::new(format!("arg{}", i), AbiType::parse(t)?)))
                .collect::<Result<Vec<_>, AbiError>>()?
        };

        Ok(Self::function(name, inputs, Vec::new()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FunctionKind {
        self.kind
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn is_anonymous(&self) -> bool {
        self.anonymous
    }

    pub fn inputs(&self) -> &[Param] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Param] {
        &self.outputs
    }

    /// Canonical signature, e.g. `transfer(address,uint256)`
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// Full keccak256 of the signature (topic 0 of non-anonymous events)
    pub fn topic(&self) -> [u8; 32] {
        self.topic
    }

    /// Positions of indexed event inputs, in declaration order
    pub fn indexed_inputs(&self) -> &[usize] {
        &self.indexed_inputs
    }

    /// Positions of inputs carried in the data section
    pub fn data_inputs(&self) -> &[usize] {
        &self.data_inputs
    }

    pub fn input_types(&self) -> Vec<&AbiType> {
        self.inputs.iter().map(|p| &p.param_type).collect()
    }

    pub fn output_types(&self) -> Vec<&AbiType> {
        self.outputs.iter().map(|p| &p.param_type).collect()
    }
}
