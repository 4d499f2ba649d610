use std::str::FromStr;

use crate::enums::ArithmeticOperator;
use crate::ids::{Node, NodeId};
use crate::literal::Literal;
use crate::variable::Variable;
use crate::wire::{ConversionData, OperandData};

/// Right-hand side of a conversion step.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Value of a source variable.
    Variable(Variable),
    /// A typed-in value; `None` while the user has not entered one yet.
    Value(Option<Literal>),
}

impl Operand {
    pub fn kind(&self) -> OperandKind {
        match self {
            Operand::Variable(_) => OperandKind::Variable,
            Operand::Value(_) => OperandKind::Value,
        }
    }

    fn from_wire(data: &OperandData) -> Self {
        match data {
            OperandData::Variable(variable) => Operand::Variable(Variable::from_wire(variable)),
            OperandData::Literal(literal) => Operand::Value(literal.clone()),
        }
    }

    fn to_wire(&self) -> OperandData {
        match self {
            Operand::Variable(variable) => OperandData::Variable(variable.to_wire()),
            Operand::Value(literal) => OperandData::Literal(literal.clone()),
        }
    }
}

/// Operand representation picked in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Variable,
    Value,
}

impl FromStr for OperandKind {
    type Err = std::convert::Infallible;

    /// `VAR` selects a variable operand; every other selector value means a
    /// typed-in value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(if s.trim() == "VAR" {
            OperandKind::Variable
        } else {
            OperandKind::Value
        })
    }
}

/// One arithmetic step in a group's chain.
#[derive(Debug)]
pub struct Conversion {
    id: NodeId,
    pub operator: Option<ArithmeticOperator>,
    pub value: Operand,
}

impl Conversion {
    /// A conversion whose operand is an empty variable reference.
    pub fn by_variable_empty() -> Self {
        Self::with_operand(None, Operand::Variable(Variable::default()))
    }

    pub fn with_operand(operator: Option<ArithmeticOperator>, value: Operand) -> Self {
        Self {
            id: NodeId::next(),
            operator,
            value,
        }
    }

    pub fn from_wire(data: &ConversionData) -> Self {
        let mut conversion = Self::default();
        conversion.update(data);
        conversion
    }

    pub fn to_wire(&self) -> ConversionData {
        ConversionData {
            operator: self.operator,
            value: self.value.to_wire(),
        }
    }

    pub fn update(&mut self, data: &ConversionData) {
        self.operator = data.operator;
        self.value = Operand::from_wire(&data.value);
    }

    pub fn by_variable(&self) -> bool {
        matches!(self.value, Operand::Variable(_))
    }

    pub fn by_value(&self) -> bool {
        !self.by_variable()
    }

    pub fn variable(&self) -> Option<&Variable> {
        match &self.value {
            Operand::Variable(variable) => Some(variable),
            Operand::Value(_) => None,
        }
    }

    pub fn variable_mut(&mut self) -> Option<&mut Variable> {
        match &mut self.value {
            Operand::Variable(variable) => Some(variable),
            Operand::Value(_) => None,
        }
    }

    /// Switches the operand representation, discarding the old operand
    /// entirely.
    pub fn change_type(&mut self, kind: OperandKind) {
        self.value = match kind {
            OperandKind::Variable => Operand::Variable(Variable::default()),
            OperandKind::Value => Operand::Value(None),
        };
    }
}

/// A freshly added step: no operator yet and no value typed in.
impl Default for Conversion {
    fn default() -> Self {
        Self::with_operand(None, Operand::Value(None))
    }
}

impl Node for Conversion {
    fn id(&self) -> NodeId {
        self.id
    }
}
